use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{RegistryError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub email: Option<EmailConfig>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Directory with the guest-facing form (index.html, script.js, ...)
    pub public_dir: Option<PathBuf>,
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            public_dir: None,
            cors: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    File,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Defaults to `names.db` for sqlite and `names.json` for the file backend
    pub path: Option<PathBuf>,
    pub fallback_to_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: None,
            fallback_to_memory: true,
        }
    }
}

impl StorageConfig {
    pub fn path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StorageBackend::File) => PathBuf::from("names.json"),
            (None, _) => PathBuf::from("names.db"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Use STARTTLS instead of implicit TLS
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; defaults to `username`
    pub from: Option<String>,
    /// Host address; defaults to `username`
    pub to: Option<String>,
    pub subject: String,
    pub verify_on_startup: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            starttls: false,
            username: None,
            password: None,
            from: None,
            to: None,
            subject: "New gift registry items claimed!".to_string(),
            verify_on_startup: true,
        }
    }
}

impl EmailConfig {
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }

    pub fn recipient(&self) -> Option<&str> {
        self.to.as_deref().or(self.username.as_deref())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_ids: Vec<i64>,
}

impl Config {
    /// Layered load: `.env`, `config/default`, the optional explicit file,
    /// then `REGISTRY_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("REGISTRY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.apply_email_env(|key| std::env::var(key).ok());
        config.validate()?;

        debug!(
            backend = %config.storage.backend,
            path = %config.storage.path().display(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// `EMAIL_USER` / `EMAIL_PASS` fill in missing credentials. With no
    /// `[email]` section, `EMAIL_USER` alone turns email on with defaults.
    fn apply_email_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let user = var("EMAIL_USER").filter(|v| !v.trim().is_empty());
        let pass = var("EMAIL_PASS");

        match self.email.as_mut() {
            Some(email) => {
                if email.username.is_none() {
                    email.username = user;
                }
                if email.password.is_none() {
                    email.password = pass;
                }
            }
            None if user.is_some() => {
                self.email = Some(EmailConfig {
                    username: user,
                    password: pass,
                    ..EmailConfig::default()
                });
            }
            None => {}
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(email) = self.email.as_ref().filter(|e| e.enabled) {
            if email.smtp_host.trim().is_empty() {
                return Err(RegistryError::Config("email.smtp_host is empty".to_string()));
            }
            if email.sender().is_none() {
                return Err(RegistryError::Config(
                    "email.from (or email.username / EMAIL_USER) is required".to_string(),
                ));
            }
            if email.recipient().is_none() {
                return Err(RegistryError::Config(
                    "email.to (or email.username / EMAIL_USER) is required".to_string(),
                ));
            }
        }

        if let Some(telegram) = self.telegram.as_ref().filter(|t| t.enabled) {
            if telegram.bot_token.trim().is_empty() {
                return Err(RegistryError::Config("telegram.bot_token is empty".to_string()));
            }
            if telegram.chat_ids.is_empty() {
                return Err(RegistryError::Config("telegram.chat_ids is empty".to_string()));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.address, self.server.port)
    }
}
