use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info, warn};

use crate::config::EmailConfig;
use crate::error::{RegistryError, Result};
use crate::notify::{formatters, ClaimNotice, Notifier};

/// Sends the host an email for every batch with accepted claims
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
    verify_on_startup: bool,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from = config
            .sender()
            .ok_or_else(|| RegistryError::Config("email sender missing".to_string()))?
            .parse::<Mailbox>()?;
        let to = config
            .recipient()
            .ok_or_else(|| RegistryError::Config("email recipient missing".to_string()))?
            .parse::<Mailbox>()?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        };
        let mut builder = builder.port(config.smtp_port);

        match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
            }
            _ => warn!("No SMTP credentials configured; sending unauthenticated"),
        }

        info!("Email notifications enabled via {}:{}", config.smtp_host, config.smtp_port);

        Ok(Self {
            transport: builder.build(),
            from,
            to,
            subject: config.subject.clone(),
            verify_on_startup: config.verify_on_startup,
        })
    }
}

/// Build the notification email: plain text with an HTML alternative
pub fn compose(from: Mailbox, to: Mailbox, subject: &str, notice: &ClaimNotice) -> Result<Message> {
    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(MultiPart::alternative_plain_html(
            formatters::plain_text(notice),
            formatters::html(notice),
        ))?;
    Ok(message)
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn verify(&self) -> Result<()> {
        if !self.verify_on_startup {
            debug!("SMTP connection check disabled");
            return Ok(());
        }
        if self.transport.test_connection().await? {
            info!("Email server configured correctly");
            Ok(())
        } else {
            Err(RegistryError::Other(anyhow::anyhow!("SMTP server did not accept the connection")))
        }
    }

    async fn notify(&self, notice: &ClaimNotice) -> Result<()> {
        let message = compose(self.from.clone(), self.to.clone(), &self.subject, notice)?;
        let response = self.transport.send(message).await?;
        info!("Email sent: {}", response.code());
        Ok(())
    }
}
