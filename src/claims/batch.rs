use serde_json::Value;

use crate::error::{RegistryError, Result};

/// One proposed claim, name already trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedClaim {
    pub item: String,
    pub name: String,
}

/// Validated submission: item -> claimant proposals in submission order.
///
/// Entries with a blank name are dropped here, so every entry that reaches
/// the store is a real claim attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimBatch {
    entries: Vec<ProposedClaim>,
}

impl ClaimBatch {
    /// Validate a raw request body
    pub fn from_json(body: Value) -> Result<Self> {
        let object = match body {
            Value::Object(object) => object,
            other => {
                return Err(RegistryError::InvalidBatch(format!(
                    "expected an object of item -> name, got {}",
                    json_kind(&other)
                )))
            }
        };

        if object.is_empty() {
            return Err(RegistryError::InvalidBatch("No data submitted".to_string()));
        }

        let mut pairs = Vec::with_capacity(object.len());
        for (item, value) in object {
            match value {
                Value::String(name) => pairs.push((item, name)),
                other => {
                    return Err(RegistryError::InvalidBatch(format!(
                        "name for item \"{}\" must be a string, got {}",
                        item,
                        json_kind(&other)
                    )))
                }
            }
        }

        Self::from_pairs(pairs)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut batch = ClaimBatch::default();

        for (item, name) in pairs {
            let item = item.into();
            if item.trim().is_empty() {
                return Err(RegistryError::InvalidBatch("item key must not be empty".to_string()));
            }

            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            batch.entries.push(ProposedClaim {
                item,
                name: name.to_string(),
            });
        }

        Ok(batch)
    }

    pub fn entries(&self) -> &[ProposedClaim] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
