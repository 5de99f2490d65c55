//! Release values domain types
//!
//! The installer release carries a loosely-typed values document. The two
//! lists this crate owns are lifted into named fields; every other key is
//! kept verbatim in `extra` and written back untouched.
//!
//! The default registry lives in `args` as `--registry=<domain>` and keeps its
//! position there until the default actually changes.

use serde_json::{Map, Value};

use crate::error::ReleaseError;

pub const IMAGE_PULL_SECRETS_KEY: &str = "imagePullSecrets";
pub const ARGS_KEY: &str = "args";
/// Flag carrying the default registry domain
pub const REGISTRY_FLAG: &str = "--registry";

/// Typed view of the installer release values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseValues {
    /// Secret names, `None` when the key is absent
    pub image_pull_secrets: Option<Vec<String>>,
    /// Installer CLI arguments in their original order
    pub args: Option<Vec<String>>,
    /// All other values
    pub extra: Map<String, Value>,
}

/// What happened to `imagePullSecrets` on removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed(usize),
    NotReferenced,
}

impl ReleaseValues {
    /// Parse values as returned by the installer. `null` means no values.
    pub fn from_value(value: Value) -> Result<Self, ReleaseError> {
        let mut map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(ReleaseError::InvalidValues {
                    message: format!("expected a mapping, got {}", other),
                })
            }
        };

        Ok(Self {
            image_pull_secrets: take_string_list(&mut map, IMAGE_PULL_SECRETS_KEY)?,
            args: take_string_list(&mut map, ARGS_KEY)?,
            extra: map,
        })
    }

    /// Serialize back into the installer's shape
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        if let Some(secrets) = &self.image_pull_secrets {
            map.insert(IMAGE_PULL_SECRETS_KEY.to_string(), string_list(secrets));
        }
        if let Some(args) = &self.args {
            map.insert(ARGS_KEY.to_string(), string_list(args));
        }
        Value::Object(map)
    }

    /// Domain of the default registry; the last `--registry=` wins
    pub fn default_registry(&self) -> Option<&str> {
        self.args
            .as_deref()
            .unwrap_or_default()
            .iter()
            .rev()
            .find_map(|arg| registry_flag_value(arg))
    }

    /// Whether the `imagePullSecrets` key exists at all
    pub fn has_pull_secrets(&self) -> bool {
        self.image_pull_secrets.is_some()
    }

    pub fn pull_secrets(&self) -> &[String] {
        self.image_pull_secrets.as_deref().unwrap_or_default()
    }

    /// Append a secret name, initializing the list. Returns false if already present.
    pub fn add_pull_secret(&mut self, name: &str) -> bool {
        let secrets = self.image_pull_secrets.get_or_insert_with(Vec::new);
        if secrets.iter().any(|s| s == name) {
            return false;
        }
        secrets.push(name.to_string());
        true
    }

    /// Remove every occurrence of a secret name, keeping the order of the rest
    pub fn remove_pull_secret(&mut self, name: &str) -> Removal {
        let Some(secrets) = self.image_pull_secrets.as_mut() else {
            return Removal::NotReferenced;
        };
        let before = secrets.len();
        secrets.retain(|s| s != name);
        match before - secrets.len() {
            0 => Removal::NotReferenced,
            n => Removal::Removed(n),
        }
    }

    /// Make `domain` the only default registry.
    ///
    /// A lone `--registry=<domain>` already in place is left where it is.
    pub fn set_default_registry(&mut self, domain: impl Into<String>) {
        let flag = format!("{}={}", REGISTRY_FLAG, domain.into());
        let args = self.args.get_or_insert_with(Vec::new);
        let mut mentions = args.iter().filter(|arg| arg.contains(REGISTRY_FLAG));
        if mentions.next() == Some(&flag) && mentions.next().is_none() {
            return;
        }
        self.strip_registry_args();
        if let Some(args) = self.args.as_mut() {
            args.push(flag);
        }
    }

    /// Drop the default registry. Returns true if anything changed.
    pub fn clear_default_registry(&mut self) -> bool {
        self.strip_registry_args()
    }

    /// Remove leftover args mentioning `--registry` in any other form
    fn strip_registry_args(&mut self) -> bool {
        match self.args.as_mut() {
            Some(args) => {
                let before = args.len();
                args.retain(|arg| !arg.contains(REGISTRY_FLAG));
                before != args.len()
            }
            None => false,
        }
    }
}

fn registry_flag_value(arg: &str) -> Option<&str> {
    arg.strip_prefix(REGISTRY_FLAG)
        .and_then(|rest| rest.strip_prefix('='))
}

fn take_string_list(
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, ReleaseError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(ReleaseError::InvalidValues {
                    message: format!("{} entries must be strings, got {}", key, other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(ReleaseError::InvalidValues {
            message: format!("{} must be a list, got {}", key, other),
        }),
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
