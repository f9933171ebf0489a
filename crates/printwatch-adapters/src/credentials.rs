//! Secret lookup by reference key.
//!
//! Config files only ever name a credential key; the secret itself is
//! resolved through a [`CredentialStore`] on every request.

use std::collections::HashMap;

/// Environment variable prefix read by [`EnvCredentials`].
pub const SECRET_ENV_PREFIX: &str = "PRINTWATCH_SECRET_";

pub trait CredentialStore: Send + Sync {
    /// Secret for `key`, or `None` when nothing is stored.
    fn secret(&self, key: &str) -> Option<String>;
}

/// Environment variable consulted for `key`.
///
/// The key is uppercased and every non-alphanumeric character becomes `_`,
/// so `printer.local:alice` reads `PRINTWATCH_SECRET_PRINTER_LOCAL_ALICE`.
pub fn env_var_name(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{SECRET_ENV_PREFIX}{sanitized}")
}

/// Reads secrets from `PRINTWATCH_SECRET_<KEY>` environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn secret(&self, key: &str) -> Option<String> {
        std::env::var(env_var_name(key))
            .ok()
            .filter(|s| !s.is_empty())
    }
}

/// In-memory store, mostly for tests and one-shot commands.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), secret.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn secret(&self, key: &str) -> Option<String> {
        self.secrets.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_names_are_sanitized() {
        assert_eq!(env_var_name("octo"), "PRINTWATCH_SECRET_OCTO");
        assert_eq!(
            env_var_name("printer.local:alice"),
            "PRINTWATCH_SECRET_PRINTER_LOCAL_ALICE"
        );
        assert_eq!(env_var_name("a-b c"), "PRINTWATCH_SECRET_A_B_C");
    }

    #[test]
    fn env_store_misses_unset_keys() {
        let store = EnvCredentials;
        assert_eq!(store.secret("definitely-not-set-7f3a9c"), None);
    }

    #[test]
    fn static_store_lookup() {
        let store = StaticCredentials::new().with_secret("octo", "s3cret");
        assert_eq!(store.secret("octo").as_deref(), Some("s3cret"));
        assert_eq!(store.secret("other"), None);
    }
}
