//! Builds the adapter named by an [`AppConfig`].
//!
//! Validation happens here, once, so a bad configuration fails before any
//! polling starts. Construction performs no I/O.

use std::sync::Arc;

use printwatch_core::{AppConfig, AuthMode, Backend, ConfigError};
use reqwest::Url;

use crate::adapter::PrinterAdapter;
use crate::credentials::CredentialStore;
use crate::demo::DemoAdapter;
use crate::http::{AuthScheme, HttpJsonClient};
use crate::octoprint::OctoPrintAdapter;
use crate::prusaconnect::{PrusaConnectAdapter, resolve_status_path};
use crate::prusalink::PrusaLinkAdapter;

pub fn create_adapter(
    config: &AppConfig,
    credentials: Arc<dyn CredentialStore>,
) -> Result<Arc<dyn PrinterAdapter>, ConfigError> {
    let backend = config.backend_kind()?;

    let adapter: Arc<dyn PrinterAdapter> = match backend {
        Backend::Demo => Arc::new(DemoAdapter::new()),
        Backend::PrusaLink => {
            let base_url = require_base_url(config, backend)?;
            let auth = auth_scheme(config, backend)?;
            Arc::new(PrusaLinkAdapter::new(HttpJsonClient::new(
                &base_url,
                auth,
                credentials,
            )?))
        }
        Backend::OctoPrint => {
            let base_url = require_base_url(config, backend)?;
            let auth = auth_scheme(config, backend)?;
            Arc::new(OctoPrintAdapter::new(HttpJsonClient::new(
                &base_url,
                auth,
                credentials,
            )?))
        }
        Backend::PrusaConnect => {
            let base_url = require_base_url(config, backend)?;
            let printer_id = require(config.printer_id.as_deref(), backend, "printer_id")?;
            let token_key = require(config.credential_key.as_deref(), backend, "credential_key")?;
            let auth = AuthScheme::Bearer {
                credential_key: token_key.to_string(),
            };
            let path = resolve_status_path(config.status_path.as_deref(), printer_id);
            Arc::new(PrusaConnectAdapter::new(
                HttpJsonClient::new(&base_url, auth, credentials)?,
                path,
            ))
        }
    };

    tracing::debug!(backend = adapter.name(), "adapter created");
    Ok(adapter)
}

/// Non-blank value or [`ConfigError::MissingField`].
fn require<'a>(
    value: Option<&'a str>,
    backend: Backend,
    field: &'static str,
) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField {
            backend: backend.as_str(),
            field,
        })
}

/// Validated `http`/`https` base URL, trailing slash removed.
fn require_base_url(config: &AppConfig, backend: Backend) -> Result<String, ConfigError> {
    let raw = require(config.base_url.as_deref(), backend, "base_url")?;
    validate_base_url(raw)
}

pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn auth_scheme(config: &AppConfig, backend: Backend) -> Result<AuthScheme, ConfigError> {
    match config.auth_mode {
        AuthMode::None => Ok(AuthScheme::None),
        AuthMode::ApiKey => {
            let key = require(config.credential_key.as_deref(), backend, "credential_key")?;
            Ok(AuthScheme::ApiKey {
                credential_key: key.to_string(),
            })
        }
        AuthMode::Digest => {
            let username = require(config.username.as_deref(), backend, "username")?;
            let key = require(config.credential_key.as_deref(), backend, "credential_key")?;
            Ok(AuthScheme::Basic {
                username: username.to_string(),
                credential_key: key.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    fn store() -> Arc<dyn CredentialStore> {
        Arc::new(StaticCredentials::new())
    }

    fn config(backend: &str) -> AppConfig {
        AppConfig {
            backend: backend.to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn default_config_builds_demo() {
        let adapter = create_adapter(&AppConfig::default(), store()).expect("demo");
        assert_eq!(adapter.name(), "demo");
    }

    #[test]
    fn backend_names_are_case_insensitive() {
        let mut cfg = config("OctoPrint");
        cfg.base_url = Some("http://octopi.local".into());
        let adapter = create_adapter(&cfg, store()).expect("octoprint");
        assert_eq!(adapter.name(), "octoprint");
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = create_adapter(&config("klipper"), store())
            .err()
            .expect("must fail");
        assert!(matches!(err, ConfigError::UnknownBackend(ref b) if b == "klipper"));
    }

    #[test]
    fn network_backends_need_base_url() {
        for name in ["prusalink", "octoprint", "prusaconnect"] {
            let err = create_adapter(&config(name), store())
                .err()
                .expect("must fail");
            assert!(
                matches!(err, ConfigError::MissingField { field: "base_url", .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn bad_urls_rejected() {
        for url in ["printer.local", "ftp://printer.local", "http://", "not a url"] {
            let mut cfg = config("prusalink");
            cfg.base_url = Some(url.into());
            let err = create_adapter(&cfg, store()).err().expect("must fail");
            assert!(matches!(err, ConfigError::InvalidUrl(_)), "{url}: {err}");
        }
    }

    #[test]
    fn prusaconnect_needs_printer_id_and_token() {
        let mut cfg = config("prusaconnect");
        cfg.base_url = Some("https://connect.prusa3d.com".into());
        let err = create_adapter(&cfg, store()).err().expect("must fail");
        assert!(matches!(err, ConfigError::MissingField { field: "printer_id", .. }));

        cfg.printer_id = Some("c0ffee".into());
        let err = create_adapter(&cfg, store()).err().expect("must fail");
        assert!(matches!(err, ConfigError::MissingField { field: "credential_key", .. }));

        cfg.credential_key = Some("connect-token".into());
        let adapter = create_adapter(&cfg, store()).expect("prusaconnect");
        assert_eq!(adapter.name(), "prusaconnect");
    }

    #[test]
    fn auth_modes_need_their_fields() {
        let mut cfg = config("prusalink");
        cfg.base_url = Some("http://192.168.1.50".into());
        cfg.auth_mode = AuthMode::ApiKey;
        let err = create_adapter(&cfg, store()).err().expect("must fail");
        assert!(matches!(err, ConfigError::MissingField { field: "credential_key", .. }));

        cfg.auth_mode = AuthMode::Digest;
        cfg.credential_key = Some("link".into());
        let err = create_adapter(&cfg, store()).err().expect("must fail");
        assert!(matches!(err, ConfigError::MissingField { field: "username", .. }));

        cfg.username = Some("maker".into());
        assert!(create_adapter(&cfg, store()).is_ok());
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let mut cfg = config("octoprint");
        cfg.base_url = Some("   ".into());
        let err = create_adapter(&cfg, store()).err().expect("must fail");
        assert!(matches!(err, ConfigError::MissingField { field: "base_url", .. }));
    }

    #[test]
    fn trailing_slash_dropped() {
        assert_eq!(
            validate_base_url("http://printer.local/").expect("valid"),
            "http://printer.local"
        );
    }
}
