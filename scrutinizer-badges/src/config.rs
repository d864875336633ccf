//! Service configuration for the upstream report fetcher.
//!
//! Configuration is read from an optional YAML document. Every field has a
//! default so an empty document (or no document at all) yields a working
//! configuration pointed at the public Scrutinizer API.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    retry::RetryConfig,
};

/// Base URL of the public repository API.
pub const DEFAULT_BASE_URL: &str = "https://scrutinizer-ci.com/api/repositories";
const DEFAULT_USER_AGENT: &str = concat!("scrutinizer-badges/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings shared by every badge request of a process.
///
/// # Examples
///
/// ```
/// use scrutinizer_badges::parse_config;
///
/// let config = parse_config("base_url: http://localhost:8080/api\n",)?;
/// assert_eq!(config.base_url, "http://localhost:8080/api");
/// assert_eq!(config.retry.max_attempts, 3);
/// # Ok::<(), scrutinizer_badges::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig
{
    /// Repository API root; reports are fetched from `{base_url}/{vcs}/{slug}`.
    pub base_url:     String,
    /// `User-Agent` header sent with every request.
    pub user_agent:   String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Backoff applied to transient upstream failures.
    pub retry:        RetryConfig,
}

impl Default for ServiceConfig
{
    fn default() -> Self
    {
        Self {
            base_url:     DEFAULT_BASE_URL.to_owned(),
            user_agent:   DEFAULT_USER_AGENT.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry:        RetryConfig::default(),
        }
    }
}

impl ServiceConfig
{
    /// Replaces the base URL when an override is supplied.
    pub fn with_base_url(mut self, base_url: Option<String,>,) -> Self
    {
        if let Some(url,) = base_url {
            self.base_url = url;
        }
        self
    }

    /// Checks the invariants the fetch layer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the base URL is not an absolute
    /// `http(s)` URL, the timeout is zero, or the retry settings would never
    /// attempt a request or shrink the delay between attempts.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::validation("base_url must not be empty",),);
        }
        if !(base_url.starts_with("http://",) || base_url.starts_with("https://",)) {
            return Err(Error::validation(format!(
                "base_url must start with http:// or https://, got '{base_url}'"
            ),),);
        }
        if self.timeout_secs == 0 {
            return Err(Error::validation("timeout_secs must be greater than zero",),);
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::validation("retry.max_attempts must be at least 1",),);
        }
        if !(self.retry.backoff_factor >= 1.0) {
            return Err(Error::validation("retry.backoff_factor must be at least 1.0",),);
        }

        Ok((),)
    }
}

/// Parses and validates a YAML configuration document.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed YAML and [`Error::Validation`] when
/// the decoded values violate [`ServiceConfig::validate`].
pub fn parse_config(source: &str,) -> Result<ServiceConfig, Error,>
{
    let config = if source.trim().is_empty() {
        ServiceConfig::default()
    } else {
        serde_yaml::from_str(source,)?
    };
    config.validate()?;
    Ok(config,)
}

/// Loads configuration from `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, otherwise the errors
/// of [`parse_config`].
pub fn load_config(path: &Path,) -> Result<ServiceConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn empty_document_yields_defaults()
    {
        let config = parse_config("",).expect("defaults are valid",);
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.user_agent.starts_with("scrutinizer-badges/"));
    }

    #[test]
    fn nested_retry_overrides_are_applied()
    {
        let yaml = r"
timeout_secs: 3
retry:
  max_attempts: 1
  backoff_factor: 1.5
";
        let config = parse_config(yaml,).expect("valid configuration",);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.backoff_factor, 1.5);
        assert_eq!(config.retry.initial_delay_ms, 250);
    }

    #[test]
    fn unknown_fields_are_rejected()
    {
        let error = parse_config("base_uri: http://example.com\n",).expect_err("typo in key",);
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn validate_rejects_non_http_base_url()
    {
        let error = parse_config("base_url: ftp://example.com\n",).expect_err("bad scheme",);
        match error {
            Error::Validation {
                message,
            } => assert!(message.contains("http://")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_zero_attempts_and_timeout()
    {
        assert!(parse_config("timeout_secs: 0\n").is_err());
        assert!(parse_config("retry:\n  max_attempts: 0\n").is_err());
        assert!(parse_config("retry:\n  backoff_factor: 0.5\n").is_err());
    }

    #[test]
    fn base_url_override_replaces_configured_value()
    {
        let config = ServiceConfig::default().with_base_url(Some("http://127.0.0.1:9000".to_owned(),),);
        assert_eq!(config.base_url, "http://127.0.0.1:9000");

        let unchanged = ServiceConfig::default().with_base_url(None,);
        assert_eq!(unchanged.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn load_config_reads_file()
    {
        let directory = tempdir().expect("failed to create temp dir",);
        let path = directory.path().join("badges.yaml",);
        fs::write(&path, "user_agent: test-agent\n",).expect("failed to write config",);

        let config = load_config(&path,).expect("config should load",);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn load_config_reports_missing_file()
    {
        let directory = tempdir().expect("failed to create temp dir",);
        let path = directory.path().join("missing.yaml",);

        match load_config(&path,).expect_err("missing file",) {
            Error::Io {
                path: stored, ..
            } => assert_eq!(stored, path),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
