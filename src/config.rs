//! Configuration types.
//!
//! Everything is read once at startup into an immutable [`AppConfig`] that is
//! handed to the pipeline and router. Parsing goes through a lookup closure so
//! it can be exercised without touching the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::notify::smtp::SmtpConfig;

/// Default location of the lead file, relative to the working directory.
pub const DEFAULT_LEADS_PATH: &str = "leads.csv";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8501";

/// Company details shown on the page and used as the default lead recipient.
#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub legal_form: String,
    pub cvr: String,
    pub linkedin_url: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Dockyard Acoustics Sound Technology".to_string(),
            email: "bisdansk@gmail.com".to_string(),
            address: "Guldblommevej 2, 1, th, 2750 Ballerup, Denmark".to_string(),
            legal_form: "Personligt ejet Mindre Virksomhed (PMV)".to_string(),
            cvr: "45796256".to_string(),
            linkedin_url: "https://www.linkedin.com/in/bisdansk/".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
    /// Append-only lead file.
    pub leads_path: PathBuf,
    /// Expose the read-only admin view and CSV download.
    pub show_leads: bool,
    /// Branding and contact details.
    pub company: CompanyInfo,
    /// Where lead notifications go.
    pub leads_to: String,
    /// SMTP relay settings. `None` when not (or not fully) configured.
    pub smtp: Option<SmtpConfig>,
    /// Directory for a daily-rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let company = CompanyInfo::default();
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8501)),
            leads_path: PathBuf::from(DEFAULT_LEADS_PATH),
            show_leads: false,
            leads_to: company.email.clone(),
            company,
            smtp: None,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// A malformed SMTP section does not fail startup; it only leaves the
    /// notifier unconfigured. A malformed bind address does.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let company = CompanyInfo::default();

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "BIND_ADDR".into(),
                message: e.to_string(),
            })?;

        let leads_path = lookup("LEADS_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEADS_PATH));

        let show_leads = lookup("SHOW_LEADS").is_some_and(|v| parse_flag(&v));

        let leads_to = lookup("LEADS_TO")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| company.email.clone());

        let smtp = SmtpConfig::from_lookup(&lookup);

        let log_dir = lookup("LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            leads_path,
            show_leads,
            company,
            leads_to,
            smtp,
            log_dir,
        })
    }
}

/// Interpret a boolean-ish flag value (`1`, `true`, `yes`, `on`).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
