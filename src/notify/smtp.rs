//! SMTP notifier via lettre.
//!
//! Port 465 uses implicit TLS, any other port STARTTLS. Credentials are
//! always sent; there is no plaintext mode.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::{NotifyReport, Notifier, render_body, render_subject};
use crate::error::NotifyError;
use crate::leads::Lead;

/// Default implicit-TLS submission port.
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Default per-operation SMTP timeout.
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

// ── Configuration ───────────────────────────────────────────────────

/// SMTP relay configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Applied to each connect/read/write on the SMTP connection.
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Build config from a key lookup (normally the process environment).
    /// Returns `None` if the relay is not (or not fully) configured.
    ///
    /// `SMTP_HOST`, `SMTP_USER` and `SMTP_PASS` must be non-empty, and
    /// `SMTP_USER` must be a usable From address. An unparsable `SMTP_PORT`
    /// or `SMTP_TIMEOUT_SECS` counts as not configured rather than silently
    /// falling back to the default.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let host = non_empty("SMTP_HOST")?;
        let username = non_empty("SMTP_USER")?;
        if let Err(e) = username.parse::<Mailbox>() {
            warn!(error = %e, "SMTP_USER is not a valid sender address, email notifications disabled");
            return None;
        }
        let password = lookup("SMTP_PASS").filter(|s| !s.is_empty())?;

        let port = match non_empty("SMTP_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(p) if p != 0 => p,
                _ => {
                    warn!(value = %raw, "SMTP_PORT is not a valid port, email notifications disabled");
                    return None;
                }
            },
            None => DEFAULT_SMTP_PORT,
        };

        let timeout = match non_empty("SMTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "SMTP_TIMEOUT_SECS is not a positive integer, email notifications disabled");
                    return None;
                }
            },
            None => DEFAULT_SMTP_TIMEOUT,
        };

        Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            timeout,
        })
    }

    /// Upper bound for one complete send (connect, TLS, auth, data).
    pub fn send_deadline(&self) -> Duration {
        self.timeout * 3
    }
}

/// Install the ring crypto provider for rustls.
///
/// Idempotent; a provider installed earlier in the process wins.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

// ── Notifier ────────────────────────────────────────────────────────

/// Relays leads to a fixed recipient over authenticated, encrypted SMTP.
pub struct SmtpNotifier {
    config: SmtpConfig,
    recipient: String,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig, recipient: impl Into<String>) -> Self {
        install_crypto_provider();
        Self {
            config,
            recipient: recipient.into(),
        }
    }

    fn build_message(&self, lead: &Lead) -> Result<Message, NotifyError> {
        let from: Mailbox = self
            .config
            .username
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address {
                role: "from",
                reason: e.to_string(),
            })?;
        let to: Mailbox = self
            .recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address {
                role: "recipient",
                reason: e.to_string(),
            })?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(render_subject(lead))
            .header(ContentType::TEXT_PLAIN);

        // The lead's address passed our shape check, but lettre is stricter.
        match lead.email.parse::<Mailbox>() {
            Ok(reply_to) => builder = builder.reply_to(reply_to),
            Err(e) => warn!(error = %e, "Lead email not usable as Reply-To"),
        }

        builder
            .body(render_body(lead))
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn build_transport(config: &SmtpConfig) -> Result<SmtpTransport, NotifyError> {
        let relay = if config.port == DEFAULT_SMTP_PORT {
            SmtpTransport::relay(&config.host)
        } else {
            SmtpTransport::starttls_relay(&config.host)
        };
        let builder =
            relay.map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?;

        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        Ok(builder
            .port(config.port)
            .credentials(creds)
            .timeout(Some(config.timeout))
            .build())
    }

    async fn try_send(&self, lead: &Lead) -> Result<String, NotifyError> {
        let message = self.build_message(lead)?;
        let transport = Self::build_transport(&self.config)?;

        let deadline = self.config.send_deadline();
        let task = tokio::task::spawn_blocking(move || transport.send(&message));

        match tokio::time::timeout(deadline, task).await {
            Err(_) => Err(NotifyError::Timeout(deadline)),
            Ok(Err(join)) => Err(NotifyError::Task(join.to_string())),
            Ok(Ok(Err(e))) => Err(NotifyError::Transport(e.to_string())),
            Ok(Ok(Ok(response))) => Ok(format!(
                "sent to {} ({})",
                self.recipient,
                response.code()
            )),
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, lead: &Lead) -> NotifyReport {
        match self.try_send(lead).await {
            Ok(info) => {
                info!(recipient = %self.recipient, "Lead notification sent");
                NotifyReport::delivered(info)
            }
            Err(e) => {
                warn!(error = %e, "Lead notification failed");
                NotifyReport::skipped(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::leads::{Budget, Topic};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const FULL: [(&str, &str); 3] = [
        ("SMTP_HOST", "smtp.example.com"),
        ("SMTP_USER", "bot@example.com"),
        ("SMTP_PASS", "hunter2"),
    ];

    fn lead() -> Lead {
        Lead {
            timestamp: Utc::now(),
            session_id: None,
            name: "A".into(),
            email: "a@b.com".into(),
            company: String::new(),
            topic: Topic::Other,
            budget: Budget::NotSure,
            message: "hi".into(),
        }
    }

    #[test]
    fn config_requires_host_user_and_password() {
        assert!(SmtpConfig::from_lookup(lookup_from(&FULL)).is_some());
        for missing in ["SMTP_HOST", "SMTP_USER", "SMTP_PASS"] {
            let pairs: Vec<(&str, &str)> = FULL
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            assert!(
                SmtpConfig::from_lookup(lookup_from(&pairs)).is_none(),
                "{missing} absent should disable SMTP"
            );
        }
    }

    #[test]
    fn config_defaults_port_and_timeout() {
        let config = SmtpConfig::from_lookup(lookup_from(&FULL)).unwrap();
        assert_eq!(config.port, 465);
        assert_eq!(config.timeout, DEFAULT_SMTP_TIMEOUT);
        assert_eq!(config.send_deadline(), Duration::from_secs(30));
    }

    #[test]
    fn malformed_port_means_not_configured() {
        let mut pairs = FULL.to_vec();
        pairs.push(("SMTP_PORT", "smtps"));
        assert!(SmtpConfig::from_lookup(lookup_from(&pairs)).is_none());

        let mut pairs = FULL.to_vec();
        pairs.push(("SMTP_PORT", "587"));
        assert_eq!(SmtpConfig::from_lookup(lookup_from(&pairs)).unwrap().port, 587);
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let config = SmtpConfig::from_lookup(lookup_from(&FULL)).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn unusable_sender_means_not_configured() {
        let mut pairs = FULL.to_vec();
        pairs.retain(|(k, _)| *k != "SMTP_USER");
        pairs.push(("SMTP_USER", "bot"));
        assert!(SmtpConfig::from_lookup(lookup_from(&pairs)).is_none());
    }

    #[tokio::test]
    async fn bad_recipient_is_a_diagnostic_not_a_panic() {
        let config = SmtpConfig::from_lookup(lookup_from(&FULL)).unwrap();
        let notifier = SmtpNotifier::new(config, "not an address");
        let report = notifier.send(&lead()).await;
        assert!(!report.delivered);
        assert!(report.info.contains("recipient"), "info: {}", report.info);
    }

    #[tokio::test]
    async fn unreachable_relay_fails_within_deadline() {
        // Grab a free port and release it so the connect is refused.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = SmtpConfig {
            host: "127.0.0.1".into(),
            port,
            username: "bot@example.com".into(),
            password: SecretString::from("pw".to_string()),
            timeout: Duration::from_secs(2),
        };
        let notifier = SmtpNotifier::new(config, "sales@example.com");

        let report = tokio::time::timeout(Duration::from_secs(10), notifier.send(&lead()))
            .await
            .expect("notifier exceeded its deadline");
        assert!(!report.delivered);
        assert_ne!(report.info, "not configured");
    }
}
