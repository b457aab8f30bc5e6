use async_trait::async_trait;
use devcamper_config::EmailConfig;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email delivery is disabled")]
    Disabled,
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Transport(String),
}

/// A single outbound message.
#[derive(Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

// Bodies can carry reset links.
impl std::fmt::Debug for OutgoingEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingEmail")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Builds the mailer selected by `SMTP_ENABLED`.
pub fn mailer_from_config(config: &EmailConfig) -> Box<dyn Mailer> {
    if config.enabled {
        Box::new(SmtpMailer::new(config.clone()))
    } else {
        warn!("SMTP is disabled; password reset mail cannot be delivered");
        Box::new(DisabledMailer)
    }
}

pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, MailError> {
        if self.config.smtp_username.is_empty() {
            return Ok(SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        Ok(SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| MailError::Transport(format!("failed to create SMTP relay: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }

    fn html_body(text: &str) -> String {
        let paragraphs: String = text
            .split("\n\n")
            .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
            .collect();
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>DevCamper</title></head>
<body style="font-family: Arial, sans-serif; color: #333;">
<h2>DevCamper</h2>
{paragraphs}
<p style="color: #888; font-size: 12px;">DevCamper - Helping You Build A Brighter Future</p>
</body>
</html>"#
        )
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, email), fields(email.to = %email.to, email.subject = %email.subject))]
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let html = Self::html_body(&email.text);

        let message = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| MailError::Build(format!("invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| MailError::Build(format!("invalid recipient: {e}")))?)
            .subject(email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.transport()?;

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Transport(format!("task join error: {e}")))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        warn!(email.to = %email.to, "Dropping email: SMTP is disabled");
        Err(MailError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_body() {
        let email = OutgoingEmail {
            to: "a@b.io".to_string(),
            subject: "Password reset token".to_string(),
            text: "secret-link".to_string(),
        };
        let debug = format!("{email:?}");
        assert!(debug.contains("a@b.io"));
        assert!(!debug.contains("secret-link"));
    }

    #[test]
    fn test_html_body_wraps_paragraphs() {
        let html = SmtpMailer::html_body("Hello\n\nLine one\nLine two");
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains("<p>Line one<br>Line two</p>"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_fails() {
        let result = DisabledMailer
            .send(OutgoingEmail {
                to: "a@b.io".to_string(),
                subject: "s".to_string(),
                text: "t".to_string(),
            })
            .await;
        assert!(matches!(result, Err(MailError::Disabled)));
    }
}
