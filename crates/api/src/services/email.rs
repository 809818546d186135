//! Email delivery for login codes.
//!
//! Supported providers:
//! - `console`: logs the message (development)
//! - `sendgrid`: SendGrid v3 mail API
//!
//! Delivery is treated as unreliable. Callers log failures and carry on.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[cfg(test)]
use mockall::automock;

use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email service disabled")]
    Disabled,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Outbound mail delivery.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Builds the message carrying a one-time login code.
pub fn login_code_message(
    school_name: &str,
    to: &str,
    to_name: &str,
    code: &str,
    valid_minutes: i64,
) -> EmailMessage {
    let subject = format!("Your {} login code", school_name);

    let body_text = format!(
        r#"Hi {name},

Your login verification code is: {code}

The code expires in {minutes} minutes. If you did not try to log in, you can ignore this email.

{school}"#,
        name = to_name,
        code = code,
        minutes = valid_minutes,
        school = school_name,
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, Helvetica, sans-serif; color: #333; max-width: 560px; margin: 0 auto; padding: 20px;">
    <h2 style="margin-top: 0;">{school}</h2>
    <p>Hi {name},</p>
    <p>Your login verification code is:</p>
    <p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{code}</p>
    <p>The code expires in {minutes} minutes. If you did not try to log in, you can ignore this email.</p>
</body>
</html>"#,
        name = to_name,
        code = code,
        minutes = valid_minutes,
        school = school_name,
    );

    EmailMessage {
        to: to.to_string(),
        to_name: Some(to_name.to_string()),
        subject,
        body_text,
        body_html: Some(body_html),
    }
}

/// Configured email provider.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs the email (for development).
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body (plain text)");
        if let Some(html) = &message.body_html {
            debug!(body_html_length = html.len(), "Email body (HTML)");
        }
        Ok(())
    }

    /// SendGrid provider.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = sendgrid_body(&self.config, &message);

        let response = self
            .client
            .post(&self.config.sendgrid_endpoint)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(to = %message.to, subject = %message.subject, "Email service disabled");
            return Err(EmailError::Disabled);
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }
}

fn sendgrid_body(config: &EmailConfig, message: &EmailMessage) -> serde_json::Value {
    let mut to = json!({ "email": message.to });
    if let Some(name) = &message.to_name {
        to["name"] = json!(name);
    }

    let mut content = vec![json!({ "type": "text/plain", "value": message.body_text })];
    if let Some(html) = &message.body_html {
        content.push(json!({ "type": "text/html", "value": html }));
    }

    json!({
        "personalizations": [{ "to": [to] }],
        "from": {
            "email": config.sender_email,
            "name": config.sender_name
        },
        "subject": message.subject,
        "content": content
    })
}
