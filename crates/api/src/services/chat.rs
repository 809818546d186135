//! Help-desk chat assistant.
//!
//! A remote chat-completions model can be configured; the local keyword
//! responder always answers when it is not, or when the remote call fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
#[cfg(test)]
use mockall::automock;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ChatConfig;

/// Reply to a blank message.
pub const EMPTY_MESSAGE_REPLY: &str = "Please type a question and I will do my best to help.";

const SYSTEM_PROMPT: &str = "You are the help desk assistant for a secondary school enrollment \
portal. Answer briefly and only about registration, sign-in codes, the enrollment form, \
subjects, application status and offer letters.";

// ============================================================================
// Backend seam
// ============================================================================

#[derive(Debug, Error)]
pub enum ChatBackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat provider returned status {0}")]
    Status(u16),

    #[error("Chat provider returned an empty reply")]
    EmptyReply,
}

/// A source of free-text replies that may fail.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, ChatBackendError>;
}

// ============================================================================
// Remote backend
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// Chat-completions style HTTP backend.
pub struct RemoteChatBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl RemoteChatBackend {
    pub fn new(config: &ChatConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for RemoteChatBackend {
    async fn complete(&self, message: &str) -> Result<String, ChatBackendError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                CompletionMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                CompletionMessage {
                    role: "user",
                    content: message,
                },
            ],
            max_tokens: 300,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatBackendError::Status(status.as_u16()));
        }

        response
            .json::<CompletionResponse>()
            .await?
            .into_text()
            .ok_or(ChatBackendError::EmptyReply)
    }
}

// ============================================================================
// Keyword responder
// ============================================================================

struct Rule {
    pattern: Regex,
    reply: &'static str,
}

fn rule(phrases: &[&str], reply: &'static str) -> Rule {
    let alternatives: Vec<String> = phrases.iter().map(|p| regex::escape(p)).collect();
    // Literal phrases joined by `|` always form a valid pattern.
    let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).unwrap();
    Rule { pattern, reply }
}

lazy_static! {
    static ref RULES: Vec<Rule> = vec![
        rule(
            &["hello", "hi", "hey", "good morning", "good afternoon"],
            "Hello! Ask me about registering, signing in, the enrollment form or your application status.",
        ),
        rule(
            &["register", "registration", "sign up", "create account", "new account"],
            "Choose Student or Teacher registration, enter your full name, email and a password of at least 6 characters. Your ID (S or T followed by a number) is shown once you register.",
        ),
        rule(
            &["code", "otp", "verification", "verify", "two factor", "2fa"],
            "After your password is accepted we email you a 6-digit code. It is valid for 5 minutes. Ask for a new code by signing in again if it expires.",
        ),
        rule(
            &["password", "forgot", "reset", "login", "log in", "sign in"],
            "Sign in with your ID or email and your password, then enter the code we email you. If you cannot sign in, please contact the school ICT support desk.",
        ),
        rule(
            &["subject", "subjects", "stream", "science", "arts", "language"],
            "Year 9 and 10 students take the core subjects plus one language and one practical subject. Year 11 to 13 students choose Arts or Science and pick three subjects from that stream alongside English and Mathematics.",
        ),
        rule(
            &["apply", "application", "enrol", "enroll", "enrollment", "enrolment", "form"],
            "The application has two steps: your personal and guardian details first, then your year level and subjects. You can have one open application at a time.",
        ),
        rule(
            &["status", "approved", "rejected", "pending", "result", "decision"],
            "Your dashboard shows the status of your latest application. If it was not approved the reason is shown there and you may apply again.",
        ),
        rule(
            &["offer letter", "letter", "download", "admission"],
            "Once your application is approved the school uploads your offer letter. You can download it from your dashboard.",
        ),
        rule(
            &["photo", "picture", "upload", "image"],
            "Photos can be JPG, JPEG or PNG files up to 2 MB. Offer letters are PDF, Word or image files.",
        ),
        rule(
            &["thanks", "thank you", "bye", "goodbye"],
            "You're welcome! Good luck with your enrollment.",
        ),
    ];
}

/// Fallback reply listing what the responder knows about.
pub const DEFAULT_REPLY: &str = "I can help with registration, sign-in codes, the enrollment form, \
subjects and streams, application status, offer letters and photo uploads. What would you like to know?";

/// Deterministic responder: the first rule with a matching phrase wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordResponder;

impl KeywordResponder {
    pub fn reply(&self, message: &str) -> &'static str {
        RULES
            .iter()
            .find(|rule| rule.pattern.is_match(message))
            .map(|rule| rule.reply)
            .unwrap_or(DEFAULT_REPLY)
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct ChatService {
    remote: Option<Arc<dyn ChatBackend>>,
    local: KeywordResponder,
    max_message_chars: usize,
}

impl ChatService {
    /// Builds the service from configuration. A remote backend that cannot be
    /// constructed is logged and skipped.
    pub fn new(config: &ChatConfig) -> Self {
        let remote: Option<Arc<dyn ChatBackend>> = if config.remote_enabled {
            if config.api_key.is_empty() {
                warn!("Remote chat is enabled but no API key is configured - using keyword responder");
                None
            } else {
                match RemoteChatBackend::new(config) {
                    Ok(backend) => Some(Arc::new(backend)),
                    Err(e) => {
                        warn!(error = %e, "Failed to build remote chat client - using keyword responder");
                        None
                    }
                }
            }
        } else {
            None
        };

        Self {
            remote,
            local: KeywordResponder,
            max_message_chars: config.max_message_chars,
        }
    }

    pub fn with_backend(backend: Option<Arc<dyn ChatBackend>>, max_message_chars: usize) -> Self {
        Self {
            remote: backend,
            local: KeywordResponder,
            max_message_chars,
        }
    }

    /// Always returns a non-empty reply.
    pub async fn reply(&self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return EMPTY_MESSAGE_REPLY.to_string();
        }

        let message = truncate_chars(message, self.max_message_chars);

        if let Some(remote) = &self.remote {
            match remote.complete(message).await {
                Ok(reply) if !reply.trim().is_empty() => return reply,
                Ok(_) => debug!("Remote chat returned a blank reply - falling back"),
                Err(e) => warn!(error = %e, "Remote chat failed - falling back to keyword responder"),
            }
        }

        self.local.reply(message).to_string()
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
