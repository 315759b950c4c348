use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::config::{EmailConfig, TimeoutsConfig};
use crate::error::{codes, AppError};

pub const ANSWER_EMAIL_SUBJECT: &str = "Sustainability Query Response from SustainaBOT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Outbound delivery of a finished answer. Transport details stay behind this trait.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

pub fn compose_answer_email(recipient: &str, query: &str, answer_text: &str) -> EmailMessage {
    let body = format!(
        "📌 Query: {query}\n\n🧠 Response Summary:\n\n{answer_text}\n\n📬 _This response was generated using SustainaBOT, powered by AI and real-time data._\n\nBest regards,\nSustainaBOT 🤖🌱\n"
    );
    EmailMessage {
        recipient: recipient.trim().to_string(),
        subject: ANSWER_EMAIL_SUBJECT.to_string(),
        body,
    }
}

pub fn parse_mailbox(address: &str) -> Result<Mailbox, AppError> {
    address.trim().parse::<Mailbox>().map_err(|e| {
        AppError::new(codes::EMAIL_INVALID, "Invalid email address")
            .with_details(format!("address={}; err={}", address.trim(), e))
    })
}

/// SMTP delivery over a STARTTLS relay.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    sender: String,
    password: String,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn from_config(cfg: &EmailConfig, timeouts: &TimeoutsConfig) -> Result<Self, AppError> {
        let sender = cfg.sender.clone().ok_or_else(|| {
            AppError::new(codes::EMAIL_FAILED, "Sender address is not configured")
                .with_details("set email.sender or SMTP_EMAIL")
        })?;
        let password = cfg.password.clone().ok_or_else(|| {
            AppError::new(codes::EMAIL_FAILED, "SMTP password is not configured")
                .with_details("set SMTP_PASSWORD")
        })?;
        parse_mailbox(&sender)?;
        Ok(Self {
            host: cfg.smtp_host.clone(),
            port: cfg.smtp_port,
            sender,
            password,
            timeout: timeouts.email(),
        })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, AppError> {
        let from = parse_mailbox(&self.sender)?;
        let to = parse_mailbox(&message.recipient)?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| {
                AppError::new(codes::EMAIL_FAILED, "Failed to build email message")
                    .with_details(e.to_string())
            })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let email = self.build_message(message)?;

        let transport = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| {
                AppError::new(codes::EMAIL_FAILED, "Failed to configure SMTP relay")
                    .with_details(format!("host={}; err={}", self.host, e))
            })?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .timeout(Some(self.timeout))
            .build();

        transport.send(&email).map_err(|e| {
            AppError::new(codes::EMAIL_FAILED, "Failed to send email")
                .with_details(format!("host={}; err={}", self.host, e))
                .with_retryable(true)
        })?;
        tracing::info!(recipient = %message.recipient, "answer email sent");
        Ok(())
    }
}
