//! # mc-mail-smtp
//!
//! SMTP implementation of `MailTransport` on top of lettre's async transport.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mc_core::models::OutgoingMail;
use mc_core::traits::MailTransport;

/// Connection parameters for the relay.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    /// Plain connection when false (local relays, mail catchers)
    pub starttls: bool,
}

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(settings: SmtpSettings) -> anyhow::Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address '{}'", settings.from))?;

        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        builder = builder.port(settings.port);

        if let Some(username) = settings.username.filter(|u| !u.is_empty()) {
            let password = settings.password.unwrap_or_default();
            builder = builder.credentials(Credentials::new(username, password));
        }

        log::info!("SMTP transport configured for {}:{}", settings.host, settings.port);
        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

/// Builds the RFC 5322 message for one outgoing mail.
pub fn build_message(from: &Mailbox, mail: &OutgoingMail) -> anyhow::Result<Message> {
    let to: Mailbox = mail
        .to
        .parse()
        .with_context(|| format!("invalid recipient address '{}'", mail.to))?;
    let content_type = ContentType::parse(&mail.content_type).unwrap_or(ContentType::TEXT_PLAIN);

    let message = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(mail.subject.as_str())
        .header(content_type)
        .body(mail.body.clone())?;
    Ok(message)
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let message = build_message(&self.from, mail)?;
        self.mailer.send(message).await.context("SMTP delivery failed")?;
        Ok(())
    }
}
