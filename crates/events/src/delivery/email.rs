//! Plain-text email over SMTP.
//!
//! [`EmailSender`] is the seam the [`BookingMailer`](crate::BookingMailer)
//! sends through; [`EmailDelivery`] implements it with `lettre`'s pooled
//! async transport.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "Cinema Tickets <noreply@cinema.local>";

/// SMTP settings. Mail is only sent when `SMTP_HOST` is configured.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender mailbox, display name allowed.
    pub from_address: String,
    /// Username and password, when the relay requires auth.
    pub credentials: Option<(String, String)>,
}

impl EmailConfig {
    /// | Variable        | Default                                 |
    /// |-----------------|-----------------------------------------|
    /// | `SMTP_HOST`     | unset disables email                    |
    /// | `SMTP_PORT`     | `587`                                   |
    /// | `SMTP_FROM`     | `Cinema Tickets <noreply@cinema.local>` |
    /// | `SMTP_USER`     |                                         |
    /// | `SMTP_PASSWORD` |                                         |
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Some(Self {
            smtp_host: var("SMTP_HOST")?,
            smtp_port: var("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            credentials: var("SMTP_USER").zip(var("SMTP_PASSWORD")),
        })
    }
}

/// A rendered email waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn to_message(&self, from: &Mailbox) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(from.clone())
            .to(self.to.parse()?)
            .subject(&self.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;
        Ok(message)
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// [`EmailSender`] backed by a STARTTLS SMTP relay.
pub struct EmailDelivery {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Validates the sender address and builds the transport. Connections are
    /// opened lazily on the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let from: Mailbox = config.from_address.parse()?;

        let mut transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);
        if let Some((user, password)) = config.credentials {
            transport = transport.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            from,
            transport: transport.build(),
        })
    }
}

#[async_trait]
impl EmailSender for EmailDelivery {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.transport.send(email.to_message(&self.from)?).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}
