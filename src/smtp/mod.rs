use anyhow::Result;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Outbound mail transport seam. The dispatch loop and the auth flows only
/// ever talk to this trait, so tests can swap in a recording mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message fanned out to all recipients in a single transport
    /// call. Returns a transport-defined success descriptor.
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<String>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            // Trim whitespace that may sneak in from copied app passwords
            let clean_pass: String = pass.chars().filter(|c| !c.is_whitespace()).collect();
            builder = builder.credentials(Credentials::new(user.trim().to_string(), clean_pass));
        }

        Ok(SmtpMailer {
            transport: builder.build(),
            from: config.smtp_from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<String> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for addr in recipients {
            builder = builder.to(addr.parse()?);
        }
        let email = builder.body(body.to_string())?;

        let response = self.transport.send(email).await?;
        let detail: Vec<&str> = response.message().collect();
        Ok(format!("{} {}", response.code(), detail.join(" ")))
    }
}
