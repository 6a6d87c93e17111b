use std::fs;
use std::path::Path;
use std::time::Duration;

use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Attachment as AttachmentPart, Body, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Account, SmtpServer};
use crate::progress::{SendProgress, SendStatus};

/// How long to wait on the initial TCP connect before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Failed to read attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A file to attach, referenced by path and read once at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filepath: String,
}

impl Attachment {
    pub fn new(filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Final path component, used as the MIME attachment filename.
    pub fn filename(&self) -> String {
        Path::new(&self.filepath)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filepath.clone())
    }

    fn to_part(&self) -> Result<SinglePart, EmailError> {
        let content = fs::read(&self.filepath)?;
        // Force base64 rather than letting lettre pick a cheaper encoding.
        let body = Body::new_with_encoding(content, ContentTransferEncoding::Base64)
            .unwrap_or_else(|content| Body::new(content));
        let content_type: ContentType = "application/octet-stream".parse().unwrap();

        Ok(AttachmentPart::new(self.filename()).body(body, content_type))
    }
}

/// One outgoing message together with everything needed to deliver it:
/// credentials, server, envelope addresses, subject, plain-text body and
/// any attachments. Constructed fully formed by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub username: String,
    pub password: String,
    pub server: SmtpServer,
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Build a message from a stored account profile.
    pub fn from_account(
        account: &Account,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            username: account.username.clone(),
            password: account.password.clone(),
            server: account.server.clone(),
            sender: account.email.clone(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    /// Deliver this message, reporting each phase through `callback`.
    ///
    /// The callback fires synchronously on the calling thread, once per
    /// phase, in the order `Building`, `Connecting`, `Sending`, `Closing`,
    /// `Done`. A failure propagates immediately; the last status the
    /// callback saw names the phase that raised it. Exactly one connection
    /// is opened and closed per call, with no retry.
    pub fn send<F>(&self, mut callback: F) -> Result<(), EmailError>
    where
        F: FnMut(SendStatus),
    {
        callback(SendStatus::Building);
        let message = self.to_mime()?;

        callback(SendStatus::Connecting);
        log::debug!("connecting to {}:{}", self.server.address, self.server.port);
        let hello = ClientId::default();
        let mut connection = SmtpConnection::connect(
            (self.server.address.as_str(), self.server.port),
            Some(CONNECT_TIMEOUT),
            &hello,
            None,
            None,
        )?;
        if self.server.tls {
            let tls = TlsParameters::new(self.server.address.clone())?;
            connection.starttls(&tls, &hello)?;
        }
        connection.auth(
            &[Mechanism::Plain, Mechanism::Login],
            &Credentials::new(self.username.clone(), self.password.clone()),
        )?;

        callback(SendStatus::Sending);
        connection.send(message.envelope(), &message.formatted())?;

        callback(SendStatus::Closing);
        connection.quit()?;

        callback(SendStatus::Done);
        log::info!("sent \"{}\" to {}", self.subject, self.recipient);
        Ok(())
    }

    /// Send `emails` strictly in order, one at a time.
    ///
    /// Every status a message reports is rebroadcast as a [`SendProgress`]
    /// carrying that message's 1-based position and the batch size. The
    /// first failure aborts the remainder of the batch and propagates;
    /// messages after it are never attempted.
    pub fn send_batch<F>(emails: &[Email], mut callback: F) -> Result<(), EmailError>
    where
        F: FnMut(SendProgress<'_>),
    {
        let total = emails.len();
        for (index, email) in emails.iter().enumerate() {
            email.send(|status| {
                callback(SendProgress {
                    current: index + 1,
                    total,
                    email,
                    status,
                })
            })?;
        }
        Ok(())
    }

    /// Serialize into a multipart MIME document: `From`, `To`, `Date` and
    /// `Subject` headers, a text part for the body, then one base64 part
    /// per attachment in list order. The `Date` header is rendered by
    /// lettre, which formats the current time in UTC rather than with the
    /// local-timezone offset.
    fn to_mime(&self) -> Result<Message, EmailError> {
        let from: Mailbox = self.sender.parse()?;
        let to: Mailbox = self.recipient.parse()?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(self.body.clone()));
        for attachment in &self.attachments {
            parts = parts.singlepart(attachment.to_part()?);
        }

        Ok(Message::builder()
            .from(from)
            .to(to)
            .date_now()
            .subject(self.subject.clone())
            .multipart(parts)?)
    }
}
