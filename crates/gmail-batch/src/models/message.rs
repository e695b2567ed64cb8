//! Message model produced by the batch pipeline

use serde::{Deserialize, Serialize};

/// Which address header a participant came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    From,
    To,
    Cc,
    Bcc,
}

impl ParticipantRole {
    /// All roles, in the order participants are listed on a message
    pub const ALL: [ParticipantRole; 4] = [Self::From, Self::To, Self::Cc, Self::Bcc];

    /// Header name this role is read from
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
        }
    }
}

/// One address on a message, tagged with its role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub role: ParticipantRole,
    /// Lowercased email address
    pub handle: String,
    /// Display name, empty when the header has none
    pub display_name: String,
}

impl Participant {
    /// Create a participant, normalizing the handle to lowercase
    pub fn new(
        role: ParticipantRole,
        handle: impl AsRef<str>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            role,
            handle: handle.as_ref().to_lowercase(),
            display_name: display_name.into(),
        }
    }
}

/// Attachment metadata. The content itself is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: String,
    pub content_id: Option<String>,
    /// Decoded size in bytes
    pub size: usize,
}

/// A message fetched and parsed from Gmail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Gmail history ID at the time of the fetch
    pub history_id: String,
    /// Gmail message ID
    pub external_id: String,
    /// RFC 5322 Message-ID header, empty if absent
    pub header_message_id: String,
    pub subject: String,
    /// Gmail thread ID
    pub message_thread_external_id: String,
    /// Gmail's internal timestamp (milliseconds since epoch, as sent by the API)
    pub internal_date: String,
    pub from_handle: String,
    pub from_display_name: String,
    pub participants: Vec<Participant>,
    /// Plain text body with quoted replies removed when possible
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(external_id: impl Into<String>, thread_id: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(external_id.into(), thread_id.into())
    }

    /// Participants with the given role
    pub fn participants_with_role(
        &self,
        role: ParticipantRole,
    ) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(move |p| p.role == role)
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    external_id: String,
    thread_id: String,
    history_id: String,
    header_message_id: String,
    subject: String,
    internal_date: String,
    from_handle: String,
    from_display_name: String,
    participants: Vec<Participant>,
    text: String,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    fn new(external_id: String, thread_id: String) -> Self {
        Self {
            external_id,
            thread_id,
            history_id: String::new(),
            header_message_id: String::new(),
            subject: String::new(),
            internal_date: String::new(),
            from_handle: String::new(),
            from_display_name: String::new(),
            participants: Vec::new(),
            text: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn history_id(mut self, history_id: impl Into<String>) -> Self {
        self.history_id = history_id.into();
        self
    }

    pub fn header_message_id(mut self, header_message_id: impl Into<String>) -> Self {
        self.header_message_id = header_message_id.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn internal_date(mut self, internal_date: impl Into<String>) -> Self {
        self.internal_date = internal_date.into();
        self
    }

    /// Set the sender handle and display name
    pub fn from(mut self, handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.from_handle = handle.into();
        self.from_display_name = display_name.into();
        self
    }

    pub fn participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = participants;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn build(self) -> Message {
        Message {
            history_id: self.history_id,
            external_id: self.external_id,
            header_message_id: self.header_message_id,
            subject: self.subject,
            message_thread_external_id: self.thread_id,
            internal_date: self.internal_date,
            from_handle: self.from_handle,
            from_display_name: self.from_display_name,
            participants: self.participants,
            text: self.text,
            attachments: self.attachments,
        }
    }
}
