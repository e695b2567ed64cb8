//! Domain models for the batch pipeline

mod message;
mod query;

pub use message::{Attachment, Message, MessageBuilder, Participant, ParticipantRole};
pub use query::MessageQuery;
