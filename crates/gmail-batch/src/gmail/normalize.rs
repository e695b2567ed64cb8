//! Batch item normalization
//!
//! Converts parsed batch fragments to domain [`Message`]s.

use base64::prelude::*;
use log::warn;
use mailparse::{DispositionType, MailAddr, MailHeaderMap, ParsedMail, SingleInfo};

use super::api::{ParsedItem, RawMessagePayload};
use super::quotes::QuoteStripper;
use crate::error::ItemError;
use crate::models::{Attachment, Message, Participant, ParticipantRole};

/// Decode one batch item to a message
///
/// Error items and messages that cannot be decoded come back as `Err`; the
/// caller collects them alongside successful messages. The item is not
/// modified, so decoding the same item twice yields equal messages.
pub fn decode_item(
    item: &ParsedItem,
    stripper: &dyn QuoteStripper,
) -> Result<Message, ItemError> {
    match item {
        ParsedItem::Error(error) => Err(ItemError::Api(error.clone())),
        ParsedItem::Message(payload) => decode_message(payload, stripper),
    }
}

fn decode_message(
    payload: &RawMessagePayload,
    stripper: &dyn QuoteStripper,
) -> Result<Message, ItemError> {
    let raw = payload
        .raw
        .as_deref()
        .ok_or_else(|| ItemError::InvalidEncoding {
            reason: "message has no raw body".to_string(),
        })?;

    let bytes = decode_raw_body(raw).ok_or_else(|| ItemError::InvalidEncoding {
        reason: format!("raw body of message {} is not valid base64", payload.id),
    })?;

    let parsed = mailparse::parse_mail(&bytes).map_err(|e| ItemError::Mime {
        reason: e.to_string(),
    })?;

    let (from_handle, from_display_name) = sender(&parsed)?;

    let participants: Vec<Participant> = ParticipantRole::ALL
        .into_iter()
        .flat_map(|role| {
            header_addresses(&parsed, role.header_name())
                .into_iter()
                .map(move |info| {
                    Participant::new(role, &info.addr, info.display_name.unwrap_or_default())
                })
        })
        .collect();

    let subject = parsed.headers.get_first_value("Subject").unwrap_or_default();
    let header_message_id = parsed
        .headers
        .get_first_value("Message-ID")
        .map(|id| id.trim().to_string())
        .unwrap_or_default();

    let mut text = None;
    let mut attachments = Vec::new();
    walk_parts(&parsed, &mut text, &mut attachments);

    let text = text
        .map(|text| strip_reply_quotes(&text, stripper))
        .unwrap_or_default();

    Ok(Message::builder(&payload.id, &payload.thread_id)
        .history_id(&payload.history_id)
        .internal_date(&payload.internal_date)
        .header_message_id(header_message_id)
        .subject(subject)
        .from(from_handle, from_display_name)
        .participants(participants)
        .text(text)
        .attachments(attachments)
        .build())
}

/// Decode Gmail's URL-safe base64 `raw` field
///
/// Padding varies, and some producers use the standard alphabet, so several
/// decoders are tried in turn.
pub fn decode_raw_body(data: &str) -> Option<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&URL_SAFE, &BASE64_URL_SAFE_NO_PAD, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data.trim()).ok())
}

/// Sender handle and display name from the first `From` header
///
/// Only a missing header is an error. A header without a usable address
/// gives an empty handle, with the group name or raw header text as the
/// display name.
fn sender(parsed: &ParsedMail) -> Result<(String, String), ItemError> {
    let header = parsed
        .headers
        .get_first_header(ParticipantRole::From.header_name())
        .ok_or(ItemError::MissingSender)?;

    let addrs = mailparse::addrparse_header(header)
        .map(|list| list.into_inner())
        .unwrap_or_default();

    let first = addrs.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info),
        MailAddr::Group(group) => group.addrs.first(),
    });
    if let Some(info) = first {
        return Ok((info.addr.clone(), info.display_name.clone().unwrap_or_default()));
    }

    let display_name = addrs
        .iter()
        .find_map(|addr| match addr {
            MailAddr::Group(group) => Some(group.group_name.clone()),
            MailAddr::Single(_) => None,
        })
        .unwrap_or_else(|| header.get_value().trim().to_string());

    Ok((String::new(), display_name))
}

/// All addresses in every header named `name`
///
/// Groups contribute every member. A header that fails to parse contributes
/// nothing.
fn header_addresses(parsed: &ParsedMail, name: &str) -> Vec<SingleInfo> {
    parsed
        .headers
        .get_all_headers(name)
        .into_iter()
        .filter_map(|header| mailparse::addrparse_header(header).ok())
        .flat_map(|list| list.into_inner())
        .flat_map(|addr| match addr {
            MailAddr::Single(info) => vec![info],
            MailAddr::Group(group) => group.addrs,
        })
        .collect()
}

/// Collect the first inline text/plain body and attachment metadata
fn walk_parts(
    part: &ParsedMail,
    text: &mut Option<String>,
    attachments: &mut Vec<Attachment>,
) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            walk_parts(sub, text, attachments);
        }
        return;
    }

    let content_type = part.ctype.mimetype.to_lowercase();
    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    let is_text = content_type.starts_with("text/");
    let is_attachment = disposition.disposition == DispositionType::Attachment
        || (filename.is_some() && content_type != "text/plain");
    let is_inline_non_text = disposition.disposition == DispositionType::Inline && !is_text;

    if is_attachment || is_inline_non_text {
        let size = part.get_body_raw().map(|b| b.len()).unwrap_or(0);
        let content_id = part.headers.get_first_value("Content-ID");

        attachments.push(Attachment {
            filename,
            content_type,
            content_id,
            size,
        });
    } else if content_type == "text/plain" && text.is_none() {
        *text = part.get_body().ok();
    }
}

/// Strip reply quotes, keeping the original text if stripping fails
fn strip_reply_quotes(text: &str, stripper: &dyn QuoteStripper) -> String {
    if text.is_empty() {
        return String::new();
    }

    match stripper.strip(text, "text/plain") {
        Ok(stripped) => stripped,
        Err(e) => {
            warn!("Error while trying to remove reply quotations: {}", e);
            text.to_string()
        }
    }
}
