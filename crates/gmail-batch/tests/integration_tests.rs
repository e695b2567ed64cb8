//! Integration tests for the gmail-batch crate
//!
//! These tests drive the whole pipeline through a mock transport, from
//! queries to decoded messages and errors.

use base64::prelude::*;
use gmail_batch::{
    BatchConfig, BatchFetcher, BatchTransport, ItemError, JobLabels, MessageQuery,
    ParticipantRole, QuoteStripError, QuoteStripper, RawBatchResponse, TransportError,
    fetch_all_messages,
};
use std::sync::Mutex;

const RESPONSE_BOUNDARY: &str = "batch_xyz";

/// One request as seen by the mock transport
#[derive(Debug, Clone)]
struct SentRequest {
    body: String,
    boundary: String,
    access_token: String,
}

/// Mock transport that answers every embedded GET from a lookup function
struct MockTransport<F> {
    answer: F,
    sent: Mutex<Vec<SentRequest>>,
}

impl<F> MockTransport<F>
where
    F: Fn(&str) -> String,
{
    fn new(answer: F) -> Self {
        Self {
            answer,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl<F> BatchTransport for MockTransport<F>
where
    F: Fn(&str) -> String,
{
    fn send(
        &self,
        body: &str,
        boundary: &str,
        access_token: &str,
    ) -> Result<RawBatchResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            body: body.to_string(),
            boundary: boundary.to_string(),
            access_token: access_token.to_string(),
        });

        let fragments: Vec<String> = requested_uris(body)
            .iter()
            .map(|uri| (self.answer)(uri))
            .collect();

        Ok(multipart_response(&fragments))
    }
}

/// URIs of the embedded GET requests, in order
fn requested_uris(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.trim_end().strip_prefix("GET "))
        .map(str::to_string)
        .collect()
}

/// Message ID from a `format=raw` message URI
fn id_from_uri(uri: &str) -> &str {
    uri.trim_start_matches("/gmail/v1/users/me/messages/")
        .trim_end_matches("?format=raw")
}

fn multipart_response(fragments: &[String]) -> RawBatchResponse {
    let mut body = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        body.push_str(&format!(
            "--{}\r\nContent-Type: application/http\r\nContent-ID: <response-item-{}>\r\n\r\n\
             HTTP/1.1 200 OK\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n",
            RESPONSE_BOUNDARY,
            i + 1,
            fragment
        ));
    }
    body.push_str(&format!("--{}--\r\n", RESPONSE_BOUNDARY));

    RawBatchResponse {
        status: 200,
        content_type: Some(format!("multipart/mixed; boundary={}", RESPONSE_BOUNDARY)),
        body,
    }
}

fn raw_message_json(id: &str, rfc822: &str) -> String {
    serde_json::json!({
        "id": id,
        "threadId": format!("thread-{}", id),
        "historyId": "9001",
        "internalDate": "1700000000000",
        "raw": BASE64_URL_SAFE.encode(rfc822),
    })
    .to_string()
}

fn simple_email(id: &str) -> String {
    format!(
        "From: Sender <sender@x.com>\r\nTo: me@x.com\r\nSubject: Message {}\r\n\r\nBody {}\r\n",
        id, id
    )
}

#[test]
fn test_end_to_end_message_and_error() {
    let transport = MockTransport::new(|uri: &str| match id_from_uri(uri) {
        "good" => raw_message_json(
            "good",
            "From: alice@x.com\r\nTo: bob@x.com\r\nSubject: Hello\r\n\r\nHi\n\n> old quote\n",
        ),
        _ => r#"{"error": {"message": "not found"}}"#.to_string(),
    });

    let queries = vec![
        MessageQuery::raw_message("good"),
        MessageQuery::raw_message("missing"),
    ];

    let result = fetch_all_messages(&transport, &queries, "token-123", &JobLabels::default())
        .unwrap();

    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.errors.len(), 1);

    let message = &result.messages[0];
    assert_eq!(message.from_handle, "alice@x.com");
    assert_eq!(message.external_id, "good");
    assert_eq!(message.message_thread_external_id, "thread-good");
    assert!(!message.text.contains("> old quote"));
    assert_eq!(message.text, "Hi");

    match &result.errors[0] {
        ItemError::Api(e) => assert_eq!(e.message.as_deref(), Some("not found")),
        other => panic!("expected API error, got {:?}", other),
    }

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].boundary, "batch_gmail_messages");
    assert_eq!(sent[0].access_token, "token-123");
}

#[test]
fn test_paging_over_many_queries() {
    let transport = MockTransport::new(|uri: &str| {
        let id = id_from_uri(uri);
        raw_message_json(id, &simple_email(id))
    });

    let queries: Vec<MessageQuery> = (0..120)
        .map(|i| MessageQuery::raw_message(&format!("m{:03}", i)))
        .collect();

    let fetcher = BatchFetcher::new(&transport, BatchConfig::default());
    let result = fetcher
        .fetch_all_messages(
            &queries,
            "token",
            &JobLabels::new("messages-import", "ws-1", "acct-1"),
        )
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    let per_page: Vec<usize> = sent.iter().map(|r| requested_uris(&r.body).len()).collect();
    assert_eq!(per_page, vec![50, 50, 20]);

    assert_eq!(result.messages.len(), 120);
    assert!(result.errors.is_empty());

    // Results keep query order across pages
    let ids: Vec<String> = result.messages.iter().map(|m| m.external_id.clone()).collect();
    let expected: Vec<String> = (0..120).map(|i| format!("m{:03}", i)).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_empty_query_list() {
    let transport = MockTransport::new(|_: &str| String::new());
    let result = fetch_all_messages(&transport, &[], "token", &JobLabels::default()).unwrap();

    assert!(result.messages.is_empty());
    assert!(result.errors.is_empty());
    assert!(transport.sent().is_empty());
}

#[test]
fn test_item_failures_do_not_abort_siblings() {
    let transport = MockTransport::new(|uri: &str| match id_from_uri(uri) {
        "no-sender" => raw_message_json("no-sender", "Subject: orphan\r\n\r\nbody\r\n"),
        "broken" => r#"{"id": "broken", "raw": }"#.to_string(),
        "bad-base64" => r#"{"id": "bad-base64", "threadId": "t", "raw": "%%%"}"#.to_string(),
        id => raw_message_json(id, &simple_email(id)),
    });

    let queries: Vec<MessageQuery> = ["ok-1", "no-sender", "broken", "bad-base64", "ok-2"]
        .iter()
        .map(|id| MessageQuery::raw_message(id))
        .collect();

    let result = fetch_all_messages(&transport, &queries, "token", &JobLabels::default()).unwrap();

    assert_eq!(result.messages.len() + result.errors.len(), queries.len());
    assert_eq!(result.messages.len(), 2);
    assert_eq!(result.errors[0], ItemError::MissingSender);
    assert!(matches!(result.errors[1], ItemError::MalformedFragment { .. }));
    assert!(matches!(result.errors[2], ItemError::InvalidEncoding { .. }));
}

#[test]
fn test_participants_across_all_roles() {
    let transport = MockTransport::new(|uri: &str| {
        raw_message_json(
            id_from_uri(uri),
            "From: Alice <ALICE@x.com>\r\n\
             To: bob@x.com, Carol <carol@x.com>\r\n\
             Cc: dan@x.com\r\n\
             Bcc: erin@x.com\r\n\
             Subject: Plans\r\n\r\nSee you\r\n",
        )
    });

    let queries = vec![MessageQuery::raw_message("m1")];
    let result = fetch_all_messages(&transport, &queries, "token", &JobLabels::default()).unwrap();
    let message = &result.messages[0];

    assert_eq!(message.participants.len(), 5);
    let from: Vec<_> = message.participants_with_role(ParticipantRole::From).collect();
    assert_eq!(from[0].handle, "alice@x.com");
    assert_eq!(from[0].display_name, "Alice");
    assert_eq!(message.from_display_name, "Alice");
    assert_eq!(message.participants_with_role(ParticipantRole::To).count(), 2);
    assert_eq!(message.participants_with_role(ParticipantRole::Bcc).count(), 1);
}

#[test]
fn test_custom_quote_stripper_failure_falls_back() {
    struct AlwaysFails;

    impl QuoteStripper for AlwaysFails {
        fn strip(&self, _text: &str, _mime_type: &str) -> Result<String, QuoteStripError> {
            Err(QuoteStripError::Other("stripper unavailable".to_string()))
        }
    }

    let transport = MockTransport::new(|uri: &str| {
        raw_message_json(
            id_from_uri(uri),
            "From: alice@x.com\r\n\r\nHi\n\n> old quote\n",
        )
    });

    let fetcher =
        BatchFetcher::new(&transport, BatchConfig::default()).with_quote_stripper(AlwaysFails);
    let result = fetcher
        .fetch_all_messages(&[MessageQuery::raw_message("m1")], "token", &JobLabels::default())
        .unwrap();

    assert!(result.errors.is_empty());
    assert!(result.messages[0].text.contains("> old quote"));
}

#[test]
fn test_transport_failure_propagates() {
    struct DownTransport;

    impl BatchTransport for DownTransport {
        fn send(
            &self,
            _body: &str,
            _boundary: &str,
            _access_token: &str,
        ) -> Result<RawBatchResponse, TransportError> {
            Err(TransportError::Status(500))
        }
    }

    let queries = vec![MessageQuery::raw_message("m1")];
    let err = fetch_all_messages(DownTransport, &queries, "token", &JobLabels::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Batch request for page 0 failed");
}

#[test]
fn test_result_serializes_for_callers() {
    let transport = MockTransport::new(|uri: &str| match id_from_uri(uri) {
        "m1" => raw_message_json("m1", &simple_email("m1")),
        _ => r#"{"error": {"code": 404, "message": "not found", "status": "NOT_FOUND"}}"#
            .to_string(),
    });

    let queries = vec![MessageQuery::raw_message("m1"), MessageQuery::raw_message("m2")];
    let result = fetch_all_messages(&transport, &queries, "token", &JobLabels::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["messages"][0]["externalId"], "m1");
    assert_eq!(json["messages"][0]["subject"], "Message m1");
    assert_eq!(json["errors"][0]["kind"], "api");
    assert_eq!(json["errors"][0]["code"], 404);
    assert!(json["timing"]["fetchMs"].is_u64());
}
