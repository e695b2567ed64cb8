//! Reply quote stripping for plain text bodies

/// Error from a quote stripper. Callers fall back to the unstripped text.
#[derive(Debug, thiserror::Error)]
pub enum QuoteStripError {
    #[error("Unsupported mime type for quote stripping: {0}")]
    UnsupportedMimeType(String),

    #[error("{0}")]
    Other(String),
}

/// Removes quoted earlier messages from a reply
pub trait QuoteStripper: Send + Sync {
    fn strip(&self, text: &str, mime_type: &str) -> Result<String, QuoteStripError>;
}

/// Line-based stripper for `text/plain` replies
///
/// Cuts the body at the first reply marker:
/// - a line quoted with `>`
/// - an `On <date>, <name> wrote:` attribution, possibly wrapped onto two lines
/// - an Outlook `-----Original Message-----` separator or `From:`/`Sent:` header block
///
/// If the reply marker is the first content in the body, the text is
/// returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyQuoteStripper;

impl QuoteStripper for ReplyQuoteStripper {
    fn strip(&self, text: &str, mime_type: &str) -> Result<String, QuoteStripError> {
        if !mime_type.eq_ignore_ascii_case("text/plain") {
            return Err(QuoteStripError::UnsupportedMimeType(mime_type.to_string()));
        }

        let lines: Vec<&str> = text.lines().collect();
        let Some(cut) = find_quote_start(&lines) else {
            return Ok(text.to_string());
        };

        // Slice the original text so CRLF line endings survive
        let offset: usize = text.split_inclusive('\n').take(cut).map(str::len).sum();
        let reply = text[..offset].trim_end();
        if reply.trim().is_empty() {
            return Ok(text.to_string());
        }

        Ok(reply.to_string())
    }
}

/// Index of the first line that starts quoted content
fn find_quote_start(lines: &[&str]) -> Option<usize> {
    (0..lines.len()).find(|&i| {
        let line = lines[i].trim();
        line.starts_with('>')
            || is_attribution(line, lines.get(i + 1).map(|l| l.trim()))
            || is_original_message_separator(line)
            || is_outlook_header(&lines[i..])
    })
}

fn is_attribution(line: &str, next: Option<&str>) -> bool {
    if !line.starts_with("On ") {
        return false;
    }
    line.ends_with("wrote:") || next.is_some_and(|n| n.ends_with("wrote:"))
}

fn is_original_message_separator(line: &str) -> bool {
    let inner = line.trim_matches('-').trim();
    line.starts_with("-----") && inner.eq_ignore_ascii_case("Original Message")
}

/// `From:` followed by `Sent:` within the next few lines
fn is_outlook_header(lines: &[&str]) -> bool {
    let Some(first) = lines.first() else {
        return false;
    };
    if !first.trim().starts_with("From:") {
        return false;
    }
    lines
        .iter()
        .skip(1)
        .take(4)
        .any(|l| l.trim().starts_with("Sent:"))
}
