//! The inline message mini-protocol: ` ```pika-<tag>` fenced blocks embedded
//! in message bodies.
//!
//! A message body is split into ordered typed segments for rendering.
//! Display tags (`prompt`, `html`) become structured segments; the two
//! control tags (`html-update`, `prompt-response`) never render and are
//! surfaced as [`ControlEvent`]s instead. Anything malformed or unrecognized
//! degrades to a plain markdown code fence so a message is always fully
//! displayable.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One rendered unit of a message body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal display text, rendered as markdown.
    Markdown { text: String },
    /// Interactive poll: a title and ordered option labels.
    Prompt { title: String, options: Vec<String> },
    /// Markup for an embedded sandboxed view. Widget state arrives
    /// out-of-band through the message's metadata, not through the parser.
    Html { body: String },
}

/// Control block consumed from a message body. These carry no display value;
/// they exist to drive state updates in whatever layer consumes the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Replaces the content of a previously rendered `pika-html` widget.
    /// `target` is the widget id from the fence line's auxiliary token.
    HtmlUpdate { target: Option<String>, body: String },
    /// A peer's answer to a previously rendered prompt. Body decodes via
    /// [`PromptResponse::from_body`].
    PromptResponse { body: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub segments: Vec<Segment>,
    pub control: Vec<ControlEvent>,
}

/// Body of a `pika-prompt` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptPayload {
    pub title: String,
    pub options: Vec<String>,
}

impl PromptPayload {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// Body of a `pika-prompt-response` block, sent when a user picks an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt_id: String,
    pub selected: String,
}

impl PromptResponse {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// The complete fenced block, ready to send as a message body.
    pub fn encode_block(&self) -> String {
        let json = serde_json::to_string(self).expect("infallible");
        format!("```pika-prompt-response\n{json}\n```")
    }
}

fn segment_regex() -> &'static regex::Regex {
    static SEGMENT_RE: OnceLock<regex::Regex> = OnceLock::new();
    SEGMENT_RE.get_or_init(|| {
        regex::Regex::new(r"```pika-([\w-]+)(?:[ \t]+(\S+))?\n([\s\S]*?)```")
            .expect("valid pika segment regex")
    })
}

/// Split a message body into display segments, dropping control blocks.
///
/// Never fails: malformed prompt JSON and unknown tags degrade to markdown
/// fences, whitespace-only text between blocks is dropped. An all-whitespace
/// body yields no segments.
pub fn parse_segments(content: &str) -> Vec<Segment> {
    parse_message(content).segments
}

/// Like [`parse_segments`], but also surfaces `html-update` and
/// `prompt-response` blocks as control events instead of discarding them.
/// Single left-to-right scan; both output sequences preserve source order.
pub fn parse_message(content: &str) -> ParsedMessage {
    let mut parsed = ParsedMessage::default();
    let mut last_end = 0usize;

    for caps in segment_regex().captures_iter(content) {
        let Some(full_match) = caps.get(0) else {
            continue;
        };

        let before = &content[last_end..full_match.start()];
        if !before.trim().is_empty() {
            parsed.segments.push(Segment::Markdown {
                text: before.to_string(),
            });
        }

        let block_type = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let block_arg = caps.get(2).map(|m| m.as_str().to_string());
        let block_body = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        match block_type {
            "prompt" => match PromptPayload::from_body(&block_body) {
                Ok(payload) => parsed.segments.push(Segment::Prompt {
                    title: payload.title,
                    options: payload.options,
                }),
                Err(err) => {
                    tracing::debug!(%err, "malformed pika-prompt body, rendering as fence");
                    parsed.segments.push(raw_fence(block_type, &block_body));
                }
            },
            "html" => parsed.segments.push(Segment::Html { body: block_body }),
            "html-update" => parsed.control.push(ControlEvent::HtmlUpdate {
                target: block_arg,
                body: block_body,
            }),
            "prompt-response" => parsed
                .control
                .push(ControlEvent::PromptResponse { body: block_body }),
            _ => {
                tracing::debug!(block_type, "unknown pika block, rendering as fence");
                parsed.segments.push(raw_fence(block_type, &block_body));
            }
        }

        last_end = full_match.end();
    }

    let tail = &content[last_end..];
    if !tail.trim().is_empty() {
        parsed.segments.push(Segment::Markdown {
            text: tail.to_string(),
        });
    }

    parsed
}

/// Rebuild an unrecognized or malformed block as a plain markdown code fence.
/// Tag loses its `pika-` prefix, body is trimmed, any auxiliary token on the
/// fence line is not preserved.
fn raw_fence(block_type: &str, body: &str) -> Segment {
    Segment::Markdown {
        text: format!("```{block_type}\n{body}\n```"),
    }
}

/// Extract the widget id from a ` ```pika-html <id>` fence line, so a
/// consumer can match [`ControlEvent::HtmlUpdate`] events to the message
/// that rendered the widget. `None` for plain `pika-html` blocks.
pub fn html_widget_id(content: &str) -> Option<String> {
    let marker = "```pika-html ";
    let start = content.find(marker)?;
    let rest = &content[start + marker.len()..];
    let line_end = rest.find('\n')?;
    let id = rest[..line_end].trim();
    if id.is_empty() || id.contains(' ') {
        return None;
    }
    Some(id.to_string())
}
