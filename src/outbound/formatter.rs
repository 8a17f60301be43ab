//! Classification of AI platform output into WhatsApp content.
//!
//! An output is the generic `{text?, data?}` object the AI platform emits.
//! Rich output is described by directives looked up under
//! `data._cognigy._default._<kind>` and then `data.<kind>`. The first step
//! below that matches wins:
//!
//! 1. `template`
//! 2. `video`, `image`, `audio` (in that order)
//! 3. `quickReplies` or `list`
//! 4. `text`, sent verbatim when it is a non-empty string
//!
//! Anything else is rejected with [`BridgeError::MissingChannelOutput`].

use serde_json::Value;
use tracing::{debug, warn};

use super::message::{
    ButtonAction, ButtonPrompt, Header, Interactive, ListAction, ListPrompt, ListRow, ListSection,
    MessageContent, OutgoingMessage, ReplyButton, Template, TextBody,
};
use crate::config::FormatterConfig;
use crate::error::{BridgeError, Result};

/// WhatsApp rejects button prompts with more than three buttons.
pub const MAX_BUTTONS: usize = 3;

/// Template language used when the directive doesn't name one.
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "en";

/// List button label used in lenient mode when the directive has none.
pub const DEFAULT_LIST_BUTTON: &str = "Options";

/// First non-empty string among `keys` of `value`.
pub fn first_text<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Header and footer accept either a bare string or `{"text": ...}`.
fn text_or_object<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value.get(key)? {
        Value::String(s) => Some(s.as_str()),
        obj @ Value::Object(_) => obj.get("text").and_then(Value::as_str),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}

pub struct Formatter {
    strict: bool,
    default_prompt: String,
}

impl Formatter {
    pub fn new(config: &FormatterConfig) -> Self {
        Self {
            strict: config.strict,
            default_prompt: config.default_prompt.clone(),
        }
    }

    /// Classify one output into a message sent from channel `from`.
    pub fn classify(&self, output: &Value, from: &str) -> Result<OutgoingMessage> {
        self.classify_content(output)
            .map(|content| OutgoingMessage::new(from, content))
    }

    /// Classify every output, dropping the ones that don't classify.
    pub fn classify_stack(&self, outputs: &[Value], from: &str) -> Vec<OutgoingMessage> {
        outputs
            .iter()
            .enumerate()
            .filter_map(|(i, output)| match self.classify(output, from) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!(index = i, error = %e, "dropping output without channel representation");
                    None
                }
            })
            .collect()
    }

    fn classify_content(&self, output: &Value) -> Result<MessageContent> {
        if let Some(d) = directive(output, "template") {
            if let Some(content) = self.template(d)? {
                return Ok(content);
            }
        }

        for kind in ["video", "image", "audio"] {
            if let Some(d) = directive(output, kind) {
                if let Some(content) = self.media(kind, d)? {
                    return Ok(content);
                }
            }
        }

        if let Some(d) = directive(output, "list") {
            if let Some(prompt) = self.list(d, output)? {
                return Ok(MessageContent::Interactive(Interactive::List(prompt)));
            }
        }
        if let Some(d) = directive(output, "quickReplies") {
            let interactive = if d.get("displayType").and_then(Value::as_str) == Some("list") {
                self.quick_reply_list(d, output)?.map(Interactive::List)
            } else {
                self.buttons(d, output)?.map(Interactive::Button)
            };
            if let Some(interactive) = interactive {
                return Ok(MessageContent::Interactive(interactive));
            }
        }

        if let Some(text) = output
            .get("text")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            if text.trim().is_empty() {
                warn!("sending whitespace-only text output");
            }
            return Ok(MessageContent::Text {
                text: text.to_string(),
            });
        }

        Err(BridgeError::MissingChannelOutput(
            "output has no text and no supported directive".to_string(),
        ))
    }

    /// In strict mode a malformed directive rejects the output; in lenient
    /// mode it falls through to the next step.
    fn reject<T>(&self, reason: String) -> Result<Option<T>> {
        if self.strict {
            Err(BridgeError::MissingChannelOutput(reason))
        } else {
            debug!(%reason, "skipping malformed directive");
            Ok(None)
        }
    }

    fn template(&self, d: &Value) -> Result<Option<MessageContent>> {
        let Some(name) = first_text(d, &["name"]) else {
            return self.reject("template directive without name".to_string());
        };
        Ok(Some(MessageContent::Template {
            template: Template {
                name: name.to_string(),
                language: first_text(d, &["language"])
                    .unwrap_or(DEFAULT_TEMPLATE_LANGUAGE)
                    .to_string(),
                components: d
                    .get("components")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },
        }))
    }

    fn media(&self, kind: &str, d: &Value) -> Result<Option<MessageContent>> {
        let url_key = format!("{}Url", kind);
        let Some(url) = first_text(d, &[url_key.as_str()]) else {
            return self.reject(format!("{} directive without {}", kind, url_key));
        };
        let url = url.to_string();
        let content = match kind {
            "video" => MessageContent::Video {
                url,
                caption: first_text(d, &["fallbackText", "videoAltText"])
                    .unwrap_or_default()
                    .to_string(),
            },
            "image" => MessageContent::Image {
                url,
                caption: first_text(d, &["fallbackText", "imageAltText"])
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => MessageContent::Audio { url },
        };
        Ok(Some(content))
    }

    fn body(&self, d: &Value, output: &Value) -> TextBody {
        TextBody::new(
            first_text(d, &["text"])
                .or_else(|| first_text(output, &["text"]))
                .unwrap_or(&self.default_prompt),
        )
    }

    fn buttons(&self, d: &Value, output: &Value) -> Result<Option<ButtonPrompt>> {
        let replies = d
            .get("quickReplies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if replies.len() > MAX_BUTTONS {
            debug!(
                count = replies.len(),
                "truncating quick replies to {} buttons", MAX_BUTTONS
            );
        }

        let mut buttons = Vec::with_capacity(MAX_BUTTONS);
        for (index, reply) in replies.iter().take(MAX_BUTTONS).enumerate() {
            match first_text(reply, &["title"]) {
                Some(title) => buttons.push(ReplyButton::reply(format!("option-{}", index + 1), title)),
                None => {
                    self.reject::<()>(format!("quick reply {} without title", index + 1))?;
                }
            }
        }
        if buttons.is_empty() {
            return self.reject("quick replies directive without replies".to_string());
        }

        Ok(Some(ButtonPrompt {
            header: text_or_object(d, "header").map(Header::text),
            body: self.body(d, output),
            footer: text_or_object(d, "footer").map(TextBody::new),
            action: ButtonAction { buttons },
        }))
    }

    fn button_label(&self, d: &Value) -> Result<Option<String>> {
        match first_text(d, &["button", "buttonText"]) {
            Some(label) => Ok(Some(label.to_string())),
            None if self.strict => self.reject("list directive without button label".to_string()),
            None => Ok(Some(DEFAULT_LIST_BUTTON.to_string())),
        }
    }

    /// Quick replies rendered as a single-section list.
    fn quick_reply_list(&self, d: &Value, output: &Value) -> Result<Option<ListPrompt>> {
        let Some(button) = self.button_label(d)? else {
            return Ok(None);
        };
        let replies = d
            .get("quickReplies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut position = 0;
        let Some(rows) = self.rows(replies, &mut position)? else {
            return Ok(None);
        };
        let title = first_text(d, &["sectionTitle"]).unwrap_or(&button).to_string();
        Ok(Some(ListPrompt {
            header: text_or_object(d, "header").map(Header::text),
            body: self.body(d, output),
            footer: text_or_object(d, "footer").map(TextBody::new),
            action: ListAction {
                button,
                sections: vec![ListSection { title, rows }],
            },
        }))
    }

    fn list(&self, d: &Value, output: &Value) -> Result<Option<ListPrompt>> {
        let Some(button) = self.button_label(d)? else {
            return Ok(None);
        };
        let raw_sections = d
            .get("sections")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        // Row position counts across sections so synthesized ids stay unique.
        let mut position = 0;
        let mut sections = Vec::with_capacity(raw_sections.len());
        for (index, section) in raw_sections.iter().enumerate() {
            let rows = section
                .get("rows")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let Some(rows) = self.rows(rows, &mut position)? else {
                self.reject::<()>(format!("list section {} has no rows", index + 1))?;
                continue;
            };
            sections.push(ListSection {
                title: first_text(section, &["title"]).unwrap_or_default().to_string(),
                rows,
            });
        }
        if sections.is_empty() {
            return self.reject("list directive without sections".to_string());
        }

        Ok(Some(ListPrompt {
            header: text_or_object(d, "header").map(Header::text),
            body: self.body(d, output),
            footer: text_or_object(d, "footer").map(TextBody::new),
            action: ListAction { button, sections },
        }))
    }

    /// Build rows, synthesizing `option-<n>` ids from the running `position`.
    /// Returns `None` when no row survives.
    fn rows(&self, raw: &[Value], position: &mut usize) -> Result<Option<Vec<ListRow>>> {
        let mut rows = Vec::with_capacity(raw.len());
        for row in raw {
            *position += 1;
            let Some(title) = first_text(row, &["title"]) else {
                self.reject::<()>(format!("list row {} without title", position))?;
                continue;
            };
            rows.push(ListRow {
                id: first_text(row, &["id"])
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("option-{}", position)),
                title: title.to_string(),
                description: first_text(row, &["description"]).map(str::to_string),
            });
        }
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }
}

/// Directive `kind`, preferring the platform default-channel location.
fn directive<'a>(output: &'a Value, kind: &str) -> Option<&'a Value> {
    let data = output.get("data")?;
    data.get("_cognigy")
        .and_then(|c| c.get("_default"))
        .and_then(|d| d.get(format!("_{}", kind)))
        .filter(|v| !v.is_null())
        .or_else(|| data.get(kind).filter(|v| !v.is_null()))
}
