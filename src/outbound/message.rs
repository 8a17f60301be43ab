//! Outgoing WhatsApp message model and 8x8 wire shapes.
//!
//! [`MessageContent`] serializes directly to the `{"type": ..., "content": ...}`
//! pair the 8x8 messages endpoint expects; [`ProviderMessage`] adds the
//! recipient.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message model
// ---------------------------------------------------------------------------

/// One message destined for a WhatsApp user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Clear 8x8 channel id the conversation is on.
    pub from: String,
    pub content: MessageContent,
}

impl OutgoingMessage {
    pub fn new(from: impl Into<String>, content: MessageContent) -> Self {
        Self {
            from: from.into(),
            content,
        }
    }

    /// Wire envelope addressed to `msisdn`.
    pub fn to_wire<'a>(&'a self, msisdn: &'a str) -> ProviderMessage<'a> {
        ProviderMessage {
            user: WireUser { msisdn },
            content: &self.content,
        }
    }
}

/// Exactly one WhatsApp content kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(rename = "text", default, skip_serializing_if = "String::is_empty")]
        caption: String,
    },
    Audio {
        url: String,
    },
    Video {
        url: String,
        #[serde(rename = "text", default, skip_serializing_if = "String::is_empty")]
        caption: String,
    },
    Template {
        template: Template,
    },
    Interactive(Interactive),
}

impl MessageContent {
    /// Wire `type` value.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Image { .. } => "image",
            MessageContent::Audio { .. } => "audio",
            MessageContent::Video { .. } => "video",
            MessageContent::Template { .. } => "template",
            MessageContent::Interactive(_) => "interactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Interactive
// ---------------------------------------------------------------------------

/// Interactive prompt: up to three reply buttons, or a sectioned list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Interactive {
    Button(ButtonPrompt),
    List(ListPrompt),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonPrompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    pub body: TextBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<TextBody>,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPrompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    pub body: TextBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<TextBody>,
    pub action: ListAction,
}

/// Text header; 8x8 also accepts media headers, which are not produced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Header {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub text: String,
}

impl TextBody {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonAction {
    pub buttons: Vec<ReplyButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyButton {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply: Reply,
}

impl ReplyButton {
    pub fn reply(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: "reply".to_string(),
            reply: Reply {
                id: id.into(),
                title: title.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListAction {
    pub button: String,
    pub sections: Vec<ListSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// Body of `POST /messages`, and one element of a batch.
#[derive(Debug, Serialize)]
pub struct ProviderMessage<'a> {
    pub user: WireUser<'a>,
    #[serde(flatten)]
    pub content: &'a MessageContent,
}

#[derive(Debug, Serialize)]
pub struct WireUser<'a> {
    pub msisdn: &'a str,
}

/// Body of `POST /messages/batch`.
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub messages: Vec<ProviderMessage<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(content: MessageContent) -> serde_json::Value {
        let msg = OutgoingMessage::new("chan-1", content);
        serde_json::to_value(msg.to_wire("+6512345678")).unwrap()
    }

    #[test]
    fn test_text_wire() {
        assert_eq!(
            wire(MessageContent::Text {
                text: "Hi".to_string()
            }),
            json!({
                "user": {"msisdn": "+6512345678"},
                "type": "text",
                "content": {"text": "Hi"}
            })
        );
    }

    #[test]
    fn test_media_caption_omitted_when_empty() {
        let value = wire(MessageContent::Image {
            url: "https://x/img.png".to_string(),
            caption: String::new(),
        });
        assert_eq!(value["type"], "image");
        assert_eq!(value["content"], json!({"url": "https://x/img.png"}));

        let value = wire(MessageContent::Video {
            url: "https://x/v.mp4".to_string(),
            caption: "Watch".to_string(),
        });
        assert_eq!(
            value["content"],
            json!({"url": "https://x/v.mp4", "text": "Watch"})
        );
    }

    #[test]
    fn test_template_wire() {
        let value = wire(MessageContent::Template {
            template: Template {
                name: "welcome".to_string(),
                language: "en".to_string(),
                components: vec![],
            },
        });
        assert_eq!(
            value["content"],
            json!({"template": {"name": "welcome", "language": "en", "components": []}})
        );
    }

    #[test]
    fn test_button_wire() {
        let value = wire(MessageContent::Interactive(Interactive::Button(
            ButtonPrompt {
                header: None,
                body: TextBody::new("Pick one"),
                footer: Some(TextBody::new("thanks")),
                action: ButtonAction {
                    buttons: vec![ReplyButton::reply("option-1", "Yes")],
                },
            },
        )));
        assert_eq!(value["type"], "interactive");
        assert_eq!(
            value["content"],
            json!({
                "type": "button",
                "body": {"text": "Pick one"},
                "footer": {"text": "thanks"},
                "action": {"buttons": [{"type": "reply", "reply": {"id": "option-1", "title": "Yes"}}]}
            })
        );
    }

    #[test]
    fn test_list_wire() {
        let value = wire(MessageContent::Interactive(Interactive::List(ListPrompt {
            header: Some(Header::text("Menu")),
            body: TextBody::new("Choose"),
            footer: None,
            action: ListAction {
                button: "Options".to_string(),
                sections: vec![ListSection {
                    title: "Drinks".to_string(),
                    rows: vec![ListRow {
                        id: "option-1".to_string(),
                        title: "Tea".to_string(),
                        description: None,
                    }],
                }],
            },
        })));
        assert_eq!(
            value["content"],
            json!({
                "type": "list",
                "header": {"type": "text", "text": "Menu"},
                "body": {"text": "Choose"},
                "action": {
                    "button": "Options",
                    "sections": [{"title": "Drinks", "rows": [{"id": "option-1", "title": "Tea"}]}]
                }
            })
        );
    }

    #[test]
    fn test_batch_wire() {
        let a = OutgoingMessage::new("c", MessageContent::Text { text: "a".into() });
        let b = OutgoingMessage::new(
            "c",
            MessageContent::Audio {
                url: "https://x/a.ogg".into(),
            },
        );
        let batch = BatchRequest {
            messages: vec![a.to_wire("+1"), b.to_wire("+1")],
        };
        let value = serde_json::to_value(batch).unwrap();
        assert_eq!(value["messages"][0]["type"], "text");
        assert_eq!(value["messages"][1]["type"], "audio");
        assert_eq!(value["messages"][1]["user"]["msisdn"], "+1");
    }

    #[test]
    fn test_kind_matches_wire_type() {
        let content = MessageContent::Audio { url: "u".into() };
        assert_eq!(wire(content.clone())["type"], content.kind());
    }
}
