/// Conversation content as carried inside item resources.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText(TextPart),
    #[serde(rename = "text")]
    Text(TextPart),
    #[serde(rename = "input_audio")]
    InputAudio(AudioTranscriptPart),
    #[serde(rename = "audio")]
    Audio(AudioTranscriptPart),
}

impl ContentPart {
    /// The readable text of this part, transcript text for audio parts.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPart::InputText(part) | ContentPart::Text(part) => Some(part.text()),
            ContentPart::InputAudio(part) | ContentPart::Audio(part) => part.transcript(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TextPart {
    text: String,
}

impl TextPart {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioTranscriptPart {
    transcript: Option<String>,
}

impl AudioTranscriptPart {
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ItemType {
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "function_call")]
    FunctionCall,
    #[serde(rename = "function_call_output")]
    FunctionCallOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "incomplete")]
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ItemRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// A conversation item as the agent reports it.
///
/// The flat shape mirrors the wire: message items carry `role` and
/// `content`, function-call items carry `call_id`, `name` and `arguments`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ItemResource {
    /// The unique ID of the item
    id: Option<String>,
    #[serde(rename = "type")]
    item_type: ItemType,
    /// The status of the item
    status: Option<ItemStatus>,
    /// The role, for "message" items
    role: Option<ItemRole>,
    /// The content parts, for "message" items
    #[serde(default)]
    content: Vec<ContentPart>,
    /// The ID of the function call, for "function_call" items
    call_id: Option<String>,
    /// The name of the called function, for "function_call" items
    name: Option<String>,
    /// The accumulated arguments, for "function_call" items
    arguments: Option<String>,
}

impl ItemResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn status(&self) -> Option<ItemStatus> {
        self.status
    }

    pub fn role(&self) -> Option<ItemRole> {
        self.role
    }

    pub fn content(&self) -> &[ContentPart] {
        &self.content
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }
}

/// The session resource announced by `session.created`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionResource {
    id: Option<String>,
    model: Option<String>,
}

impl SessionResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// The response resource carried by `response.done`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseResource {
    id: Option<String>,
    status: Option<String>,
}

impl ResponseResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
