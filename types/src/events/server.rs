mod error;

pub use error::ErrorDetails;

use crate::items::{ItemResource, ResponseResource, SessionResource};

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    event_id: Option<String>,

    /// Details about the error
    error: ErrorDetails,
}

impl ErrorEvent {
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

/// `session.created` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionCreatedEvent {
    event_id: String,
    /// The session resource
    session: SessionResource,
}

impl SessionCreatedEvent {
    pub fn event_id(&self) -> &str {
        self.event_id.as_str()
    }

    pub fn session(&self) -> &SessionResource {
        &self.session
    }
}

/// `input_audio_buffer.speech_started` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferSpeechStartedEvent {
    event_id: String,

    /// Milliseconds since the session started when speech was detected
    audio_start_ms: i32,
    /// The ID of the candidate message item that will be created when speech stops
    item_id: String,
}

impl InputAudioBufferSpeechStartedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_start_ms(&self) -> i32 {
        self.audio_start_ms
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

/// `input_audio_buffer.speech_stopped` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferSpeechStoppedEvent {
    event_id: String,

    /// Milliseconds since the session started when speech stopped
    audio_end_ms: i32,
    /// The ID of the candidate message item that will be created
    item_id: String,
}

impl InputAudioBufferSpeechStoppedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_end_ms(&self) -> i32 {
        self.audio_end_ms
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

/// `conversation.item.created` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreatedEvent {
    event_id: String,

    /// The ID of the preceding item
    previous_item_id: Option<String>,
    /// The item that was created
    item: ItemResource,
}

impl ConversationItemCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn previous_item_id(&self) -> Option<&str> {
        self.previous_item_id.as_deref()
    }

    pub fn item(&self) -> &ItemResource {
        &self.item
    }
}

/// `conversation.item.input_audio_transcription.completed` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemInputAudioTranscriptionCompletedEvent {
    event_id: String,

    /// The ID of the candidate message item
    item_id: String,

    /// The index of the content part containing the audio
    content_index: i32,

    /// The transcribed text
    transcript: String,
}

impl ConversationItemInputAudioTranscriptionCompletedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `output_audio_buffer.started` event, the agent's audio began playing out
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OutputAudioBufferStartedEvent {
    event_id: String,

    /// The ID of the response the audio belongs to
    response_id: Option<String>,
}

impl OutputAudioBufferStartedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }
}

/// `output_audio_buffer.stopped` event, the agent's audio finished playing out
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OutputAudioBufferStoppedEvent {
    event_id: String,

    /// The ID of the response the audio belonged to
    response_id: Option<String>,
}

impl OutputAudioBufferStoppedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }
}

/// `response.text.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseTextDeltaEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The index of the content part in the item's content array
    content_index: i32,
    /// The delta in the text content
    delta: String,
}

impl ResponseTextDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.text.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseTextDoneEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The index of the content part in the item's content array
    content_index: i32,
    /// The completed text content
    text: String,
}

impl ResponseTextDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `response.audio_transcript.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioTranscriptDeltaEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The index of the content part in the item's content array
    content_index: i32,
    /// The delta in the audio transcript
    delta: String,
}

impl ResponseAudioTranscriptDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.audio_transcript.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioTranscriptDoneEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The index of the content part in the item's content array
    content_index: i32,
    /// The completed audio transcript
    transcript: String,
}

impl ResponseAudioTranscriptDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `response.audio.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioDeltaEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The index of the content part in the item's content array
    content_index: i32,
    /// The delta in the audio content
    delta: String,
}

impl ResponseAudioDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn content_index(&self) -> i32 {
        self.content_index
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseDoneEvent {
    event_id: String,

    /// The response resource
    response: ResponseResource,
}

impl ResponseDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response(&self) -> &ResponseResource {
        &self.response
    }
}

/// `response.output_item.added` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseOutputItemAddedEvent {
    event_id: String,

    /// The ID of the response to which the item belongs
    response_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The item that was added
    item: ItemResource,
}

impl ResponseOutputItemAddedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn item(&self) -> &ItemResource {
        &self.item
    }
}

/// `response.function_call_arguments.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseFunctionCallArgumentsDeltaEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the function call item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The ID of the function call
    call_id: String,
    /// The delta in the function calling arguments
    delta: String,
}

impl ResponseFunctionCallArgumentsDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.function_call_arguments.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseFunctionCallArgumentsDoneEvent {
    event_id: String,

    /// The ID of the response
    response_id: String,
    /// The ID of the function call item
    item_id: String,
    /// The index of the output item in the response
    output_index: i32,
    /// The ID of the function call
    call_id: String,
    /// The completed function calling arguments
    arguments: String,
}

impl ResponseFunctionCallArgumentsDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn output_index(&self) -> i32 {
        self.output_index
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}
