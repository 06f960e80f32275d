//! Turns the ordered stream of agent events into transcript state and
//! flow signals. Holds no interview logic itself; the flow decides what
//! each signal means.

use chrono::{DateTime, Utc};
use interview_realtime_types::audio::Base64EncodedAudioBytes;
use interview_realtime_types::{ItemRole, ItemType, ServerEvent};

use crate::calls::{CallBuffer, FunctionCall};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Agent,
    Candidate,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Agent => write!(f, "agent"),
            Speaker::Candidate => write!(f, "candidate"),
        }
    }
}

/// One finalized transcript entry.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// True for agent entries that pose an interview question.
    pub is_question: bool,
}

impl Message {
    fn new(speaker: Speaker, text: &str, is_question: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker,
            text: text.to_string(),
            timestamp: Utc::now(),
            is_question,
        }
    }
}

/// What an applied event means for the interview, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    CandidateSpeechStarted,
    /// A finalized candidate utterance.
    CandidateTranscript(String),
    AgentSpeechStarted,
    AgentSpeechDone,
    AnswerStarted,
    /// The agent judged the answer finished; `answer` is its structured
    /// summary when one was supplied.
    AnswerCompleted { answer: Option<String> },
    /// A fragment of agent speech audio for playback.
    AgentAudio(Base64EncodedAudioBytes),
    ProtocolError(String),
}

/// Accumulates transcript and call state across one session.
#[derive(Debug, Default)]
pub struct EventProcessor {
    messages: Vec<Message>,
    /// The agent reply currently streaming in, replaced wholesale on done.
    live_reply: String,
    /// The most recent finalized candidate utterance.
    last_transcript: Option<String>,
    calls: CallBuffer,
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn live_reply(&self) -> &str {
        &self.live_reply
    }

    pub fn last_transcript(&self) -> Option<&str> {
        self.last_transcript.as_deref()
    }

    /// Records a question the controller just posed, so the transcript
    /// shows it even if the agent rephrases while speaking.
    pub fn record_posed_question(&mut self, text: &str) {
        self.messages.push(Message::new(Speaker::Agent, text, true));
    }

    /// Applies one event and returns the signals it produced.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<Signal> {
        match event {
            ServerEvent::Close { reason } => {
                // Lifecycle is the transport's concern; reaching here means
                // the link surfaced it as a regular event.
                tracing::debug!("close event in the stream: {:?}", reason);
                vec![]
            }
            ServerEvent::Error(data) => {
                let message = data.error().message().to_string();
                tracing::warn!("agent error: {}", message);
                vec![Signal::ProtocolError(message)]
            }
            ServerEvent::SessionCreated(data) => {
                tracing::info!(
                    "realtime session created: {}",
                    data.session().id().unwrap_or("unknown")
                );
                vec![]
            }
            ServerEvent::InputAudioBufferSpeechStarted(data) => {
                tracing::debug!("candidate speech started at {}ms", data.audio_start_ms());
                vec![Signal::CandidateSpeechStarted]
            }
            ServerEvent::InputAudioBufferSpeechStopped(data) => {
                tracing::debug!("candidate speech stopped at {}ms", data.audio_end_ms());
                vec![]
            }
            ServerEvent::ConversationItemCreated(data) => {
                let item = data.item();
                tracing::debug!("conversation item created: {}", item.id().unwrap_or("unknown"));
                // Candidate items are covered by their transcription events.
                if item.role() == Some(ItemRole::Assistant) {
                    if let Some(text) = item.content().iter().find_map(|part| part.text()) {
                        if !text.is_empty() {
                            self.live_reply = text.to_string();
                            self.messages.push(Message::new(Speaker::Agent, text, false));
                        }
                    }
                }
                vec![]
            }
            ServerEvent::ConversationItemInputAudioTranscriptionCompleted(data) => {
                let transcript = data.transcript().trim();
                if transcript.is_empty() {
                    tracing::debug!("skipping empty transcript for item {}", data.item_id());
                    return vec![];
                }
                self.messages
                    .push(Message::new(Speaker::Candidate, transcript, false));
                self.last_transcript = Some(transcript.to_string());
                vec![Signal::CandidateTranscript(transcript.to_string())]
            }
            ServerEvent::OutputAudioBufferStarted(_) => vec![Signal::AgentSpeechStarted],
            ServerEvent::OutputAudioBufferStopped(_) => vec![Signal::AgentSpeechDone],
            ServerEvent::ResponseTextDelta(data) => {
                self.live_reply.push_str(data.delta());
                vec![]
            }
            ServerEvent::ResponseTextDone(data) => {
                self.finish_reply(data.text());
                vec![]
            }
            ServerEvent::ResponseAudioTranscriptDelta(data) => {
                self.live_reply.push_str(data.delta());
                vec![]
            }
            ServerEvent::ResponseAudioTranscriptDone(data) => {
                self.finish_reply(data.transcript());
                vec![]
            }
            ServerEvent::ResponseAudioDelta(data) => {
                vec![Signal::AgentAudio(data.delta().to_string())]
            }
            ServerEvent::ResponseDone(data) => {
                tracing::debug!(
                    "response {} finished with status {}",
                    data.response().id().unwrap_or("unknown"),
                    data.response().status().unwrap_or("unknown")
                );
                self.live_reply.clear();
                vec![]
            }
            ServerEvent::ResponseOutputItemAdded(data) => {
                let item = data.item();
                if item.item_type() == ItemType::FunctionCall {
                    if let (Some(call_id), Some(name)) = (item.call_id(), item.name()) {
                        self.calls.start(call_id, name);
                    }
                }
                vec![]
            }
            ServerEvent::ResponseFunctionCallArgumentsDelta(data) => {
                self.calls.append(data.call_id(), data.delta());
                vec![]
            }
            ServerEvent::ResponseFunctionCallArgumentsDone(data) => {
                match self.calls.finish(data.call_id()) {
                    Some(FunctionCall::AnswerStarted) => vec![Signal::AnswerStarted],
                    Some(FunctionCall::AnswerComplete { answer }) => {
                        vec![Signal::AnswerCompleted { answer }]
                    }
                    None => vec![],
                }
            }
        }
    }

    /// Drops the per-turn buffers once an answer has been accepted.
    pub fn finish_turn(&mut self) {
        self.live_reply.clear();
        self.last_transcript = None;
    }

    /// The streamed reply is finalized: the done text wins over whatever
    /// the deltas accumulated.
    fn finish_reply(&mut self, text: &str) {
        self.live_reply = text.to_string();
        if !text.is_empty() {
            self.messages.push(Message::new(Speaker::Agent, text, false));
            tracing::info!("agent said: {:?}", text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> ServerEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn deltas_accumulate_without_creating_messages() {
        let mut processor = EventProcessor::new();
        let signals = processor.apply(event(
            r#"{"type":"response.audio_transcript.delta","event_id":"e1","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,"delta":"Tell me"}"#,
        ));
        assert!(signals.is_empty());
        processor.apply(event(
            r#"{"type":"response.audio_transcript.delta","event_id":"e2","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,"delta":" about yourself"}"#,
        ));

        assert_eq!(processor.live_reply(), "Tell me about yourself");
        assert!(processor.messages().is_empty());
    }

    #[test]
    fn done_text_replaces_the_accumulated_reply() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"response.audio_transcript.delta","event_id":"e1","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,"delta":"Tell me abo"}"#,
        ));
        processor.apply(event(
            r#"{"type":"response.audio_transcript.done","event_id":"e2","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,
                "transcript":"Tell me about yourself."}"#,
        ));

        assert_eq!(processor.live_reply(), "Tell me about yourself.");
        assert_eq!(processor.messages().len(), 1);
        let message = &processor.messages()[0];
        assert_eq!(message.speaker, Speaker::Agent);
        assert_eq!(message.text, "Tell me about yourself.");
        assert!(!message.is_question);
    }

    #[test]
    fn response_done_resets_the_live_reply() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"response.text.delta","event_id":"e1","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,"delta":"partial"}"#,
        ));
        processor.apply(event(
            r#"{"type":"response.done","event_id":"e2",
                "response":{"id":"r1","status":"completed"}}"#,
        ));

        assert_eq!(processor.live_reply(), "");
    }

    #[test]
    fn transcription_records_the_candidate_and_signals() {
        let mut processor = EventProcessor::new();
        let signals = processor.apply(event(
            r#"{"type":"conversation.item.input_audio_transcription.completed",
                "event_id":"e1","item_id":"i1","content_index":0,
                "transcript":"  I worked on search infrastructure.  "}"#,
        ));

        assert_eq!(
            signals,
            vec![Signal::CandidateTranscript(
                "I worked on search infrastructure.".to_string()
            )]
        );
        assert_eq!(
            processor.last_transcript(),
            Some("I worked on search infrastructure.")
        );
        assert_eq!(processor.messages().len(), 1);
        assert_eq!(processor.messages()[0].speaker, Speaker::Candidate);
    }

    #[test]
    fn agent_items_with_text_become_messages() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"conversation.item.created","event_id":"e1","previous_item_id":null,
                "item":{"id":"i2","type":"message","status":"completed","role":"assistant",
                        "content":[{"type":"text","text":"Let us begin."}]}}"#,
        ));

        assert_eq!(processor.messages().len(), 1);
        assert_eq!(processor.messages()[0].speaker, Speaker::Agent);
        assert_eq!(processor.messages()[0].text, "Let us begin.");
        assert_eq!(processor.live_reply(), "Let us begin.");
    }

    #[test]
    fn candidate_items_wait_for_their_transcription() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"conversation.item.created","event_id":"e1","previous_item_id":null,
                "item":{"id":"i3","type":"message","status":"completed","role":"user",
                        "content":[{"type":"input_audio","transcript":"I like Rust."}]}}"#,
        ));

        assert!(processor.messages().is_empty());
        assert_eq!(processor.last_transcript(), None);
    }

    #[test]
    fn finishing_a_turn_clears_the_transient_buffers() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"conversation.item.input_audio_transcription.completed",
                "event_id":"e1","item_id":"i1","content_index":0,
                "transcript":"Borrowed, mostly."}"#,
        ));
        processor.apply(event(
            r#"{"type":"response.audio_transcript.delta","event_id":"e2","response_id":"r1",
                "item_id":"i2","output_index":0,"content_index":0,"delta":"And"}"#,
        ));

        processor.finish_turn();

        assert_eq!(processor.last_transcript(), None);
        assert_eq!(processor.live_reply(), "");
        assert_eq!(processor.messages().len(), 1);
    }

    #[test]
    fn empty_transcriptions_are_skipped() {
        let mut processor = EventProcessor::new();
        let signals = processor.apply(event(
            r#"{"type":"conversation.item.input_audio_transcription.completed",
                "event_id":"e1","item_id":"i1","content_index":0,"transcript":"  \n"}"#,
        ));

        assert!(signals.is_empty());
        assert!(processor.messages().is_empty());
        assert_eq!(processor.last_transcript(), None);
    }

    #[test]
    fn function_call_stream_decodes_into_one_completion_signal() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"response.output_item.added","event_id":"e1","response_id":"r1",
                "output_index":0,
                "item":{"id":"i9","type":"function_call","status":"in_progress",
                        "call_id":"c1","name":"answer_complete"}}"#,
        ));
        processor.apply(event(
            r#"{"type":"response.function_call_arguments.delta","event_id":"e2",
                "response_id":"r1","item_id":"i9","output_index":0,"call_id":"c1",
                "delta":"{\"answer\":\"Rust"}"#,
        ));
        processor.apply(event(
            r#"{"type":"response.function_call_arguments.delta","event_id":"e3",
                "response_id":"r1","item_id":"i9","output_index":0,"call_id":"c1",
                "delta":" and Go\"}"}"#,
        ));
        let signals = processor.apply(event(
            r#"{"type":"response.function_call_arguments.done","event_id":"e4",
                "response_id":"r1","item_id":"i9","output_index":0,"call_id":"c1",
                "arguments":"{\"answer\":\"Rust and Go\"}"}"#,
        ));

        assert_eq!(
            signals,
            vec![Signal::AnswerCompleted {
                answer: Some("Rust and Go".to_string())
            }]
        );
    }

    #[test]
    fn answer_started_call_signals_without_arguments() {
        let mut processor = EventProcessor::new();
        processor.apply(event(
            r#"{"type":"response.output_item.added","event_id":"e1","response_id":"r1",
                "output_index":0,
                "item":{"id":"i3","type":"function_call","status":"in_progress",
                        "call_id":"c2","name":"answer_started"}}"#,
        ));
        let signals = processor.apply(event(
            r#"{"type":"response.function_call_arguments.done","event_id":"e2",
                "response_id":"r1","item_id":"i3","output_index":0,"call_id":"c2",
                "arguments":"{}"}"#,
        ));

        assert_eq!(signals, vec![Signal::AnswerStarted]);
    }

    #[test]
    fn speech_and_audio_lifecycle_signals() {
        let mut processor = EventProcessor::new();

        let started = processor.apply(event(
            r#"{"type":"input_audio_buffer.speech_started","event_id":"e1",
                "audio_start_ms":120,"item_id":"i1"}"#,
        ));
        assert_eq!(started, vec![Signal::CandidateSpeechStarted]);

        let stopped = processor.apply(event(
            r#"{"type":"input_audio_buffer.speech_stopped","event_id":"e2",
                "audio_end_ms":3480,"item_id":"i1"}"#,
        ));
        assert!(stopped.is_empty());

        let playing = processor.apply(event(
            r#"{"type":"output_audio_buffer.started","event_id":"e3","response_id":"r1"}"#,
        ));
        assert_eq!(playing, vec![Signal::AgentSpeechStarted]);

        let done = processor.apply(event(
            r#"{"type":"output_audio_buffer.stopped","event_id":"e4","response_id":"r1"}"#,
        ));
        assert_eq!(done, vec![Signal::AgentSpeechDone]);
    }

    #[test]
    fn audio_deltas_surface_for_playback() {
        let mut processor = EventProcessor::new();
        let signals = processor.apply(event(
            r#"{"type":"response.audio.delta","event_id":"e1","response_id":"r1",
                "item_id":"i1","output_index":0,"content_index":0,"delta":"AAAA"}"#,
        ));

        assert_eq!(signals, vec![Signal::AgentAudio("AAAA".to_string())]);
    }

    #[test]
    fn protocol_errors_carry_the_message() {
        let mut processor = EventProcessor::new();
        let signals = processor.apply(event(
            r#"{"type":"error","event_id":"e1",
                "error":{"type":"invalid_request_error","code":null,
                         "message":"directive rejected","param":null,"event_id":null}}"#,
        ));

        assert_eq!(
            signals,
            vec![Signal::ProtocolError("directive rejected".to_string())]
        );
    }

    #[test]
    fn posed_questions_enter_the_transcript() {
        let mut processor = EventProcessor::new();
        processor.record_posed_question("Why Rust?");

        assert_eq!(processor.messages().len(), 1);
        assert!(processor.messages()[0].is_question);
        assert_eq!(processor.messages()[0].speaker, Speaker::Agent);
    }
}
