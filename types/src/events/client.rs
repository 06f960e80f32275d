use crate::audio::Base64EncodedAudioBytes;

/// `text` event, the directive channel toward the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TextEvent {
    /// The directive text for the agent to act on
    text: String,
    /// The role the directive is attributed to, `system` for interviewer control
    role: String,
}

impl TextEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            role: "system".to_string(),
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

/// `session.end` event, asks the agent to wind the session down.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionEndEvent {}

impl SessionEndEvent {
    pub fn new() -> Self {
        Self {}
    }
}

/// `input_audio_buffer.append` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InputAudioBufferAppendEvent {
    /// The audio data to append to the buffer
    audio: Base64EncodedAudioBytes,
}

impl InputAudioBufferAppendEvent {
    pub fn new(audio: Base64EncodedAudioBytes) -> Self {
        Self { audio }
    }

    pub fn audio(&self) -> &Base64EncodedAudioBytes {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use crate::ClientEvent;

    #[test]
    fn text_event_wire_shape() {
        let event = ClientEvent::Text(super::TextEvent::new("Ask the next question."));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"text","text":"Ask the next question.","role":"system"}"#
        );
    }

    #[test]
    fn session_end_wire_shape() {
        let event = ClientEvent::SessionEnd(super::SessionEndEvent::new());
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"session.end"}"#);
    }

    #[test]
    fn audio_append_wire_shape() {
        let event = ClientEvent::InputAudioBufferAppend(super::InputAudioBufferAppendEvent::new(
            "AAAA".to_string(),
        ));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"input_audio_buffer.append","audio":"AAAA"}"#);
    }
}
