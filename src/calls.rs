//! Accumulates streamed function-call arguments and decodes completed
//! calls into typed values the interview flow can dispatch on.

use std::collections::HashMap;

/// Wire name of the call announcing the candidate began answering.
const CALL_ANSWER_STARTED: &str = "answer_started";
/// Wire name of the call carrying the finished answer.
const CALL_ANSWER_COMPLETE: &str = "answer_complete";

/// A function call from the agent, decoded and ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionCall {
    AnswerStarted,
    AnswerComplete { answer: Option<String> },
}

#[derive(Debug)]
struct PendingCall {
    name: String,
    arguments: String,
}

/// In-flight calls keyed by call id. Arguments stream in as fragments
/// and are only parsed once the call completes.
#[derive(Debug, Default)]
pub struct CallBuffer {
    pending: HashMap<String, PendingCall>,
}

impl CallBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a call. A stale entry under the same id is discarded.
    pub fn start(&mut self, call_id: &str, name: &str) {
        let previous = self.pending.insert(
            call_id.to_string(),
            PendingCall {
                name: name.to_string(),
                arguments: String::new(),
            },
        );
        if previous.is_some() {
            tracing::debug!("restarted call {} over a stale entry", call_id);
        }
    }

    /// Appends an argument fragment. Fragments for unknown ids are dropped.
    pub fn append(&mut self, call_id: &str, fragment: &str) {
        match self.pending.get_mut(call_id) {
            Some(call) => call.arguments.push_str(fragment),
            None => tracing::debug!("dropping argument fragment for unknown call {}", call_id),
        }
    }

    /// Completes a call and decodes it. The entry is removed whether or
    /// not the arguments parse; a second completion is a no-op.
    pub fn finish(&mut self, call_id: &str) -> Option<FunctionCall> {
        let call = match self.pending.remove(call_id) {
            Some(call) => call,
            None => {
                tracing::debug!("completion for unknown call {}", call_id);
                return None;
            }
        };

        let arguments: serde_json::Value =
            serde_json::from_str(&call.arguments).unwrap_or_else(|e| {
                tracing::warn!(
                    "arguments of call {} failed to parse ({}), treating as empty",
                    call_id,
                    e
                );
                serde_json::Value::Object(serde_json::Map::new())
            });

        match call.name.as_str() {
            CALL_ANSWER_STARTED => Some(FunctionCall::AnswerStarted),
            CALL_ANSWER_COMPLETE => {
                let answer = arguments
                    .get("answer")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                Some(FunctionCall::AnswerComplete { answer })
            }
            other => {
                tracing::debug!("ignoring unrecognized call {:?}", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_arguments_split_mid_token() {
        let mut calls = CallBuffer::new();
        calls.start("call-1", "answer_complete");
        calls.append("call-1", "{\"an");
        calls.append("call-1", "swer\":\"ye");
        calls.append("call-1", "s\"}");

        assert_eq!(
            calls.finish("call-1"),
            Some(FunctionCall::AnswerComplete {
                answer: Some("yes".to_string())
            })
        );
    }

    #[test]
    fn fragments_for_unknown_ids_are_dropped() {
        let mut calls = CallBuffer::new();
        calls.append("call-9", "{\"answer\":\"lost\"}");
        assert_eq!(calls.finish("call-9"), None);
    }

    #[test]
    fn unparseable_arguments_fall_back_to_empty() {
        let mut calls = CallBuffer::new();
        calls.start("call-2", "answer_complete");
        calls.append("call-2", "{\"answer\": truncated");

        assert_eq!(
            calls.finish("call-2"),
            Some(FunctionCall::AnswerComplete { answer: None })
        );
    }

    #[test]
    fn blank_answers_are_treated_as_missing() {
        let mut calls = CallBuffer::new();
        calls.start("call-3", "answer_complete");
        calls.append("call-3", "{\"answer\": \"   \"}");

        assert_eq!(
            calls.finish("call-3"),
            Some(FunctionCall::AnswerComplete { answer: None })
        );
    }

    #[test]
    fn restart_discards_the_stale_buffer() {
        let mut calls = CallBuffer::new();
        calls.start("call-4", "answer_complete");
        calls.append("call-4", "{\"answer\":\"old");
        calls.start("call-4", "answer_complete");
        calls.append("call-4", "{\"answer\":\"new\"}");

        assert_eq!(
            calls.finish("call-4"),
            Some(FunctionCall::AnswerComplete {
                answer: Some("new".to_string())
            })
        );
    }

    #[test]
    fn second_completion_is_a_no_op() {
        let mut calls = CallBuffer::new();
        calls.start("call-5", "answer_started");
        assert_eq!(calls.finish("call-5"), Some(FunctionCall::AnswerStarted));
        assert_eq!(calls.finish("call-5"), None);
    }

    #[test]
    fn unrecognized_call_names_decode_to_none() {
        let mut calls = CallBuffer::new();
        calls.start("call-6", "adjust_difficulty");
        calls.append("call-6", "{}");
        assert_eq!(calls.finish("call-6"), None);
    }
}
