//! The interview state machine. Decides what happens next; all side
//! effects come out as [`Action`] values for the controller to execute.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Pause between a completed answer and the next question.
pub const NEXT_QUESTION_DELAY: Duration = Duration::from_secs(2);

/// Recorded when neither the structured answer nor a transcript exists.
const NO_ANSWER_FALLBACK: &str = "no answer recognized";

/// Lifecycle of the interview as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStatus {
    Connecting,
    Ready,
    Speaking,
    Listening,
    Ended,
    Error,
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InterviewStatus::Connecting => "connecting",
            InterviewStatus::Ready => "ready",
            InterviewStatus::Speaking => "speaking",
            InterviewStatus::Listening => "listening",
            InterviewStatus::Ended => "ended",
            InterviewStatus::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// One planned interview question as the backend serves it.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Question {
    pub id: String,
    pub number: u32,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Model answer for the evaluator; never read aloud.
    #[serde(default)]
    pub reference_answer: Option<String>,
}

/// A question paired with the answer that was accepted for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Interaction {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Side effects the controller must carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Direct the agent to pose this question.
    Ask { text: String },
    /// Save a finished interaction, without blocking the flow.
    Persist(Interaction),
    /// Queue an `AskNext` after the pacing delay.
    ScheduleNext { delay: Duration },
    /// Tell the agent the session is over.
    SendSessionEnd,
    /// Release the backend session and the transport.
    CloseSession,
    /// Operator-facing note; nothing to execute.
    Notice(String),
}

/// Tracks the question pointer and status across one interview.
///
/// The pointer only ever moves forward; a question is consumed the
/// moment its answer is accepted, whatever the answer looked like.
#[derive(Debug)]
pub struct InterviewFlow {
    status: InterviewStatus,
    questions: Vec<Question>,
    cursor: usize,
    interactions: Vec<Interaction>,
}

impl InterviewFlow {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            status: InterviewStatus::Connecting,
            questions,
            cursor: 0,
            interactions: Vec::new(),
        }
    }

    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    fn is_over(&self) -> bool {
        matches!(self.status, InterviewStatus::Ended | InterviewStatus::Error)
    }

    /// The event channel came up. The first ask goes through the
    /// scheduling queue like every later one.
    pub fn on_channel_ready(&mut self) -> Vec<Action> {
        if self.is_over() {
            return vec![];
        }
        self.status = InterviewStatus::Ready;
        if self.questions.is_empty() {
            return vec![Action::Notice(
                "no questions are loaded; waiting for the operator".to_string(),
            )];
        }
        vec![Action::ScheduleNext {
            delay: Duration::ZERO,
        }]
    }

    /// Poses the question under the pointer, or ends the interview when
    /// the list is exhausted.
    pub fn ask_current_question(&mut self) -> Vec<Action> {
        if self.is_over() {
            return vec![];
        }
        match self.questions.get(self.cursor) {
            Some(question) => {
                tracing::info!("asking question {}: {:?}", question.number, question.text);
                self.status = InterviewStatus::Speaking;
                vec![Action::Ask {
                    text: question.text.clone(),
                }]
            }
            None => self.end_interview(),
        }
    }

    pub fn on_agent_speech_started(&mut self) {
        if !self.is_over() {
            self.status = InterviewStatus::Speaking;
        }
    }

    pub fn on_agent_speech_done(&mut self) {
        if !self.is_over() {
            self.status = InterviewStatus::Listening;
        }
    }

    pub fn on_candidate_speech_started(&mut self) {
        if !self.is_over() {
            self.status = InterviewStatus::Listening;
        }
    }

    /// The agent marked the answer as underway; the candidate has the
    /// floor even if no speech-state event preceded the call.
    pub fn on_answer_started(&mut self) {
        tracing::debug!("agent marked the answer as underway");
        if !self.is_over() {
            self.status = InterviewStatus::Listening;
        }
    }

    /// Accepts the answer for the current question and moves the pointer.
    ///
    /// The structured answer wins; the last heard transcript is the
    /// fallback; a fixed marker is recorded when neither exists.
    pub fn on_answer_complete(
        &mut self,
        structured: Option<String>,
        last_heard: Option<String>,
    ) -> Vec<Action> {
        if self.is_over() {
            return vec![];
        }
        let question = match self.questions.get(self.cursor) {
            Some(question) => question.clone(),
            None => {
                tracing::warn!("answer completion with no question under the pointer");
                return vec![];
            }
        };

        let answer = structured
            .filter(|answer| !answer.trim().is_empty())
            .or_else(|| last_heard.filter(|heard| !heard.trim().is_empty()))
            .unwrap_or_else(|| NO_ANSWER_FALLBACK.to_string());

        let interaction = Interaction {
            question_id: question.id.clone(),
            question: question.text.clone(),
            answer,
            created_at: Utc::now(),
        };
        self.interactions.push(interaction.clone());
        self.cursor += 1;

        if self.cursor < self.questions.len() {
            self.status = InterviewStatus::Ready;
        }

        vec![
            Action::Persist(interaction),
            Action::ScheduleNext {
                delay: NEXT_QUESTION_DELAY,
            },
        ]
    }

    pub fn on_protocol_error(&mut self, message: &str) -> Vec<Action> {
        vec![Action::Notice(format!("agent reported an error: {}", message))]
    }

    /// Winds the session down. Only the first call produces actions.
    pub fn end_interview(&mut self) -> Vec<Action> {
        if self.status == InterviewStatus::Ended {
            return vec![];
        }
        tracing::info!(
            "ending interview after {} of {} questions",
            self.interactions.len(),
            self.questions.len()
        );
        self.status = InterviewStatus::Ended;
        vec![Action::SendSessionEnd, Action::CloseSession]
    }

    /// The transport dropped out from under a live interview. Collected
    /// interactions stay intact for inspection.
    pub fn on_transport_failed(&mut self, reason: Option<&str>) -> Vec<Action> {
        if self.status == InterviewStatus::Ended {
            return vec![];
        }
        self.status = InterviewStatus::Error;
        vec![Action::Notice(format!(
            "connection lost: {}",
            reason.unwrap_or("no reason given")
        ))]
    }
}

/// The directive the agent speaks from when posing a question.
pub fn question_directive(question: &str) -> String {
    format!(
        "Ask the candidate the following interview question. Read it naturally, \
         then wait silently for their answer: {}",
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(number: u32, text: &str) -> Question {
        Question {
            id: format!("q{}", number),
            number,
            text: text.to_string(),
            category: None,
            difficulty: None,
            reference_answer: None,
        }
    }

    fn three_questions() -> Vec<Question> {
        vec![
            question(1, "Why Rust?"),
            question(2, "Describe a hard bug."),
            question(3, "What would you redesign?"),
        ]
    }

    fn complete_answer(flow: &mut InterviewFlow, answer: &str) -> Vec<Action> {
        flow.on_agent_speech_started();
        flow.on_agent_speech_done();
        flow.on_answer_complete(Some(answer.to_string()), None)
    }

    #[test]
    fn walks_the_status_sequence_for_three_questions() {
        let mut flow = InterviewFlow::new(three_questions());
        let mut trace = vec![flow.status()];

        flow.on_channel_ready();
        trace.push(flow.status());

        for answer in ["one", "two", "three"] {
            flow.ask_current_question();
            trace.push(flow.status());
            flow.on_agent_speech_started();
            flow.on_agent_speech_done();
            trace.push(flow.status());
            flow.on_answer_complete(Some(answer.to_string()), None);
            trace.push(flow.status());
        }

        flow.ask_current_question();
        trace.push(flow.status());

        use InterviewStatus::*;
        assert_eq!(
            trace,
            vec![
                Connecting, Ready, Speaking, Listening, Ready, Speaking, Listening, Ready,
                Speaking, Listening, Listening, Ended,
            ]
        );
    }

    #[test]
    fn answer_started_marks_the_candidate_listening() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        assert_eq!(flow.status(), InterviewStatus::Speaking);

        flow.on_answer_started();
        assert_eq!(flow.status(), InterviewStatus::Listening);

        flow.end_interview();
        flow.on_answer_started();
        assert_eq!(flow.status(), InterviewStatus::Ended);
    }

    #[test]
    fn candidate_speech_moves_the_status_to_listening() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        assert_eq!(flow.status(), InterviewStatus::Speaking);

        flow.on_candidate_speech_started();
        assert_eq!(flow.status(), InterviewStatus::Listening);
    }

    #[test]
    fn no_ready_after_the_final_answer() {
        let mut flow = InterviewFlow::new(vec![question(1, "Only one.")]);
        flow.on_channel_ready();
        flow.ask_current_question();
        complete_answer(&mut flow, "done");

        assert_ne!(flow.status(), InterviewStatus::Ready);
    }

    #[test]
    fn structured_answer_wins_over_transcript() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        let actions =
            flow.on_answer_complete(Some("structured".to_string()), Some("heard".to_string()));

        match &actions[0] {
            Action::Persist(interaction) => assert_eq!(interaction.answer, "structured"),
            other => panic!("expected a persist action, got {:?}", other),
        }
    }

    #[test]
    fn transcript_fills_in_for_a_missing_structured_answer() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        let actions = flow.on_answer_complete(None, Some("heard".to_string()));

        match &actions[0] {
            Action::Persist(interaction) => assert_eq!(interaction.answer, "heard"),
            other => panic!("expected a persist action, got {:?}", other),
        }
    }

    #[test]
    fn missing_answers_fall_back_to_the_marker() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        let actions = flow.on_answer_complete(Some("   ".to_string()), None);

        match &actions[0] {
            Action::Persist(interaction) => assert_eq!(interaction.answer, "no answer recognized"),
            other => panic!("expected a persist action, got {:?}", other),
        }
    }

    #[test]
    fn every_answer_schedules_the_next_question() {
        let mut flow = InterviewFlow::new(vec![question(1, "Only one.")]);
        flow.on_channel_ready();
        flow.ask_current_question();
        let actions = flow.on_answer_complete(Some("done".to_string()), None);

        assert!(actions.iter().any(|action| matches!(
            action,
            Action::ScheduleNext { delay } if *delay == NEXT_QUESTION_DELAY
        )));
    }

    #[test]
    fn exhausting_the_questions_ends_the_interview() {
        let mut flow = InterviewFlow::new(vec![question(1, "Only one.")]);
        flow.on_channel_ready();
        flow.ask_current_question();
        complete_answer(&mut flow, "done");

        let actions = flow.ask_current_question();
        assert_eq!(actions, vec![Action::SendSessionEnd, Action::CloseSession]);
        assert_eq!(flow.status(), InterviewStatus::Ended);
    }

    #[test]
    fn end_interview_only_fires_once() {
        let mut flow = InterviewFlow::new(three_questions());
        assert_eq!(
            flow.end_interview(),
            vec![Action::SendSessionEnd, Action::CloseSession]
        );
        assert!(flow.end_interview().is_empty());
        assert_eq!(flow.status(), InterviewStatus::Ended);
    }

    #[test]
    fn nothing_moves_after_the_interview_ended() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.end_interview();

        assert!(flow.ask_current_question().is_empty());
        assert!(flow
            .on_answer_complete(Some("late".to_string()), None)
            .is_empty());
        assert!(flow.interactions().is_empty());
        assert_eq!(flow.status(), InterviewStatus::Ended);
    }

    #[test]
    fn transport_loss_keeps_collected_interactions() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        complete_answer(&mut flow, "first");

        let actions = flow.on_transport_failed(Some("socket reset"));
        assert_eq!(flow.status(), InterviewStatus::Error);
        assert_eq!(flow.interactions().len(), 1);
        assert!(matches!(actions[0], Action::Notice(_)));
    }

    #[test]
    fn transport_loss_after_a_clean_end_is_ignored() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.end_interview();

        assert!(flow.on_transport_failed(None).is_empty());
        assert_eq!(flow.status(), InterviewStatus::Ended);
    }

    #[test]
    fn empty_question_lists_only_notice() {
        let mut flow = InterviewFlow::new(vec![]);
        let actions = flow.on_channel_ready();

        assert_eq!(flow.status(), InterviewStatus::Ready);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], Action::Notice(_)));
    }

    #[test]
    fn pointer_never_regresses() {
        let mut flow = InterviewFlow::new(three_questions());
        flow.on_channel_ready();
        flow.ask_current_question();
        complete_answer(&mut flow, "first");

        assert_eq!(flow.current_question().map(|q| q.number), Some(2));
        flow.ask_current_question();
        flow.ask_current_question();
        assert_eq!(flow.current_question().map(|q| q.number), Some(2));
    }
}
