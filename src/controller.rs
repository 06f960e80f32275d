//! Drives one interview session: pulls ordered inputs off a single
//! queue, feeds events through the processor, and executes whatever
//! actions the flow decides on.

use std::sync::Arc;

use interview_realtime_types::audio::Base64EncodedAudioBytes;
use interview_realtime_types::events::client::{SessionEndEvent, TextEvent};
use interview_realtime_types::ClientEvent;
use tokio::sync::mpsc;

use crate::api::{InterviewApi, RealtimeCredential};
use crate::interview::{question_directive, Action, InterviewFlow, InterviewStatus};
use crate::processor::{EventProcessor, Signal};
use crate::transport::link::ChannelEvent;
use crate::transport::SessionTransport;

const INPUT_CAPACITY: usize = 256;

/// Everything the controller reacts to, consumed strictly in order.
#[derive(Debug)]
pub enum ControllerInput {
    Channel(ChannelEvent),
    AskNext,
    ToggleMic,
    Shutdown,
}

/// Cloneable handle for feeding the controller from outside the loop.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerInput>,
}

impl ControllerHandle {
    pub async fn shutdown(&self) {
        let _ = self.tx.send(ControllerInput::Shutdown).await;
    }

    pub async fn ask_next(&self) {
        let _ = self.tx.send(ControllerInput::AskNext).await;
    }

    pub async fn toggle_mic(&self) {
        let _ = self.tx.send(ControllerInput::ToggleMic).await;
    }
}

pub struct InterviewController<A> {
    session_id: String,
    api: Arc<A>,
    transport: SessionTransport,
    processor: EventProcessor,
    flow: InterviewFlow,
    audio_sink: Option<mpsc::Sender<Base64EncodedAudioBytes>>,
    input_tx: mpsc::Sender<ControllerInput>,
    input_rx: mpsc::Receiver<ControllerInput>,
}

impl<A: InterviewApi + Send + Sync + 'static> InterviewController<A> {
    pub fn new(
        session_id: &str,
        api: Arc<A>,
        transport: SessionTransport,
        flow: InterviewFlow,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);
        Self {
            session_id: session_id.to_string(),
            api,
            transport,
            processor: EventProcessor::new(),
            flow,
            audio_sink: None,
            input_tx,
            input_rx,
        }
    }

    /// Wires decoded agent audio toward a playback task.
    pub fn set_audio_sink(&mut self, sink: mpsc::Sender<Base64EncodedAudioBytes>) {
        self.audio_sink = Some(sink);
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.input_tx.clone(),
        }
    }

    pub fn flow(&self) -> &InterviewFlow {
        &self.flow
    }

    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    /// Establishes the transport and runs the session until it ends or
    /// the channel is lost. The transport is always torn down on exit.
    pub async fn run(&mut self, credential: &RealtimeCredential) -> anyhow::Result<()> {
        let mut events = match self.transport.establish(credential).await {
            Ok(events) => events,
            Err(e) => {
                let reason = e.to_string();
                let actions = self.flow.on_transport_failed(Some(&reason));
                self.run_actions(actions).await;
                return Err(e.into());
            }
        };

        let pump_tx = self.input_tx.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if pump_tx.send(ControllerInput::Channel(event)).await.is_err() {
                    break;
                }
            }
        });

        while let Some(input) = self.input_rx.recv().await {
            if !self.handle_input(input).await {
                break;
            }
        }

        pump.abort();
        self.transport.teardown().await;
        Ok(())
    }

    async fn handle_input(&mut self, input: ControllerInput) -> bool {
        match input {
            ControllerInput::Channel(ChannelEvent::Open) => {
                tracing::info!("event channel open");
                let actions = self.flow.on_channel_ready();
                self.run_actions(actions).await
            }
            ControllerInput::Channel(ChannelEvent::Event(event)) => {
                for signal in self.processor.apply(event) {
                    if !self.handle_signal(signal).await {
                        return false;
                    }
                }
                true
            }
            ControllerInput::Channel(ChannelEvent::Closed { reason }) => {
                if self.flow.status() == InterviewStatus::Ended {
                    tracing::info!("channel closed after session end");
                    return false;
                }
                let actions = self.flow.on_transport_failed(reason.as_deref());
                self.run_actions(actions).await;
                false
            }
            ControllerInput::AskNext => {
                let actions = self.flow.ask_current_question();
                self.run_actions(actions).await
            }
            ControllerInput::ToggleMic => {
                let muted = self.transport.toggle_mute();
                tracing::info!("microphone {}", if muted { "muted" } else { "live" });
                true
            }
            ControllerInput::Shutdown => {
                tracing::info!("shutdown requested");
                let actions = self.flow.end_interview();
                self.run_actions(actions).await
            }
        }
    }

    async fn handle_signal(&mut self, signal: Signal) -> bool {
        match signal {
            Signal::CandidateSpeechStarted => {
                self.flow.on_candidate_speech_started();
                true
            }
            Signal::CandidateTranscript(text) => {
                tracing::info!("candidate said: {:?}", text);
                true
            }
            Signal::AgentSpeechStarted => {
                self.flow.on_agent_speech_started();
                true
            }
            Signal::AgentSpeechDone => {
                self.flow.on_agent_speech_done();
                true
            }
            Signal::AnswerStarted => {
                self.flow.on_answer_started();
                true
            }
            Signal::AnswerCompleted { answer } => {
                let last_heard = self.processor.last_transcript().map(|t| t.to_string());
                let actions = self.flow.on_answer_complete(answer, last_heard);
                self.processor.finish_turn();
                self.run_actions(actions).await
            }
            Signal::AgentAudio(audio) => {
                if let Some(sink) = &self.audio_sink {
                    if sink.try_send(audio).is_err() {
                        tracing::warn!("playback channel full, dropping an audio fragment");
                    }
                }
                true
            }
            Signal::ProtocolError(message) => {
                let actions = self.flow.on_protocol_error(&message);
                self.run_actions(actions).await
            }
        }
    }

    async fn run_actions(&mut self, actions: Vec<Action>) -> bool {
        for action in actions {
            if !self.execute(action).await {
                return false;
            }
        }
        true
    }

    /// Carries out one action; false means the session is over.
    async fn execute(&mut self, action: Action) -> bool {
        match action {
            Action::Ask { text } => {
                self.processor.record_posed_question(&text);
                let directive = question_directive(&text);
                let event = ClientEvent::Text(TextEvent::new(&directive));
                if !self.transport.send(event).await {
                    tracing::warn!("question directive was not sent");
                }
                true
            }
            Action::Persist(interaction) => {
                // Fire and forget; a failed save never stalls the flow.
                let api = self.api.clone();
                let session_id = self.session_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = api.save_interaction(&session_id, &interaction).await {
                        tracing::warn!("failed to persist interaction: {}", e);
                    }
                });
                true
            }
            Action::ScheduleNext { delay } => {
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(ControllerInput::AskNext).await;
                });
                true
            }
            Action::SendSessionEnd => {
                let event = ClientEvent::SessionEnd(SessionEndEvent::new());
                if !self.transport.send(event).await {
                    tracing::warn!("session end signal was not sent");
                }
                true
            }
            Action::CloseSession => {
                if let Err(e) = self.api.end_session(&self.session_id).await {
                    tracing::warn!("failed to mark the session ended: {}", e);
                }
                if let Err(e) = self.api.request_evaluation(&self.session_id).await {
                    tracing::warn!("failed to request an evaluation: {}", e);
                }
                self.transport.teardown().await;
                false
            }
            Action::Notice(message) => {
                tracing::info!("{}", message);
                true
            }
        }
    }
}
