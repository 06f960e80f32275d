//! Microphone capture behind a trait. The cpal stream is owned by a
//! dedicated thread because streams are not `Send`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use tokio::sync::mpsc;

use crate::config::INPUT_CHUNK_SIZE;
use crate::error::TransportError;

const FRAME_CHANNEL_CAPACITY: usize = 1024;

/// A block of mono samples straight off the device.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A running capture. Closing releases the device; dropping does too.
pub trait CaptureStream: Send {
    /// Takes the frame receiver. Yields `None` after the first call.
    fn frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>>;

    /// While muted the stream keeps producing frames, but zeroed ones.
    fn set_muted(&self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Stops the capture thread and releases the device.
    fn close(&mut self);
}

/// Opens capture streams against the preferred device.
pub trait AudioCapture: Send + Sync {
    fn open(&self) -> Result<Box<dyn CaptureStream>, TransportError>;
}

pub struct CpalCapture {
    device_name: Option<String>,
}

impl CpalCapture {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl AudioCapture for CpalCapture {
    fn open(&self) -> Result<Box<dyn CaptureStream>, TransportError> {
        let (frames_tx, frames_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let muted = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let device_name = self.device_name.clone();
        let thread_muted = muted.clone();
        let thread_stop = stop.clone();
        let thread = std::thread::spawn(move || {
            run_capture(device_name, frames_tx, thread_muted, thread_stop, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalCaptureStream {
                frames: Some(frames_rx),
                muted,
                stop,
                thread: Some(thread),
            })),
            Ok(Err(reason)) => {
                let _ = thread.join();
                Err(TransportError::MediaAccessDenied(reason))
            }
            Err(_) => {
                let _ = thread.join();
                Err(TransportError::MediaAccessDenied(
                    "capture thread exited before startup".to_string(),
                ))
            }
        }
    }
}

fn run_capture(
    device_name: Option<String>,
    frames_tx: mpsc::Sender<AudioFrame>,
    muted: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<Result<(), String>>,
) {
    let started = start_stream(device_name, frames_tx, muted);
    match started {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            while !stop.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(50));
            }
            drop(stream);
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
        }
    }
}

fn start_stream(
    device_name: Option<String>,
    frames_tx: mpsc::Sender<AudioFrame>,
    muted: Arc<AtomicBool>,
) -> anyhow::Result<cpal::Stream> {
    let device = interview_realtime_utils::device::get_or_default_input(device_name.as_deref())?;
    tracing::info!("using input device: {:?}", device.name()?);

    let default_config = device.default_input_config()?;
    let config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: default_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    let channel_count = config.channels as usize;
    let sample_rate = config.sample_rate.0;

    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let samples: Vec<f32> = if muted.load(Ordering::Relaxed) {
            vec![0.0; data.len() / channel_count.max(1)]
        } else if channel_count > 1 {
            // Mix interleaved channels down to mono.
            data.chunks(channel_count)
                .map(|frame| frame.iter().sum::<f32>() / channel_count as f32)
                .collect()
        } else {
            data.to_vec()
        };
        if frames_tx
            .try_send(AudioFrame {
                samples,
                sample_rate,
            })
            .is_err()
        {
            tracing::warn!("dropping capture frame, channel full or closed");
        }
    };

    let stream = device.build_input_stream(
        &config,
        input_data_fn,
        |err| tracing::error!("input stream error: {}", err),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

struct CpalCaptureStream {
    frames: Option<mpsc::Receiver<AudioFrame>>,
    muted: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CaptureStream for CpalCaptureStream {
    fn frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.frames.take()
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("capture thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}
