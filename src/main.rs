use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use rubato::Resampler;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

use interview_realtime::api::{InterviewApi, InterviewApiClient};
use interview_realtime::config::{Config, OUTPUT_CHUNK_SIZE, OUTPUT_LATENCY_MS};
use interview_realtime::controller::InterviewController;
use interview_realtime::interview::InterviewFlow;
use interview_realtime::transport::capture::CpalCapture;
use interview_realtime::transport::negotiate::HttpNegotiator;
use interview_realtime::transport::ws::WsLinkFactory;
use interview_realtime::transport::SessionTransport;
use interview_realtime::utils;

#[derive(Debug, Parser)]
#[command(about = "Runs a live interview session from the terminal")]
struct Cli {
    /// The interview scenario to instantiate
    #[arg(required_unless_present = "list_devices")]
    scenario_id: Option<String>,

    /// Capture device name; the default input when omitted
    #[arg(long)]
    device: Option<String>,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Device listing needs no backend configuration.
    if args.list_devices {
        println!("input devices:\n{}", utils::device::describe_inputs()?);
        println!("output devices:\n{}", utils::device::describe_outputs()?);
        return Ok(());
    }

    let config = Config::from_env().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let scenario_id = args.scenario_id.context("a scenario id is required")?;

    let api = Arc::new(InterviewApiClient::new(
        &config.api_base_url,
        config.api_key,
    ));

    tracing::info!("creating a session for scenario {}", scenario_id);
    let session = api.create_session(&scenario_id).await?;
    let detail = api.fetch_session(&session.id).await?;
    tracing::info!(
        "session {} loaded with {} question(s)",
        detail.id,
        detail.questions.len()
    );
    let credential = api.start_session(&session.id).await?;

    // Playback path: decoded agent audio is resampled to the output
    // device rate and drained by the cpal callback from a ring buffer.
    let output =
        utils::device::get_or_default_output(None).context("failed to get an output device")?;
    tracing::info!("using output device: {:?}", output.name()?);
    let default_output_config = output
        .default_output_config()
        .context("failed to get the output config")?;
    let output_config = StreamConfig {
        channels: default_output_config.channels(),
        sample_rate: default_output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    let output_channels = output_config.channels as usize;
    let output_sample_rate = output_config.sample_rate.0 as f64;

    let buffer =
        utils::audio::shared_buffer(output_sample_rate as usize * OUTPUT_LATENCY_MS / 1000);
    let (mut producer, mut consumer) = buffer.split();

    let output_stream = output.build_output_stream(
        &output_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(output_channels) {
                let sample = consumer.try_pop().unwrap_or(0.0);
                for slot in frame.iter_mut() {
                    *slot = sample;
                }
            }
        },
        move |err| tracing::error!("output stream error: {}", err),
        None,
    )?;
    output_stream.play()?;

    let (audio_tx, mut audio_rx) = tokio::sync::mpsc::channel::<String>(100);
    let playback = tokio::spawn(async move {
        let mut resampler = match utils::audio::create_resampler(
            utils::audio::REALTIME_PCM16_SAMPLE_RATE,
            output_sample_rate,
            OUTPUT_CHUNK_SIZE,
        ) {
            Ok(resampler) => resampler,
            Err(e) => {
                tracing::error!("failed to create the playback resampler: {}", e);
                return;
            }
        };
        while let Some(fragment) = audio_rx.recv().await {
            let samples = utils::audio::decode(&fragment);
            for chunk in utils::audio::split_for_chunks(&samples, OUTPUT_CHUNK_SIZE) {
                match resampler.process(&[chunk.as_slice()], None) {
                    Ok(blocks) => {
                        if let Some(block) = blocks.first() {
                            for sample in block {
                                if producer.try_push(*sample).is_err() {
                                    tracing::warn!("playback buffer full, dropping a sample");
                                }
                            }
                        }
                    }
                    Err(e) => tracing::warn!("playback resampling failed: {}", e),
                }
            }
        }
    });

    let capture = CpalCapture::new(args.device.clone().or(config.capture_device));
    let negotiator = HttpNegotiator::new(&config.negotiate_url);
    let factory = WsLinkFactory::new(&config.channel_url);
    let transport = SessionTransport::new(
        Box::new(capture),
        Box::new(negotiator),
        Box::new(factory),
    );

    let flow = InterviewFlow::new(detail.questions);
    let mut controller = InterviewController::new(&session.id, api, transport, flow);
    controller.set_audio_sink(audio_tx);

    let handle = controller.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, ending the interview...");
            handle.shutdown().await;
        }
    });

    let outcome = controller.run(&credential).await;
    tracing::info!(
        "interview finished with status: {}",
        controller.flow().status()
    );

    for message in controller.processor().messages() {
        let marker = if message.is_question { "Q" } else { " " };
        println!(
            "[{}] {}{}: {}",
            message.timestamp.format("%H:%M:%S"),
            marker,
            message.speaker,
            message.text
        );
    }

    playback.abort();
    outcome
}
