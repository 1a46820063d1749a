use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::AudioCommand;

mod clip;
mod engine;
mod frame;
mod fx;
mod voice;

pub use clip::{ClipBuffer, ClipId, next_clip_id};
pub use engine::{CompletedRecording, Engine};
pub use frame::StereoFrame;
pub use fx::{Biquad, DelayLine, FxBus, MAX_DELAY_SECONDS};
pub use voice::Voice;

// The control thread's grip on the audio side: a command sender, the
// completed-recording channel, and the streams kept alive by ownership.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    completed_rx: Receiver<CompletedRecording>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
    _input_stream: Option<cpal::Stream>, // None when no mic is available
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn poll_completed_recording(&self) -> Option<CompletedRecording> {
        self.completed_rx.try_recv().ok()
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    if config.sample_format() != cpal::SampleFormat::F32 {
        anyhow::bail!(
            "unsupported sample format {:?} (only f32 for now)",
            config.sample_format()
        );
    }
    if channels != 2 {
        anyhow::bail!("padloop needs a stereo output device, got {channels} channels");
    }

    let (input_tx, input_rx) = crossbeam_channel::bounded::<Vec<StereoFrame>>(2048);
    let (completed_tx, completed_rx) = crossbeam_channel::bounded::<CompletedRecording>(16);

    let output_stream = build_output_stream(
        &device,
        &config.into(),
        rx,
        input_rx,
        completed_tx,
        sample_rate.0,
    )?;
    output_stream
        .play()
        .context("failed to start output stream")?;

    let input_stream = try_build_input_stream(&host, sample_rate, input_tx);

    Ok(AudioHandle {
        tx,
        completed_rx,
        sample_rate: sample_rate.0,
        _output_stream: output_stream,
        _input_stream: input_stream,
    })
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    input_rx: Receiver<Vec<StereoFrame>>,
    completed_tx: Sender<CompletedRecording>,
    sample_rate: u32,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);
    engine.set_input_rx(input_rx);
    engine.set_completed_tx(completed_tx);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            engine.drain_input();

            // stereo interleaved f32 reinterpreted as frames (checked at setup)
            let n_frames = data.len() / 2;
            let frames: &mut [StereoFrame] = unsafe {
                std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
            };
            engine.render_block(frames);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// ── Input stream ──────────────────────────────────────────────────

fn try_build_input_stream(
    host: &cpal::Host,
    target_sample_rate: cpal::SampleRate,
    tx: Sender<Vec<StereoFrame>>,
) -> Option<cpal::Stream> {
    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            log::warn!("no default input device, mic recording disabled");
            return None;
        }
    };

    let supported = device.default_input_config().ok()?;
    let mut stream_config: cpal::StreamConfig = supported.into();
    stream_config.sample_rate = target_sample_rate;

    let in_channels = stream_config.channels as usize;

    let err_fn = |err| log::error!("audio input stream error: {err}");

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let frames: Vec<StereoFrame> = if in_channels == 1 {
                    data.iter().map(|&s| StereoFrame::splat(s)).collect()
                } else {
                    data.chunks_exact(in_channels)
                        .map(|c| StereoFrame {
                            left: c[0],
                            right: if c.len() > 1 { c[1] } else { c[0] },
                        })
                        .collect()
                };

                let _ = tx.try_send(frames);
            },
            err_fn,
            None,
        )
        .ok()?;

    if let Err(e) = stream.play() {
        log::warn!("could not start input stream: {e}");
        return None;
    }

    Some(stream)
}
