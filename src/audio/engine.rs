use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::clip::{ClipBuffer, ClipId};
use super::frame::StereoFrame;
use super::fx::FxBus;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, EffectsSnapshot, TriggerParams};
use crate::shared::PadId;

const MAX_VOICES: usize = 16; // overlapping triggers past this steal the oldest slot

// A finished capture, handed back to the control thread for decode/install.
#[derive(Clone, Debug)]
pub struct CompletedRecording {
    pub pad: PadId,
    pub frames: Vec<StereoFrame>,
}

struct Capture {
    pad: PadId,
    frames: Vec<StereoFrame>,
}

// The realtime side. Lives inside the output callback: drains commands,
// drains mic input, renders the voice pool and the send bus into the block.
pub struct Engine {
    clips: Vec<(ClipId, Arc<ClipBuffer>)>,
    voices: Vec<Voice>,
    fx: FxBus,
    capture: Option<Capture>,
    input_rx: Option<Receiver<Vec<StereoFrame>>>,
    completed_tx: Option<Sender<CompletedRecording>>,
    send_scratch: Vec<StereoFrame>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            clips: Vec::new(),
            voices: Vec::with_capacity(MAX_VOICES),
            fx: FxBus::new(sample_rate as f32, EffectsSnapshot::default()),
            capture: None,
            input_rx: None,
            completed_tx: None,
            send_scratch: Vec::new(),
        }
    }

    pub fn set_input_rx(&mut self, rx: Receiver<Vec<StereoFrame>>) {
        self.input_rx = Some(rx);
    }

    pub fn set_completed_tx(&mut self, tx: Sender<CompletedRecording>) {
        self.completed_tx = Some(tx);
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterClip { id, clip } => {
                if let Some(slot) = self.clips.iter_mut().find(|(cid, _)| *cid == id) {
                    slot.1 = clip;
                } else {
                    self.clips.push((id, clip));
                }
            }
            AudioCommand::DropClip(id) => {
                self.clips.retain(|(cid, _)| *cid != id);
            }
            AudioCommand::Trigger(t) => self.spawn_voice(t),
            AudioCommand::SetEffects(params) => self.fx.set_params(params),
            AudioCommand::BeginCapture { pad } => {
                self.capture = Some(Capture {
                    pad,
                    frames: Vec::new(),
                });
            }
            AudioCommand::StopCapture => {
                if let (Some(capture), Some(tx)) = (self.capture.take(), self.completed_tx.as_ref())
                {
                    let _ = tx.try_send(CompletedRecording {
                        pad: capture.pad,
                        frames: capture.frames,
                    });
                }
            }
        }
    }

    fn spawn_voice(&mut self, t: TriggerParams) {
        // clip may have been dropped between dispatch and arrival
        let Some((_, clip)) = self.clips.iter().find(|(cid, _)| *cid == t.clip) else {
            return;
        };
        let voice = Voice::new(clip.clone(), t.start_frame, t.frames, t.gain, t.delay_send);
        if !voice.is_active() {
            return;
        }
        if self.voices.len() < MAX_VOICES {
            self.voices.push(voice);
        } else {
            self.voices[0] = voice;
        }
    }

    // Mic frames stream in continuously; they only stick while a capture is
    // open, otherwise they're dropped on the floor.
    pub fn drain_input(&mut self) {
        let Some(rx) = self.input_rx.as_ref() else {
            return;
        };
        while let Ok(block) = rx.try_recv() {
            if let Some(capture) = self.capture.as_mut() {
                capture.frames.extend_from_slice(&block);
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        if self.send_scratch.len() < out.len() {
            self.send_scratch.resize(out.len(), StereoFrame::zero());
        }
        let send = &mut self.send_scratch[..out.len()];
        send.fill(StereoFrame::zero());

        for voice in self.voices.iter_mut() {
            voice.render_into(out, send);
        }
        self.voices.retain(|v| v.is_active());

        self.fx.process(send, out);
    }
}
