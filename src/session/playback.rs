use crossbeam_channel::Sender;

use crate::audio_api::{AudioCommand, TriggerParams};
use crate::shared::PadId;

use super::error::SessionError;
use super::pads::PadStore;

// Turns "play pad N" into a trigger the engine can act on: resolves the
// trim window to frames and reads the pad's levels at dispatch time.
// Fire-and-forget; overlapping triggers each become their own voice and
// nothing is queued or cancellable once sent.
pub struct PlaybackEngine {
    tx: Sender<AudioCommand>,
    sample_rate: u32,
}

impl PlaybackEngine {
    pub fn new(tx: Sender<AudioCommand>, sample_rate: u32) -> Self {
        Self { tx, sample_rate }
    }

    pub fn trigger(&self, pads: &PadStore, id: PadId) -> Result<(), SessionError> {
        let pad = pads.pad(id)?;
        if pad.is_recording() {
            // suppressed, not queued; the pad is busy with the mic
            return Err(SessionError::AlreadyRecording(id));
        }
        let Some(clip) = pad.clip_id() else {
            return Err(SessionError::NoAudioLoaded(id));
        };

        let rate = self.sample_rate as f32;
        let start_frame = (pad.start_time() * rate).round() as usize;
        let frames = ((pad.end_time() - pad.start_time()) * rate).round() as usize;

        let _ = self.tx.try_send(AudioCommand::Trigger(TriggerParams {
            clip,
            start_frame,
            frames,
            gain: pad.gain(),
            delay_send: pad.delay_send(),
        }));
        Ok(())
    }
}
