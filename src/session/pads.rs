use std::sync::Arc;

use crate::audio::{ClipBuffer, ClipId};
use crate::shared::{NUM_STEPS, PadId};

use super::error::SessionError;

// One pad: at most one clip, its trim window, its two levels, the capture
// flag, and its row of the step grid.
pub struct Pad {
    id: PadId,
    clip: Option<(ClipId, Arc<ClipBuffer>)>,
    duration: f32,
    start_time: f32,
    end_time: f32,
    gain: f32,
    delay_send: f32,
    recording: bool,
    steps: [bool; NUM_STEPS],
}

impl Pad {
    fn new(id: PadId) -> Self {
        Self {
            id,
            clip: None,
            duration: 0.0,
            start_time: 0.0,
            end_time: 0.0,
            gain: 1.0,
            delay_send: 0.0,
            recording: false,
            steps: [false; NUM_STEPS],
        }
    }

    pub fn id(&self) -> PadId {
        self.id
    }

    pub fn clip_id(&self) -> Option<ClipId> {
        self.clip.as_ref().map(|(id, _)| *id)
    }

    pub fn clip(&self) -> Option<&Arc<ClipBuffer>> {
        self.clip.as_ref().map(|(_, clip)| clip)
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration
    }

    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn delay_send(&self) -> f32 {
        self.delay_send
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

// The full pad set plus the step grid. All mutation goes through here so
// the invariants (trim window inside the clip, one capture flag per pad)
// hold no matter who is asking.
pub struct PadStore {
    pads: Vec<Pad>,
}

impl PadStore {
    pub fn new() -> Self {
        Self { pads: Vec::new() }
    }

    // the usual fixed set: ids 0..count, all empty
    pub fn with_pads(count: usize) -> Self {
        Self {
            pads: (0..count).map(|i| Pad::new(PadId(i as u8))).collect(),
        }
    }

    pub fn create_pad(&mut self, id: PadId) -> Result<(), SessionError> {
        if self.pads.iter().any(|p| p.id == id) {
            return Err(SessionError::DuplicateId(id));
        }
        self.pads.push(Pad::new(id));
        Ok(())
    }

    pub fn pad(&self, id: PadId) -> Result<&Pad, SessionError> {
        self.pads
            .iter()
            .find(|p| p.id == id)
            .ok_or(SessionError::NotFound(id))
    }

    fn pad_mut(&mut self, id: PadId) -> Result<&mut Pad, SessionError> {
        self.pads
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::NotFound(id))
    }

    pub fn pads(&self) -> impl Iterator<Item = &Pad> {
        self.pads.iter()
    }

    // ── capture session flag ──────────────────────────────────────

    pub fn begin_recording(&mut self, id: PadId) -> Result<(), SessionError> {
        let pad = self.pad_mut(id)?;
        if pad.recording {
            return Err(SessionError::AlreadyRecording(id));
        }
        pad.recording = true;
        Ok(())
    }

    // Ends the capture session. The decode pipeline keeps running after
    // this; the buffer lands later via set_recording.
    pub fn stop_recording(&mut self, id: PadId) -> Result<(), SessionError> {
        let pad = self.pad_mut(id)?;
        pad.recording = false;
        Ok(())
    }

    // Install a decoded buffer. Rejected while a capture session is live
    // for the pad -- the arriving buffer would be stale. Returns the clip
    // it replaced, if any, so the caller can release it on the audio side.
    pub fn set_recording(
        &mut self,
        id: PadId,
        clip_id: ClipId,
        buffer: Arc<ClipBuffer>,
        duration_seconds: f32,
    ) -> Result<Option<ClipId>, SessionError> {
        let pad = self.pad_mut(id)?;
        if pad.recording {
            return Err(SessionError::AlreadyRecording(id));
        }
        let replaced = pad.clip.take().map(|(cid, _)| cid);
        pad.duration = duration_seconds.max(0.0);
        pad.start_time = 0.0;
        pad.end_time = pad.duration;
        pad.clip = Some((clip_id, buffer));
        Ok(replaced)
    }

    // ── trim & levels ─────────────────────────────────────────────

    pub fn set_trim(&mut self, id: PadId, start: f32, end: f32) -> Result<(), SessionError> {
        let pad = self.pad_mut(id)?;
        let duration = pad.duration;
        if !(0.0..=duration).contains(&start) || !(0.0..=duration).contains(&end) {
            return Err(SessionError::OutOfRange(format!(
                "trim [{start}, {end}] outside clip duration {duration}"
            )));
        }
        // start never pushes end out of the way; it gets clamped to it.
        // end is always taken as given, the guard only runs one direction.
        let start = if start > end { end } else { start };
        pad.start_time = start;
        pad.end_time = end;
        Ok(())
    }

    pub fn set_gain(&mut self, id: PadId, gain: f32) -> Result<(), SessionError> {
        let pad = self.pad_mut(id)?;
        if !gain.is_finite() {
            return Err(SessionError::InvalidParameter(format!(
                "gain must be a finite number, got {gain}"
            )));
        }
        pad.gain = gain;
        Ok(())
    }

    pub fn set_delay_send(&mut self, id: PadId, level: f32) -> Result<(), SessionError> {
        let pad = self.pad_mut(id)?;
        if !level.is_finite() {
            return Err(SessionError::InvalidParameter(format!(
                "delay send must be a finite number, got {level}"
            )));
        }
        pad.delay_send = level;
        Ok(())
    }

    // Drop the clip and put everything but the step row back to defaults.
    // Returns the dropped clip id for release on the audio side.
    pub fn clear(&mut self, id: PadId) -> Result<Option<ClipId>, SessionError> {
        let pad = self.pad_mut(id)?;
        let dropped = pad.clip.take().map(|(cid, _)| cid);
        pad.duration = 0.0;
        pad.start_time = 0.0;
        pad.end_time = 0.0;
        pad.gain = 1.0;
        pad.delay_send = 0.0;
        Ok(dropped)
    }

    // ── step grid ─────────────────────────────────────────────────

    pub fn is_step_active(&self, id: PadId, step: usize) -> Result<bool, SessionError> {
        let pad = self.pad(id)?;
        if step >= NUM_STEPS {
            return Err(SessionError::OutOfRange(format!(
                "step {step} outside 0..{NUM_STEPS}"
            )));
        }
        Ok(pad.steps[step])
    }

    pub fn toggle_step(&mut self, id: PadId, step: usize) -> Result<bool, SessionError> {
        let pad = self.pad_mut(id)?;
        if step >= NUM_STEPS {
            return Err(SessionError::OutOfRange(format!(
                "step {step} outside 0..{NUM_STEPS}"
            )));
        }
        pad.steps[step] = !pad.steps[step];
        Ok(pad.steps[step])
    }

    // snapshot read used by step dispatch
    pub fn active_pads_at(&self, step: usize) -> Vec<PadId> {
        self.pads
            .iter()
            .filter(|p| p.steps.get(step).copied().unwrap_or(false))
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::next_clip_id;

    fn clip_seconds(seconds: f32) -> (ClipId, Arc<ClipBuffer>, f32) {
        let rate = 1000;
        let frames = (seconds * rate as f32) as usize;
        let clip = Arc::new(ClipBuffer::new(
            vec![crate::audio::StereoFrame::splat(0.5); frames],
            rate,
        ));
        (next_clip_id(), clip, seconds)
    }

    fn store_with_loaded_pad(seconds: f32) -> PadStore {
        let mut store = PadStore::with_pads(8);
        let (id, clip, dur) = clip_seconds(seconds);
        store.set_recording(PadId(0), id, clip, dur).unwrap();
        store
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut store = PadStore::new();
        store.create_pad(PadId(0)).unwrap();
        assert_eq!(
            store.create_pad(PadId(0)),
            Err(SessionError::DuplicateId(PadId(0)))
        );
    }

    #[test]
    fn unknown_pad_is_not_found() {
        let mut store = PadStore::with_pads(8);
        assert_eq!(
            store.set_gain(PadId(42), 1.0),
            Err(SessionError::NotFound(PadId(42)))
        );
    }

    #[test]
    fn install_sets_trim_to_full_clip() {
        let store = store_with_loaded_pad(2.0);
        let pad = store.pad(PadId(0)).unwrap();
        assert_eq!(pad.start_time(), 0.0);
        assert_eq!(pad.end_time(), 2.0);
        assert_eq!(pad.duration_seconds(), 2.0);
        assert!(pad.has_clip());
    }

    #[test]
    fn install_while_capturing_is_rejected() {
        let mut store = PadStore::with_pads(8);
        store.begin_recording(PadId(0)).unwrap();
        let (id, clip, dur) = clip_seconds(1.0);
        assert_eq!(
            store.set_recording(PadId(0), id, clip, dur),
            Err(SessionError::AlreadyRecording(PadId(0)))
        );
        // stopping the session unblocks the install
        store.stop_recording(PadId(0)).unwrap();
        let (id, clip, dur) = clip_seconds(1.0);
        assert!(store.set_recording(PadId(0), id, clip, dur).is_ok());
    }

    #[test]
    fn double_begin_recording_is_rejected() {
        let mut store = PadStore::with_pads(8);
        store.begin_recording(PadId(0)).unwrap();
        assert_eq!(
            store.begin_recording(PadId(0)),
            Err(SessionError::AlreadyRecording(PadId(0)))
        );
    }

    #[test]
    fn reinstall_returns_the_replaced_clip() {
        let mut store = store_with_loaded_pad(2.0);
        let old = store.pad(PadId(0)).unwrap().clip_id().unwrap();
        let (id, clip, dur) = clip_seconds(1.0);
        let replaced = store.set_recording(PadId(0), id, clip, dur).unwrap();
        assert_eq!(replaced, Some(old));
    }

    #[test]
    fn trim_inside_the_clip_sticks() {
        let mut store = store_with_loaded_pad(2.0);
        store.set_trim(PadId(0), 0.5, 1.5).unwrap();
        let pad = store.pad(PadId(0)).unwrap();
        assert_eq!(pad.start_time(), 0.5);
        assert_eq!(pad.end_time(), 1.5);
    }

    #[test]
    fn start_past_end_clamps_to_end() {
        let mut store = store_with_loaded_pad(2.0);
        // never an error; start collapses onto end, end stays put
        store.set_trim(PadId(0), 1.8, 1.0).unwrap();
        let pad = store.pad(PadId(0)).unwrap();
        assert_eq!(pad.start_time(), 1.0);
        assert_eq!(pad.end_time(), 1.0);
    }

    #[test]
    fn trim_outside_duration_is_rejected_without_mutation() {
        let mut store = store_with_loaded_pad(2.0);
        store.set_trim(PadId(0), 0.5, 1.5).unwrap();
        assert!(matches!(
            store.set_trim(PadId(0), -0.1, 1.0),
            Err(SessionError::OutOfRange(_))
        ));
        assert!(matches!(
            store.set_trim(PadId(0), 0.0, 2.5),
            Err(SessionError::OutOfRange(_))
        ));
        assert!(matches!(
            store.set_trim(PadId(0), f32::NAN, 1.0),
            Err(SessionError::OutOfRange(_))
        ));
        let pad = store.pad(PadId(0)).unwrap();
        assert_eq!((pad.start_time(), pad.end_time()), (0.5, 1.5));
    }

    #[test]
    fn levels_accept_any_finite_value() {
        let mut store = store_with_loaded_pad(1.0);
        // pad levels carry no range bound, unlike the bus setters
        store.set_gain(PadId(0), 100.0).unwrap();
        store.set_delay_send(PadId(0), -3.0).unwrap();
        let pad = store.pad(PadId(0)).unwrap();
        assert_eq!(pad.gain(), 100.0);
        assert_eq!(pad.delay_send(), -3.0);
        assert!(store.set_gain(PadId(0), f32::NAN).is_err());
        assert!(store.set_delay_send(PadId(0), f32::INFINITY).is_err());
    }

    #[test]
    fn clear_resets_everything_but_steps() {
        let mut store = store_with_loaded_pad(2.0);
        store.set_trim(PadId(0), 0.5, 1.5).unwrap();
        store.set_gain(PadId(0), 2.0).unwrap();
        store.set_delay_send(PadId(0), 0.7).unwrap();
        store.toggle_step(PadId(0), 3).unwrap();

        let dropped = store.clear(PadId(0)).unwrap();
        assert!(dropped.is_some());

        let pad = store.pad(PadId(0)).unwrap();
        assert!(!pad.has_clip());
        assert_eq!((pad.start_time(), pad.end_time()), (0.0, 0.0));
        assert_eq!(pad.gain(), 1.0);
        assert_eq!(pad.delay_send(), 0.0);
        assert!(store.is_step_active(PadId(0), 3).unwrap());
    }

    #[test]
    fn step_toggle_round_trips() {
        let mut store = PadStore::with_pads(8);
        assert!(!store.is_step_active(PadId(2), 5).unwrap());
        assert!(store.toggle_step(PadId(2), 5).unwrap());
        assert!(store.is_step_active(PadId(2), 5).unwrap());
        assert!(!store.toggle_step(PadId(2), 5).unwrap());
    }

    #[test]
    fn step_index_is_bounded() {
        let mut store = PadStore::with_pads(8);
        assert!(matches!(
            store.toggle_step(PadId(0), 8),
            Err(SessionError::OutOfRange(_))
        ));
    }

    #[test]
    fn active_pads_reads_one_column() {
        let mut store = PadStore::with_pads(8);
        store.toggle_step(PadId(1), 4).unwrap();
        store.toggle_step(PadId(6), 4).unwrap();
        store.toggle_step(PadId(3), 5).unwrap();
        assert_eq!(store.active_pads_at(4), vec![PadId(1), PadId(6)]);
        assert_eq!(store.active_pads_at(5), vec![PadId(3)]);
        assert!(store.active_pads_at(0).is_empty());
    }
}
