// The one context object for a running session. Owns the pad store, the
// bus parameters, the clock, and the trigger dispatcher; everything the
// front-end does goes through here, and this is the only place that talks
// to the audio thread. Constructed once in main and passed around -- no
// globals.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use log::warn;

use crate::audio::{ClipBuffer, CompletedRecording, MAX_DELAY_SECONDS, next_clip_id};
use crate::audio_api::{AudioCommand, FilterType};
use crate::shared::{DisplayState, InputEvent, NUM_PADS, NUM_STEPS, PadId, ParamPage};
use crate::visual;

mod effects;
mod error;
mod pads;
mod playback;
mod sequencer;

pub use effects::EffectsBus;
pub use error::SessionError;
pub use pads::{Pad, PadStore};
pub use playback::PlaybackEngine;
pub use sequencer::SequencerClock;

const WAVE_COLUMNS: usize = 48;

// knob feel; raw deltas come in as fractions of a turn
const BPM_MIN: f32 = 20.0;
const BPM_MAX: f32 = 300.0;
const FREQ_MIN: f32 = 20.0;
const FREQ_MAX: f32 = 20_000.0;

pub struct Session {
    pads: PadStore,
    effects: EffectsBus,
    sequencer: SequencerClock,
    playback: PlaybackEngine,
    tx: Sender<AudioCommand>,
    sample_rate: u32,
    selected: PadId,
    capturing: Option<PadId>,
    param_page: ParamPage,
    last_step: Option<u8>,
    waveform: Vec<f32>,
    status: String,
}

impl Session {
    pub fn new(tx: Sender<AudioCommand>, sample_rate: u32) -> Self {
        Self {
            pads: PadStore::with_pads(NUM_PADS),
            effects: EffectsBus::default(),
            sequencer: SequencerClock::new(),
            playback: PlaybackEngine::new(tx.clone(), sample_rate),
            tx,
            sample_rate,
            selected: PadId(0),
            capturing: None,
            param_page: ParamPage::Trim,
            last_step: None,
            waveform: Vec::new(),
            status: String::from("ready"),
        }
    }

    // ── frame loop entry points ───────────────────────────────────

    // Advance the clock and dispatch every step that came due. A failing
    // pad is logged and skipped; it must not silence the rest of its step.
    pub fn tick(&mut self, now: Duration) {
        for step in self.sequencer.poll(now) {
            self.last_step = Some(step as u8);
            for pad_id in self.pads.active_pads_at(step) {
                if let Err(e) = self.playback.trigger(&self.pads, pad_id) {
                    warn!("step {step}: {e}");
                }
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Duration) {
        match event {
            InputEvent::TriggerPad(n) => self.select_and_trigger(PadId(n)),
            InputEvent::ToggleStep(step) => {
                if let Err(e) = self.pads.toggle_step(self.selected, step as usize) {
                    warn!("{e}");
                }
            }
            InputEvent::PlayPress => {
                if self.sequencer.is_running() {
                    self.sequencer.stop();
                    self.last_step = None;
                    self.status = String::from("stopped");
                } else {
                    self.sequencer.start(now);
                    self.status = String::from("playing");
                }
            }
            InputEvent::RecordPress => self.toggle_record(self.selected),
            InputEvent::DeletePress => self.clear_pad(self.selected),
            InputEvent::CyclePage => self.param_page = self.param_page.next(),
            InputEvent::CycleFilterType => {
                let next = self.effects.filter_type().next();
                let freq = self.effects.filter_freq();
                if let Err(e) = self.set_filter(freq, next) {
                    warn!("{e}");
                }
            }
            InputEvent::KnobA(delta) => self.turn_knob_a(delta),
            InputEvent::KnobB(delta) => self.turn_knob_b(delta),
            InputEvent::BpmNudge(delta) => {
                let bpm = (self.sequencer.bpm() + delta).clamp(BPM_MIN, BPM_MAX);
                if let Err(e) = self.sequencer.set_tempo(bpm, now) {
                    warn!("{e}");
                }
            }
            InputEvent::SwingNudge(delta) => {
                let swing = (self.sequencer.swing() + delta).clamp(0.0, 1.0);
                if let Err(e) = self.sequencer.set_swing(swing) {
                    warn!("{e}");
                }
            }
            InputEvent::Quit => {}
        }
    }

    // ── pads & playback ───────────────────────────────────────────

    pub fn trigger_pad(&mut self, id: PadId) -> Result<(), SessionError> {
        self.playback.trigger(&self.pads, id)
    }

    fn select_and_trigger(&mut self, id: PadId) {
        if id.index() >= NUM_PADS {
            return;
        }
        if self.selected != id {
            self.selected = id;
            self.refresh_waveform();
        }
        match self.trigger_pad(id) {
            Ok(()) => self.status = format!("{id}"),
            Err(e) => {
                self.status = e.to_string();
                warn!("{e}");
            }
        }
    }

    // Install a decoded clip into a pad: recording completion and WAV
    // import both land here.
    pub fn install_clip(&mut self, id: PadId, clip: ClipBuffer) -> Result<(), SessionError> {
        let duration = clip.duration_seconds();
        let clip = Arc::new(clip);
        let clip_id = next_clip_id();
        let replaced = self
            .pads
            .set_recording(id, clip_id, clip.clone(), duration)?;
        self.send(AudioCommand::RegisterClip { id: clip_id, clip });
        if let Some(old) = replaced {
            self.send(AudioCommand::DropClip(old));
        }
        if id == self.selected {
            self.refresh_waveform();
        }
        self.status = format!("{id}: {duration:.2}s loaded");
        Ok(())
    }

    pub fn set_trim(&mut self, id: PadId, start: f32, end: f32) -> Result<(), SessionError> {
        self.pads.set_trim(id, start, end)
    }

    pub fn set_gain(&mut self, id: PadId, gain: f32) -> Result<(), SessionError> {
        self.pads.set_gain(id, gain)
    }

    pub fn set_delay_send(&mut self, id: PadId, level: f32) -> Result<(), SessionError> {
        self.pads.set_delay_send(id, level)
    }

    pub fn toggle_step(&mut self, id: PadId, step: usize) -> Result<bool, SessionError> {
        self.pads.toggle_step(id, step)
    }

    fn clear_pad(&mut self, id: PadId) {
        match self.pads.clear(id) {
            Ok(Some(old)) => {
                self.send(AudioCommand::DropClip(old));
                self.status = format!("{id}: cleared");
            }
            Ok(None) => self.status = format!("{id}: already empty"),
            Err(e) => warn!("{e}"),
        }
        if id == self.selected {
            self.refresh_waveform();
        }
    }

    // ── recording ─────────────────────────────────────────────────

    fn toggle_record(&mut self, id: PadId) {
        if self.capturing == Some(id) {
            if let Err(e) = self.pads.stop_recording(id) {
                warn!("{e}");
                return;
            }
            self.send(AudioCommand::StopCapture);
            self.capturing = None;
            self.status = format!("{id}: capture stopped");
        } else if let Some(busy) = self.capturing {
            // one mic; finish the open capture first
            warn!("mic busy: still capturing into {busy}");
            self.status = format!("mic busy ({busy})");
        } else {
            match self.pads.begin_recording(id) {
                Ok(()) => {
                    self.send(AudioCommand::BeginCapture { pad: id });
                    self.capturing = Some(id);
                    if self.selected != id {
                        self.selected = id;
                        self.refresh_waveform();
                    }
                    self.status = format!("{id}: capturing...");
                }
                Err(e) => warn!("{e}"),
            }
        }
    }

    // Capture flushed out of the engine; decode is trivial (frames are
    // already f32 at the device rate) so this goes straight to install.
    pub fn finish_recording(&mut self, rec: CompletedRecording) {
        if rec.frames.is_empty() {
            warn!("{}: empty capture discarded", rec.pad);
            self.status = format!("{}: nothing captured", rec.pad);
            return;
        }
        let clip = ClipBuffer::new(rec.frames, self.sample_rate);
        if let Err(e) = self.install_clip(rec.pad, clip) {
            // a fresh capture session opened before this one landed
            warn!("discarding stale capture: {e}");
        }
    }

    // ── effects bus ───────────────────────────────────────────────

    pub fn set_delay_time(&mut self, seconds: f32) -> Result<(), SessionError> {
        self.effects.set_delay_time(seconds)?;
        self.push_effects();
        Ok(())
    }

    pub fn set_feedback(&mut self, amount: f32) -> Result<(), SessionError> {
        self.effects.set_feedback(amount)?;
        self.push_effects();
        Ok(())
    }

    pub fn set_wet_dry(&mut self, wet: f32) -> Result<(), SessionError> {
        self.effects.set_wet_dry(wet)?;
        self.push_effects();
        Ok(())
    }

    pub fn set_filter(&mut self, freq_hz: f32, filter_type: FilterType) -> Result<(), SessionError> {
        self.effects.set_filter(freq_hz, filter_type)?;
        self.push_effects();
        Ok(())
    }

    fn push_effects(&mut self) {
        self.send(AudioCommand::SetEffects(self.effects.snapshot()));
    }

    // ── transport ─────────────────────────────────────────────────

    pub fn start(&mut self, now: Duration) {
        self.sequencer.start(now);
    }

    pub fn stop(&mut self) {
        self.sequencer.stop();
        self.last_step = None;
    }

    pub fn set_tempo(&mut self, bpm: f32, now: Duration) -> Result<(), SessionError> {
        self.sequencer.set_tempo(bpm, now)
    }

    pub fn set_swing(&mut self, amount: f32) -> Result<(), SessionError> {
        self.sequencer.set_swing(amount)
    }

    // ── knobs ─────────────────────────────────────────────────────

    // The knob layer owns unit conversion and clamping so the typed setters
    // below it only ever see values in their own domain.
    fn turn_knob_a(&mut self, delta: f32) {
        let id = self.selected;
        let result = match self.param_page {
            ParamPage::Trim => {
                let pad = match self.pads.pad(id) {
                    Ok(p) => p,
                    Err(e) => return warn!("{e}"),
                };
                let duration = pad.duration_seconds();
                let start = (pad.start_time() + delta * duration).clamp(0.0, duration);
                let end = pad.end_time();
                self.pads.set_trim(id, start, end)
            }
            ParamPage::Level => {
                let gain = match self.pads.pad(id) {
                    Ok(p) => (p.gain() + delta * 2.0).max(0.0),
                    Err(e) => return warn!("{e}"),
                };
                self.pads.set_gain(id, gain)
            }
            ParamPage::Delay => {
                let time = (self.effects.delay_time() + delta).clamp(0.0, MAX_DELAY_SECONDS);
                self.set_delay_time(time)
            }
            ParamPage::Mix => {
                let wet = (self.effects.wet() + delta).clamp(0.0, 1.0);
                self.set_wet_dry(wet)
            }
        };
        if let Err(e) = result {
            warn!("{e}");
        }
    }

    fn turn_knob_b(&mut self, delta: f32) {
        let id = self.selected;
        let result = match self.param_page {
            ParamPage::Trim => {
                let pad = match self.pads.pad(id) {
                    Ok(p) => p,
                    Err(e) => return warn!("{e}"),
                };
                let duration = pad.duration_seconds();
                let start = pad.start_time();
                let end = (pad.end_time() + delta * duration).clamp(0.0, duration);
                self.pads.set_trim(id, start, end)
            }
            ParamPage::Level => {
                let send = match self.pads.pad(id) {
                    Ok(p) => (p.delay_send() + delta).max(0.0),
                    Err(e) => return warn!("{e}"),
                };
                self.pads.set_delay_send(id, send)
            }
            ParamPage::Delay => {
                let feedback = (self.effects.feedback() + delta).clamp(0.0, 1.0);
                self.set_feedback(feedback)
            }
            ParamPage::Mix => {
                // log-scaled so the knob feels even across the audible range
                let freq = 10f32
                    .powf(self.effects.filter_freq().log10() + delta)
                    .clamp(FREQ_MIN, FREQ_MAX);
                self.set_filter(freq, self.effects.filter_type())
            }
        };
        if let Err(e) = result {
            warn!("{e}");
        }
    }

    // ── display ───────────────────────────────────────────────────

    fn refresh_waveform(&mut self) {
        self.waveform = match self.pads.pad(self.selected).ok().and_then(Pad::clip) {
            Some(clip) => visual::column_peaks(clip, WAVE_COLUMNS),
            None => Vec::new(),
        };
    }

    pub fn display_state(&self) -> DisplayState {
        let mut grid = [[false; NUM_STEPS]; NUM_PADS];
        let mut pads_loaded = [false; NUM_PADS];
        for pad in self.pads.pads() {
            let row = pad.id().index();
            if row >= NUM_PADS {
                continue;
            }
            pads_loaded[row] = pad.has_clip();
            for step in 0..NUM_STEPS {
                grid[row][step] = self.pads.is_step_active(pad.id(), step).unwrap_or(false);
            }
        }

        let (trim_span, pad_values) = match self.pads.pad(self.selected) {
            Ok(pad) => {
                let duration = pad.duration_seconds();
                let span = if duration > 0.0 {
                    (pad.start_time() / duration, pad.end_time() / duration)
                } else {
                    (0.0, 1.0)
                };
                (span, (pad.start_time(), pad.end_time(), pad.gain(), pad.delay_send()))
            }
            Err(_) => ((0.0, 1.0), (0.0, 0.0, 1.0, 0.0)),
        };

        let (knob_a_label, knob_b_label) = self.param_page.knob_labels();
        let (knob_a_value, knob_b_value) = match self.param_page {
            ParamPage::Trim => (pad_values.0, pad_values.1),
            ParamPage::Level => (pad_values.2, pad_values.3),
            ParamPage::Delay => (self.effects.delay_time(), self.effects.feedback()),
            ParamPage::Mix => (self.effects.wet(), self.effects.filter_freq()),
        };

        DisplayState {
            grid,
            pads_loaded,
            selected: self.selected.0,
            recording_pad: self.capturing.map(|p| p.0),
            playing: self.sequencer.is_running(),
            playing_step: if self.sequencer.is_running() {
                self.last_step
            } else {
                None
            },
            bpm: self.sequencer.bpm(),
            swing: self.sequencer.swing(),
            param_page: self.param_page,
            knob_a_label,
            knob_b_label,
            knob_a_value,
            knob_b_value,
            delay_time: self.effects.delay_time(),
            feedback: self.effects.feedback(),
            wet: self.effects.wet(),
            filter_freq: self.effects.filter_freq(),
            filter_label: self.effects.filter_type().label(),
            waveform: self.waveform.clone(),
            trim_span,
            status: self.status.clone(),
        }
    }

    // ── accessors ─────────────────────────────────────────────────

    pub fn pads(&self) -> &PadStore {
        &self.pads
    }

    pub fn sequencer(&self) -> &SequencerClock {
        &self.sequencer
    }

    pub fn effects(&self) -> &EffectsBus {
        &self.effects
    }

    pub fn selected(&self) -> PadId {
        self.selected
    }

    fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}
