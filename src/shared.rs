// Control-side types shared between the session and the tui: pad identity,
// the semantic input events raw keys resolve into, and the display snapshot
// the view renders each frame.

use std::fmt;

pub const NUM_PADS: usize = 8;
pub const NUM_STEPS: usize = 8;

// stable pad identity, 0..NUM_PADS
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PadId(pub u8);

impl PadId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pad-{}", self.0)
    }
}

// Keymap:
//   1..8             TriggerPad (select + audition)
//   q w e r t y u i  ToggleStep 0..7 on the selected pad
//   Space            PlayPress
//   c                RecordPress (capture into the selected pad)
//   x                DeletePress (clear the selected pad)
//   Tab              CyclePage
//   f                CycleFilterType
//   [ / ]            KnobA
//   - / =            KnobB
//   Up / Down        BpmNudge
//   Left / Right     SwingNudge
//   Esc              Quit
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    TriggerPad(u8),
    ToggleStep(u8),
    PlayPress,
    RecordPress,
    DeletePress,
    CyclePage,
    CycleFilterType,
    KnobA(f32),
    KnobB(f32),
    BpmNudge(f32),
    SwingNudge(f32),
    Quit,
}

// Which pair of values the two knobs currently edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamPage {
    Trim,
    Level,
    Delay,
    Mix,
}

impl ParamPage {
    pub fn next(self) -> Self {
        match self {
            ParamPage::Trim => ParamPage::Level,
            ParamPage::Level => ParamPage::Delay,
            ParamPage::Delay => ParamPage::Mix,
            ParamPage::Mix => ParamPage::Trim,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamPage::Trim => "TRIM",
            ParamPage::Level => "LEVEL",
            ParamPage::Delay => "DELAY",
            ParamPage::Mix => "MIX",
        }
    }

    pub fn knob_labels(self) -> (&'static str, &'static str) {
        match self {
            ParamPage::Trim => ("START", "END"),
            ParamPage::Level => ("GAIN", "SEND"),
            ParamPage::Delay => ("TIME", "FDBK"),
            ParamPage::Mix => ("WET", "FREQ"),
        }
    }
}

// Everything the view needs for one frame. The tui renders this and nothing
// else; all interpretation already happened in the session.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub grid: [[bool; NUM_STEPS]; NUM_PADS],
    pub pads_loaded: [bool; NUM_PADS],
    pub selected: u8,
    pub recording_pad: Option<u8>,
    pub playing: bool,
    pub playing_step: Option<u8>,
    pub bpm: f32,
    pub swing: f32,
    pub param_page: ParamPage,
    pub knob_a_label: &'static str,
    pub knob_b_label: &'static str,
    pub knob_a_value: f32,
    pub knob_b_value: f32,
    pub delay_time: f32,
    pub feedback: f32,
    pub wet: f32,
    pub filter_freq: f32,
    pub filter_label: &'static str,
    pub waveform: Vec<f32>,
    pub trim_span: (f32, f32), // fractions of the clip, for the overlay
    pub status: String,
}
