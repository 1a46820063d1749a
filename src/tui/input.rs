use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

const KNOB_STEP: f32 = 0.05;
const BPM_STEP: f32 = 2.0;
const SWING_STEP: f32 = 0.05;

// poll one frame's worth of raw key input and resolve it into the semantic
// events the session understands
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Tab => vec![InputEvent::CyclePage],

        // pad row
        KeyCode::Char(c @ '1'..='8') => vec![InputEvent::TriggerPad(c as u8 - b'1')],

        // step row for the selected pad
        KeyCode::Char(c @ ('q' | 'w' | 'e' | 'r' | 't' | 'y' | 'u' | 'i')) => {
            match char_to_step(c) {
                Some(step) => vec![InputEvent::ToggleStep(step)],
                None => vec![],
            }
        }

        KeyCode::Char('c') => vec![InputEvent::RecordPress],
        KeyCode::Char('x') => vec![InputEvent::DeletePress],
        KeyCode::Char('f') => vec![InputEvent::CycleFilterType],

        // knobs
        KeyCode::Char('[') => vec![InputEvent::KnobA(-KNOB_STEP)],
        KeyCode::Char(']') => vec![InputEvent::KnobA(KNOB_STEP)],
        KeyCode::Char('-') => vec![InputEvent::KnobB(-KNOB_STEP)],
        KeyCode::Char('=') => vec![InputEvent::KnobB(KNOB_STEP)],

        // transport feel
        KeyCode::Up => vec![InputEvent::BpmNudge(BPM_STEP)],
        KeyCode::Down => vec![InputEvent::BpmNudge(-BPM_STEP)],
        KeyCode::Right => vec![InputEvent::SwingNudge(SWING_STEP)],
        KeyCode::Left => vec![InputEvent::SwingNudge(-SWING_STEP)],

        _ => vec![],
    }
}

fn char_to_step(c: char) -> Option<u8> {
    let idx = match c {
        'q' => 0,
        'w' => 1,
        'e' => 2,
        'r' => 3,
        't' => 4,
        'y' => 5,
        'u' => 6,
        'i' => 7,
        _ => return None,
    };
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_keys_map_to_indices() {
        assert_eq!(handle_key(KeyCode::Char('1')), vec![InputEvent::TriggerPad(0)]);
        assert_eq!(handle_key(KeyCode::Char('8')), vec![InputEvent::TriggerPad(7)]);
    }

    #[test]
    fn step_row_maps_in_order() {
        assert_eq!(handle_key(KeyCode::Char('q')), vec![InputEvent::ToggleStep(0)]);
        assert_eq!(handle_key(KeyCode::Char('i')), vec![InputEvent::ToggleStep(7)]);
    }

    #[test]
    fn unmapped_keys_produce_nothing() {
        assert!(handle_key(KeyCode::Char('9')).is_empty());
        assert!(handle_key(KeyCode::Char('z')).is_empty());
    }
}
