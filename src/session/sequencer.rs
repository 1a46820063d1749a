use std::time::Duration;

use crate::shared::NUM_STEPS;

use super::error::SessionError;

// The loop clock. Pure state machine over an injected notion of "now"
// (duration since session start) so the timing logic runs identically under
// the frame loop and under a fake clock in tests. The frame loop calls
// poll() every frame; fires happen at the stored deadlines, not at poll
// time, so the grid doesn't drift with frame jitter.
//
// Swing pushes odd step indices late: with swing s, the gap into an odd
// step is interval * (1 + s) and the regular grid resumes one interval
// after the delayed step. Even steps always sit on the grid.
pub struct SequencerClock {
    bpm: f32,
    swing: f32,
    current_step: usize,
    timer: Timer,
}

// At most one of these is ever armed; arming overwrites, which is the
// cancel-before-rearm rule. Two live timers would double-fire steps.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Timer {
    Idle,
    Repeating { next: Duration },
    SwingShot { at: Duration },
}

impl SequencerClock {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            swing: 0.0,
            current_step: 0,
            timer: Timer::Idle,
        }
    }

    // a step lasts (30 / bpm) * 1000 ms, an eighth of a 4-beat bar.
    // the floor keeps an absurd tempo from arming a zero-length timer,
    // which would spin poll() forever
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(30.0 / self.bpm as f64).max(Duration::from_millis(1))
    }

    pub fn is_running(&self) -> bool {
        self.timer != Timer::Idle
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    // Start, or restart if already running. The overwrite cancels any armed
    // timer first; the step index is left alone (stop is what rewinds).
    pub fn start(&mut self, now: Duration) {
        self.timer = Timer::Repeating {
            next: now + self.interval(),
        };
    }

    // Cancels whichever timer is armed and rewinds to step 0. Safe to call
    // in any state, any number of times.
    pub fn stop(&mut self) {
        self.timer = Timer::Idle;
        self.current_step = 0;
    }

    pub fn set_tempo(&mut self, bpm: f32, now: Duration) -> Result<(), SessionError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(SessionError::InvalidParameter(format!(
                "bpm must be a positive number, got {bpm}"
            )));
        }
        self.bpm = bpm;
        // re-arm at the new interval without touching the step index
        if self.is_running() {
            self.timer = Timer::Repeating {
                next: now + self.interval(),
            };
        }
        Ok(())
    }

    pub fn set_swing(&mut self, amount: f32) -> Result<(), SessionError> {
        if !amount.is_finite() || !(0.0..=1.0).contains(&amount) {
            return Err(SessionError::InvalidParameter(format!(
                "swing must be between 0 and 1, got {amount}"
            )));
        }
        self.swing = amount;
        Ok(())
    }

    // Fire every deadline that has come due, in order. Returns the fired
    // step indices; the caller dispatches triggers for each.
    pub fn poll(&mut self, now: Duration) -> Vec<usize> {
        let mut fired = Vec::new();
        loop {
            let due = match self.timer {
                Timer::Repeating { next } if next <= now => Some(next),
                Timer::SwingShot { at } if at <= now => Some(at),
                _ => None,
            };
            match due {
                Some(at) => fired.push(self.advance(at)),
                None => break,
            }
        }
        fired
    }

    // One step: report the current index, move on, and re-arm. `at` is the
    // deadline that fired, used as the logical time base for the next one.
    fn advance(&mut self, at: Duration) -> usize {
        let fired = self.current_step;
        self.current_step = (self.current_step + 1) % NUM_STEPS;

        let interval = self.interval();
        if self.swing > 0.0 && self.current_step % 2 == 1 {
            // the upcoming odd step is pushed late; the repeating grid is
            // cancelled and resumes after the one-shot fires
            self.timer = Timer::SwingShot {
                at: at + interval + interval.mul_f32(self.swing),
            };
        } else {
            self.timer = Timer::Repeating {
                next: at + interval,
            };
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn interval_follows_the_tempo_constant() {
        let mut clock = SequencerClock::new();
        assert_eq!(clock.interval(), ms(250)); // 30 / 120 = 0.25s
        clock.set_tempo(60.0, ms(0)).unwrap();
        assert_eq!(clock.interval(), ms(500));
    }

    #[test]
    fn steps_fire_on_the_grid_and_wrap() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        let mut fired = Vec::new();
        for t in (250..=2500).step_by(250) {
            fired.extend(clock.poll(ms(t)));
        }
        assert_eq!(fired, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
    }

    #[test]
    fn double_start_leaves_exactly_one_timer() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        clock.start(ms(0));
        // 8 intervals produce 8 advances, not 16
        let fired = clock.poll(ms(2000));
        assert_eq!(fired.len(), 8);
    }

    #[test]
    fn restart_while_running_does_not_rewind() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        assert_eq!(clock.poll(ms(750)), vec![0, 1, 2]);
        clock.start(ms(750));
        assert_eq!(clock.poll(ms(1000)), vec![3]);
    }

    #[test]
    fn stop_rewinds_to_step_zero_and_is_idempotent() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        clock.poll(ms(750));
        assert_eq!(clock.current_step(), 3);
        clock.stop();
        assert_eq!(clock.current_step(), 0);
        assert!(!clock.is_running());
        clock.stop();
        assert_eq!(clock.current_step(), 0);
        // no stray timer left behind
        assert!(clock.poll(ms(10_000)).is_empty());
    }

    #[test]
    fn swing_delays_odd_steps_only() {
        // bpm 120 -> interval 250ms, swing 0.5 -> odd steps 125ms late.
        // step 0 on the grid, step 1 at +375, step 2 back on the grid at
        // +250 after that.
        let mut clock = SequencerClock::new();
        clock.set_swing(0.5).unwrap();
        clock.start(ms(0));

        assert_eq!(clock.poll(ms(250)), vec![0]);
        assert!(clock.poll(ms(624)).is_empty()); // 250 alone doesn't reach step 1
        assert_eq!(clock.poll(ms(625)), vec![1]); // 250 + 375
        assert!(clock.poll(ms(874)).is_empty());
        assert_eq!(clock.poll(ms(875)), vec![2]); // regular grid resumes
        assert_eq!(clock.poll(ms(1250)), vec![3]); // 875 + 375
    }

    #[test]
    fn zero_swing_keeps_the_straight_grid() {
        let mut clock = SequencerClock::new();
        clock.set_swing(0.0).unwrap();
        clock.start(ms(0));
        let fired = clock.poll(ms(1000));
        assert_eq!(fired, vec![0, 1, 2, 3]);
    }

    #[test]
    fn tempo_change_rearms_but_keeps_the_step_index() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        assert_eq!(clock.poll(ms(500)), vec![0, 1]);
        assert_eq!(clock.current_step(), 2);

        clock.set_tempo(240.0, ms(500)).unwrap(); // interval now 125ms
        assert_eq!(clock.current_step(), 2);
        assert_eq!(clock.poll(ms(625)), vec![2]);
        assert_eq!(clock.poll(ms(750)), vec![3]);
    }

    #[test]
    fn tempo_change_while_stopped_does_not_arm() {
        let mut clock = SequencerClock::new();
        clock.set_tempo(90.0, ms(0)).unwrap();
        assert!(!clock.is_running());
        assert!(clock.poll(ms(10_000)).is_empty());
    }

    #[test]
    fn bad_tempo_and_swing_are_rejected() {
        let mut clock = SequencerClock::new();
        assert!(clock.set_tempo(0.0, ms(0)).is_err());
        assert!(clock.set_tempo(-10.0, ms(0)).is_err());
        assert!(clock.set_tempo(f32::NAN, ms(0)).is_err());
        assert_eq!(clock.bpm(), 120.0);
        assert!(clock.set_swing(1.5).is_err());
        assert!(clock.set_swing(-0.1).is_err());
        assert_eq!(clock.swing(), 0.0);
    }

    #[test]
    fn late_poll_catches_up_in_order() {
        let mut clock = SequencerClock::new();
        clock.start(ms(0));
        // one stalled frame three intervals later still fires every step once
        assert_eq!(clock.poll(ms(750)), vec![0, 1, 2]);
    }
}
