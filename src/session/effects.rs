// Control-side owner of the shared bus parameters. Each setter validates
// before mutating; on success the session ships a fresh snapshot to the
// audio thread, which affects every pad routed through the bus, in-flight
// voices included.

use crate::audio_api::{EffectsSnapshot, FilterType};

use super::error::SessionError;

pub struct EffectsBus {
    params: EffectsSnapshot,
}

impl Default for EffectsBus {
    fn default() -> Self {
        Self {
            params: EffectsSnapshot::default(),
        }
    }
}

impl EffectsBus {
    pub fn set_delay_time(&mut self, seconds: f32) -> Result<(), SessionError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SessionError::InvalidParameter(format!(
                "delay time must be a non-negative number, got {seconds}"
            )));
        }
        self.params.delay_time = seconds;
        Ok(())
    }

    pub fn set_feedback(&mut self, amount: f32) -> Result<(), SessionError> {
        if !amount.is_finite() || !(0.0..=1.0).contains(&amount) {
            return Err(SessionError::InvalidParameter(format!(
                "feedback must be between 0 and 1, got {amount}"
            )));
        }
        self.params.feedback = amount;
        Ok(())
    }

    // wet and dry move as a pair; dry is never set on its own
    pub fn set_wet_dry(&mut self, wet: f32) -> Result<(), SessionError> {
        if !wet.is_finite() || !(0.0..=1.0).contains(&wet) {
            return Err(SessionError::InvalidParameter(format!(
                "wet amount must be between 0 and 1, got {wet}"
            )));
        }
        self.params.wet = wet;
        self.params.dry = 1.0 - wet;
        Ok(())
    }

    pub fn set_filter(&mut self, freq_hz: f32, filter_type: FilterType) -> Result<(), SessionError> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(SessionError::InvalidParameter(format!(
                "filter frequency must be a positive number, got {freq_hz}"
            )));
        }
        self.params.filter_freq = freq_hz;
        self.params.filter_type = filter_type;
        Ok(())
    }

    pub fn delay_time(&self) -> f32 {
        self.params.delay_time
    }

    pub fn feedback(&self) -> f32 {
        self.params.feedback
    }

    pub fn wet(&self) -> f32 {
        self.params.wet
    }

    pub fn dry(&self) -> f32 {
        self.params.dry
    }

    pub fn filter_freq(&self) -> f32 {
        self.params.filter_freq
    }

    pub fn filter_type(&self) -> FilterType {
        self.params.filter_type
    }

    pub fn snapshot(&self) -> EffectsSnapshot {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_defaults() {
        let bus = EffectsBus::default();
        assert_eq!(bus.delay_time(), 0.5);
        assert_eq!(bus.feedback(), 0.5);
        assert_eq!(bus.wet(), 0.5);
        assert_eq!(bus.dry(), 0.5);
        assert_eq!(bus.filter_freq(), 2000.0);
        assert_eq!(bus.filter_type(), FilterType::Lowpass);
    }

    #[test]
    fn filter_round_trips() {
        let mut bus = EffectsBus::default();
        bus.set_filter(440.0, FilterType::Notch).unwrap();
        assert_eq!(bus.filter_freq(), 440.0);
        assert_eq!(bus.filter_type(), FilterType::Notch);
    }

    #[test]
    fn wet_and_dry_always_sum_to_one() {
        let mut bus = EffectsBus::default();
        for wet in [0.0, 0.25, 0.5, 0.75, 1.0] {
            bus.set_wet_dry(wet).unwrap();
            assert_eq!(bus.wet(), wet);
            assert_eq!(bus.dry(), 1.0 - wet);
        }
    }

    #[test]
    fn negative_delay_time_is_rejected_without_mutation() {
        let mut bus = EffectsBus::default();
        assert!(matches!(
            bus.set_delay_time(-0.1),
            Err(SessionError::InvalidParameter(_))
        ));
        assert_eq!(bus.delay_time(), 0.5);
    }

    #[test]
    fn feedback_outside_unit_range_is_rejected() {
        let mut bus = EffectsBus::default();
        assert!(bus.set_feedback(1.5).is_err());
        assert!(bus.set_feedback(-0.01).is_err());
        assert!(bus.set_feedback(f32::NAN).is_err());
        assert_eq!(bus.feedback(), 0.5);
    }

    #[test]
    fn wet_outside_unit_range_is_rejected() {
        let mut bus = EffectsBus::default();
        assert!(bus.set_wet_dry(2.0).is_err());
        assert_eq!(bus.wet(), 0.5);
        assert_eq!(bus.dry(), 0.5);
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let mut bus = EffectsBus::default();
        assert!(bus.set_filter(0.0, FilterType::Lowpass).is_err());
        assert!(bus.set_filter(-10.0, FilterType::Highpass).is_err());
        assert!(bus.set_filter(f32::INFINITY, FilterType::Lowpass).is_err());
        assert_eq!(bus.filter_freq(), 2000.0);
        assert_eq!(bus.filter_type(), FilterType::Lowpass);
    }
}
