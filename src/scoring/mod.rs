//! Scoring - Weighted Desirability of Sensor Events
//!
//! ## Responsibilities
//!
//! - PreferenceProfile (per-session weight set, hot-swappable)
//! - Pure weighted-sum scoring of one sensor event

use crate::event_log::SensorEvent;
use serde::{Deserialize, Serialize};

/// Named weights applied to sensor event fields.
///
/// Weights are non-negative and need not sum to 1. Replaceable at any
/// time; a replacement takes effect on the session's next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceProfile {
    pub motion: f64,
    pub sound: f64,
    pub gaze: f64,
    pub gesture: f64,
    /// Biases switch cadence rather than per-event score; it never
    /// multiplies an event field. See [`score`].
    pub interval: f64,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            motion: 0.1,
            sound: 0.6,
            gaze: 0.1,
            gesture: 0.0,
            interval: 0.2,
        }
    }
}

impl PreferenceProfile {
    /// Clamp negative or non-finite weights to zero.
    ///
    /// Applied when a profile is installed so scoring stays infallible.
    pub fn sanitized(mut self) -> Self {
        self.motion = clamp_weight(self.motion);
        self.sound = clamp_weight(self.sound);
        self.gaze = clamp_weight(self.gaze);
        self.gesture = clamp_weight(self.gesture);
        self.interval = clamp_weight(self.interval);
        self
    }
}

/// Weighted desirability of one event under a profile.
///
/// `interval` contributes nothing here: it is a switch-frequency bias, not
/// a per-event term. Absent sub-signals and negative or non-finite inputs
/// score 0, so this never fails and is deterministic for equal inputs.
pub fn score(profile: &PreferenceProfile, event: &SensorEvent) -> f64 {
    let mut s = 0.0;
    s += profile.motion * non_neg(event.motion_score);
    s += profile.sound * non_neg(event.sound_score);
    s += profile.gaze * event.gaze.map(|g| non_neg(g.score)).unwrap_or(0.0);
    s += profile.gesture * event.gesture.map(|g| non_neg(g.score)).unwrap_or(0.0);
    s
}

fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn non_neg(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::SignalScore;
    use chrono::Utc;

    fn event(motion: f64, sound: f64, gaze: Option<f64>, gesture: Option<f64>) -> SensorEvent {
        SensorEvent {
            sequence_id: 1,
            camera_id: 1,
            motion_score: motion,
            sound_score: sound,
            gaze: gaze.map(|score| SignalScore { score }),
            gesture: gesture.map(|score| SignalScore { score }),
            recorded_at: Utc::now(),
        }
    }

    fn zero_profile() -> PreferenceProfile {
        PreferenceProfile {
            motion: 0.0,
            sound: 0.0,
            gaze: 0.0,
            gesture: 0.0,
            interval: 0.0,
        }
    }

    #[test]
    fn test_zero_profile_scores_zero() {
        let profile = zero_profile();
        assert_eq!(score(&profile, &event(0.9, 0.8, Some(0.7), Some(0.6))), 0.0);
        assert_eq!(score(&profile, &event(0.0, 0.0, None, None)), 0.0);
    }

    #[test]
    fn test_weighted_sum() {
        let profile = PreferenceProfile {
            motion: 0.5,
            sound: 2.0,
            gaze: 1.0,
            gesture: 0.25,
            interval: 0.0,
        };
        let s = score(&profile, &event(0.4, 0.3, Some(0.2), Some(0.8)));
        assert!((s - (0.5 * 0.4 + 2.0 * 0.3 + 1.0 * 0.2 + 0.25 * 0.8)).abs() < 1e-12);
    }

    #[test]
    fn test_linear_in_each_weight() {
        let base = PreferenceProfile {
            motion: 0.3,
            sound: 0.4,
            gaze: 0.2,
            gesture: 0.1,
            interval: 0.0,
        };
        let ev = event(0.5, 0.6, Some(0.7), Some(0.8));

        // scaling one weight by k scales that term's contribution by k
        let mut scaled = base;
        scaled.sound *= 3.0;
        let delta = score(&scaled, &ev) - score(&base, &ev);
        assert!((delta - 2.0 * base.sound * 0.6).abs() < 1e-12);

        let mut scaled = base;
        scaled.gesture *= 5.0;
        let delta = score(&scaled, &ev) - score(&base, &ev);
        assert!((delta - 4.0 * base.gesture * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_missing_sub_signals_score_zero() {
        let profile = PreferenceProfile {
            motion: 0.0,
            sound: 0.0,
            gaze: 1.0,
            gesture: 1.0,
            interval: 0.0,
        };
        assert_eq!(score(&profile, &event(0.9, 0.9, None, None)), 0.0);
    }

    #[test]
    fn test_interval_weight_never_contributes() {
        let mut profile = zero_profile();
        profile.interval = 100.0;
        assert_eq!(score(&profile, &event(1.0, 1.0, Some(1.0), Some(1.0))), 0.0);
    }

    #[test]
    fn test_negative_inputs_treated_as_zero() {
        let profile = PreferenceProfile {
            motion: 1.0,
            sound: 1.0,
            gaze: 1.0,
            gesture: 0.0,
            interval: 0.0,
        };
        assert_eq!(score(&profile, &event(-5.0, -1.0, Some(-0.3), None)), 0.0);
    }

    #[test]
    fn test_default_profile_values() {
        let profile = PreferenceProfile::default();
        assert_eq!(profile.sound, 0.6);
        assert_eq!(profile.motion, 0.1);
        assert_eq!(profile.gaze, 0.1);
        assert_eq!(profile.gesture, 0.0);
        assert_eq!(profile.interval, 0.2);
    }

    #[test]
    fn test_sanitized_clamps_negative_weights() {
        let profile = PreferenceProfile {
            motion: -1.0,
            sound: 0.6,
            gaze: f64::NAN,
            gesture: 0.2,
            interval: -0.1,
        }
        .sanitized();
        assert_eq!(profile.motion, 0.0);
        assert_eq!(profile.sound, 0.6);
        assert_eq!(profile.gaze, 0.0);
        assert_eq!(profile.gesture, 0.2);
        assert_eq!(profile.interval, 0.0);
    }

    #[test]
    fn test_profile_deserialization_fills_defaults() {
        let profile: PreferenceProfile = serde_json::from_str(r#"{"sound": 1.0}"#).unwrap();
        assert_eq!(profile.sound, 1.0);
        assert_eq!(profile.motion, 0.1);
        assert_eq!(profile.interval, 0.2);
    }
}
