//! Session configuration with tunable thresholds

use crate::session::errors::SessionError;

/// Configuration for the sampling loop and pipeline thresholds.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sampling cadence of the tick loop
    pub sample_interval_ms: u64,

    /// Smoothing window size N for classification debouncing
    pub smoothing_window: usize,

    /// Mean confidence a majority label needs before the smoothed label
    /// switches
    pub majority_confidence: f32,

    /// Classifier confidence below which form is judged `Bad`
    pub form_confidence: f32,

    /// Hysteresis margin at the top of the movement: descending completes
    /// at progress >= 1 - rising_margin
    pub rising_margin: f32,

    /// Hysteresis margin at the bottom: ascending completes at
    /// progress <= falling_margin
    pub falling_margin: f32,

    /// Minimum keypoint detection confidence used by normalization and
    /// progress extraction
    pub keypoint_confidence_floor: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 500,
            smoothing_window: 5,
            majority_confidence: 0.6,
            form_confidence: 0.7,
            rising_margin: 0.05,
            falling_margin: 0.05,
            keypoint_confidence_floor: 0.3,
        }
    }
}

impl SessionConfig {
    /// Fail-fast validation at construction time.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.sample_interval_ms == 0 {
            return Err(SessionError::InvalidConfiguration(
                "sample_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.smoothing_window < 1 {
            return Err(SessionError::InvalidConfiguration(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("majority_confidence", self.majority_confidence),
            ("form_confidence", self.form_confidence),
            ("keypoint_confidence_floor", self.keypoint_confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SessionError::InvalidConfiguration(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("rising_margin", self.rising_margin),
            ("falling_margin", self.falling_margin),
        ] {
            if !(value > 0.0 && value < 0.5) {
                return Err(SessionError::InvalidConfiguration(format!(
                    "{} must be in (0, 0.5), got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SessionConfig {
            sample_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_window_rejected() {
        let config = SessionConfig {
            smoothing_window: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_margin_bounds() {
        for bad in [0.0, 0.5, 0.7, -0.1] {
            let config = SessionConfig {
                rising_margin: bad,
                ..SessionConfig::default()
            };
            assert!(config.validate().is_err(), "margin {} accepted", bad);
        }
        let config = SessionConfig {
            falling_margin: 0.49,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_range() {
        let config = SessionConfig {
            form_confidence: 1.5,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
