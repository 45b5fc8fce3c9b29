//! Form quality evaluation
//!
//! Judges whether the current movement is performed with valid form. The
//! default policy thresholds the classifier's confidence in the smoothed
//! exercise label: a pose that no longer resembles the exercise reads as
//! bad form. The verdict gates the rep counter and never mutates it.

use serde::{Deserialize, Serialize};

use crate::classifier::labels::ExerciseType;
use crate::classifier::model::ClassificationResult;

/// Binary form verdict gating repetition counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormQuality {
    Good,
    Bad,
}

/// Confidence-threshold form gate.
#[derive(Clone, Copy, Debug)]
pub struct FormEvaluator {
    confidence_threshold: f32,
}

impl FormEvaluator {
    pub fn new(confidence_threshold: f32) -> Self {
        FormEvaluator {
            confidence_threshold,
        }
    }

    /// `Good` iff the classifier's probability for the smoothed label
    /// meets the threshold.
    pub fn evaluate(
        &self,
        result: &ClassificationResult,
        smoothed: ExerciseType,
    ) -> FormQuality {
        if result.probability(smoothed) >= self.confidence_threshold {
            FormQuality::Good
        } else {
            FormQuality::Bad
        }
    }
}
