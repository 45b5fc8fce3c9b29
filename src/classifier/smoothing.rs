//! Classification debouncing over a sliding window
//!
//! Raw per-frame classification is noisy; without debouncing the exercise
//! type would flicker frame to frame and corrupt per-exercise rep counting.
//! The smoothed label changes only when the most recent frames form a
//! strict majority (> N/2) of the window agreeing on one label, with mean
//! confidence above the configured threshold. Alternating windows such as
//! A,B,A,B,A therefore never flip the label.

use std::collections::VecDeque;

use crate::classifier::labels::ExerciseType;
use crate::classifier::model::ClassificationResult;

/// Debounces raw classifications into a stable exercise-type decision
#[derive(Clone, Debug)]
pub struct ClassificationSmoother {
    /// Last N raw (label, confidence) observations, oldest first
    window: VecDeque<(ExerciseType, f32)>,
    capacity: usize,
    majority_confidence: f32,
    current: Option<ExerciseType>,
}

impl ClassificationSmoother {
    pub fn new(window_size: usize, majority_confidence: f32) -> Self {
        ClassificationSmoother {
            window: VecDeque::with_capacity(window_size),
            capacity: window_size.max(1),
            majority_confidence,
            current: None,
        }
    }

    /// Consecutive agreeing frames required for a label change (> N/2)
    fn majority_needed(&self) -> usize {
        self.capacity / 2 + 1
    }

    /// Record one raw classification and return the stabilized label.
    ///
    /// Returns `None` until the first majority forms.
    pub fn observe(&mut self, result: &ClassificationResult) -> Option<ExerciseType> {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back((result.top(), result.confidence()));

        let needed = self.majority_needed();
        if self.window.len() < needed {
            return self.current;
        }

        let recent: Vec<&(ExerciseType, f32)> =
            self.window.iter().rev().take(needed).collect();
        let candidate = recent[0].0;
        if recent.iter().any(|(label, _)| *label != candidate) {
            return self.current;
        }

        let confidences: Vec<f32> = self
            .window
            .iter()
            .filter(|(label, _)| *label == candidate)
            .map(|&(_, conf)| conf)
            .collect();
        let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
        if mean > self.majority_confidence {
            self.current = Some(candidate);
        }

        self.current
    }

    /// Currently stabilized label, if any
    pub fn current(&self) -> Option<ExerciseType> {
        self.current
    }

    /// Clear window and decision (session restart)
    pub fn reset(&mut self) {
        self.window.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: ExerciseType, confidence: f32) -> ClassificationResult {
        let mut probs = vec![(1.0 - confidence) / 9.0; 10];
        probs[label.index()] = confidence;
        ClassificationResult::from_probabilities(probs).unwrap()
    }

    #[test]
    fn test_majority_selects_label() {
        let mut smoother = ClassificationSmoother::new(5, 0.6);
        // A,A,A,B,B: majority A within the window
        for _ in 0..3 {
            smoother.observe(&result(ExerciseType::Squats, 0.9));
        }
        for _ in 0..2 {
            smoother.observe(&result(ExerciseType::Pushups, 0.9));
        }
        assert_eq!(smoother.current(), Some(ExerciseType::Squats));
    }

    #[test]
    fn test_alternating_retains_previous() {
        let mut smoother = ClassificationSmoother::new(5, 0.6);
        for _ in 0..3 {
            smoother.observe(&result(ExerciseType::Pushups, 0.9));
        }
        assert_eq!(smoother.current(), Some(ExerciseType::Pushups));

        // A,B,A,B,A: no stable majority, previous label persists
        for label in [
            ExerciseType::Squats,
            ExerciseType::Pushups,
            ExerciseType::Squats,
            ExerciseType::Pushups,
            ExerciseType::Squats,
        ] {
            let smoothed = smoother.observe(&result(label, 0.9));
            assert_eq!(smoothed, Some(ExerciseType::Pushups));
        }
    }

    #[test]
    fn test_low_confidence_blocks_switch() {
        let mut smoother = ClassificationSmoother::new(5, 0.6);
        for _ in 0..5 {
            smoother.observe(&result(ExerciseType::Squats, 0.4));
        }
        assert_eq!(smoother.current(), None);
    }

    #[test]
    fn test_no_decision_before_majority() {
        let mut smoother = ClassificationSmoother::new(5, 0.6);
        assert_eq!(smoother.observe(&result(ExerciseType::Lunges, 0.9)), None);
        assert_eq!(smoother.observe(&result(ExerciseType::Lunges, 0.9)), None);
        assert_eq!(
            smoother.observe(&result(ExerciseType::Lunges, 0.9)),
            Some(ExerciseType::Lunges)
        );
    }

    #[test]
    fn test_reset_clears_decision() {
        let mut smoother = ClassificationSmoother::new(5, 0.6);
        for _ in 0..3 {
            smoother.observe(&result(ExerciseType::Situps, 0.9));
        }
        assert!(smoother.current().is_some());
        smoother.reset();
        assert_eq!(smoother.current(), None);
        assert_eq!(smoother.observe(&result(ExerciseType::Situps, 0.9)), None);
    }
}
