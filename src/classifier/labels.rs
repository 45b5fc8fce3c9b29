//! Exercise label set for the classifier output head
//!
//! Handles:
//! - Label index to exercise-type mapping (the model's output ordering)
//! - Name lookups for dataset loading and display

use serde::{Deserialize, Serialize};

/// Exercise types the classifier can recognize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Squats,
    Lunges,
    BicepCurls,
    Situps,
    Pushups,
    TricepExtensions,
    DumbbellRows,
    JumpingJacks,
    DumbbellShoulderPress,
    LateralShoulderRaises,
}

/// Output-head ordering: label index i in the model corresponds to
/// `EXERCISE_LABELS[i]`. Training and inference must agree on this.
pub const EXERCISE_LABELS: [ExerciseType; 10] = [
    ExerciseType::Squats,
    ExerciseType::Lunges,
    ExerciseType::BicepCurls,
    ExerciseType::Situps,
    ExerciseType::Pushups,
    ExerciseType::TricepExtensions,
    ExerciseType::DumbbellRows,
    ExerciseType::JumpingJacks,
    ExerciseType::DumbbellShoulderPress,
    ExerciseType::LateralShoulderRaises,
];

impl ExerciseType {
    /// Dataset/config label string
    pub fn name(&self) -> &'static str {
        match self {
            ExerciseType::Squats => "squats",
            ExerciseType::Lunges => "lunges",
            ExerciseType::BicepCurls => "bicep_curls",
            ExerciseType::Situps => "situps",
            ExerciseType::Pushups => "pushups",
            ExerciseType::TricepExtensions => "tricep_extensions",
            ExerciseType::DumbbellRows => "dumbbell_rows",
            ExerciseType::JumpingJacks => "jumping_jacks",
            ExerciseType::DumbbellShoulderPress => "dumbbell_shoulder_press",
            ExerciseType::LateralShoulderRaises => "lateral_shoulder_raises",
        }
    }

    /// Parse a dataset label string
    pub fn from_name(name: &str) -> Option<Self> {
        EXERCISE_LABELS.iter().copied().find(|e| e.name() == name)
    }

    /// Position of this label in the model output head.
    ///
    /// Variant declaration order matches `EXERCISE_LABELS`.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Label for a model output index
    pub fn from_index(index: usize) -> Option<Self> {
        EXERCISE_LABELS.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for &label in EXERCISE_LABELS.iter() {
            assert_eq!(ExerciseType::from_name(label.name()), Some(label));
        }
        assert_eq!(ExerciseType::from_name("handstands"), None);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, &label) in EXERCISE_LABELS.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(ExerciseType::from_index(i), Some(label));
        }
        assert_eq!(ExerciseType::from_index(EXERCISE_LABELS.len()), None);
    }
}
