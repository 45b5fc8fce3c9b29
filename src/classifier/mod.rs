//! Classifier Module: Model inference, label set, smoothing, and progress
//!
//! # Components
//! - `model.rs`: Candle classifier loading and inference
//! - `labels.rs`: Exercise label set and index mapping
//! - `smoothing.rs`: Sliding-window classification debounce
//! - `progress.rs`: Per-exercise movement-progress strategies

pub mod labels;
pub mod model;
pub mod progress;
pub mod smoothing;

pub use labels::{ExerciseType, EXERCISE_LABELS};
pub use model::{ClassificationResult, ClassifierConfig, ClassifierError, ExerciseClassifier};
pub use progress::{JointAngleProgress, ProgressExtractor};
pub use smoothing::ClassificationSmoother;
