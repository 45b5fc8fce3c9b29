//! Candle classifier loading and inference
//!
//! Handles:
//! - Lazy, idempotent loading of pre-trained weights from bincode format
//! - Forward pass producing a per-exercise probability distribution
//! - M1 Metal GPU acceleration support

use candle_core::{Device, Tensor};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classifier::labels::{ExerciseType, EXERCISE_LABELS};
use crate::pose::normalize::{NormalizedVector, FEATURE_COUNT};

/// Probabilities must sum to 1 within this tolerance; otherwise the
/// wrapper re-normalizes the distribution.
pub const PROB_TOLERANCE: f32 = 1e-4;

/// Shape of the classifier MLP (input -> hidden -> labels).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub label_count: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            input_size: FEATURE_COUNT,
            hidden_size: 64,
            label_count: EXERCISE_LABELS.len(),
        }
    }
}

impl ClassifierConfig {
    /// Flat weight-vector length for this shape: w1, b1, w2, b2
    pub fn weight_len(&self) -> usize {
        self.input_size * self.hidden_size
            + self.hidden_size
            + self.hidden_size * self.label_count
            + self.label_count
    }
}

/// Errors produced by the classifier wrapper.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// `classify` was called before a successful load.
    #[error("model is not ready")]
    ModelNotReady,

    /// The weights artifact could not be read or deserialized.
    #[error("failed to load model weights: {0}")]
    LoadFailure(String),

    /// Input vector length does not match the model's input layer.
    #[error("input length {got} does not match expected {expected}")]
    InputShape { expected: usize, got: usize },

    /// Any runtime inference error from the tensor backend.
    #[error("inference failure: {0}")]
    InferenceFailure(String),
}

impl From<candle_core::Error> for ClassifierError {
    fn from(err: candle_core::Error) -> Self {
        ClassifierError::InferenceFailure(err.to_string())
    }
}

/// A valid categorical distribution over exercise labels plus its arg-max.
#[derive(Clone, Debug)]
pub struct ClassificationResult {
    probabilities: Vec<f32>,
    top: ExerciseType,
    confidence: f32,
}

impl ClassificationResult {
    /// Build a result from a raw per-label distribution in
    /// `EXERCISE_LABELS` order, re-normalizing if needed.
    pub fn from_probabilities(probs: Vec<f32>) -> Result<Self, ClassifierError> {
        if probs.len() != EXERCISE_LABELS.len() {
            return Err(ClassifierError::InputShape {
                expected: EXERCISE_LABELS.len(),
                got: probs.len(),
            });
        }
        let probabilities = normalize_distribution(probs)?;
        let (top_index, &top_prob) = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| ClassifierError::InferenceFailure("empty distribution".to_string()))?;
        let top = ExerciseType::from_index(top_index).ok_or_else(|| {
            ClassifierError::InferenceFailure(format!("label index {} out of range", top_index))
        })?;
        Ok(ClassificationResult {
            probabilities,
            top,
            confidence: top_prob,
        })
    }

    /// Per-label probabilities in `EXERCISE_LABELS` order
    #[allow(dead_code)]
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Probability assigned to a specific label
    pub fn probability(&self, label: ExerciseType) -> f32 {
        self.probabilities[label.index()]
    }

    /// Arg-max label
    pub fn top(&self) -> ExerciseType {
        self.top
    }

    /// Probability of the arg-max label
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

struct LoadedWeights {
    w1: Tensor,
    b1: Tensor,
    w2: Tensor,
    b2: Tensor,
}

/// Exercise classifier wrapping an exclusively-owned Candle model.
///
/// The model resource is loaded lazily; `ensure_loaded` is idempotent and
/// may be retried after a failure. A missing or malformed artifact is an
/// error, never a silent fallback.
pub struct ExerciseClassifier {
    config: ClassifierConfig,
    device: Device,
    weights_path: PathBuf,
    weights: Option<LoadedWeights>,
}

impl ExerciseClassifier {
    /// Create an unloaded classifier bound to a weights artifact path
    pub fn new(weights_path: impl Into<PathBuf>, config: ClassifierConfig) -> Self {
        ExerciseClassifier {
            config,
            device: pick_device(),
            weights_path: weights_path.into(),
            weights: None,
        }
    }

    /// Construct an already-loaded classifier from in-memory weights.
    ///
    /// Entry point for embedders and tests that do not ship an artifact
    /// file. Layout: w1 (input x hidden), b1, w2 (hidden x labels), b2.
    pub fn from_weights(
        config: ClassifierConfig,
        weights: Vec<f32>,
    ) -> Result<Self, ClassifierError> {
        let device = pick_device();
        let loaded = build_weights(&config, &weights, &device)?;
        Ok(ExerciseClassifier {
            config,
            device,
            weights_path: PathBuf::new(),
            weights: Some(loaded),
        })
    }

    /// Construct an already-loaded classifier from artifact bytes
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<Self, ClassifierError> {
        let (config, weights) = decode_artifact(bytes)?;
        Self::from_weights(config, weights)
    }

    /// Load the weights artifact if not already loaded.
    ///
    /// Idempotent; a failed attempt leaves the classifier unloaded and may
    /// be retried.
    pub fn ensure_loaded(&mut self) -> Result<(), ClassifierError> {
        if self.weights.is_some() {
            return Ok(());
        }

        let bytes = fs::read(&self.weights_path).map_err(|err| {
            ClassifierError::LoadFailure(format!(
                "{}: {}",
                self.weights_path.display(),
                err
            ))
        })?;
        let (config, weights) = decode_artifact(&bytes)?;
        let loaded = build_weights(&config, &weights, &self.device)?;

        info!(
            "classifier loaded from {} ({} -> {} -> {} labels)",
            self.weights_path.display(),
            config.input_size,
            config.hidden_size,
            config.label_count
        );
        self.config = config;
        self.weights = Some(loaded);
        Ok(())
    }

    /// Whether a successful load has completed
    pub fn is_loaded(&self) -> bool {
        self.weights.is_some()
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    #[allow(dead_code)]
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    /// Run one forward pass and return a valid categorical distribution.
    pub fn classify(
        &self,
        vector: &NormalizedVector,
    ) -> Result<ClassificationResult, ClassifierError> {
        let weights = self.weights.as_ref().ok_or(ClassifierError::ModelNotReady)?;

        if vector.len() != self.config.input_size {
            return Err(ClassifierError::InputShape {
                expected: self.config.input_size,
                got: vector.len(),
            });
        }

        let input = Tensor::from_slice(
            vector.features(),
            (1, self.config.input_size),
            &self.device,
        )?;
        let hidden = input.matmul(&weights.w1)?.broadcast_add(&weights.b1)?.relu()?;
        let logits = hidden.matmul(&weights.w2)?.broadcast_add(&weights.b2)?;

        let rows = logits.to_vec2::<f32>()?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::InferenceFailure("empty logits".to_string()))?;

        ClassificationResult::from_probabilities(softmax(&row))
    }
}

/// Use Metal GPU on macOS, fallback to CPU
fn pick_device() -> Device {
    #[cfg(target_os = "macos")]
    let device = Device::new_metal(0).unwrap_or(Device::Cpu);
    #[cfg(not(target_os = "macos"))]
    let device = Device::Cpu;
    device
}

fn decode_artifact(bytes: &[u8]) -> Result<(ClassifierConfig, Vec<f32>), ClassifierError> {
    let (config, weights): (ClassifierConfig, Vec<f32>) = bincode::deserialize(bytes)
        .map_err(|err| ClassifierError::LoadFailure(format!("malformed artifact: {}", err)))?;

    if config.label_count != EXERCISE_LABELS.len() {
        return Err(ClassifierError::LoadFailure(format!(
            "artifact has {} labels, engine expects {}",
            config.label_count,
            EXERCISE_LABELS.len()
        )));
    }
    if config.input_size != FEATURE_COUNT {
        return Err(ClassifierError::LoadFailure(format!(
            "artifact expects {} input features, engine produces {}",
            config.input_size, FEATURE_COUNT
        )));
    }
    if weights.len() != config.weight_len() {
        return Err(ClassifierError::LoadFailure(format!(
            "artifact has {} weights, shape requires {}",
            weights.len(),
            config.weight_len()
        )));
    }
    Ok((config, weights))
}

fn build_weights(
    config: &ClassifierConfig,
    weights: &[f32],
    device: &Device,
) -> Result<LoadedWeights, ClassifierError> {
    if weights.len() != config.weight_len() {
        return Err(ClassifierError::LoadFailure(format!(
            "{} weights provided, shape requires {}",
            weights.len(),
            config.weight_len()
        )));
    }

    let w1_len = config.input_size * config.hidden_size;
    let b1_len = config.hidden_size;
    let w2_len = config.hidden_size * config.label_count;

    let mut offset = 0;
    let w1 = Tensor::from_slice(
        &weights[offset..offset + w1_len],
        (config.input_size, config.hidden_size),
        device,
    )?;
    offset += w1_len;
    let b1 = Tensor::from_slice(&weights[offset..offset + b1_len], b1_len, device)?;
    offset += b1_len;
    let w2 = Tensor::from_slice(
        &weights[offset..offset + w2_len],
        (config.hidden_size, config.label_count),
        device,
    )?;
    offset += w2_len;
    let b2 = Tensor::from_slice(&weights[offset..], config.label_count, device)?;

    Ok(LoadedWeights { w1, b1, w2, b2 })
}

/// Normalize logits to probabilities using softmax
fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return vec![];
    }

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.iter().map(|&x| x / sum).collect()
}

/// Enforce a valid categorical distribution, re-normalizing if the sum
/// drifts outside tolerance.
fn normalize_distribution(mut probs: Vec<f32>) -> Result<Vec<f32>, ClassifierError> {
    for p in probs.iter_mut() {
        if *p < 0.0 {
            *p = 0.0;
        }
    }
    let sum: f32 = probs.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(ClassifierError::InferenceFailure(
            "degenerate probability mass".to_string(),
        ));
    }
    if (sum - 1.0).abs() > PROB_TOLERANCE {
        for p in probs.iter_mut() {
            *p /= sum;
        }
    }
    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tiny deterministic model: logit 0 = 64 * |sum(features)|, rest 0.
    /// Any input with a clearly nonzero feature sum classifies as the
    /// first label (squats) with near-certain confidence.
    fn test_classifier() -> ExerciseClassifier {
        let config = ClassifierConfig {
            input_size: FEATURE_COUNT,
            hidden_size: 2,
            label_count: EXERCISE_LABELS.len(),
        };
        let mut weights = Vec::with_capacity(config.weight_len());
        // w1: column 0 = +8, column 1 = -8 for every input row
        for _ in 0..config.input_size {
            weights.push(8.0);
            weights.push(-8.0);
        }
        // b1
        weights.extend_from_slice(&[0.0, 0.0]);
        // w2: both hidden units feed label 0
        for _ in 0..2 {
            weights.push(8.0);
            weights.extend(std::iter::repeat(0.0).take(config.label_count - 1));
        }
        // b2
        weights.extend(std::iter::repeat(0.0).take(config.label_count));
        ExerciseClassifier::from_weights(config, weights).unwrap()
    }

    fn input_with_sum(sum: f32) -> NormalizedVector {
        let mut features = vec![0.0f32; FEATURE_COUNT];
        features[0] = sum;
        NormalizedVector::from_features(features)
    }

    #[test]
    fn test_classify_valid_distribution() {
        let classifier = test_classifier();
        let result = classifier.classify(&input_with_sum(1.0)).unwrap();

        assert_eq!(result.probabilities().len(), EXERCISE_LABELS.len());
        let total: f32 = result.probabilities().iter().sum();
        assert!((total - 1.0).abs() < PROB_TOLERANCE);
        assert!(result.probabilities().iter().all(|&p| p >= 0.0));
        assert_eq!(result.top(), ExerciseType::Squats);
        assert!(result.confidence() > 0.99);
        assert_eq!(result.probability(result.top()), result.confidence());
    }

    #[test]
    fn test_classify_before_load_fails() {
        let classifier =
            ExerciseClassifier::new("does/not/exist.bin", ClassifierConfig::default());
        assert!(!classifier.is_loaded());
        assert!(matches!(
            classifier.classify(&input_with_sum(1.0)),
            Err(ClassifierError::ModelNotReady)
        ));
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let mut classifier =
            ExerciseClassifier::new("does/not/exist.bin", ClassifierConfig::default());
        assert!(matches!(
            classifier.ensure_loaded(),
            Err(ClassifierError::LoadFailure(_))
        ));
        // still retryable, still unloaded
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn test_input_shape_mismatch() {
        let classifier = test_classifier();
        let short = NormalizedVector::from_features(vec![0.0; 10]);
        assert!(matches!(
            classifier.classify(&short),
            Err(ClassifierError::InputShape {
                expected: FEATURE_COUNT,
                got: 10
            })
        ));
    }

    #[test]
    fn test_artifact_round_trip() {
        let config = ClassifierConfig {
            input_size: FEATURE_COUNT,
            hidden_size: 2,
            label_count: EXERCISE_LABELS.len(),
        };
        let weights = vec![0.5f32; config.weight_len()];
        let bytes = bincode::serialize(&(config, weights)).unwrap();

        let classifier = ExerciseClassifier::from_artifact_bytes(&bytes).unwrap();
        assert!(classifier.is_loaded());
        let result = classifier.classify(&input_with_sum(0.3)).unwrap();
        let total: f32 = result.probabilities().iter().sum();
        assert!((total - 1.0).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_artifact_wrong_weight_count() {
        let config = ClassifierConfig::default();
        let bytes = bincode::serialize(&(config, vec![0.5f32; 3])).unwrap();
        assert!(matches!(
            ExerciseClassifier::from_artifact_bytes(&bytes),
            Err(ClassifierError::LoadFailure(_))
        ));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert_eq!(probs.len(), 3);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 0.0001);
    }
}
