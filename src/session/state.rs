//! Workout session state and emitted event payloads
//!
//! Maintains:
//! - The per-session smoother and rep counter
//! - The append-only log of emitted rep events
//! - Feedback deduplication and timestamp monotonicity

use std::time::Instant;

use serde::Serialize;

use crate::classifier::labels::ExerciseType;
use crate::classifier::smoothing::ClassificationSmoother;
use crate::session::config::SessionConfig;
use crate::session::form::FormQuality;
use crate::session::reps::RepCounter;

/// One completed repetition. Immutable once emitted.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RepEvent {
    pub timestamp_ms: u64,
    pub exercise: ExerciseType,
    /// 1-based, strictly increasing within a session
    pub rep_index: u32,
    pub form: FormQuality,
}

/// Transient guidance for display ("Go up", "Lost tracking", ...).
#[derive(Clone, Debug, Serialize)]
pub struct FeedbackMessage {
    pub timestamp_ms: u64,
    pub text: String,
}

/// Final read-out of a finished session.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub exercise: Option<ExerciseType>,
    pub rep_count: u32,
    pub duration_secs: f64,
    pub events: Vec<RepEvent>,
}

/// State of one active workout, owned by the session controller.
pub struct WorkoutSession {
    pub(crate) smoother: ClassificationSmoother,
    pub(crate) counter: RepCounter,
    pub(crate) started_at: Instant,
    /// Timestamp of the last accepted frame; frames must be strictly newer
    pub(crate) last_timestamp_ms: Option<u64>,
    pub(crate) events: Vec<RepEvent>,
    pub(crate) last_feedback: Option<String>,
    pub(crate) last_form: Option<FormQuality>,
}

impl WorkoutSession {
    pub(crate) fn new(config: &SessionConfig) -> Self {
        WorkoutSession {
            smoother: ClassificationSmoother::new(
                config.smoothing_window,
                config.majority_confidence,
            ),
            counter: RepCounter::new(config.rising_margin, config.falling_margin),
            started_at: Instant::now(),
            last_timestamp_ms: None,
            events: Vec::new(),
            last_feedback: None,
            last_form: None,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    #[allow(dead_code)]
    pub fn rep_count(&self) -> u32 {
        self.counter.rep_count()
    }

    #[allow(dead_code)]
    pub fn events(&self) -> &[RepEvent] {
        &self.events
    }

    pub(crate) fn summary(&self) -> SessionSummary {
        SessionSummary {
            exercise: self.smoother.current(),
            rep_count: self.counter.rep_count(),
            duration_secs: self.duration_secs(),
            events: self.events.clone(),
        }
    }
}
