//! Session orchestration: per-tick pipeline and the sampling loop
//!
//! Owns exactly one active workout session and drives
//! normalize -> classify -> smooth -> evaluate -> count on a fixed
//! cadence. Each tick runs synchronously to completion, so no two
//! inference calls ever overlap; a tick that overruns the interval skips
//! its sleep and the stale frame is dropped, never queued. Any pipeline
//! stage failure degrades that tick to a no-op with a transient feedback
//! message and leaves rep state untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::classifier::labels::ExerciseType;
use crate::classifier::model::ExerciseClassifier;
use crate::classifier::progress::ProgressExtractor;
use crate::pose::keypoints::PoseFrame;
use crate::pose::normalize::KeypointNormalizer;
use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::form::{FormEvaluator, FormQuality};
use crate::session::reps::RepPhase;
use crate::session::state::{FeedbackMessage, RepEvent, SessionSummary, WorkoutSession};

/// Supplies pose frames, one pull per tick.
///
/// Implementations should return the most recent frame available; the
/// engine never queues, so older frames are simply dropped.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<PoseFrame>;
}

/// Consumes session output events (UI layer, logs, recorders).
pub trait EventSink {
    fn on_rep_event(&mut self, event: &RepEvent);
    fn on_feedback(&mut self, feedback: &FeedbackMessage);
    fn on_session_ended(&mut self, summary: &SessionSummary);
}

/// Cloneable handle for requesting a stop from outside the sampling
/// loop; the loop observes it within one tick interval.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Live view of session state for display.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub exercise: Option<ExerciseType>,
    pub phase: RepPhase,
    pub progress: f32,
    pub rep_count: u32,
    pub form: Option<FormQuality>,
    pub feedback: Option<String>,
    pub duration_secs: f64,
}

/// Owns one workout session and the pipeline components driving it.
pub struct SessionController {
    config: SessionConfig,
    normalizer: KeypointNormalizer,
    evaluator: FormEvaluator,
    classifier: ExerciseClassifier,
    progress: Box<dyn ProgressExtractor>,
    session: Option<WorkoutSession>,
    stop_flag: Arc<AtomicBool>,
}

impl SessionController {
    /// Validate configuration and assemble the pipeline.
    pub fn new(
        config: SessionConfig,
        classifier: ExerciseClassifier,
        progress: Box<dyn ProgressExtractor>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(SessionController {
            normalizer: KeypointNormalizer::new(config.keypoint_confidence_floor),
            evaluator: FormEvaluator::new(config.form_confidence),
            config,
            classifier,
            progress,
            session: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Begin a fresh session, resetting smoother, counter and stop flag.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.classifier.is_loaded() {
            return Err(SessionError::ModelNotReady);
        }
        if self.session.is_some() {
            return Err(SessionError::SessionAlreadyActive);
        }
        self.stop_flag.store(false, Ordering::SeqCst);
        self.session = Some(WorkoutSession::new(&self.config));
        Ok(())
    }

    /// Request the sampling loop to halt. Idempotent, safe from any
    /// thread, a no-op when nothing is running.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Handle for stopping the session from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_flag))
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Live state for display, if a session is active
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|session| {
            let state = session.counter.state();
            SessionSnapshot {
                exercise: session.smoother.current(),
                phase: state.phase,
                progress: state.progress,
                rep_count: state.rep_count,
                form: session.last_form,
                feedback: session.last_feedback.clone(),
                duration_secs: session.duration_secs(),
            }
        })
    }

    /// Run the sampling loop until stopped, then finalize the session.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn EventSink,
    ) -> Option<SessionSummary> {
        let interval = Duration::from_millis(self.config.sample_interval_ms);
        while self.session.is_some() && !self.stop_flag.load(Ordering::SeqCst) {
            let tick_start = Instant::now();
            self.tick(source, sink);

            let elapsed = tick_start.elapsed();
            if elapsed >= interval {
                warn!(
                    "tick overran the {}ms interval ({}ms), dropping stale frame",
                    self.config.sample_interval_ms,
                    elapsed.as_millis()
                );
            } else {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.finish(sink)
    }

    /// Finalize and clear the session, emitting its summary. No-op when
    /// no session is active (stop is idempotent).
    pub fn finish(&mut self, sink: &mut dyn EventSink) -> Option<SessionSummary> {
        self.stop_flag.store(true, Ordering::SeqCst);
        let session = self.session.take()?;
        let summary = session.summary();
        sink.on_session_ended(&summary);
        Some(summary)
    }

    /// Execute one pipeline tick. Stage failures skip the tick with a
    /// transient feedback message; they never abort the session.
    pub fn tick(&mut self, source: &mut dyn FrameSource, sink: &mut dyn EventSink) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let fallback_ts = session.last_timestamp_ms.unwrap_or(0);
        let Some(frame) = source.next_frame() else {
            emit_feedback(session, sink, fallback_ts, "Lost tracking");
            return;
        };

        // Timestamps must be strictly increasing within the session
        if let Some(last) = session.last_timestamp_ms {
            if frame.timestamp_ms <= last {
                warn!(
                    "out-of-order frame dropped: {} after {}",
                    frame.timestamp_ms, last
                );
                return;
            }
        }
        session.last_timestamp_ms = Some(frame.timestamp_ms);

        let vector = match self.normalizer.normalize(&frame) {
            Ok(vector) => vector,
            Err(err) => {
                debug!("normalization skipped tick: {}", err);
                emit_feedback(session, sink, frame.timestamp_ms, "Lost tracking");
                return;
            }
        };

        let result = match self.classifier.classify(&vector) {
            Ok(result) => result,
            Err(err) => {
                warn!("classification skipped tick: {}", err);
                emit_feedback(session, sink, frame.timestamp_ms, "Lost tracking");
                return;
            }
        };

        let Some(exercise) = session.smoother.observe(&result) else {
            emit_feedback(session, sink, frame.timestamp_ms, "Detecting exercise...");
            return;
        };

        let form = self.evaluator.evaluate(&result, exercise);
        session.last_form = Some(form);

        let Some(sample) = self.progress.progress(exercise, &frame) else {
            emit_feedback(session, sink, frame.timestamp_ms, "Lost tracking");
            return;
        };

        if let Some(count) = session.counter.update(sample, form) {
            let event = RepEvent {
                timestamp_ms: frame.timestamp_ms,
                exercise,
                rep_index: count,
                form,
            };
            session.events.push(event);
            sink.on_rep_event(&event);
        }

        let text = if form == FormQuality::Bad {
            "Fix your form"
        } else {
            match session.counter.state().phase {
                RepPhase::Idle | RepPhase::Descending => "Go down",
                RepPhase::Ascending => "Go up",
            }
        };
        emit_feedback(session, sink, frame.timestamp_ms, text);
    }
}

/// Forward feedback to the sink, suppressing consecutive duplicates
fn emit_feedback(
    session: &mut WorkoutSession,
    sink: &mut dyn EventSink,
    timestamp_ms: u64,
    text: &str,
) {
    if session.last_feedback.as_deref() == Some(text) {
        return;
    }
    session.last_feedback = Some(text.to_string());
    sink.on_feedback(&FeedbackMessage {
        timestamp_ms,
        text: text.to_string(),
    });
}
