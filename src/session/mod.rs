//! Session Module: Configuration, rep counting, form gating, and control
//!
//! # Components
//! - `config.rs`: Tunable thresholds with fail-fast validation
//! - `errors.rs`: Lifecycle error taxonomy
//! - `state.rs`: Workout session aggregate and event payloads
//! - `reps.rs`: Hysteresis repetition state machine
//! - `form.rs`: Confidence-threshold form gate
//! - `controller.rs`: Per-tick pipeline and sampling loop

pub mod config;
pub mod controller;
pub mod errors;
pub mod form;
pub mod reps;
pub mod state;

pub use config::SessionConfig;
pub use controller::{EventSink, FrameSource, SessionController, SessionSnapshot, StopHandle};
pub use errors::SessionError;
pub use form::{FormEvaluator, FormQuality};
pub use reps::{RepCounter, RepPhase, RepState};
pub use state::{FeedbackMessage, RepEvent, SessionSummary, WorkoutSession};
