//! Gym Pose Trainer - real-time exercise recognition and rep counting
//!
//! Single-session, self-contained CLI application. Runs the full
//! pipeline (normalize -> classify -> smooth -> evaluate -> count)
//! against a simulated camera feed and renders a live workout overlay.

mod classifier;
mod cli;
mod pose;
mod session;

use clap::Parser;
use rand::Rng;
use std::error::Error;
use std::time::{Duration, Instant};

use classifier::{ClassifierConfig, ExerciseClassifier, JointAngleProgress};
use cli::display::Display;
use cli::input::InputHandler;
use pose::{JointId, Keypoint, PoseFrame};
use session::{
    EventSink, FeedbackMessage, FrameSource, RepEvent, SessionConfig, SessionController,
    SessionSummary,
};

#[derive(Parser, Debug)]
#[command(name = "Gym Pose Trainer")]
#[command(about = "Real-time exercise recognition and rep counting from pose keypoints")]
struct Args {
    /// Path to classifier weights
    #[arg(short, long, default_value = "models/classifier_weights.bin")]
    model: String,

    /// Sampling interval in milliseconds
    #[arg(short, long, default_value = "500")]
    interval_ms: u64,

    /// Classification smoothing window size
    #[arg(short, long, default_value = "5")]
    window: usize,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

/// Camera-free workout feed: synthesizes squat-cycle pose frames with
/// detection jitter and occasional tracking dropouts, standing in for an
/// external pose-estimation pipeline.
struct SimulatedWorkoutSource {
    knee_angle: f32,
    /// Degrees per tick; sign flips at the motion bounds
    angle_step: f32,
    timestamp_ms: u64,
    interval_ms: u64,
    rng: rand::rngs::ThreadRng,
}

impl SimulatedWorkoutSource {
    const TOP_ANGLE: f32 = 172.0;
    const BOTTOM_ANGLE: f32 = 76.0;

    fn new(interval_ms: u64) -> Self {
        SimulatedWorkoutSource {
            knee_angle: Self::TOP_ANGLE,
            angle_step: -12.0,
            timestamp_ms: 0,
            interval_ms,
            rng: rand::thread_rng(),
        }
    }

    /// Full-body frame for the current knee angle with positional jitter
    fn synthesize(&mut self) -> PoseFrame {
        let bend = (180.0 - self.knee_angle).to_radians();
        let shin_dx = bend.sin() * 0.4;
        let shin_dy = 0.4 * bend.cos();

        let base = [
            (JointId::LeftShoulder, [-0.2, 1.4, 0.0]),
            (JointId::RightShoulder, [0.2, 1.4, 0.0]),
            (JointId::LeftElbow, [-0.3, 1.1, 0.0]),
            (JointId::RightElbow, [0.3, 1.1, 0.0]),
            (JointId::LeftWrist, [-0.3, 0.8, 0.0]),
            (JointId::RightWrist, [0.3, 0.8, 0.0]),
            (JointId::LeftHip, [-0.15, 0.9, 0.0]),
            (JointId::RightHip, [0.15, 0.9, 0.0]),
            (JointId::LeftKnee, [-0.15, 0.5, 0.0]),
            (JointId::RightKnee, [0.15, 0.5, 0.0]),
            (JointId::LeftAnkle, [-0.15 - shin_dx, 0.5 - shin_dy, 0.0]),
            (JointId::RightAnkle, [0.15 + shin_dx, 0.5 - shin_dy, 0.0]),
        ];

        let detections = base
            .iter()
            .map(|&(joint, p)| {
                let jitter = 0.004;
                Keypoint::new(
                    joint,
                    [
                        p[0] + self.rng.gen_range(-jitter..jitter),
                        p[1] + self.rng.gen_range(-jitter..jitter),
                        p[2],
                    ],
                    self.rng.gen_range(0.85..1.0),
                )
            })
            .collect();

        PoseFrame::new(self.timestamp_ms, detections)
    }
}

impl FrameSource for SimulatedWorkoutSource {
    fn next_frame(&mut self) -> Option<PoseFrame> {
        self.timestamp_ms += self.interval_ms;

        // Occasional tracking dropout: detector produced nothing usable
        if self.rng.gen_bool(0.03) {
            return Some(PoseFrame::new(self.timestamp_ms, vec![]));
        }

        self.knee_angle += self.angle_step + self.rng.gen_range(-1.5..1.5);
        if self.knee_angle <= Self::BOTTOM_ANGLE {
            self.knee_angle = Self::BOTTOM_ANGLE;
            self.angle_step = self.angle_step.abs();
        } else if self.knee_angle >= Self::TOP_ANGLE {
            self.knee_angle = Self::TOP_ANGLE;
            self.angle_step = -self.angle_step.abs();
        }

        Some(self.synthesize())
    }
}

/// Forwards emitted events to the log; the summary carries the full
/// event list for the final read-out
#[derive(Default)]
struct CliSink;

impl EventSink for CliSink {
    fn on_rep_event(&mut self, event: &RepEvent) {
        log::info!(
            "rep {} ({}) at {}ms",
            event.rep_index,
            event.exercise.name(),
            event.timestamp_ms
        );
    }

    fn on_feedback(&mut self, feedback: &FeedbackMessage) {
        log::debug!("feedback: {}", feedback.text);
    }

    fn on_session_ended(&mut self, summary: &SessionSummary) {
        log::info!(
            "session ended: {} reps in {:.1}s",
            summary.rep_count,
            summary.duration_secs
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("🏋️ Gym Pose Trainer v0.1.0");
    println!(
        "Model: {} | Interval: {}ms | Window: {}",
        args.model, args.interval_ms, args.window
    );

    // Load classifier weights up front; a missing model is an error,
    // not a silent fallback
    let mut exercise_classifier =
        ExerciseClassifier::new(&args.model, ClassifierConfig::default());
    if let Err(e) = exercise_classifier.ensure_loaded() {
        eprintln!("❌ {}", e);
        eprintln!("   Train one first: cargo run --bin train -- --dataset <keypoints.json>");
        return Err(e.into());
    }

    let config = SessionConfig {
        sample_interval_ms: args.interval_ms,
        smoothing_window: args.window,
        ..SessionConfig::default()
    };
    let floor = config.keypoint_confidence_floor;
    let mut controller = SessionController::new(
        config,
        exercise_classifier,
        Box::new(JointAngleProgress::new(floor)),
    )?;

    let mut source = SimulatedWorkoutSource::new(args.interval_ms);
    let mut sink = CliSink::default();

    if args.debug {
        println!("✓ Classifier ready, starting simulated workout");
    }

    // Initialize display and input
    let display = Display::new()?;
    display.clear()?;
    InputHandler::enable_raw_mode()?;
    let input = InputHandler::new();

    controller.start()?;

    let interval = Duration::from_millis(args.interval_ms);
    let mut next_tick = Instant::now();

    // Event loop: poll keys between ticks, run the pipeline on cadence
    'workout: loop {
        if let Some(key) = input.read_key()? {
            if InputHandler::is_exit(&key) {
                controller.stop();
                break 'workout;
            }
        }

        if Instant::now() >= next_tick {
            controller.tick(&mut source, &mut sink);
            next_tick += interval;
            // Overrun: drop the missed cadence slots, never queue
            if next_tick < Instant::now() {
                next_tick = Instant::now() + interval;
            }

            if let Some(snapshot) = controller.snapshot() {
                display.clear()?;
                display.show_session(&snapshot)?;
                display.show_help()?;
            }
        }
    }

    let summary = controller.finish(&mut sink);

    // Cleanup
    InputHandler::disable_raw_mode()?;
    display.shutdown()?;

    // Summary
    println!("\n🎉 Workout Complete!");
    if let Some(summary) = summary {
        let exercise = summary
            .exercise
            .map(|e| e.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "📊 Final Stats: {} | {} reps | {:.1}s",
            exercise, summary.rep_count, summary.duration_secs
        );
        if args.debug {
            for event in &summary.events {
                println!(
                    "   rep {} at {}ms ({:?} form)",
                    event.rep_index, event.timestamp_ms, event.form
                );
            }
        }
    }
    println!("🏋️ Nice work!");

    Ok(())
}
