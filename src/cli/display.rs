//! Terminal display and workout overlay rendering
//!
//! Features:
//! - Detected exercise type and live rep count
//! - Movement progress bar with phase direction
//! - Form indicator and guidance feedback line

use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{stdout, Write};

use crate::session::controller::SessionSnapshot;
use crate::session::form::FormQuality;
use crate::session::reps::RepPhase;

const PROGRESS_BAR_WIDTH: usize = 30;

/// Terminal display manager
pub struct Display;

impl Display {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Display)
    }

    /// Clear screen
    pub fn clear(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();
        execute!(
            stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    /// Render the full workout overlay for one tick
    pub fn show_session(
        &self,
        snapshot: &SessionSnapshot,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();

        let exercise = snapshot
            .exercise
            .map(|e| e.name().to_uppercase())
            .unwrap_or_else(|| "DETECTING...".to_string());

        execute!(
            stdout,
            cursor::MoveTo(0, 1),
            SetForegroundColor(Color::Cyan),
            Print("Exercise: "),
            ResetColor,
            Print(format!("{}\n", exercise)),
            cursor::MoveTo(0, 2),
            SetForegroundColor(Color::Magenta),
            Print("Reps: "),
            ResetColor,
            Print(format!(
                "{}  |  Time: {:.0}s\n",
                snapshot.rep_count, snapshot.duration_secs
            )),
        )?;

        self.show_progress(snapshot.progress, snapshot.phase)?;

        if let Some(form) = snapshot.form {
            let (color, label) = match form {
                FormQuality::Good => (Color::Green, "GOOD"),
                FormQuality::Bad => (Color::Red, "FIX FORM"),
            };
            execute!(
                stdout,
                cursor::MoveTo(0, 4),
                Print("Form: "),
                SetForegroundColor(color),
                Print(format!("{}\n", label)),
                ResetColor,
            )?;
        }

        if let Some(feedback) = &snapshot.feedback {
            execute!(
                stdout,
                cursor::MoveTo(0, 6),
                SetForegroundColor(Color::Yellow),
                Print(format!("{}\n", feedback)),
                ResetColor,
            )?;
        }

        stdout.flush()?;
        Ok(())
    }

    /// Movement progress bar with phase direction
    fn show_progress(
        &self,
        progress: f32,
        phase: RepPhase,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();

        let filled = ((progress.clamp(0.0, 1.0)) * PROGRESS_BAR_WIDTH as f32).round() as usize;
        let bar: String = "█".repeat(filled) + &"░".repeat(PROGRESS_BAR_WIDTH - filled);
        let arrow = match phase {
            RepPhase::Idle => " ",
            RepPhase::Descending => "▼",
            RepPhase::Ascending => "▲",
        };

        execute!(
            stdout,
            cursor::MoveTo(0, 3),
            Print("Movement: "),
            SetForegroundColor(if progress > 0.9 {
                Color::Green
            } else if progress > 0.5 {
                Color::Yellow
            } else {
                Color::DarkGrey
            }),
            Print(bar),
            ResetColor,
            Print(format!(" {}\n", arrow)),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Show help text
    pub fn show_help(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = stdout();

        execute!(
            stdout,
            cursor::MoveTo(0, 8),
            SetForegroundColor(Color::DarkGrey),
            Print("Press q or Esc to stop the workout\n"),
            ResetColor
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Reset terminal state and cleanup
    pub fn shutdown(&self) -> Result<(), Box<dyn std::error::Error>> {
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}
