use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Two-phase spinner for one build analysis: investigation, then solution.
pub struct PhaseProgress {
    pb: ProgressBar,
    visible: bool,
}

impl PhaseProgress {
    /// A hidden progress never draws, which keeps tests and JSON pipes clean.
    pub fn start_investigation(visible: bool) -> Self {
        if visible {
            eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        }
        let pb = create_spinner(
            bright_yellow("Phase 1/2: Investigating build").to_string(),
            visible,
        );
        Self { pb, visible }
    }

    pub fn finish_investigation_start_solution(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 1/2: Evidence collected ✓").to_string());
        let pb = create_spinner(
            bright_yellow("Phase 2/2: Classifying failure").to_string(),
            self.visible,
        );
        Self {
            pb,
            visible: self.visible,
        }
    }

    pub fn finish_solution(self) {
        self.pb
            .finish_with_message(bright_green("Phase 2/2: Solution ready ✓").to_string());
        if self.visible {
            eprintln!();
        }
    }
}

fn create_spinner(message: String, visible: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(if visible {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    });
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    if visible {
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
    }
    pb
}
