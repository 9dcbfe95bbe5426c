mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{export_analysis, export_json};
pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};

/// Prints the `triagelens` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔍 triagelens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI failure triage")
    );
}
