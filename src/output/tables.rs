use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::agents::recommendations::Priority;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Confidence in `[0, 1]` shown as a percentage.
pub fn color_coded_confidence_cell(score: f64) -> Cell {
    let text = format!("{:.0}%", score * 100.0);
    if score >= 0.7 {
        Cell::new(text).fg(TableColor::Green)
    } else if score >= 0.4 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

pub fn color_coded_priority_cell(priority: Priority) -> Cell {
    let color = match priority {
        Priority::Critical => TableColor::Red,
        Priority::High => TableColor::Yellow,
        Priority::Medium => TableColor::Cyan,
        Priority::Low => TableColor::DarkGrey,
    };
    Cell::new(priority.as_str()).fg(color)
}

pub fn status_cell(ok: bool, label: &str) -> Cell {
    Cell::new(label).fg(if ok { TableColor::Green } else { TableColor::Red })
}
