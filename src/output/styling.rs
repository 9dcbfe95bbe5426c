use console::{style, StyledObject};

use crate::agents::solution::BugClass;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Bug classes in a fixed colour each: product red, automation yellow,
/// infrastructure cyan.
pub fn classification(class: BugClass) -> StyledObject<String> {
    match class {
        BugClass::ProductBug => bright_red(class),
        BugClass::AutomationBug => bright_yellow(class),
        BugClass::InfrastructureBug => cyan(class),
    }
}

/// Confidence in `[0, 1]` as a coloured percentage.
pub fn confidence(score: f64) -> StyledObject<String> {
    let text = format!("{:.0}%", score * 100.0);
    if score >= 0.7 {
        bright_green(text)
    } else if score >= 0.4 {
        bright_yellow(text)
    } else {
        bright_red(text)
    }
}
