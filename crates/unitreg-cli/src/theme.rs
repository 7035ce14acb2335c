//! Terminal styling for unitreg output.

use std::fmt::Display;

use colored::Colorize;

/// Width of the rule drawn under table headings.
const RULE_WIDTH: usize = 60;

/// Styling helpers shared by every command.
pub(crate) struct Theme;

impl Theme {
    /// Section heading, e.g. a namespace or unit name.
    pub(crate) fn heading(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    /// A unit that loaded.
    pub(crate) fn loaded(id: &str) -> String {
        format!("{} {id}", "✓".green())
    }

    /// A unit that failed, tagged with its failure code.
    pub(crate) fn failed(id: &str, code: &str) -> String {
        format!("{} {} {}", "✗".red(), id.red(), format!("[{code}]").yellow())
    }

    /// Informational note for empty results.
    pub(crate) fn note(text: &str) -> String {
        format!("{} {text}", "·".blue())
    }

    /// De-emphasized text.
    pub(crate) fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    /// Horizontal rule under a table heading.
    pub(crate) fn rule() -> String {
        "─".repeat(RULE_WIDTH).dimmed().to_string()
    }

    /// An aligned `label: value` line inside a unit description.
    pub(crate) fn field(label: &str, value: impl Display) -> String {
        format!("  {:<12} {value}", format!("{label}:").bold())
    }
}
