//! Centralized color scheme for consistent output formatting

use colored::{ColoredString, Colorize};

/// Structural element colors
pub struct StructureColors;

impl StructureColors {
    /// Section headers
    pub fn section(text: &str) -> ColoredString {
        text.cyan().bold()
    }

    /// Artifact coordinates
    pub fn artifact(text: &str) -> ColoredString {
        text.white().bold()
    }

    /// Count/statistics numbers
    pub fn count(text: &str) -> ColoredString {
        text.white().bold()
    }
}

/// Per-section status symbols
pub struct SectionSymbol;

impl SectionSymbol {
    /// A dependency in good standing
    pub fn ok() -> ColoredString {
        "✓".green().bold()
    }

    /// A dependency the build should fix
    pub fn warning() -> ColoredString {
        "⚠".yellow()
    }
}
