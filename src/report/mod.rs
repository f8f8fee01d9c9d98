mod colors;
mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use std::path::PathBuf;

use crate::analysis::ProjectDependencyAnalysis;
use crate::error::Result;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Default terminal output with colored sections
    #[default]
    Terminal,
    /// JSON machine-readable format
    Json,
}

/// Options for report generation
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Output file path (for JSON)
    pub output_path: Option<PathBuf>,
    /// Print usage detail under used-declared artifacts too
    pub show_usages: bool,
    /// Usage pairs shown per artifact before eliding
    pub max_usages: usize,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self {
            output_path: None,
            show_usages: false,
            max_usages: 5,
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Reporter for outputting dependency analysis results
pub struct Reporter {
    format: ReportFormat,
    options: ReportOptions,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            options: ReportOptions {
                output_path,
                ..Default::default()
            },
        }
    }

    pub fn with_options(format: ReportFormat, options: ReportOptions) -> Self {
        Self { format, options }
    }

    /// Report the analysis results
    pub fn report(&self, analysis: &ProjectDependencyAnalysis) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new()
                    .with_show_usages(self.options.show_usages)
                    .with_max_usages(self.options.max_usages);
                reporter.report(analysis);
                Ok(())
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.options.output_path.clone());
                reporter.report(analysis)
            }
        }
    }
}
