//! Terminal reporter with colored output

use colored::Colorize;

use crate::analysis::ProjectDependencyAnalysis;
use crate::report::colors::{SectionSymbol, StructureColors};
use crate::usage::ReferenceSet;

/// Renders the four classification views as labeled terminal sections.
pub struct TerminalReporter {
    /// Print usage detail under used-declared artifacts too
    show_usages: bool,
    /// Usage pairs shown per artifact before eliding
    max_usages: usize,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_usages: false,
            max_usages: 5,
        }
    }

    pub fn with_show_usages(mut self, show: bool) -> Self {
        self.show_usages = show;
        self
    }

    pub fn with_max_usages(mut self, max: usize) -> Self {
        self.max_usages = max;
        self
    }

    pub fn report(&self, analysis: &ProjectDependencyAnalysis) {
        println!();
        if !analysis.has_warnings() {
            println!("{}", "No dependency warnings found!".green().bold());
            println!();
        }

        if !analysis.used_declared().is_empty() {
            println!(
                "{}",
                StructureColors::section("Used declared dependencies found:")
            );
            for (artifact, usage) in analysis.used_declared() {
                println!(
                    "  {} {}",
                    SectionSymbol::ok(),
                    StructureColors::artifact(&artifact.to_string())
                );
                if self.show_usages {
                    self.print_usage(usage);
                }
            }
            println!();
        }

        if !analysis.used_undeclared().is_empty() {
            println!(
                "{}",
                StructureColors::section("Used undeclared dependencies found:")
            );
            for (artifact, usage) in analysis.used_undeclared() {
                println!(
                    "  {} {}",
                    SectionSymbol::warning(),
                    StructureColors::artifact(&artifact.to_string())
                );
                // the offending classes are the whole point here
                self.print_usage(usage);
            }
            println!();
        }

        if !analysis.unused_declared().is_empty() {
            println!(
                "{}",
                StructureColors::section("Unused declared dependencies found:")
            );
            for artifact in analysis.unused_declared() {
                println!(
                    "  {} {}",
                    SectionSymbol::warning(),
                    StructureColors::artifact(&artifact.to_string())
                );
            }
            println!();
        }

        if !analysis.test_artifacts_with_non_test_scope().is_empty() {
            println!(
                "{}",
                StructureColors::section("Non-test scoped test only dependencies found:")
            );
            for artifact in analysis.test_artifacts_with_non_test_scope() {
                println!(
                    "  {} {}",
                    SectionSymbol::warning(),
                    StructureColors::artifact(&artifact.to_string())
                );
            }
            println!();
        }

        println!(
            "{} used declared, {} used undeclared, {} unused declared, {} non-test scoped",
            StructureColors::count(&analysis.used_declared().len().to_string()),
            StructureColors::count(&analysis.used_undeclared().len().to_string()),
            StructureColors::count(&analysis.unused_declared().len().to_string()),
            StructureColors::count(
                &analysis
                    .test_artifacts_with_non_test_scope()
                    .len()
                    .to_string()
            ),
        );
    }

    fn print_usage(&self, usage: &ReferenceSet) {
        for pair in usage.iter().take(self.max_usages) {
            println!(
                "      {}",
                format!("{} (used by {})", pair.dependency_class, pair.used_by).dimmed()
            );
        }
        if usage.len() > self.max_usages {
            println!(
                "      {}",
                format!("... and {} more", usage.len() - self.max_usages).dimmed()
            );
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
