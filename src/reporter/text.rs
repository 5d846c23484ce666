//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{AnalysisResult, ChangeSummary, Finding, Severity};
use colored::{ColoredString, Colorize};
use comfy_table::{Cell, Color, ContentArrangement, Table};

const RULE_WIDTH: usize = 80;

/// Text report generator for CLI output.
#[derive(Debug, Clone, Copy)]
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to append the overview table
    verbose: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            verbose: config.output.verbose,
        }
    }

    /// Apply `style` only when colors are on.
    fn paint(&self, text: &str, style: impl FnOnce(ColoredString) -> ColoredString) -> String {
        if self.use_colors {
            style(text.normal()).to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        self.paint(text, |s| s.dimmed())
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, result: &AnalysisResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header());
        output.push_str(&self.format_changes(&result.summary));

        if result.is_clean() {
            output.push_str(&format!(
                "\n  {}  {}\n\n",
                self.paint("✓", |s| s.bright_green()),
                self.paint("No findings, plan looks safe", |s| s.bright_green()),
            ));
            return Ok(output);
        }

        output.push_str(&self.format_risk(result));

        for (index, finding) in result.findings.iter().enumerate() {
            output.push_str(&self.format_finding(index + 1, finding));
        }

        if self.verbose {
            output.push_str(&self.format_overview(&result.findings));
        }

        Ok(output)
    }
}

impl TextReporter {
    /// Format the report header.
    fn format_header(&self) -> String {
        format!(
            "\n  {}\n  {}\n\n",
            self.paint("TERRAFORM PLAN ANALYSIS", |s| s.bright_white().bold()),
            self.dim(&"=".repeat(RULE_WIDTH)),
        )
    }

    /// Format the change-kind line.
    fn format_changes(&self, summary: &ChangeSummary) -> String {
        if summary.total() == 0 {
            return format!("  {}  No resource changes detected\n", self.dim("∅"));
        }

        let mut parts = Vec::new();
        if summary.create > 0 {
            parts.push(self.paint(&format!("+{} create", summary.create), |s| s.green().bold()));
        }
        if summary.update > 0 {
            parts.push(self.paint(&format!("~{} update", summary.update), |s| s.yellow().bold()));
        }
        if summary.delete > 0 {
            parts.push(self.paint(&format!("-{} delete", summary.delete), |s| s.red().bold()));
        }
        if summary.replace > 0 {
            parts.push(self.paint(&format!("!{} replace", summary.replace), |s| {
                s.bright_red().bold()
            }));
        }

        format!(
            "  {}  {}\n",
            self.dim("CHANGES"),
            parts.join(self.dim(" | ").as_str())
        )
    }

    /// Format the overall severity line.
    fn format_risk(&self, result: &AnalysisResult) -> String {
        let count = result.findings.len();
        let badge = result
            .overall_severity
            .map_or_else(String::new, |s| self.badge(s));
        format!(
            "  {}  {} {}\n\n",
            self.dim("RISK"),
            badge,
            self.dim(&format!(
                "({count} finding{})",
                if count == 1 { "" } else { "s" }
            )),
        )
    }

    fn badge(&self, severity: Severity) -> String {
        if !self.use_colors {
            return format!("[{}]", severity.as_str().to_uppercase());
        }
        match severity {
            Severity::High => " HIGH ".on_red().bright_white().bold().to_string(),
            Severity::Medium => " MED  ".on_yellow().black().bold().to_string(),
            Severity::Low => " LOW  ".on_blue().bright_white().bold().to_string(),
        }
    }

    fn severity_style(severity: Severity) -> impl FnOnce(ColoredString) -> ColoredString {
        move |s: ColoredString| match severity {
            Severity::High => s.bright_red(),
            Severity::Medium => s.bright_yellow(),
            Severity::Low => s.blue(),
        }
    }

    fn tag(&self, tag: &str) -> String {
        self.paint(tag, |s| match tag {
            "security" => s.red(),
            "downtime" | "data" => s.bright_red(),
            "network" => s.magenta(),
            "ops" | "capacity" => s.yellow(),
            "cost" => s.cyan(),
            _ => s.white(),
        })
    }

    /// Format a single finding.
    fn format_finding(&self, index: usize, finding: &Finding) -> String {
        let bar = self.dim("│");
        let mut output = format!(
            "  {} {}  {}\n",
            self.badge(finding.severity),
            self.dim(&format!("#{index}")),
            self.paint(&finding.title, |s| Self::severity_style(finding.severity)(s).bold()),
        );

        output.push_str(&format!(
            "  {bar}  {} {}\n",
            self.dim("Resource:"),
            self.paint(&finding.address, |s| s.cyan().bold()),
        ));

        if !finding.tags.is_empty() {
            let tags: Vec<String> = finding.tags.iter().map(|t| self.tag(t)).collect();
            output.push_str(&format!(
                "  {bar}  {} {}\n",
                self.dim("Tags:"),
                tags.join(self.dim(", ").as_str())
            ));
        }

        if !finding.why.is_empty() {
            output.push_str(&format!("  {bar}\n  {bar}  {}\n", self.paint("Why:", |s| s.white().bold())));
            let arrow = self.paint("→", Self::severity_style(finding.severity));
            for reason in &finding.why {
                output.push_str(&format!("  {bar}  {arrow} {reason}\n"));
            }
        }

        if !finding.recommendations.is_empty() {
            output.push_str(&format!(
                "  {bar}\n  {bar}  {}\n",
                self.paint("Recommendations:", |s| s.white().bold())
            ));
            let check = self.dim("□");
            for rec in &finding.recommendations {
                output.push_str(&format!("  {bar}  {check} {rec}\n"));
            }
        }

        output.push('\n');
        output
    }

    /// Format the overview table shown in verbose mode.
    fn format_overview(&self, findings: &[Finding]) -> String {
        let mut output = format!(
            "  {}\n  {}\n",
            self.paint("Overview", |s| s.bright_cyan().bold()),
            "-".repeat(RULE_WIDTH)
        );

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Severity", "Address", "Tags"]);

        for (index, finding) in findings.iter().enumerate() {
            let severity = finding.severity.as_str().to_uppercase();
            let severity_cell = if self.use_colors {
                Cell::new(&severity).fg(match finding.severity {
                    Severity::High => Color::Red,
                    Severity::Medium => Color::Yellow,
                    Severity::Low => Color::Blue,
                })
            } else {
                Cell::new(&severity)
            };
            table.add_row(vec![
                Cell::new(index + 1),
                severity_cell,
                Cell::new(&finding.address),
                Cell::new(finding.tags.join(", ")),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }
}
