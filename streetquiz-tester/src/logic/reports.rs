use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use streetquiz_game::{RoundLength, format_length};

use super::{RunRecord, StrategySummary};

/// Context shared by every report format.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    pub street_count: usize,
    pub round_length: String,
    pub policy: String,
    pub levels: Vec<String>,
}

impl ReportContext {
    #[must_use]
    pub fn new(
        street_count: usize,
        round_length: RoundLength,
        policy: &str,
        levels: &[RoundLength],
    ) -> Self {
        Self {
            street_count,
            round_length: round_length.to_string(),
            policy: policy.to_string(),
            levels: levels.iter().map(ToString::to_string).collect(),
        }
    }
}

fn success_rate(summaries: &[StrategySummary]) -> f64 {
    let runs: usize = summaries.iter().map(|s| s.runs).sum();
    let passed: usize = summaries.iter().map(|s| s.passed_runs).sum();
    if runs == 0 {
        return 0.0;
    }
    streetquiz_game::numbers::usize_to_f64(passed) / streetquiz_game::numbers::usize_to_f64(runs)
        * 100.0
}

pub fn write_console_report(
    out: &mut dyn Write,
    context: &ReportContext,
    summaries: &[StrategySummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Round Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;
    writeln!(out, "Streets in pool: {}", context.street_count)?;
    writeln!(out, "Round length: {}", context.round_length)?;
    writeln!(out, "Guess policy: {}", context.policy)?;
    writeln!(out, "Difficulty levels: {}", context.levels.join(", "))?;
    writeln!(out, "Success rate: {:.1}%", success_rate(summaries))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for summary in summaries {
        let status = if summary.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, summary.strategy.bold())?;
        writeln!(out, "   Runs: {}/{} passed", summary.passed_runs, summary.runs)?;
        writeln!(out, "   Accuracy: {:.1}%", summary.mean_accuracy * 100.0)?;
        writeln!(
            out,
            "   Mean error distance: {}",
            format_length(summary.mean_distance_m)
        )?;
        writeln!(out, "   Average time: {:?}", summary.average_duration)?;
        for warning in &summary.warnings {
            writeln!(out, "   ⚠ {}", warning.yellow())?;
        }
        if !summary.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &summary.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    context: &'a ReportContext,
    summaries: &'a [StrategySummary],
    runs: &'a [RunRecord],
}

pub fn write_json_report(
    out: &mut dyn Write,
    context: &ReportContext,
    summaries: &[StrategySummary],
    runs: &[RunRecord],
) -> Result<()> {
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        context,
        summaries,
        runs,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn write_markdown_report(
    out: &mut dyn Write,
    context: &ReportContext,
    summaries: &[StrategySummary],
) -> Result<()> {
    writeln!(out, "# StreetQuiz Round Simulation\n")?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Streets in pool**: {}", context.street_count)?;
    writeln!(out, "- **Round length**: {}", context.round_length)?;
    writeln!(out, "- **Guess policy**: {}", context.policy)?;
    writeln!(out, "- **Difficulty levels**: {}", context.levels.join(", "))?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(summaries))?;

    writeln!(out, "## Strategies\n")?;
    writeln!(out, "| Strategy | Runs | Passed | Accuracy | Mean error |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for summary in summaries {
        writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {} |",
            summary.strategy,
            summary.runs,
            summary.passed_runs,
            summary.mean_accuracy * 100.0,
            format_length(summary.mean_distance_m)
        )?;
    }
    writeln!(out)?;

    for summary in summaries.iter().filter(|s| !s.failures.is_empty()) {
        writeln!(out, "### ❌ {}\n", summary.strategy)?;
        for failure in &summary.failures {
            writeln!(out, "- {failure}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
