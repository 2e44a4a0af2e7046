use crate::index::types::RunReport;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Display a run summary on stdout
pub fn show_report(report: &RunReport, output_dir: &Path, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    writeln!(stdout, "Index Summary")?;
    writeln!(stdout, "=============")?;
    writeln!(stdout)?;
    writeln!(
        stdout,
        "Workers:          {} map, {} reduce",
        report.map_threads, report.reduce_threads
    )?;
    writeln!(stdout, "Files listed:     {}", report.total_files)?;
    writeln!(stdout, "Files indexed:    {}", report.indexed_files)?;
    writeln!(stdout, "Distinct words:   {}", report.distinct_words)?;
    writeln!(stdout, "Merges:           {}", report.merges)?;
    writeln!(stdout, "Elapsed:          {}", format_elapsed(report.elapsed_ms))?;

    // Busiest buckets first
    let mut buckets: Vec<_> = report.buckets.iter().filter(|b| b.entries > 0).collect();
    buckets.sort_by(|a, b| b.entries.cmp(&a.entries).then(a.letter.cmp(&b.letter)));
    if !buckets.is_empty() {
        writeln!(stdout)?;
        writeln!(stdout, "Largest buckets:")?;
        for bucket in buckets.iter().take(5) {
            writeln!(stdout, "  {}  {}", bucket.letter, bucket.entries)?;
        }
    }

    if !report.skipped.is_empty() {
        writeln!(stdout)?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        writeln!(stdout, "Skipped {} unreadable file(s):", report.skipped.len())?;
        stdout.reset()?;
        for file in &report.skipped {
            write!(stdout, "  [{}] ", file.file_index)?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(stdout, "{}", file.path.display())?;
            stdout.reset()?;
            writeln!(stdout, ": {}", file.reason)?;
        }
    }

    writeln!(stdout)?;
    writeln!(stdout, "Buckets written to: {}", output_dir.display())?;
    Ok(())
}

/// Save the report as pretty-printed JSON
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;
    Ok(())
}

/// Format milliseconds to human readable
fn format_elapsed(ms: u64) -> String {
    if ms >= 60_000 {
        format!("{}m {:.1}s", ms / 60_000, (ms % 60_000) as f64 / 1000.0)
    } else if ms >= 1000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}
