use std::path::PathBuf;
use std::time::Duration;

use owo_colors::OwoColorize;
use palimpsest_core::AnalysisSummary;
use palimpsest_core::analyze::ChangeRef;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Palimpsest".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Track how a site changed across web archive captures\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print how long a phase took
pub fn print_timing(label: &str, duration: Duration) {
    let secs = duration.as_secs_f64();
    let shown = if secs < 1.0 { format!("{:>8.2}ms", secs * 1000.0) } else { format!("{:>8.2}s ", secs) };
    if secs < 10.0 {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), shown.bright_white());
    } else {
        eprintln!("  {} {}", format!("{}:", label).dimmed(), shown.bright_yellow());
    }
}

fn rule(title: &str) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", title.bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
}

/// Print the headline figures of an analysis run
pub fn print_summary(summary: &AnalysisSummary) {
    rule("Analysis Summary");
    eprintln!("  {} {}", "Comparisons:".dimmed(), summary.total_comparisons.to_string().bright_white());
    eprintln!(
        "  {} {} {}",
        "Significant:".dimmed(),
        summary.significant_changes.to_string().bright_white(),
        format!("(distance ≥ {})", summary.threshold).dimmed()
    );

    if summary.significant_changes == 0 {
        print_info("No changes crossed the significance threshold");
        return;
    }

    eprintln!("\n  {}", "Most changed pages".bold());
    for entry in summary.changes_by_slug.iter().take(5) {
        eprintln!("    {:<32} {}", entry.slug, entry.count.to_string().bright_white());
    }

    if let Some(stats) = &summary.magnitude {
        eprintln!(
            "\n  {} {}  {} {}",
            "Average magnitude:".dimmed(),
            format!("{:.3}", stats.average).bright_white(),
            "max".dimmed(),
            format!("{:.3}", stats.maximum).bright_white()
        );
        for c in &stats.categories {
            eprintln!("    {:<12} {:>4} ({:.1}%)", c.category.as_str(), c.count, c.percent);
        }
    }

    eprintln!("\n  {}", "Largest distance".bold());
    for change in &summary.top_by_distance {
        print_change(change);
    }

    eprintln!("\n  {}", "Highest magnitude".bold());
    for change in &summary.top_by_magnitude {
        print_change(change);
    }
}

fn print_change(change: &ChangeRef) {
    eprintln!(
        "    {} {} → {}  {} {} {}",
        change.slug.bright_white(),
        change.from_ts,
        change.to_ts,
        format!("d={:.3}", change.distance).bright_white(),
        format!("m={:.3}", change.magnitude_score).bright_white(),
        change.change_category.as_str().dimmed()
    );
}

/// List the report files written by a run
pub fn print_reports(written: &[PathBuf]) {
    rule("Reports");
    for path in written {
        eprintln!("  {}", path.display().bright_white());
    }
    eprintln!();
}
