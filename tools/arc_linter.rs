/// Arc Linter — validates a character arc configuration file.
///
/// Usage: arc_linter <arcs.json> [--verbose]

use novel_planner::core::arc::CharacterArcTracker;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: arc_linter <arcs.json> [--verbose]");
        process::exit(0);
    }

    let config_path = &args[1];
    let verbose = args[2..].iter().any(|a| a == "--verbose" || a == "-v");

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut tracker = CharacterArcTracker::new();
    let report = match tracker.load_from_json_file(Path::new(config_path)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Failed to load arc config: {}", e);
            process::exit(1);
        }
    };

    println!("=== Arc Lint Report: {} ===\n", config_path);

    for name in tracker.characters() {
        if let Some(summary) = tracker.progression_summary(name) {
            println!(
                "  OK  {}: {} states, triggers at {:?}, {} milestones",
                name, summary.total_states, summary.trigger_chapters, summary.milestones_count
            );
            if verbose {
                println!("        {}", summary.states.join(" -> "));
            }
        }
    }

    for key in &report.metadata_keys {
        println!("  --  {} (metadata, ignored)", key);
    }

    for skipped in &report.skipped {
        println!("ERROR: {} skipped: {}", skipped.character, skipped.reason);
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    println!(
        "\nSummary: {} loaded, {} skipped, {} warnings",
        report.loaded.len(),
        report.skipped.len(),
        report.warnings.len()
    );

    if report.is_empty() {
        eprintln!("ERROR: no valid characters loaded");
        process::exit(1);
    }
}
