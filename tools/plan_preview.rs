/// Plan Preview — prints the volume plan, conflict curve and per-chapter guidance.
///
/// Usage: plan_preview --chapters <n> [--curve <type>] [--per-volume <n>]
///                     [--title <text>] [--config <file.ron>] [--verbose]

use novel_planner::config::PlannerConfig;
use novel_planner::core::curve::CurveType;
use novel_planner::core::plot::PlotManager;
use novel_planner::core::volume::VolumeManager;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut chapters: Option<u32> = None;
    let mut curve: Option<String> = None;
    let mut per_volume: Option<u32> = None;
    let mut title = "Untitled".to_string();
    let mut config_path: Option<String> = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--chapters" if i + 1 < args.len() => {
                i += 1;
                chapters = Some(parse_count(&args[i], "--chapters"));
            }
            "--curve" if i + 1 < args.len() => {
                i += 1;
                curve = Some(args[i].clone());
            }
            "--per-volume" if i + 1 < args.len() => {
                i += 1;
                per_volume = Some(parse_count(&args[i], "--per-volume"));
            }
            "--title" if i + 1 < args.len() => {
                i += 1;
                title = args[i].clone();
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--verbose" | "-v" => verbose = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    init_logging(verbose);

    let Some(total) = chapters else {
        eprintln!("ERROR: --chapters is required");
        process::exit(1);
    };

    let mut config = match config_path {
        Some(ref path) => match PlannerConfig::load_from_ron(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("ERROR: Failed to load config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => PlannerConfig::default(),
    };
    if let Some(ref name) = curve {
        config.curve_type = CurveType::parse(name);
    }

    let plot = PlotManager::from_config(total, &config);
    let mut volumes = VolumeManager::from_config(&config);
    let plan = match volumes.plan_volumes(&title, "", "", total, per_volume) {
        Ok(plan) => plan.clone(),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("=== Volume Plan: {} ===\n", plan.title);
    println!(
        "{} chapters, {} volumes of up to {} chapters\n",
        plan.total_chapters, plan.total_volumes, plan.chapters_per_volume
    );
    for volume in &plan.volumes {
        println!(
            "  Volume {:>2}  ch {:>4}-{:<4} ({:>3})  {}",
            volume.volume_num,
            volume.start_chapter,
            volume.end_chapter,
            volume.chapter_count,
            volume.title
        );
    }

    println!("\n=== Conflict Curve ({}) ===\n", config.curve_type);
    println!("{}", plot.visualize_plot_curve());

    println!("\n=== Chapter Guidance ===\n");
    for volume in &plan.volumes {
        println!("-- Volume {} --", volume.volume_num);
        for chapter in volume.start_chapter..=volume.end_chapter {
            let g = plot.plot_guidance(chapter, None, Some(volume.volume_num), Some(&volume.theme));
            println!(
                "  {:>4}  {:<12} {:.2}  {:<20} {}",
                chapter,
                g.chapter_type_name,
                g.conflict_level,
                g.tone.label(),
                g.content_focus.join(", ")
            );
        }
    }
}

fn parse_count(value: &str, flag: &str) -> u32 {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            eprintln!("ERROR: {} expects a positive integer, got '{}'", flag, value);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn print_usage() {
    println!("Usage: plan_preview --chapters <n> [options]");
    println!();
    println!("Options:");
    println!("  --chapters <n>     total chapters in the book (required)");
    println!("  --curve <type>     wave_with_climax | linear | exponential");
    println!("  --per-volume <n>   chapters per volume (default: by book length)");
    println!("  --title <text>     book title used for volume titles");
    println!("  --config <file>    RON planner config");
    println!("  --verbose, -v      debug logging on stderr");
}
