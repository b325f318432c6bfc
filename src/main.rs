//! Vivacity CLI
//!
//! Usage:
//!   vivacity --replay trace.jsonl           # Replay a recorded measurement trace
//!   vivacity --interactive                  # Drive a session by hand from stdin
//!   vivacity --serve                        # HTTP API server
//!   vivacity --replay trace.jsonl --json    # JSON output

use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use vivacity::core::{replay, run_server, FeedOutcome, ReplayReport, SessionController};
use vivacity::types::{FaceMeasurement, FrameReport, LivenessConfig, StepChanged};
use vivacity::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "vivacity",
    version = VERSION,
    about = "Vivacity - challenge-response face liveness verification",
    long_about = "Vivacity decides whether a live face is in front of the camera by\n\
                  walking it through timed challenges fed by per-frame face measurements.\n\n\
                  Modes:\n  \
                  --replay       Replay a JSON-lines measurement trace\n  \
                  --interactive  Type measurements by hand\n  \
                  --serve        HTTP API server mode\n\n\
                  Steps:\n  \
                  WAITING     - Press start\n  \
                  LOOK_RIGHT  - Turn head right (yaw < -15) for 1 s\n  \
                  LOOK_LEFT   - Turn head left (yaw > 15) for 1 s\n  \
                  BLINK       - Close and reopen both eyes within 200-1000 ms\n  \
                  COMPLETED   - Live face verified"
)]
struct Args {
    /// Replay a recorded trace (JSON lines)
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Interactive mode - read commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file with threshold overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "vivacity=trace"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let config = match &args.config {
        Some(path) => match LivenessConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!("Failed to load config {}: {}", path.display(), err);
                std::process::exit(2);
            }
        },
        None => LivenessConfig::default(),
    };

    if args.serve {
        if let Err(err) = run_server(&args.addr, config).await {
            error!("Server error: {}", err);
            std::process::exit(1);
        }
    } else if let Some(ref path) = args.replay {
        run_replay(path, config, &args);
    } else {
        if !args.interactive {
            debug!("No mode given, defaulting to interactive");
        }
        run_interactive(config, &args);
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Replay a trace file and print every step change
fn run_replay(path: &Path, config: LivenessConfig, args: &Args) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!("Cannot open trace {}: {}", path.display(), err);
            std::process::exit(2);
        }
    };

    let report = match replay(BufReader::new(file), config) {
        Ok(report) => report,
        Err(err) => {
            error!("Replay failed: {}", err);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => error!("Failed to encode report: {}", err),
        }
    } else {
        print_header("Replay", args.no_color);
        for event in &report.events {
            print_event(event, args.no_color);
        }
        println!();
        print_summary(&report, args.no_color);
    }

    if !report.passed() {
        std::process::exit(3);
    }
}

/// Interactive mode: commands are evaluated against the real clock
fn run_interactive(config: LivenessConfig, args: &Args) {
    let mut controller = SessionController::new(config);

    print_header("Interactive", args.no_color);
    println!("Commands:");
    println!("  start | reset | status | diag | quit");
    println!("  face <yaw> <left_eye> <right_eye>   e.g. face -20 0.9 0.9");
    println!("  none                                frame without a face");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{}] > ", controller.step());
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let command = match parse_command(line.trim()) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("  {}", message);
                continue;
            }
        };

        match command {
            Command::Quit => {
                println!("\nSession ended at step {}", controller.step());
                break;
            }
            Command::Start => match controller.start() {
                Ok(event) => print_event(&event, args.no_color),
                Err(err) => println!("  {}", err),
            },
            Command::Reset => {
                let event = controller.reset();
                print_event(&event, args.no_color);
            }
            Command::Status => {
                let snapshot = controller.snapshot();
                if args.json {
                    println!("{}", serde_json::to_string(&snapshot).unwrap_or_default());
                } else {
                    println!(
                        "  step={} status={} gen={} in-step={}ms blink_latched={}",
                        snapshot.step,
                        snapshot.status,
                        snapshot.generation,
                        snapshot.elapsed_in_step_ms,
                        snapshot.blink_detected
                    );
                }
            }
            Command::Diagnostics => {
                println!("  {}", controller.diagnostics().to_overlay_string());
            }
            Command::Frame(report) => {
                let tag = controller.generation();
                let outcome = controller.feed_frame(&report, tag);
                print_outcome(&outcome, args);
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Start,
    Reset,
    Status,
    Diagnostics,
    Quit,
    Frame(FrameReport),
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "reset" => Command::Reset,
        "status" => Command::Status,
        "diag" => Command::Diagnostics,
        "quit" | "exit" => Command::Quit,
        "none" => Command::Frame(FrameReport::default()),
        "face" | "f" => {
            let values: Vec<f64> = parts
                .map(|p| p.parse::<f64>().map_err(|_| format!("not a number: {}", p)))
                .collect::<Result<_, _>>()?;
            let [yaw, left, right] = values[..] else {
                return Err("usage: face <yaw> <left_eye> <right_eye>".to_string());
            };
            Command::Frame(FrameReport::with_faces(vec![FaceMeasurement::new(yaw, left, right)]))
        }
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn print_header(mode: &str, no_color: bool) {
    let title = format!("  Vivacity v{} - {}", VERSION, mode);
    if no_color {
        println!("========================================");
        println!("{}", title);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("{}", title.bold());
        println!("{}", "========================================".bold());
    }
    println!();
}

fn print_event(event: &StepChanged, no_color: bool) {
    if no_color {
        println!("{}", event.to_parseable_string());
    } else {
        println!("{}", event.to_terminal_string());
    }
}

fn print_outcome(outcome: &FeedOutcome, args: &Args) {
    if args.json {
        println!("{}", serde_json::to_string(outcome).unwrap_or_default());
        return;
    }
    match outcome {
        FeedOutcome::Advanced { event } => {
            print_event(event, args.no_color);
            if event.status == vivacity::types::LivenessStatus::Completed {
                let msg = "  ✓ VERIFIED - live face confirmed";
                if args.no_color {
                    println!("{}", msg);
                } else {
                    println!("{}", msg.green().bold());
                }
            }
        }
        other => println!("  {}", other.reason()),
    }
}

fn print_summary(report: &ReplayReport, no_color: bool) {
    println!(
        "frames={} stale={} detector_failures={} rejected_commands={}",
        report.frames, report.stale_frames, report.detector_failures, report.rejected_commands
    );
    println!("{}", report.diagnostics.to_overlay_string());
    let verdict = if report.passed() {
        format!("VERIFIED (step {})", report.final_snapshot.step)
    } else {
        format!("NOT VERIFIED (stopped at {})", report.final_snapshot.step)
    };
    if no_color {
        println!("{}", verdict);
    } else if report.passed() {
        println!("{}", verdict.green().bold());
    } else {
        println!("{}", verdict.red().bold());
    }
}
