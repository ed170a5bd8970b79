//! Doorman CLI - interactive simulator
//!
//! Usage:
//!   doorman                                 # Interactive session, in-memory verifier
//!   doorman --store-dir ./verifiers         # Persist the registered verifier
//!   doorman --config doorman.toml --json    # Custom thresholds, JSON output

use clap::Parser;
use colored::Colorize;
use rand::Rng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use doorman::core::crypto::hmac_sha256;
use doorman::core::{
    rhythm_hash, Clock, Doorman, FileStore, GestureRecognizer, ManualClock, MemoryStore,
    RegisterOutcome, TokenSigner, VerifierStore,
};
use doorman::types::{
    DoormanConfig, DoormanEvent, GestureSequence, GestureStep, PanicPattern, PatternRegion,
    PointerEvent, Region, TransitionOutput,
};
use doorman::VERSION;

/// Capture surface used for `trace` files
const SURFACE_WIDTH: f64 = 400.0;
const SURFACE_HEIGHT: f64 = 400.0;

/// Demo signing key for locally minted tokens
const DEMO_SIGNING_KEY: &[u8] = b"doorman-cli-demo-key";

#[derive(Parser, Debug)]
#[command(
    name = "doorman",
    version = VERSION,
    about = "Speakeasy Doorman - ritual gesture authentication simulator",
    long_about = "Drives the Doorman state machine from a prompt.\n\n\
                  Knock, perform a gesture (tap/hold/radial/flick or a pointer trace),\n\
                  then submit it. Time is simulated: use 'wait <ms>' to let windows expire.\n\n\
                  States:\n  \
                  IDLE        - Nothing in progress\n  \
                  CHALLENGED  - Knock accepted, gesture window open\n  \
                  VERIFYING   - Gesture being checked\n  \
                  ADMITTED    - Capability token issued\n  \
                  COOLDOWN    - Wrong gesture, backing off\n  \
                  LOCKED      - Too many failures or panic\n  \
                  DECOY       - Looks admitted, grants nothing"
)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for verifier records (default: in-memory only)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show context after each command and debug logs
    #[arg(short, long)]
    verbose: bool,
}

/// Steps gathered since the last submit/register
#[derive(Default)]
struct Draft {
    steps: Vec<GestureStep>,
    starts: Vec<u64>,
}

impl Draft {
    fn push(&mut self, step: GestureStep, start: u64) {
        self.steps.push(step);
        self.starts.push(start);
    }

    fn take(&mut self, now: u64) -> GestureSequence {
        let first = self.starts.first().copied().unwrap_or(now);
        let sequence = GestureSequence::new(
            std::mem::take(&mut self.steps),
            now.saturating_sub(first),
            rhythm_hash(&self.starts),
            now,
        );
        self.starts.clear();
        sequence
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.starts.clear();
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "doorman=debug" } else { "doorman=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn demo_signer() -> Box<dyn TokenSigner> {
    Box::new(|payload: &[u8]| hex::encode(hmac_sha256(DEMO_SIGNING_KEY, payload)))
}

fn run(args: &Args) -> doorman::Result<()> {
    let config = match &args.config {
        Some(path) => DoormanConfig::load(path)?,
        None => DoormanConfig::default(),
    };
    let store: Box<dyn VerifierStore> = match &args.store_dir {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    };

    let clock = ManualClock::new(0);
    let mut doorman = Doorman::new(config, store, demo_signer())?.with_clock(clock.clone());
    let mut draft = Draft::default();

    print_header(&doorman);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(&doorman, &draft));
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, rest)) = words.split_first() else {
            continue;
        };

        let command = command.to_ascii_lowercase();
        match command.as_str() {
            "quit" | "q" => {
                println!("\nSession ended at t={}ms", clock.now_ms());
                break;
            }
            "help" | "?" => print_help(),
            "knock" => {
                let output = doorman.knock();
                print_output(&output, args);
            }
            "tap" | "hold" | "radial" | "flick" => match parse_step(&command, rest) {
                Ok(step) => {
                    let start = clock.now_ms();
                    clock.advance(step_duration(&step));
                    println!("  + {}", step);
                    draft.push(step, start);
                }
                Err(msg) => print_warning(&msg),
            },
            "trace" => match rest.first() {
                Some(path) => match run_trace(path, &doorman, &clock, &mut draft) {
                    Ok(()) => {}
                    Err(msg) => print_warning(&msg),
                },
                None => print_warning("usage: trace <file.json>"),
            },
            "submit" => {
                if draft.steps.is_empty() {
                    print_warning("no gesture steps recorded");
                    continue;
                }
                let sequence = draft.take(clock.now_ms());
                let output = doorman.submit_gesture(&sequence);
                print_output(&output, args);
            }
            "panic" => {
                let sequence = panic_sequence(&doorman.config().panic_pattern, clock.now_ms());
                draft.clear();
                let output = doorman.submit_gesture(&sequence);
                print_output(&output, args);
            }
            "register" => {
                if draft.steps.is_empty() {
                    print_warning("no gesture steps recorded");
                    continue;
                }
                let sequence = draft.take(clock.now_ms());
                match doorman.register(&sequence) {
                    Ok(RegisterOutcome::AwaitingConfirmation) => {
                        println!("{}", "Captured. Repeat the same gesture and register again.".cyan());
                    }
                    Ok(RegisterOutcome::Registered { created_at }) => {
                        println!("{} (t={}ms)", "Gesture registered.".green().bold(), created_at);
                    }
                    Err(e) => print_warning(&format!("registration restarted: {}", e)),
                }
            }
            "unregister" => match doorman.clear_registration() {
                Ok(true) => println!("Registration cleared."),
                Ok(false) => println!("Nothing registered."),
                Err(e) => print_warning(&e.to_string()),
            },
            "wait" => match rest.first().map(|ms| ms.parse::<u64>()) {
                Some(Ok(ms)) => {
                    clock.advance(ms);
                    while let Some(output) = doorman.tick() {
                        print_output(&output, args);
                    }
                    println!("  t={}ms", clock.now_ms());
                }
                _ => print_warning("usage: wait <ms>"),
            },
            "exit" => {
                let output = doorman.dispatch(DoormanEvent::ExitRequested);
                print_output(&output, args);
            }
            "clear" => {
                draft.clear();
                println!("Draft cleared.");
            }
            "reset" => {
                draft.clear();
                doorman.reset();
                println!("Doorman reset.");
            }
            "status" => print_status(&doorman, args),
            other => print_warning(&format!("unknown command '{}' (try 'help')", other)),
        }

        if args.verbose && !args.json {
            print_context(&doorman);
        }
    }

    Ok(())
}

// =============================================================================
// GESTURE INPUT
// =============================================================================

fn parse_step(command: &str, rest: &[&str]) -> Result<GestureStep, String> {
    let arg = |i: usize, usage: &str| rest.get(i).copied().ok_or_else(|| format!("usage: {}", usage));
    match command {
        "tap" => {
            let usage = "tap <count> <center|edge>";
            let count: u32 = arg(0, usage)?.parse().map_err(|_| format!("usage: {}", usage))?;
            if count == 0 {
                return Err("tap count must be at least 1".to_string());
            }
            let region: Region = arg(1, usage)?.parse()?;
            Ok(GestureStep::Tap { count, region })
        }
        "hold" => {
            let usage = "hold <ms> <center|edge>";
            let duration_ms: u32 = arg(0, usage)?.parse().map_err(|_| format!("usage: {}", usage))?;
            let region: Region = arg(1, usage)?.parse()?;
            Ok(GestureStep::Hold { duration_ms, region })
        }
        "radial" => {
            let usage = "radial <from_deg> <to_deg> <notches>";
            let parse_f = |s: &str| s.parse::<f64>().map_err(|_| format!("usage: {}", usage));
            let from_angle_deg = parse_f(arg(0, usage)?)?;
            let to_angle_deg = parse_f(arg(1, usage)?)?;
            let notches: u32 = arg(2, usage)?.parse().map_err(|_| format!("usage: {}", usage))?;
            Ok(GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches })
        }
        _ => {
            let usage = "flick <up|down|left|right> <px_per_ms>";
            let direction = arg(0, usage)?.parse()?;
            let velocity_px_per_ms: f64 =
                arg(1, usage)?.parse().map_err(|_| format!("usage: {}", usage))?;
            Ok(GestureStep::Flick { direction, velocity_px_per_ms })
        }
    }
}

/// Simulated time a step takes, with a little human jitter
fn step_duration(step: &GestureStep) -> u64 {
    let base = match step {
        GestureStep::Tap { count, .. } => 150 * u64::from(*count),
        GestureStep::Hold { duration_ms, .. } => u64::from(*duration_ms),
        GestureStep::RadialDrag { .. } => 400,
        GestureStep::Flick { .. } => 120,
    };
    base + rand::thread_rng().gen_range(20..80)
}

/// Steps a coerced user would perform for the configured duress pattern
fn panic_sequence(pattern: &PanicPattern, now: u64) -> GestureSequence {
    let concrete = |r: PatternRegion| match r {
        PatternRegion::Edge => Region::Edge,
        PatternRegion::Center | PatternRegion::Any => Region::Center,
    };
    let tap_ms = 150 * u64::from(pattern.tap_count);
    let start = now.saturating_sub(tap_ms + u64::from(pattern.hold_min_duration_ms));
    GestureSequence::new(
        vec![
            GestureStep::Tap { count: pattern.tap_count, region: concrete(pattern.tap_region) },
            GestureStep::Hold {
                duration_ms: pattern.hold_min_duration_ms,
                region: concrete(pattern.hold_region),
            },
        ],
        now - start,
        rhythm_hash(&[start, start + tap_ms]),
        now,
    )
}

/// Replay a JSON array of pointer events through the recognizer
fn run_trace(
    path: &str,
    doorman: &Doorman,
    clock: &ManualClock,
    draft: &mut Draft,
) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    let events: Vec<PointerEvent> =
        serde_json::from_str(&text).map_err(|e| format!("{}: {}", path, e))?;

    let mut recognizer =
        GestureRecognizer::new(doorman.config().recognizer.clone(), SURFACE_WIDTH, SURFACE_HEIGHT)
            .map_err(|e| e.to_string())?;
    recognizer.on_step(Box::new(|step: &GestureStep| println!("  + {}", step)));
    recognizer.start_capture();

    // Trace times are relative; anchor them at the simulated clock
    let base = clock.now_ms();
    let mut last = 0;
    for event in events {
        last = last.max(event.t);
        recognizer.handle(PointerEvent { t: base + event.t, ..event });
    }
    clock.set(base + last);

    let starts = recognizer.step_starts().to_vec();
    match recognizer.end_capture(clock.now_ms()) {
        Some(sequence) => {
            for (step, start) in sequence.steps.into_iter().zip(starts) {
                draft.push(step, start);
            }
            Ok(())
        }
        None => Err("trace produced no gesture steps".to_string()),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_output(output: &TransitionOutput, args: &Args) {
    if args.json {
        match serde_json::to_string(output) {
            Ok(json) => println!("{}", json),
            Err(e) => print_warning(&e.to_string()),
        }
    } else if args.no_color {
        println!("{}", output.to_parseable_string());
    } else if output.changed_state() {
        println!("{}", output.to_terminal_string());
    } else {
        println!("{}", output.to_terminal_string().dimmed());
    }
}

fn print_status(doorman: &Doorman, args: &Args) {
    if args.json {
        let status = serde_json::json!({
            "t": doorman.now(),
            "context": doorman.context(),
            "registered": doorman.is_registered(),
            "registration_pending": doorman.registration_pending(),
            "time_remaining_ms": doorman.time_remaining(),
            "replay_suspicions": doorman.replay_suspicions(),
        });
        println!("{}", status);
        return;
    }
    let ctx = doorman.context();
    println!("  state      : {} {}", ctx.state.emoji(), ctx.state.paint());
    println!("  t          : {}ms", doorman.now());
    match doorman.time_remaining() {
        Some(ms) => println!("  remaining  : {:.1}s", ms as f64 / 1000.0),
        None => println!("  remaining  : -"),
    }
    println!("  failures   : {}", ctx.consecutive_failures);
    println!(
        "  registered : {}{}",
        doorman.is_registered(),
        if doorman.registration_pending() { " (confirmation pending)" } else { "" }
    );
    println!("  suspicions : {}", doorman.replay_suspicions());
    if let Some(token) = doorman.capability() {
        println!("  token      : {} scopes={:?}", token.token_id, token.scopes);
    }
}

fn print_context(doorman: &Doorman) {
    if let Ok(json) = serde_json::to_string_pretty(doorman.context()) {
        println!("{}", json.dimmed());
    }
}

fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg.yellow());
}

fn format_prompt(doorman: &Doorman, draft: &Draft) -> String {
    let pending = if draft.steps.is_empty() {
        String::new()
    } else {
        format!(" +{}", draft.steps.len())
    };
    format!("[{}{}] > ", doorman.state().paint(), pending)
}

fn print_header(doorman: &Doorman) {
    println!();
    println!("{}", "╔═══════════════════════════════════════════╗".cyan());
    println!("{}", format!("║  Speakeasy Doorman v{:<22}║", VERSION).cyan());
    println!("{}", "╚═══════════════════════════════════════════╝".cyan());
    println!();
    println!("Domain: {}", doorman.config().domain);
    if !doorman.is_registered() {
        println!("No gesture registered. Record steps, then 'register' twice.");
    }
    println!("Type 'help' for commands, 'quit' to leave.");
    println!();
}

fn print_help() {
    println!("  knock                             request a challenge");
    println!("  tap <count> <center|edge>         add taps to the gesture");
    println!("  hold <ms> <center|edge>           add a hold");
    println!("  radial <from> <to> <notches>      add a radial drag");
    println!("  flick <dir> <px/ms>               add a flick");
    println!("  trace <file.json>                 add steps recognized from pointer events");
    println!("  submit                            submit the gesture to the doorman");
    println!("  register                          use the gesture as the secret (twice)");
    println!("  panic                             perform the duress gesture");
    println!("  wait <ms>                         advance simulated time");
    println!("  exit                              leave the speakeasy");
    println!("  status                            show doorman state");
    println!("  clear | unregister | reset | quit");
}
