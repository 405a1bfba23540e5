use std::env;
use std::fs;
use std::process::ExitCode;

use replay_cli::{
    parse_demo, record_demo, serialize_demo, summarize_demo, verify_demo, VerifyOutcome,
    DEFAULT_DIGEST_EVERY,
};

const USAGE: &str = "\
usage:
  replay_cli record <path> [seed] [players] [ticks]
  replay_cli verify <path>
  replay_cli inspect <path>";

const DEFAULT_SEED: u32 = 0xC0FF_EE01;
const DEFAULT_PLAYERS: u8 = 2;
const DEFAULT_TICKS: u64 = 700;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    match command.as_str() {
        "record" => record(&args[1..]),
        "verify" => verify(&args[1..]),
        "inspect" => inspect(&args[1..]),
        other => {
            eprintln!("unknown command {other:?}\n{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn record(args: &[String]) -> ExitCode {
    let Some(path) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let seed = parse_arg(args.get(1), DEFAULT_SEED);
    let players = parse_arg(args.get(2), DEFAULT_PLAYERS).clamp(1, 8);
    let ticks = parse_arg(args.get(3), DEFAULT_TICKS);

    let demo = record_demo(seed, players, ticks, DEFAULT_DIGEST_EVERY);
    if let Err(error) = fs::write(path, serialize_demo(&demo)) {
        eprintln!("failed to write {path}: {error}");
        return ExitCode::FAILURE;
    }
    println!("recorded {ticks} ticks to {path}");
    println!("final digest {}", demo.final_digest);
    ExitCode::SUCCESS
}

fn verify(args: &[String]) -> ExitCode {
    let Some(demo) = load(args) else {
        return ExitCode::from(2);
    };
    match verify_demo(&demo) {
        VerifyOutcome::Match => {
            println!("ok: {} ticks, digest {}", demo.ticks, demo.final_digest);
            ExitCode::SUCCESS
        }
        VerifyOutcome::Diverged {
            tick,
            expected,
            actual,
        } => {
            eprintln!("diverged at tick {tick}");
            eprintln!("  expected {expected}");
            eprintln!("  actual   {actual}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(args: &[String]) -> ExitCode {
    let Some(demo) = load(args) else {
        return ExitCode::from(2);
    };
    print!("{}", summarize_demo(&demo));
    ExitCode::SUCCESS
}

fn load(args: &[String]) -> Option<replay_cli::Demo> {
    let path = args.first()?;
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("failed to read {path}: {error}");
            return None;
        }
    };
    match parse_demo(&text) {
        Ok(demo) => Some(demo),
        Err(error) => {
            eprintln!("failed to parse {path}: {error}");
            None
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(raw: Option<&String>, fallback: T) -> T {
    raw.and_then(|value| value.parse().ok()).unwrap_or(fallback)
}
