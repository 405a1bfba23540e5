use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use sim::{Buttons, InputCommand};

pub const DEMO_MAGIC: &str = "# overspin demo v1";
pub const DEFAULT_DIGEST_EVERY: u64 = 35;

/// A recorded session: enough to re-run the simulation bit for bit and
/// check it against the digests taken while recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demo {
    pub seed: u32,
    pub players: u8,
    pub ticks: u64,
    /// Non-neutral commands only; absent entries replay as neutral.
    pub commands: BTreeMap<(u64, u8), InputCommand>,
    /// Periodic digests, keyed by the tick they were taken after.
    pub digests: BTreeMap<u64, String>,
    pub final_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemoParseError {
    #[error("missing or wrong magic line (expected {DEMO_MAGIC:?})")]
    BadMagic,
    #[error("line {line}: unknown directive {directive:?}")]
    UnknownDirective { line: usize, directive: String },
    #[error("line {line}: malformed {directive} entry")]
    Malformed { line: usize, directive: &'static str },
    #[error("demo is missing its final digest")]
    MissingFinalDigest,
}

/// Serialize a demo to the line format:
///
/// ```text
/// # overspin demo v1
/// seed 3203386881
/// players 2
/// ticks 700
/// cmd <tick> <player> <throttle> <steer> <aim> <buttons-hex>
/// digest <tick> <hex>
/// end <hex>
/// ```
pub fn serialize_demo(demo: &Demo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{DEMO_MAGIC}");
    let _ = writeln!(out, "seed {}", demo.seed);
    let _ = writeln!(out, "players {}", demo.players);
    let _ = writeln!(out, "ticks {}", demo.ticks);
    for ((tick, player), cmd) in &demo.commands {
        let _ = writeln!(
            out,
            "cmd {} {} {} {} {} {:04x}",
            tick,
            player,
            cmd.throttle,
            cmd.steer,
            cmd.aim,
            cmd.buttons.bits()
        );
    }
    for (tick, digest) in &demo.digests {
        let _ = writeln!(out, "digest {tick} {digest}");
    }
    let _ = writeln!(out, "end {}", demo.final_digest);
    out
}

pub fn parse_demo(text: &str) -> Result<Demo, DemoParseError> {
    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, first)) if first.trim() == DEMO_MAGIC => {}
        _ => return Err(DemoParseError::BadMagic),
    }

    let mut seed = 0u32;
    let mut players = 1u8;
    let mut ticks = 0u64;
    let mut commands = BTreeMap::new();
    let mut digests = BTreeMap::new();
    let mut final_digest = None;

    for (index, raw) in lines {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let directive = fields.next().unwrap_or_default();
        let rest: Vec<&str> = fields.collect();
        match directive {
            "seed" => {
                seed = parse_field(&rest, 0, line_no, "seed")?;
            }
            "players" => {
                players = parse_field(&rest, 0, line_no, "players")?;
            }
            "ticks" => {
                ticks = parse_field(&rest, 0, line_no, "ticks")?;
            }
            "cmd" => {
                let tick: u64 = parse_field(&rest, 0, line_no, "cmd")?;
                let player: u8 = parse_field(&rest, 1, line_no, "cmd")?;
                let throttle: i8 = parse_field(&rest, 2, line_no, "cmd")?;
                let steer: i8 = parse_field(&rest, 3, line_no, "cmd")?;
                let aim: i16 = parse_field(&rest, 4, line_no, "cmd")?;
                let bits = u16::from_str_radix(
                    rest.get(5).ok_or(DemoParseError::Malformed {
                        line: line_no,
                        directive: "cmd",
                    })?,
                    16,
                )
                .map_err(|_| DemoParseError::Malformed {
                    line: line_no,
                    directive: "cmd",
                })?;
                commands.insert(
                    (tick, player),
                    InputCommand {
                        throttle,
                        steer,
                        aim,
                        buttons: Buttons::from_bits_truncate(bits),
                    },
                );
            }
            "digest" => {
                let tick: u64 = parse_field(&rest, 0, line_no, "digest")?;
                let digest = rest
                    .get(1)
                    .ok_or(DemoParseError::Malformed {
                        line: line_no,
                        directive: "digest",
                    })?
                    .to_string();
                digests.insert(tick, digest);
            }
            "end" => {
                final_digest = rest.first().map(|value| value.to_string());
            }
            other => {
                return Err(DemoParseError::UnknownDirective {
                    line: line_no,
                    directive: other.to_string(),
                });
            }
        }
    }

    Ok(Demo {
        seed,
        players,
        ticks,
        commands,
        digests,
        final_digest: final_digest.ok_or(DemoParseError::MissingFinalDigest)?,
    })
}

fn parse_field<T: std::str::FromStr>(
    rest: &[&str],
    index: usize,
    line: usize,
    directive: &'static str,
) -> Result<T, DemoParseError> {
    rest.get(index)
        .and_then(|raw| raw.parse().ok())
        .ok_or(DemoParseError::Malformed { line, directive })
}

/// Run the built-in scripted session and record it as a demo.
pub fn record_demo(seed: u32, players: u8, ticks: u64, digest_every: u64) -> Demo {
    let mut world = game::build_world(seed, players as usize);
    let mut commands = BTreeMap::new();
    let mut digests = BTreeMap::new();
    let digest_every = digest_every.max(1);

    for tick in 0..ticks {
        let mut frame = Vec::with_capacity(players as usize);
        for player in 0..players {
            let cmd = game::scripted_command(tick, player as usize);
            if cmd != InputCommand::neutral() {
                commands.insert((tick, player), cmd);
            }
            frame.push(cmd);
        }
        sim::run_tick(&mut world, &frame);
        if (tick + 1) % digest_every == 0 {
            digests.insert(tick, world.digest_hex());
        }
    }

    Demo {
        seed,
        players,
        ticks,
        commands,
        digests,
        final_digest: world.digest_hex(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Match,
    Diverged {
        tick: u64,
        expected: String,
        actual: String,
    },
}

/// Re-run a demo from scratch and compare every recorded digest, reporting
/// the first divergence tick. This is the determinism law made executable:
/// identical command streams must reproduce identical state.
pub fn verify_demo(demo: &Demo) -> VerifyOutcome {
    let mut world = game::build_world(demo.seed, demo.players as usize);
    for tick in 0..demo.ticks {
        let frame: Vec<InputCommand> = (0..demo.players)
            .map(|player| {
                demo.commands
                    .get(&(tick, player))
                    .copied()
                    .unwrap_or_else(InputCommand::neutral)
            })
            .collect();
        sim::run_tick(&mut world, &frame);
        if let Some(expected) = demo.digests.get(&tick) {
            let actual = world.digest_hex();
            if &actual != expected {
                return VerifyOutcome::Diverged {
                    tick,
                    expected: expected.clone(),
                    actual,
                };
            }
        }
    }
    let actual = world.digest_hex();
    if actual != demo.final_digest {
        return VerifyOutcome::Diverged {
            tick: demo.ticks,
            expected: demo.final_digest.clone(),
            actual,
        };
    }
    VerifyOutcome::Match
}

/// One-line-per-fact summary for `inspect`.
pub fn summarize_demo(demo: &Demo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "seed: {}", demo.seed);
    let _ = writeln!(out, "players: {}", demo.players);
    let _ = writeln!(out, "ticks: {}", demo.ticks);
    let _ = writeln!(out, "commands: {}", demo.commands.len());
    let _ = writeln!(out, "digests: {}", demo.digests.len());
    let _ = writeln!(out, "final: {}", demo.final_digest);
    out
}
