#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs pursuit sessions headlessly.

mod session;

use std::{fs, io, path::{Path, PathBuf}, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use pursuit_core::{Difficulty, RulesetConfig};
use pursuit_rendering::{DegradingPresenter, NullPresenter, Presenter, TextPresenter};
use pursuit_system_round::RoundStateMachine;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::session::{Session, SessionOptions};

/// Rule presets selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RulesetPreset {
    /// Untimed rounds with the close-range evader.
    Classic,
    /// Sixty-second rounds with the avoiding evader.
    Timed,
}

impl RulesetPreset {
    fn config(self) -> RulesetConfig {
        match self {
            Self::Classic => RulesetConfig::classic(),
            Self::Timed => RulesetConfig::timed(),
        }
    }
}

/// Evader difficulty accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Command-line arguments for the pursuit session runner.
#[derive(Debug, Parser)]
#[command(name = "pursuit", about = "Run pursuit rounds on a generated grid")]
struct CliArgs {
    /// Rule preset used when the configuration file does not provide one.
    #[arg(long, value_enum, default_value = "classic")]
    ruleset: RulesetPreset,

    /// TOML file with an optional `difficulty` and `[ruleset]` table.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Evader difficulty; overrides the configuration file.
    #[arg(long, value_enum)]
    difficulty: Option<DifficultyArg>,

    /// Steer the pursuer with scripted manual moves along the displayed path.
    #[arg(long)]
    manual: bool,

    /// Number of rounds to play before quitting.
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Seed for reproducible sessions; entropy is used when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    /// Frame budget for the whole session.
    #[arg(long, default_value_t = 1_000_000)]
    max_frames: u64,

    /// Draw every Nth frame to stdout; 0 disables drawing.
    #[arg(long, default_value_t = 30)]
    render_every: u64,

    /// Sleep between frames so the session runs at wall-clock speed.
    #[arg(long)]
    realtime: bool,
}

/// Contents of the optional configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    difficulty: Option<Difficulty>,
    ruleset: Option<RulesetConfig>,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();

    let args = CliArgs::parse();
    if args.frame_rate == 0 {
        bail!("--frame-rate must be positive");
    }

    let file = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };
    let ruleset = file.ruleset.unwrap_or_else(|| args.ruleset.config());
    ruleset.validate().context("ruleset failed validation")?;
    let difficulty = args
        .difficulty
        .map(Difficulty::from)
        .or(file.difficulty)
        .unwrap_or_default();

    let machine = match args.seed {
        Some(seed) => RoundStateMachine::seeded(ruleset, seed),
        None => RoundStateMachine::from_entropy(ruleset),
    };
    let presenter: Box<dyn Presenter> = if args.render_every == 0 {
        Box::new(NullPresenter)
    } else {
        Box::new(DegradingPresenter::new(TextPresenter::new(io::stdout())))
    };
    let options = SessionOptions {
        difficulty,
        manual: args.manual,
        rounds: args.rounds,
        frame: Duration::from_secs(1) / args.frame_rate,
        max_frames: args.max_frames,
        render_every: args.render_every,
        realtime: args.realtime,
    };

    let summary = Session::new(machine, presenter, options).run()?;
    info!(
        rounds = summary.rounds,
        wins = summary.wins,
        best_score = summary.best_score,
        frames = summary.frames,
        "session finished"
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn parse_config(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).context("failed to parse configuration toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::EvaderPolicyKind;

    #[test]
    fn empty_config_falls_back_to_preset() {
        let file = parse_config("").expect("empty file is valid");

        assert!(file.ruleset.is_none());
        assert!(file.difficulty.is_none());
    }

    #[test]
    fn partial_ruleset_fills_remaining_fields() {
        let file = parse_config(
            r#"
            difficulty = "hard"

            [ruleset]
            time_limit_secs = 30
            evader_policy = "avoid"

            [ruleset.tuning]
            grid_size = 12
            "#,
        )
        .expect("valid configuration");

        assert_eq!(file.difficulty, Some(Difficulty::Hard));
        let ruleset = file.ruleset.expect("ruleset table present");
        assert_eq!(ruleset.time_limit_secs, Some(30));
        assert_eq!(ruleset.evader_policy, EvaderPolicyKind::Avoid);
        assert_eq!(ruleset.tuning.grid_size, 12);
        assert_eq!(
            ruleset.tuning.stuck_threshold,
            RulesetConfig::classic().tuning.stuck_threshold
        );
        ruleset.validate().expect("ruleset is valid");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("speed = 3").is_err());
        assert!(parse_config(
            r#"
            [ruleset]
            time_limit_sec = 30

            [ruleset.tuning]
            wall_probabilty = 0.9
            "#,
        )
        .is_err());
        assert!(parse_config("[ruleset]\nretry = true").is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = parse_config(
            r#"
            [ruleset.tuning]
            wall_probability = 1.5
            "#,
        )
        .expect("parses");

        let ruleset = file.ruleset.expect("ruleset table present");
        assert!(ruleset.validate().is_err());
    }

    #[test]
    fn arguments_parse() {
        let args = CliArgs::try_parse_from([
            "pursuit",
            "--ruleset",
            "timed",
            "--difficulty",
            "easy",
            "--manual",
            "--seed",
            "7",
            "--render-every",
            "0",
        ])
        .expect("valid arguments");

        assert_eq!(args.ruleset, RulesetPreset::Timed);
        assert_eq!(args.difficulty, Some(DifficultyArg::Easy));
        assert!(args.manual);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.render_every, 0);
        assert_eq!(args.rounds, 1);
    }
}
