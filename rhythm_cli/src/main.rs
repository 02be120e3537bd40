use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{ensure, Context};
use beatmap_parser::{FormatHint, PatternOptions};
use clap::{Parser, Subcommand};
use rhythm_core::gameplay::EngineConfig;

mod simulate;

use simulate::SimulateOptions;

#[derive(Debug, Parser)]
#[command(name = "rhythm")]
#[command(about = "Beatmap tools for the rhythm judgement core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an OSU or native beatmap into native JSON.
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check whether a beatmap can start a song.
    Validate { input: PathBuf },
    /// Autoplay a beatmap offline and report the result.
    Simulate {
        input: PathBuf,
        /// Engine config as JSON; missing fields take defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Press this far off target, alternating late and early.
        #[arg(long, default_value_t = 0)]
        jitter_ms: i64,
        /// Leave every Nth note unpressed.
        #[arg(long)]
        skip_every: Option<usize>,
        /// Print only the final result.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Write a beat-grid chart for an audio file as native JSON.
    Generate {
        /// Audio filename the chart plays against.
        audio: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,
        /// Chart length in seconds.
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
        /// 0.0 to 1.0; higher fills more off-beats.
        #[arg(long, default_value_t = 0.6)]
        difficulty: f64,
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=4))]
        lanes: u8,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert { input, output } => {
            let beatmap = beatmap_parser::parse_file(&input)
                .with_context(|| format!("parse failed: {}", input.display()))?;
            let json = beatmap_parser::to_json_string(&beatmap)
                .context("failed to serialize beatmap")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            log::info!("wrote {}", out_path.display());
        }
        Command::Validate { input } => {
            let beatmap = beatmap_parser::parse_file(&input)
                .with_context(|| format!("parse failed: {}", input.display()))?;
            println!("title: {}", beatmap.title());
            println!("artist: {}", beatmap.artist());
            println!("audio: {}", beatmap.audio_filename().unwrap_or("-"));
            match beatmap.bpm() {
                Some(bpm) => println!("bpm: {bpm}"),
                None => println!("bpm: -"),
            }
            println!(
                "notes: {} ({} holds)",
                beatmap.hit_objects.len(),
                beatmap.hold_count()
            );
            println!("length: {}ms", beatmap.last_time_ms());

            if let Err(e) = beatmap_parser::check(&beatmap) {
                println!("invalid: {e}");
                return Ok(ExitCode::FAILURE);
            }
            println!("ok");
        }
        Command::Simulate {
            input,
            config,
            jitter_ms,
            skip_every,
            quiet,
        } => {
            let beatmap = beatmap_parser::parse_file(&input)
                .with_context(|| format!("parse failed: {}", input.display()))?;
            let config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            let options = SimulateOptions {
                jitter_ms,
                skip_every: skip_every.filter(|n| *n > 0),
                print_events: !quiet,
            };

            let result = simulate::run_simulation(beatmap, config, &options)
                .with_context(|| format!("simulation failed: {}", input.display()))?;
            let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
            println!("{json}");
        }
        Command::Generate {
            audio,
            output,
            bpm,
            duration,
            difficulty,
            lanes,
        } => {
            ensure!(bpm.is_finite() && bpm > 0.0, "bpm must be positive, got {bpm}");
            ensure!(
                (0.0..=1.0).contains(&difficulty),
                "difficulty must be within 0.0..=1.0, got {difficulty}"
            );
            let options = PatternOptions {
                bpm,
                duration_secs: duration,
                difficulty,
                lanes,
            };
            let audio_name = audio.to_string_lossy();
            let beatmap = beatmap_parser::generate_beatmap(&audio_name, &options);
            let json = beatmap_parser::to_json_string(&beatmap)
                .context("failed to serialize beatmap")?;
            let out_path = output.unwrap_or_else(|| audio.with_extension("json"));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            println!(
                "wrote {} ({} notes)",
                out_path.display(),
                beatmap.hit_objects.len()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `song.osu` becomes `song.json`; a native input gets `song.converted.json`.
fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    if FormatHint::from_path(input) == FormatHint::Native {
        out.set_extension("converted.json");
    } else {
        out.set_extension("json");
    }
    out
}
