use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use inkcast_tools::{format_pretty, inspect_packet, simulate, InspectReport, SimulateOptions};
use session::SessionConfig;

#[derive(Parser)]
#[command(
    name = "inkcast-tools",
    version,
    about = "inkcast packet inspection and loss simulation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packet structure and payloads.
    Inspect {
        /// Packet file, or a directory of packet files.
        packet_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected packets.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected packets (after sorting).
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        /// Session config JSON supplying decode limits.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Stream random strokes between two sessions and print a JSON summary.
    Simulate {
        /// Number of strokes to draw.
        #[arg(long, default_value_t = 32)]
        strokes: u32,
        /// Points per stroke.
        #[arg(long, default_value_t = 120)]
        points: u16,
        /// RNG seed for deterministic results.
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Drop every nth Update (0 drops nothing).
        #[arg(long, default_value_t = 0)]
        drop_every: u32,
        /// Make every nth stroke an eraser (0 for none).
        #[arg(long, default_value_t = 4)]
        eraser_every: u32,
        /// Session config JSON.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write every delivered packet into this directory.
        #[arg(long)]
        capture_dir: Option<PathBuf>,
        /// Fail if more than this many strokes desync.
        #[arg(long)]
        max_desyncs: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            packet_path,
            glob,
            sort,
            limit,
            format,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            if packet_path.is_dir() {
                let entries = collect_packet_entries(&packet_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    let report = inspect_file(&entry.path, &config)?;
                    print_report(&report, format)?;
                }
            } else {
                let report = inspect_file(&packet_path, &config)?;
                print_report(&report, format)?;
            }
        }
        Command::Simulate {
            strokes,
            points,
            seed,
            drop_every,
            eraser_every,
            config,
            capture_dir,
            max_desyncs,
        } => {
            let options = SimulateOptions {
                strokes,
                points,
                seed,
                drop_every,
                eraser_every,
                config: load_config(config.as_deref())?,
            };
            let summary = simulate(&options, capture_dir.as_deref())?;
            let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
            println!("{json}");
            if let Some(max) = max_desyncs {
                if summary.desyncs > max {
                    anyhow::bail!("{} desyncs exceeds budget {max}", summary.desyncs);
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&contents).context("parse session config json")
}

fn inspect_file(path: &Path, config: &SessionConfig) -> Result<InspectReport> {
    let bytes = fs::read(path).with_context(|| format!("read packet {}", path.display()))?;
    inspect_packet(&bytes, &config.wire, &config.codec)
        .with_context(|| format!("decode packet {}", path.display()))
}

fn print_report(report: &InspectReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("serialize report")?;
            println!("{json}");
        }
        OutputFormat::Pretty => print!("{}", format_pretty(report)),
    }
    Ok(())
}

struct PacketEntry {
    path: PathBuf,
    size: u64,
}

fn collect_packet_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PacketEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(PacketEntry { path, size });
    }
    // read_dir order is platform dependent
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<PacketEntry>,
    sort: Option<InspectSort>,
) -> Vec<PacketEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}
