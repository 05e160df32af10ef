use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, ensure, Context};
use chart_format::ConvertOptions;
use chart_schema::{Chart, Difficulty, Instrument, Metadata, Performance};
use clap::{Parser, Subcommand};

mod config;
mod show;

use config::ConverterConfig;

const PREVIEW_WIDTH: usize = 60;

#[derive(Debug, Parser)]
#[command(name = "chart")]
#[command(about = "Five-lane .chart converter and inspector", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Map a JSON note sequence onto five lanes and write a .chart file.
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        charter: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Repeatable; defaults to the configured difficulty.
        #[arg(long = "difficulty", value_parser = parse_difficulty)]
        difficulties: Vec<Difficulty>,
        #[arg(long)]
        preview: bool,
        /// Skip QA markers in [Events].
        #[arg(long)]
        no_qa: bool,
    },
    /// Print metadata, tempo and per-track counts.
    Inspect { input: PathBuf },
    /// Print a fret timeline of one track.
    Show {
        input: PathBuf,
        #[arg(long, default_value = "Expert", value_parser = parse_difficulty)]
        difficulty: Difficulty,
        #[arg(long, default_value = "Single", value_parser = parse_instrument)]
        instrument: Instrument,
    },
    /// Parse and re-write in canonical form.
    Normalize {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_name(s).ok_or_else(|| format!("unknown difficulty: {s}"))
}

fn parse_instrument(s: &str) -> Result<Instrument, String> {
    Instrument::from_suffix(s).ok_or_else(|| format!("unknown instrument: {s}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Convert {
            input,
            output,
            name,
            artist,
            charter,
            config,
            difficulties,
            preview,
            no_qa,
        } => {
            let config = ConverterConfig::load(config.as_deref())?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            let request = ConvertRequest {
                name,
                artist,
                charter,
                difficulties,
                preview,
                include_qa: !no_qa,
            };
            convert(&input, &out_path, &config, request)?;
        }
        Command::Inspect { input } => {
            let chart = read_chart(&input)?;
            print!("{}", describe_chart(&chart));
        }
        Command::Show {
            input,
            difficulty,
            instrument,
        } => {
            let chart = read_chart(&input)?;
            let Some(track) = chart.get_track(instrument, difficulty) else {
                bail!(
                    "no [{}] track in {}",
                    chart_schema::section_name(difficulty, instrument),
                    input.display()
                );
            };
            print!("{}", show::render_timeline(&chart, track));
        }
        Command::Normalize { input, output } => {
            let chart = read_chart(&input)?;
            match output {
                Some(out_path) => {
                    chart_format::write_file(&chart, &out_path)
                        .with_context(|| format!("failed to write: {}", out_path.display()))?;
                }
                None => {
                    let text = chart_format::write_string(&chart)
                        .with_context(|| format!("failed to render: {}", input.display()))?;
                    print!("{text}");
                }
            }
        }
    }

    Ok(())
}

struct ConvertRequest {
    name: Option<String>,
    artist: Option<String>,
    charter: Option<String>,
    difficulties: Vec<Difficulty>,
    preview: bool,
    include_qa: bool,
}

fn convert(
    input: &Path,
    out_path: &Path,
    config: &ConverterConfig,
    request: ConvertRequest,
) -> anyhow::Result<()> {
    let mut performance = read_performance(input)?;
    let ppq = performance.ticks_per_beat;
    if !performance.is_sorted() {
        log::warn!("notes in {} are out of order, sorting", input.display());
        performance.sort_notes();
    }
    let notes = &performance.notes;

    let lanes = fret_mapper::map_pitches_to_lanes(notes, ppq, &config.mapper);
    let mapped = fret_mapper::create_mapped_notes(notes, &lanes, request.include_qa)?;

    let summary = fret_mapper::summarize_qa_issues(&mapped);
    if !request.include_qa {
        println!("QA: skipped");
    } else if summary.is_empty() {
        println!("QA: no issues found");
    } else {
        let total: usize = summary.values().sum();
        log::info!("{total} QA issues across {} notes", mapped.len());
        println!("QA issues:");
        for (issue, count) in &summary {
            println!("  {issue}: {count}");
        }
    }
    if request.preview {
        println!("{}", fret_mapper::preview_lanes_ascii(notes, &lanes, ppq, PREVIEW_WIDTH));
    }

    let fallback_name = performance
        .track_name
        .clone()
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()));
    let defaults = Metadata::default();
    let meta = Metadata {
        name: request.name.or(fallback_name).unwrap_or(defaults.name.clone()),
        artist: request.artist.unwrap_or(defaults.artist.clone()),
        charter: request
            .charter
            .unwrap_or_else(|| config.chart_defaults.charter.clone()),
        resolution: config.chart_defaults.resolution,
        ..defaults
    };

    let bpm = performance.bpm.unwrap_or(config.default_bpm);
    ensure!(bpm > 0.0, "tempo must be positive (got {bpm})");
    let difficulties = if request.difficulties.is_empty() {
        vec![config.difficulty()?]
    } else {
        request.difficulties
    };
    let options = ConvertOptions {
        min_sustain_beats: config.min_sustain_beats,
        instrument: config.instrument()?,
        difficulties,
        include_qa_events: request.include_qa,
        ..ConvertOptions::new(ppq, bpm)
    };

    let chart = chart_format::build_chart(meta, &mapped, &options)
        .with_context(|| format!("conversion failed: {}", input.display()))?;
    chart_format::write_file(&chart, out_path)
        .with_context(|| format!("failed to write: {}", out_path.display()))?;

    let beats = f64::from(performance.span_ticks()) / f64::from(ppq);
    println!("Wrote {}", out_path.display());
    println!(
        "{} notes, {:.1} BPM, {:.1} beats ({:.2} s)",
        notes.len(),
        bpm,
        beats,
        beats * 60.0 / bpm
    );
    Ok(())
}

fn read_performance(path: &Path) -> anyhow::Result<Performance> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("failed to read: {}", path.display()))?;
    let performance: Performance = serde_json::from_str(&src)
        .with_context(|| format!("invalid performance json: {}", path.display()))?;
    ensure!(
        performance.ticks_per_beat > 0,
        "ticks_per_beat must be > 0 in {}",
        path.display()
    );
    Ok(performance)
}

fn read_chart(path: &Path) -> anyhow::Result<Chart> {
    chart_format::parse_file(path).with_context(|| format!("parse failed: {}", path.display()))
}

fn describe_chart(chart: &Chart) -> String {
    let meta = &chart.meta;
    let mut lines = vec![
        format!("Name: {}", meta.name),
        format!("Artist: {}", meta.artist),
    ];
    if !meta.charter.is_empty() {
        lines.push(format!("Charter: {}", meta.charter));
    }
    lines.push(format!("Resolution: {}", meta.resolution));
    lines.push(format!(
        "BPM: {:.1} ({} tempo changes)",
        chart.get_initial_bpm(),
        chart.bpm_changes.len()
    ));
    let signatures: Vec<String> = chart
        .time_signatures
        .iter()
        .map(|ts| format!("{}/{}@{}", ts.numerator, ts.denominator, ts.tick))
        .collect();
    if !signatures.is_empty() {
        lines.push(format!("Time signatures: {}", signatures.join(", ")));
    }
    lines.push(format!(
        "Sections: {}, Events: {}",
        chart.sections.len(),
        chart.events.len()
    ));
    lines.push(format!("Tracks: {}", chart.track_count()));
    for (id, track) in chart.tracks() {
        lines.push(format!(
            "  {id}: {} notes, {} star power",
            track.note_count(),
            track.star_power.len()
        ));
    }
    lines.join("\n") + "\n"
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("chart");
    out
}
