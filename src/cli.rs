use crate::config::{Config, load_config};
use crate::ir::EventModel;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::render::{render_svg, write_output_svg};
use crate::text_metrics::{FixedMetrics, SystemFontMetrics, TextMeasurer};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "evml", version, about = "Event modeling diagram renderer")]
pub struct Args {
    /// Input model file (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, palette, layout constants, lane labels)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Text metrics source
    #[arg(long = "metrics", value_enum, default_value = "auto")]
    pub metrics: MetricsSource,

    /// Measure with this font file instead of system fonts
    #[arg(long = "font-file")]
    pub font_file: Option<PathBuf>,

    /// Write the computed layout as JSON to this path
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsSource {
    /// System fonts when any are installed, fixed metrics otherwise
    Auto,
    System,
    Fixed,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref()).context("failed to load config")?;
    let input = read_input(args.input.as_deref())?;
    let model = EventModel::from_json5_str(&input).context("failed to parse event model")?;
    let measurer = build_measurer(args.metrics, args.font_file.as_deref())?;

    let layout = compute_layout(&model, &config.theme, &config.layout, measurer.as_ref())?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout, &config.layout)?;
    }

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &config.theme, &config.layout, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            config.render.html_labels = false;
            let svg = render_svg(&layout, &config.theme, &config.layout, &config.render);
            write_png(&svg, &output, &config)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn build_measurer(source: MetricsSource, font_file: Option<&Path>) -> Result<Box<dyn TextMeasurer>> {
    if let Some(path) = font_file {
        return Ok(Box::new(SystemFontMetrics::from_font_file(path)?));
    }
    match source {
        MetricsSource::Fixed => Ok(Box::new(FixedMetrics)),
        MetricsSource::System => Ok(Box::new(SystemFontMetrics::load_system()?)),
        MetricsSource::Auto => match SystemFontMetrics::load_system() {
            Ok(metrics) => Ok(Box::new(metrics)),
            Err(err) => {
                tracing::warn!(%err, "falling back to fixed text metrics");
                Ok(Box::new(FixedMetrics))
            }
        },
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires building with the `png` feature"
    ))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
