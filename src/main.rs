
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::info;

use facescan::{DetectorConfig, Pipeline, PipelineOutcome, StartupError};

const DEFAULT_CASCADE: &str = "haarcascade_frontalface_default.xml";

/// Detect human faces on a still image and outline them.
#[derive(Parser)]
#[command(name = "facescan", version)]
struct Cli {
    /// Image to examine (JPEG, PNG, BMP or GIF).
    image: PathBuf,

    /// OpenCV Haar cascade XML.
    #[arg(long, env = "FACESCAN_CASCADE", default_value = DEFAULT_CASCADE)]
    cascade: PathBuf,

    /// Ratio between successive scales of the image pyramid (> 1.0).
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Neighbouring detections a face needs to be reported.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_MIN_NEIGHBORS)]
    min_neighbors: u32,

    /// Smallest face side, in pixels.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_MIN_SIZE.0)]
    min_size: u32,

    /// Largest face side, in pixels.
    #[arg(long)]
    max_size: Option<u32>,

    /// Save the resulting image (annotated when faces were found).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let pipeline = match build_pipeline(&cli) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            eprintln!(
                "Critical error: cannot start with cascade '{}': {}",
                absolute(&cli.cascade).display(),
                error
            );
            process::exit(1);
        }
    };

    let outcome = pipeline.process(&cli.image);
    report(&outcome);

    if let Some(output) = &cli.output {
        save(&outcome, output);
    }

    if !outcome.verdict().is_success() {
        process::exit(2);
    }
}

fn build_pipeline(cli: &Cli) -> Result<Pipeline, StartupError> {
    let mut config = DetectorConfig::new(
        cli.scale_factor,
        cli.min_neighbors,
        (cli.min_size, cli.min_size),
    )?;
    if let Some(max_size) = cli.max_size {
        config = config.with_max_size((max_size, max_size))?;
    }

    println!("Using cascade file: {}", absolute(&cli.cascade).display());
    Pipeline::from_cascade_path(&cli.cascade, config)
}

fn report(outcome: &PipelineOutcome) {
    for line in outcome.log() {
        println!("{}", line);
    }
    for face in outcome.faces() {
        info!(
            "face at ({}, {}), {}x{}",
            face.x(),
            face.y(),
            face.width(),
            face.height()
        );
    }
    println!("Result: {}", outcome.verdict().summary());
}

fn save(outcome: &PipelineOutcome, output: &Path) {
    match outcome.image() {
        Some(image) => match image.to_dynamic().save(output) {
            Ok(()) => println!("Saved result to {}", output.display()),
            Err(error) => eprintln!("Failed to save result to {}: {}", output.display(), error),
        },
        None => eprintln!("No image to save to {}", output.display()),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
