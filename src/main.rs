use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fault_detect::{DataSource, DetectorConfig, FaultDetector};

/// Compare threshold-derived fault labels with a pretrained model.
#[derive(Parser, Debug)]
#[command(name = "fault-detect")]
#[command(version)]
struct Args {
    /// JSON model artifact
    #[arg(short, long)]
    model: PathBuf,

    /// Sensor table (.csv, .json or .parquet) with vp1, vp2, vp3 columns
    #[arg(short, long)]
    data: PathBuf,

    /// Optional JSON detector config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    install_panic_logger();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DetectorConfig::default(),
    };

    let detector = FaultDetector::new(&args.model, DataSource::Path(args.data.clone()), config)
        .with_context(|| {
            format!(
                "building detector from {} and {}",
                args.model.display(),
                args.data.display()
            )
        })?;

    let comparison = detector.predict_labels().context("predicting labels")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    let pair = detector.thresholds();
    println!("# thresholds: upper {} lower {}", pair.upper, pair.lower);
    println!("# heuristic predicted");
    for (heuristic, predicted) in comparison.pairs() {
        println!("{heuristic} {predicted}");
    }
    match comparison.agreement_ratio() {
        Some(ratio) => println!(
            "# agreement: {}/{} ({:.1}%)",
            comparison.agreement(),
            comparison.len(),
            ratio * 100.0
        ),
        None => println!("# no rows"),
    }

    Ok(())
}

/// Route panics through the logger before the default hook prints them.
fn install_panic_logger() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("panic: {info}");
        default_hook(info);
    }));
}
