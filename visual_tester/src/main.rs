use anyhow::{Context, Result};
use clap::Parser;
use cone_vision::overlay::{self, OverlayLevel};
use cone_vision::{ConeDetector, DetectorConfig, FrameReport, HsvFrame, ParallelConeDetector};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs the cone detector on an image and writes an annotated copy.
#[derive(Parser, Debug)]
#[command(name = "visual_tester", version, about)]
struct Args {
    /// Image to analyze (any format the `image` crate decodes).
    input: PathBuf,
    /// Where to write the annotated image.
    output: PathBuf,
    /// JSON file overriding detector tunables.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Also draw clusters and candidates.
    #[arg(short, long)]
    trace: bool,
    /// Drawing level; overrides --trace (detections, clusters, candidates).
    #[arg(long)]
    overlay: Option<OverlayLevel>,
    /// Process the color families concurrently.
    #[arg(short, long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DetectorConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DetectorConfig::default(),
    };

    // --- 2. Image Decoding ---
    let decoded = image::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let frame = HsvFrame::from_dynamic_image(&decoded)?;
    info!(width = frame.width(), height = frame.height(), "decoded {}", args.input.display());

    // --- 3. Detection ---
    let report: FrameReport = if args.parallel {
        ParallelConeDetector::new(config)?.detect_with_trace(&frame).await?
    } else {
        ConeDetector::new(config)?.detect_with_trace(&frame)?
    };

    for detection in report.detections() {
        let bbox = detection.bounding_box;
        info!(
            tag = %detection.tag(),
            x = bbox.x,
            y = bbox.y,
            width = bbox.width,
            height = bbox.height,
            "cone"
        );
    }

    // --- 4. Visualization ---
    let level = args.overlay.unwrap_or(if args.trace {
        OverlayLevel::Candidates
    } else {
        OverlayLevel::Detections
    });
    let mut canvas = decoded.to_rgb8();
    overlay::draw_report(&mut canvas, &report, level);
    canvas
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(
        detections = report.detections().len(),
        output = %args.output.display(),
        "done"
    );
    Ok(())
}
