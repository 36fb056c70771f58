use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use nutriscan::capture::{SyntheticColorSource, SyntheticDepthSource};
use nutriscan::store::read_depth_pair;
use nutriscan::{CaptureOrchestrator, FileStore, FrameKey, NutritionRecord, NutritionSummary, ScanConfig};
use scan_codec::{PixelFormat, depth};

/// Capture a depth + color frame pair, send it to the analysis service and print
/// the nutrition estimate.
#[derive(Parser, Debug)]
#[command(name = "nutriscan")]
#[command(about = "🍽️ Estimate the nutrition of a plate from a depth + color capture")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one capture cycle with the synthetic sensors and upload it
    Capture {
        #[command(flatten)]
        service: ServiceArgs,

        /// Delay between capture completion and upload: 500ms, 2s, 1m
        #[arg(long, default_value = "500ms")]
        settle: String,

        /// Frame width in pixels
        #[arg(long, default_value_t = 640)]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value_t = 480)]
        height: u32,

        /// Depth sample format: DepthUint16 or DepthFloat32
        #[arg(long, default_value = "DepthUint16")]
        depth_format: String,

        /// Keep color frames as delivered instead of flipping them vertically
        #[arg(long)]
        no_mirror: bool,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-upload the artifacts of an earlier capture
    Upload {
        #[command(flatten)]
        service: ServiceArgs,

        /// Capture key, e.g. capture_1717171717123
        #[arg(long)]
        key: String,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored depth metadata of an earlier capture
    Inspect {
        /// Artifact directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Capture key, e.g. capture_1717171717123
        #[arg(long)]
        key: String,
    },
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Analysis service root URI
    #[arg(long, default_value = nutriscan::config::DEFAULT_BASE_URI)]
    server: String,

    /// Artifact directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Total upload attempts
    #[arg(long, default_value_t = 3)]
    attempts: u32,

    /// Backoff unit between attempts: 500ms, 1s
    #[arg(long, default_value = "1s")]
    backoff: String,
}

impl ServiceArgs {
    fn into_config(self) -> Result<ScanConfig> {
        let mut config = ScanConfig {
            base_uri: self.server,
            max_attempts: self.attempts,
            backoff_step: parse_duration(&self.backoff)?,
            ..ScanConfig::default()
        };
        if let Some(dir) = self.dir {
            config.artifact_dir = dir;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    nutriscan::logging::init(cli.verbose);

    match cli.command {
        Command::Capture {
            service,
            settle,
            width,
            height,
            depth_format,
            no_mirror,
            json,
        } => {
            let mut config = service.into_config()?;
            config.settle_delay = parse_duration(&settle)?;
            config.mirror_rgb = !no_mirror;

            let format: PixelFormat = depth_format.parse()?;
            if !format.is_depth() {
                return Err(anyhow!("{} is not a depth format", format));
            }
            let orchestrator = CaptureOrchestrator::from_config(
                &config,
                Box::new(SyntheticDepthSource::new(width, height, format)),
                Box::new(SyntheticColorSource::new(width, height)),
            )?;
            let report = orchestrator.capture_and_upload().await?;
            println!("Capture {} uploaded after {} attempt(s)", report.key, report.attempts);
            print_records(&report.records, json)
        }
        Command::Upload { service, key, json } => {
            let config = service.into_config()?;
            let key = FrameKey::parse(&key)?;
            let (outcome, records) = nutriscan::upload_stored(&config, key).await?;
            println!("Uploaded after {} attempt(s)", outcome.attempts);
            print_records(&records, json)
        }
        Command::Inspect { dir, key } => {
            let dir = dir.unwrap_or_else(|| ScanConfig::default().artifact_dir);
            let store = FileStore::new(&dir);
            let key = FrameKey::parse(&key)?;
            let (metadata, raw) = read_depth_pair(&store, &key).await?;
            let grid = depth::round_trip(&metadata, &raw)?;
            let total = metadata.width as usize * metadata.height as usize;

            println!("{}", metadata.to_text());
            match grid.stats() {
                Some(stats) => println!(
                    "full frame: {} valid of {} readings, {:.3}..{:.3} m, mean {:.3} m",
                    stats.valid, total, stats.min, stats.max, stats.mean
                ),
                None => println!("full frame: no valid readings of {}", total),
            }
            Ok(())
        }
    }
}

fn print_records(records: &[NutritionRecord], json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(records).context("serializing records")?;
        println!("{}", text);
        return Ok(());
    }
    if records.is_empty() {
        println!("No foods recognized");
        return Ok(());
    }
    for record in records {
        println!("  {}", record);
    }
    let summary = NutritionSummary::from_records(records);
    println!(
        "Total: {:.2} kcal (protein {:.2} g, fat {:.2} g, carbs {:.2} g)",
        summary.calories, summary.protein, summary.fat, summary.carbs
    );
    Ok(())
}

/// Parse duration string like "500ms", "2s", "1m" or bare seconds
fn parse_duration(duration: &str) -> Result<Duration> {
    let duration = duration.trim();
    if let Ok(seconds) = duration.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let split = duration
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow!("Invalid duration format: {}", duration))?;
    let (num_str, unit) = duration.split_at(split);
    let num: u64 = num_str
        .parse()
        .map_err(|_| anyhow!("Invalid number in duration: {}", duration))?;

    match unit {
        "ms" => Ok(Duration::from_millis(num)),
        "s" => Ok(Duration::from_secs(num)),
        "m" => Ok(Duration::from_secs(num * 60)),
        _ => Err(anyhow!(
            "Invalid duration unit: {}. Use 'ms' for milliseconds, 's' for seconds, 'm' for minutes",
            unit
        )),
    }
}
