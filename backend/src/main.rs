use clap::{Parser, Subcommand};
use ecosort::progression::achievements;
use ecosort::{ScanLocation, ScanPipeline, SorterConfig};
use image::ImageFormat;
use serde::Serialize;
use shared::UserProgress;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ecosort", about = "Classify waste photos and track eco progress")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ProgressArgs {
    /// Current eco point total
    #[arg(long, default_value_t = 0)]
    points: u64,
    #[arg(long, default_value_t = 0)]
    scans: u64,
    /// Confirmed correct sorts so far
    #[arg(long, default_value_t = 0)]
    correct: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an image and award scan points
    Scan {
        image: PathBuf,
        #[command(flatten)]
        progress: ProgressArgs,
        #[arg(long)]
        user: Option<Uuid>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// List every waste category with disposal guidance
    Categories,
    /// Show tier progress and achievements
    Progress {
        #[command(flatten)]
        progress: ProgressArgs,
    },
    /// Apply a single eco event (scan, correct_sort, diy_project, purchase)
    Award {
        kind: String,
        #[arg(long)]
        amount: Option<f64>,
        #[command(flatten)]
        progress: ProgressArgs,
    },
}

#[derive(Serialize)]
struct ProgressReport {
    progress: UserProgress,
    level: shared::LevelProgress,
    accuracy_rate: f64,
    achievements: Vec<shared::Achievement>,
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SorterConfig::load()?;

    match cli.command {
        Command::Scan {
            image,
            progress,
            user,
            location,
            lat,
            lon,
        } => {
            let pipeline = ScanPipeline::from_config(config)?;
            let progress = pipeline.engine().recompute_level(&progress.into_progress());
            let mime_type = ImageFormat::from_path(&image)
                .ok()
                .map(|format| format.to_mime_type());
            let image_data = std::fs::read(&image)?;
            let location = ScanLocation {
                label: location,
                latitude: lat,
                longitude: lon,
            };

            let outcome = pipeline.scan(
                user.unwrap_or_else(Uuid::new_v4),
                &image_data,
                mime_type,
                &progress,
                Some(location),
            )?;
            print_json(&outcome.to_response())?;
        }
        Command::Categories => {
            let pipeline = ScanPipeline::from_config(config)?;
            print_json(&pipeline.categories())?;
        }
        Command::Progress { progress } => {
            let engine = ecosort::EcoProgressionEngine::from_config(&config)?;
            let progress = engine.recompute_level(&progress.into_progress());
            print_json(&report(&engine, progress))?;
        }
        Command::Award {
            kind,
            amount,
            progress,
        } => {
            let engine = ecosort::EcoProgressionEngine::from_config(&config)?;
            let progress = engine.recompute_level(&progress.into_progress());
            let (progress, earned) = engine.award_named(&progress, &kind, amount)?;
            log::info!("Earned {} points for {}", earned, kind);
            print_json(&report(&engine, progress))?;
        }
    }
    Ok(())
}

impl ProgressArgs {
    fn into_progress(self) -> UserProgress {
        UserProgress {
            eco_points: self.points,
            eco_level: String::new(),
            total_scans: self.scans,
            correct_sorts: self.correct,
        }
    }
}

fn report(engine: &ecosort::EcoProgressionEngine, progress: UserProgress) -> ProgressReport {
    ProgressReport {
        level: engine.level_progress(&progress),
        accuracy_rate: progress.accuracy_rate(),
        achievements: achievements(&progress),
        progress,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
