use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kiosk_core::{CardTextExtractor, TesseractCli};
use kiosk_hw::Camera;
use kiosk_store::{AccessEvent, AccessStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiosk", about = "Access kiosk diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List V4L2 capture devices
    Devices,
    /// Read the name off an ID card image
    Ocr {
        /// Image containing the card
        image: PathBuf,
        #[arg(long, env = "KIOSK_TESSERACT", default_value = "tesseract")]
        tesseract: String,
        #[arg(long, env = "KIOSK_OCR_LANG", default_value = "eng")]
        lang: String,
    },
    /// Print recent access events, most recent first
    Logs {
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
        #[arg(long, env = "KIOSK_DB_PATH", default_value = "data/access.db")]
        db: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
        Commands::Ocr { image, tesseract, lang } => {
            let img = image::open(&image)
                .with_context(|| format!("reading {}", image.display()))?
                .to_rgb8();
            let extractor = CardTextExtractor::new(TesseractCli::new(tesseract, lang));
            let text = extractor.extract_text(&img);
            if text.is_empty() {
                println!("No card text found");
            } else {
                println!("{text}");
            }
        }
        Commands::Logs { limit, db, json } => {
            if !db.exists() {
                anyhow::bail!("database not found: {}", db.display());
            }
            let store = AccessStore::open(&db)?;
            let events = store.recent(Some(limit))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                print_events(&events);
            }
        }
    }

    Ok(())
}

fn print_events(events: &[AccessEvent]) {
    if events.is_empty() {
        println!("No access events");
        return;
    }
    println!("{:>6}  {:<26}  {:<24}  {:<12}  IMAGE", "ID", "TIMESTAMP", "NAME", "PERSON");
    for e in events {
        println!(
            "{:>6}  {:<26}  {:<24}  {:<12}  {}",
            e.id,
            e.timestamp,
            e.name,
            e.person_id.as_deref().unwrap_or("-"),
            e.face_image_path.as_deref().unwrap_or("-"),
        );
    }
}
