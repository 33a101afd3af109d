//! scan-sheet CLI: decode one photographed scouting sheet.

use clap::Parser;
use std::path::PathBuf;

use scan_sheets::sink::save_png;
use scan_sheets::{
    CropSink, DirectorySink, NullSink, ScanOptions, Schema, SheetConfig, SheetScanner,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "scan-sheet")]
#[command(about = "Read a photographed scouting sheet into a JSON record")]
#[command(version)]
struct Cli {
    /// Path to the sheet photograph.
    #[arg(long)]
    image: PathBuf,

    /// Sheet geometry and marker colour (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Field schema (JSON array).
    #[arg(long)]
    fields: PathBuf,

    /// Write the annotated sheet (PNG).
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// Directory for crops of Image fields with content. Crops are dropped when omitted.
    #[arg(long)]
    crops: Option<PathBuf>,

    /// Write the record here instead of printing it.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Field holding `<match number><station digit>`.
    #[arg(long, default_value = scan_sheets::constants::record::MATCH_FIELD)]
    match_field: String,

    /// Field holding the team number, used to name crops.
    #[arg(long, default_value = scan_sheets::constants::record::TEAM_FIELD)]
    team_field: String,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> CliResult<()> {
    let config = SheetConfig::from_json_file(&cli.config)?;
    let schema = Schema::from_json_file(&cli.fields)?;
    let options = ScanOptions {
        match_field: cli.match_field.clone(),
        team_field: cli.team_field.clone(),
    };
    let scanner = SheetScanner::new(config, schema, options)?;
    tracing::info!(
        "Loaded {} fields from {}",
        scanner.schema().fields().len(),
        cli.fields.display()
    );

    let mut sink: Box<dyn CropSink> = match &cli.crops {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => Box::new(NullSink),
    };

    tracing::info!("Scanning {}", cli.image.display());
    let outcome = match scanner.scan_path(&cli.image, sink.as_mut()) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{}", e.user_message());
            return Err(e.into());
        }
    };
    tracing::info!(
        "Decoded {} fields using {} markers ({} crops saved)",
        outcome.record.len(),
        outcome.quads.len(),
        outcome.captures_saved
    );

    if let Some(path) = &cli.annotated {
        save_png(&outcome.annotated, path)?;
        tracing::info!("Annotated sheet written to {}", path.display());
    }

    let json = outcome.record.to_json_pretty()?;
    match &cli.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Record written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
