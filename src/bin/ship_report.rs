use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use stage_budget::Hangar;
use stage_budget::config::load_manifest;
use stage_budget::export::{self, ShipReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Stage-by-stage mass and delta-V report for ships in a manifest"
)]
struct Cli {
    /// Manifest file (.yaml/.yml/.toml) or manifest directory
    #[arg(long)]
    manifest: PathBuf,

    /// Only report this ship (defaults to every ship, sorted by name)
    #[arg(long)]
    ship: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print full-precision decimal values alongside native floats
    #[arg(long, default_value_t = false)]
    exact: bool,

    /// Working precision in bits (overrides the manifest)
    #[arg(long)]
    precision: Option<usize>,

    /// Output path (`-` for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,

    /// List registered engines instead of ship reports
    #[arg(long, default_value_t = false)]
    list_engines: bool,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum Format {
    Text,
    Json,
    Csv,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let manifest = load_manifest(&cli.manifest)?;
    let hangar = Hangar::from_manifest(&manifest, cli.precision)?;
    let mut writer = export::writer_for_path(&cli.output)?;

    if cli.list_engines {
        writeln!(
            writer,
            "=== Engines ({} bits) ===",
            hangar.context().precision_bits()
        )?;
        for engine in hangar.engines() {
            writeln!(
                writer,
                "{:<20} mass = {:.6} kg, v_e = {:.6} m/s",
                engine.name(),
                engine.mass().to_f64(),
                engine.exhaust_velocity().to_f64()
            )?;
        }
        writer.flush()?;
        return Ok(());
    }

    let names: Vec<String> = match &cli.ship {
        Some(name) => {
            hangar.ship(name)?;
            vec![name.clone()]
        }
        None => hangar
            .ship_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    if names.is_empty() {
        anyhow::bail!("manifest '{}' defines no ships", cli.manifest.display());
    }

    let mut reports = Vec::with_capacity(names.len());
    for name in &names {
        reports.push(ShipReport::from_ship(name, hangar.ship(name)?, cli.exact)?);
    }

    match cli.format {
        Format::Text => {
            writeln!(
                writer,
                "=== Stage Budget ({}) ===",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            )?;
            export::report::write_text(&reports, &mut *writer)?;
        }
        Format::Json => export::report::write_json(&reports, &mut *writer)?,
        Format::Csv => export::report::write_csv(&reports, &mut *writer)?,
    }

    Ok(())
}
