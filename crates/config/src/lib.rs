//! Manifest models and loaders for engine catalogs and ship definitions.
//!
//! A manifest is a single YAML/TOML file, or a directory laid out as
//!
//! ```text
//! session.toml        # optional, holds precision_bits
//! engines/*.toml      # one EngineConfig per file
//! ships/*.toml        # one ShipConfig per file
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use budget_numeric::NumberInput;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Everything needed to populate a hangar.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Manifest {
    #[serde(default)]
    pub precision_bits: Option<usize>,
    #[serde(default)]
    pub engines: Vec<EngineConfig>,
    #[serde(default)]
    pub ships: Vec<ShipConfig>,
}

/// Engine entry. Values may be decimal strings or plain numbers.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    pub mass: NumberInput,
    pub exhaust_velocity: NumberInput,
}

/// Ship entry with stages listed in index order.
#[derive(Debug, Deserialize, Clone)]
pub struct ShipConfig {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StageConfig {
    pub engine: String,
    pub dry_mass: NumberInput,
    pub fuel_mass: NumberInput,
}

#[derive(Debug, Deserialize, Default)]
struct SessionSettings {
    #[serde(default)]
    precision_bits: Option<usize>,
}

/// Errors that can occur while loading manifests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported manifest format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Load a full manifest from a file or a manifest directory.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, ConfigError> {
    let path = path.as_ref();
    if !path.is_dir() {
        return read_document(path);
    }

    let settings_path = path.join("session.toml");
    let settings: SessionSettings = if settings_path.is_file() {
        toml::from_str(&std::fs::read_to_string(&settings_path)?)?
    } else {
        SessionSettings::default()
    };
    let engines = optional_dir_records(&path.join("engines"))?;
    let ships = optional_dir_records(&path.join("ships"))?;
    debug!(
        path = %path.display(),
        engines = engines.len(),
        ships = ships.len(),
        "manifest directory loaded"
    );

    Ok(Manifest {
        precision_bits: settings.precision_bits,
        engines,
        ships,
    })
}

/// Load engine entries from a YAML list, a single TOML record, or a directory of TOML records.
pub fn load_engine_configs<P: AsRef<Path>>(path: P) -> Result<Vec<EngineConfig>, ConfigError> {
    load_records(path)
}

/// Load ship entries from a YAML list, a single TOML record, or a directory of TOML records.
pub fn load_ship_configs<P: AsRef<Path>>(path: P) -> Result<Vec<ShipConfig>, ConfigError> {
    load_records(path)
}

fn read_document<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    match Format::of(path)? {
        Format::Yaml => {
            let reader = File::open(path)?;
            Ok(serde_yaml::from_reader(reader)?)
        }
        Format::Toml => {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        }
    }
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if Format::of(path)? == Format::Toml {
        Ok(vec![read_document(path)?])
    } else {
        read_document(path)
    }
}

fn optional_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    if dir.is_dir() {
        read_dir_records(dir)
    } else {
        Ok(Vec::new())
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const YAML: &str = r#"
precision_bits: 512
engines:
  - name: "1.1"
    mass: "64958.37813684586060647419003544200678"
    exhaust_velocity: 3617.40857668100880828454535276250681
ships:
  - name: Probe
    stages:
      - engine: "1.1"
        dry_mass: "46381.56737479119504996560863219201565"
        fuel_mass: "3552.14007770645868733438987874251325"
"#;

    #[test]
    fn yaml_manifest_keeps_decimal_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.yaml");
        fs::write(&path, YAML).unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.precision_bits, Some(512));
        assert_eq!(
            manifest.engines[0].mass,
            NumberInput::Decimal("64958.37813684586060647419003544200678".into())
        );
        assert!(matches!(manifest.engines[0].exhaust_velocity, NumberInput::Float(_)));
        assert_eq!(manifest.ships[0].stages.len(), 1);
    }

    #[test]
    fn manifest_directory_reads_sorted_toml_records() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("engines")).unwrap();
        fs::create_dir(dir.path().join("ships")).unwrap();
        fs::write(dir.path().join("session.toml"), "precision_bits = 2048\n").unwrap();
        fs::write(
            dir.path().join("engines/b.toml"),
            "name = \"Vinci\"\nmass = \"550\"\nexhaust_velocity = 4560\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("engines/a.toml"),
            "name = \"Aestus\"\nmass = 111.0\nexhaust_velocity = \"3187\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ships/upper.toml"),
            "name = \"Upper\"\n\n[[stages]]\nengine = \"Vinci\"\ndry_mass = \"2000\"\nfuel_mass = \"28000\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("engines/notes.txt"), "ignored").unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.precision_bits, Some(2048));
        let names: Vec<&str> = manifest.engines.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Aestus", "Vinci"]);
        assert_eq!(manifest.ships[0].stages[0].engine, "Vinci");
    }

    #[test]
    fn engine_catalog_loads_from_single_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merlin.toml");
        fs::write(&path, "name = \"Merlin\"\nmass = 470\nexhaust_velocity = 2770\n").unwrap();
        let engines = load_engine_configs(&path).unwrap();
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].mass, NumberInput::Float(470.0));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(
            load_ship_configs(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
