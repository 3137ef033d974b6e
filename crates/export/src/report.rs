//! Stage-by-stage ship reports.

use std::io::Write;

use budget_numeric::Numeric;
use budget_ship::Ship;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::ExportError;

/// A value as a native float, optionally with its full-precision decimal form.
///
/// `value` is lossy and saturates to infinity outside the `f64` range (an input
/// such as `1e400` is valid at working precision). `exact` keeps every digit.
#[derive(Debug, Clone, Serialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
}

impl Quantity {
    fn of(value: &Numeric, exact: bool) -> Self {
        Self {
            value: value.to_f64(),
            exact: exact.then(|| value.to_string()),
        }
    }

    fn render(&self) -> String {
        match &self.exact {
            Some(exact) => exact.clone(),
            None => format!("{:.6}", self.value),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub name: String,
    pub mass_kg: Quantity,
    pub exhaust_velocity_m_s: Quantity,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub index: usize,
    pub remaining_mass_kg: Quantity,
    pub total_mass_kg: Quantity,
    pub delta_v_m_s: Quantity,
    pub dry_mass_kg: Quantity,
    pub fuel_mass_kg: Quantity,
    pub engine: EngineReport,
}

/// Snapshot of one ship's aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct ShipReport {
    pub ship: String,
    pub precision_bits: usize,
    pub delta_v_m_s: Quantity,
    pub mass_kg: Quantity,
    pub stages: Vec<StageReport>,
}

impl ShipReport {
    /// Capture a ship. With `exact` set, every quantity also carries its decimal
    /// expansion at the ship's working precision.
    pub fn from_ship(name: &str, ship: &Ship, exact: bool) -> Result<Self, ExportError> {
        let mut stages = Vec::with_capacity(ship.len());
        for (index, stage) in ship.stages().iter().enumerate() {
            let engine = stage.engine();
            stages.push(StageReport {
                index,
                remaining_mass_kg: Quantity::of(&ship.remaining_mass(index)?, exact),
                total_mass_kg: Quantity::of(stage.total_mass(), exact),
                delta_v_m_s: Quantity::of(stage.delta_v(), exact),
                dry_mass_kg: Quantity::of(stage.dry_mass(), exact),
                fuel_mass_kg: Quantity::of(stage.fuel_mass(), exact),
                engine: EngineReport {
                    name: engine.name().to_string(),
                    mass_kg: Quantity::of(engine.mass(), exact),
                    exhaust_velocity_m_s: Quantity::of(engine.exhaust_velocity(), exact),
                },
            });
        }

        Ok(Self {
            ship: name.to_string(),
            precision_bits: ship.context().precision_bits(),
            delta_v_m_s: Quantity::of(ship.delta_v(), exact),
            mass_kg: Quantity::of(ship.mass(), exact),
            stages,
        })
    }

    /// Human-readable dump, one block per stage.
    pub fn write_text(&self, writer: &mut dyn Write) -> Result<(), ExportError> {
        writeln!(writer, "Ship: {}", self.ship)?;
        writeln!(writer, "DeltaV: {} m/s", self.delta_v_m_s.render())?;
        writeln!(writer, "Mass: {} kg", self.mass_kg.render())?;
        for stage in &self.stages {
            writeln!(writer, "Stage {}:", stage.index)?;
            writeln!(writer, "  Remaining Mass: {} kg", stage.remaining_mass_kg.render())?;
            writeln!(writer, "  Total Stage Mass: {} kg", stage.total_mass_kg.render())?;
            writeln!(writer, "  DeltaV: {} m/s", stage.delta_v_m_s.render())?;
            writeln!(writer, "  Dry Mass: {} kg", stage.dry_mass_kg.render())?;
            writeln!(writer, "  Fuel Mass: {} kg", stage.fuel_mass_kg.render())?;
            writeln!(writer, "  Engine {}:", stage.engine.name)?;
            writeln!(writer, "    Mass: {} kg", stage.engine.mass_kg.render())?;
            writeln!(
                writer,
                "    Exhaust Velocity: {} m/s",
                stage.engine.exhaust_velocity_m_s.render()
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    ship: &'a str,
    stage: usize,
    engine: &'a str,
    dry_mass_kg: f64,
    fuel_mass_kg: f64,
    total_mass_kg: f64,
    remaining_mass_kg: f64,
    delta_v_m_s: f64,
    engine_mass_kg: f64,
    exhaust_velocity_m_s: f64,
}

/// Text blocks for several ships, separated by blank lines.
pub fn write_text(reports: &[ShipReport], writer: &mut dyn Write) -> Result<(), ExportError> {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        report.write_text(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json(reports: &[ShipReport], writer: &mut dyn Write) -> Result<(), ExportError> {
    to_writer_pretty(&mut *writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// One CSV row per stage across all reports.
pub fn write_csv(reports: &[ShipReport], writer: &mut dyn Write) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for report in reports {
        for stage in &report.stages {
            csv_writer.serialize(CsvRow {
                ship: &report.ship,
                stage: stage.index,
                engine: &stage.engine.name,
                dry_mass_kg: stage.dry_mass_kg.value,
                fuel_mass_kg: stage.fuel_mass_kg.value,
                total_mass_kg: stage.total_mass_kg.value,
                remaining_mass_kg: stage.remaining_mass_kg.value,
                delta_v_m_s: stage.delta_v_m_s.value,
                engine_mass_kg: stage.engine.mass_kg.value,
                exhaust_velocity_m_s: stage.engine.exhaust_velocity_m_s.value,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
