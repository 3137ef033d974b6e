//! Session-level bookkeeping: one engine registry plus named ships.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use budget_config::Manifest;
use budget_numeric::{DEFAULT_PRECISION_BITS, MathContext, NumberInput, NumericError};
use budget_propulsion::{Engine, EngineRegistry, RegistryError};
use budget_ship::{Ship, ShipError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HangarError {
    #[error("ship '{0}' already exists")]
    ShipExists(String),
    #[error("ship '{0}' not found in hangar")]
    ShipNotFound(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("ship '{ship}': {source}")]
    Ship {
        ship: String,
        #[source]
        source: ShipError,
    },
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// Owns the engine registry and every named ship of a session.
///
/// All values are parsed at the hangar's working precision. Engines are shared
/// with ships through `Arc`, so a ship never outlives the engine data it uses.
#[derive(Debug, Default)]
pub struct Hangar {
    context: MathContext,
    registry: EngineRegistry,
    ships: HashMap<String, Ship>,
}

impl Hangar {
    pub fn new(context: MathContext) -> Self {
        Self {
            context,
            registry: EngineRegistry::new(context),
            ships: HashMap::new(),
        }
    }

    /// Build a hangar from a manifest. `precision_bits` overrides the manifest's own setting.
    pub fn from_manifest(
        manifest: &Manifest,
        precision_bits: Option<usize>,
    ) -> Result<Self, HangarError> {
        let bits = precision_bits
            .or(manifest.precision_bits)
            .unwrap_or(DEFAULT_PRECISION_BITS);
        let mut hangar = Hangar::new(MathContext::new(bits)?);

        for engine in &manifest.engines {
            hangar.create_engine(
                &engine.name,
                engine.mass.clone(),
                engine.exhaust_velocity.clone(),
            )?;
        }
        for ship in &manifest.ships {
            hangar.add_ship(&ship.name)?;
            for stage in &ship.stages {
                hangar.add_stage(
                    &ship.name,
                    stage.dry_mass.clone(),
                    stage.fuel_mass.clone(),
                    &stage.engine,
                    None,
                )?;
            }
        }
        Ok(hangar)
    }

    pub fn context(&self) -> MathContext {
        self.context
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn create_engine(
        &mut self,
        name: &str,
        mass: impl Into<NumberInput>,
        exhaust_velocity: impl Into<NumberInput>,
    ) -> Result<Arc<Engine>, HangarError> {
        Ok(self.registry.create_engine(name, mass, exhaust_velocity)?)
    }

    /// Registered engines in name order.
    pub fn engines(&self) -> impl Iterator<Item = &Arc<Engine>> {
        self.registry.iter()
    }

    pub fn engine(&self, name: &str) -> Result<Arc<Engine>, HangarError> {
        Ok(self.registry.get_engine(name)?)
    }

    pub fn add_ship(&mut self, name: &str) -> Result<&mut Ship, HangarError> {
        match self.ships.entry(name.to_string()) {
            Entry::Occupied(_) => Err(HangarError::ShipExists(name.to_string())),
            Entry::Vacant(entry) => {
                info!(ship = name, precision_bits = self.context.precision_bits(), "ship created");
                Ok(entry.insert(Ship::new(self.context)))
            }
        }
    }

    pub fn ship(&self, name: &str) -> Result<&Ship, HangarError> {
        self.ships
            .get(name)
            .ok_or_else(|| HangarError::ShipNotFound(name.to_string()))
    }

    pub fn ship_mut(&mut self, name: &str) -> Result<&mut Ship, HangarError> {
        self.ships
            .get_mut(name)
            .ok_or_else(|| HangarError::ShipNotFound(name.to_string()))
    }

    /// Ship names in sorted order.
    pub fn ship_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ships.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Add a stage to a named ship, resolving the engine by name.
    pub fn add_stage(
        &mut self,
        ship: &str,
        dry_mass: impl Into<NumberInput>,
        fuel_mass: impl Into<NumberInput>,
        engine: &str,
        index: Option<usize>,
    ) -> Result<usize, HangarError> {
        let engine = self.registry.get_engine(engine)?;
        let dry_mass = self.context.resolve(&dry_mass.into())?;
        let fuel_mass = self.context.resolve(&fuel_mass.into())?;
        let target = self.ship_mut(ship)?;
        target
            .add_stage(dry_mass, fuel_mass, engine, index)
            .map_err(|source| ship_error(ship, source))
    }

    pub fn set_stage(
        &mut self,
        ship: &str,
        index: usize,
        dry_mass: impl Into<NumberInput>,
        fuel_mass: impl Into<NumberInput>,
        engine: &str,
    ) -> Result<(), HangarError> {
        let engine = self.registry.get_engine(engine)?;
        let dry_mass = self.context.resolve(&dry_mass.into())?;
        let fuel_mass = self.context.resolve(&fuel_mass.into())?;
        self.ship_mut(ship)?
            .set_stage(index, dry_mass, fuel_mass, engine)
            .map_err(|source| ship_error(ship, source))
    }

    pub fn set_stage_dry_mass(
        &mut self,
        ship: &str,
        index: usize,
        dry_mass: impl Into<NumberInput>,
    ) -> Result<(), HangarError> {
        let dry_mass = self.context.resolve(&dry_mass.into())?;
        self.ship_mut(ship)?
            .set_stage_dry_mass(index, dry_mass)
            .map_err(|source| ship_error(ship, source))
    }

    pub fn set_stage_fuel_mass(
        &mut self,
        ship: &str,
        index: usize,
        fuel_mass: impl Into<NumberInput>,
    ) -> Result<(), HangarError> {
        let fuel_mass = self.context.resolve(&fuel_mass.into())?;
        self.ship_mut(ship)?
            .set_stage_fuel_mass(index, fuel_mass)
            .map_err(|source| ship_error(ship, source))
    }

    pub fn set_stage_engine(
        &mut self,
        ship: &str,
        index: usize,
        engine: &str,
    ) -> Result<(), HangarError> {
        let engine = self.registry.get_engine(engine)?;
        self.ship_mut(ship)?
            .set_stage_engine(index, engine)
            .map_err(|source| ship_error(ship, source))
    }

    /// Point every stage that uses engine `from` at engine `to`, across all ships.
    ///
    /// Either every affected ship accepts the new engine or none is changed.
    /// Returns how many stages were rebound.
    pub fn rebind_engine(&mut self, from: &str, to: &str) -> Result<usize, HangarError> {
        let from_engine = self.registry.get_engine(from)?;
        let to_engine = self.registry.get_engine(to)?;

        let mut candidates = Vec::new();
        let mut rebound = 0;
        for (name, ship) in &self.ships {
            let indices: Vec<usize> = ship
                .stages()
                .iter()
                .enumerate()
                .filter(|(_, stage)| Arc::ptr_eq(stage.engine(), &from_engine))
                .map(|(index, _)| index)
                .collect();
            if indices.is_empty() {
                continue;
            }

            let mut candidate = ship.clone();
            for index in indices {
                candidate
                    .set_stage_engine(index, Arc::clone(&to_engine))
                    .map_err(|source| ship_error(name, source))?;
                rebound += 1;
            }
            candidates.push((name.clone(), candidate));
        }

        for (name, candidate) in candidates {
            self.ships.insert(name, candidate);
        }
        info!(from, to, stages = rebound, "engine rebound");
        Ok(rebound)
    }
}

fn ship_error(ship: &str, source: ShipError) -> HangarError {
    HangarError::Ship {
        ship: ship.to_string(),
        source,
    }
}
