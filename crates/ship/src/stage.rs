use std::sync::Arc;

use budget_numeric::{MathContext, Numeric};
use budget_propulsion::Engine;

/// One stage of a ship: structure, propellant and the engine that burns it.
///
/// Total mass and delta-V are derived by the owning [`crate::Ship`] and cannot
/// be set directly.
#[derive(Debug, Clone)]
pub struct Stage {
    pub(crate) engine: Arc<Engine>,
    pub(crate) dry_mass: Numeric,
    pub(crate) fuel_mass: Numeric,
    pub(crate) total_mass: Numeric,
    pub(crate) delta_v: Numeric,
}

impl Stage {
    pub(crate) fn new(
        context: &MathContext,
        dry_mass: Numeric,
        fuel_mass: Numeric,
        engine: Arc<Engine>,
    ) -> Self {
        let total_mass = context.add(&context.add(&dry_mass, &fuel_mass), engine.mass());
        Self {
            engine,
            dry_mass,
            fuel_mass,
            total_mass,
            delta_v: context.zero(),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Structural mass excluding propellant and engine, kg.
    pub fn dry_mass(&self) -> &Numeric {
        &self.dry_mass
    }

    pub fn fuel_mass(&self) -> &Numeric {
        &self.fuel_mass
    }

    /// Dry mass + fuel mass + engine mass, kg.
    pub fn total_mass(&self) -> &Numeric {
        &self.total_mass
    }

    /// Delta-V from the last regeneration, m/s.
    pub fn delta_v(&self) -> &Numeric {
        &self.delta_v
    }
}
