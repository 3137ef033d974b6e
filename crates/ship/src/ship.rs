use std::sync::Arc;

use budget_numeric::{MathContext, Numeric, NumericError};
use budget_propulsion::Engine;
use tracing::{Level, debug, warn};

use crate::{ShipError, Stage};

/// Ordered stages plus cached mass and delta-V.
///
/// Index 0 is evaluated against the full vehicle mass; each later stage sees
/// only itself and the stages after it. Every mutating call either commits a
/// fully regenerated state or returns an error and leaves the ship untouched.
#[derive(Debug, Clone)]
pub struct Ship {
    context: MathContext,
    stages: Vec<Stage>,
    mass: Numeric,
    delta_v: Numeric,
}

impl Default for Ship {
    fn default() -> Self {
        Self::new(MathContext::default())
    }
}

impl Ship {
    pub fn new(context: MathContext) -> Self {
        Self {
            context,
            stages: Vec::new(),
            mass: context.zero(),
            delta_v: context.zero(),
        }
    }

    pub fn context(&self) -> MathContext {
        self.context
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Result<&Stage, ShipError> {
        self.stages.get(index).ok_or(ShipError::Index {
            index,
            len: self.stages.len(),
        })
    }

    /// Sum of every stage's total mass, kg.
    pub fn mass(&self) -> &Numeric {
        &self.mass
    }

    /// Sum of every stage's delta-V, m/s.
    pub fn delta_v(&self) -> &Numeric {
        &self.delta_v
    }

    pub fn stage_dry_mass(&self, index: usize) -> Result<&Numeric, ShipError> {
        self.stage(index).map(Stage::dry_mass)
    }

    pub fn stage_fuel_mass(&self, index: usize) -> Result<&Numeric, ShipError> {
        self.stage(index).map(Stage::fuel_mass)
    }

    pub fn stage_total_mass(&self, index: usize) -> Result<&Numeric, ShipError> {
        self.stage(index).map(Stage::total_mass)
    }

    pub fn stage_delta_v(&self, index: usize) -> Result<&Numeric, ShipError> {
        self.stage(index).map(Stage::delta_v)
    }

    pub fn stage_engine(&self, index: usize) -> Result<&Arc<Engine>, ShipError> {
        self.stage(index).map(Stage::engine)
    }

    /// Mass of the vehicle as stage `index` ignites: that stage and every stage after it.
    pub fn remaining_mass(&self, index: usize) -> Result<Numeric, ShipError> {
        self.stage(index)?;
        Ok(self
            .context
            .sum(self.stages[index..].iter().map(Stage::total_mass)))
    }

    /// Insert a stage at `index` (appending when `None`) and return where it landed.
    pub fn add_stage(
        &mut self,
        dry_mass: Numeric,
        fuel_mass: Numeric,
        engine: Arc<Engine>,
        index: Option<usize>,
    ) -> Result<usize, ShipError> {
        self.transact("add_stage", |context, stages, mass| {
            let index = index.unwrap_or(stages.len());
            if index > stages.len() {
                return Err(ShipError::Index {
                    index,
                    len: stages.len(),
                });
            }
            let stage = Stage::new(context, dry_mass, fuel_mass, engine);
            *mass = context.add(mass, &stage.total_mass);
            stages.insert(index, stage);
            Ok(index)
        })
    }

    pub fn push_stage(
        &mut self,
        dry_mass: Numeric,
        fuel_mass: Numeric,
        engine: Arc<Engine>,
    ) -> Result<usize, ShipError> {
        self.add_stage(dry_mass, fuel_mass, engine, None)
    }

    /// Replace dry mass, fuel mass and engine of one stage in a single step.
    pub fn set_stage(
        &mut self,
        index: usize,
        dry_mass: Numeric,
        fuel_mass: Numeric,
        engine: Arc<Engine>,
    ) -> Result<(), ShipError> {
        self.transact("set_stage", |context, stages, mass| {
            let stage = stage_mut(stages, index)?;
            let replacement = Stage::new(context, dry_mass, fuel_mass, engine);
            *mass = context.adjust(mass, &replacement.total_mass, &stage.total_mass);
            *stage = replacement;
            Ok(())
        })
    }

    pub fn set_stage_dry_mass(&mut self, index: usize, dry_mass: Numeric) -> Result<(), ShipError> {
        self.transact("set_stage_dry_mass", |context, stages, mass| {
            let stage = stage_mut(stages, index)?;
            *mass = context.adjust(mass, &dry_mass, &stage.dry_mass);
            stage.total_mass = context.adjust(&stage.total_mass, &dry_mass, &stage.dry_mass);
            stage.dry_mass = dry_mass;
            Ok(())
        })
    }

    pub fn set_stage_fuel_mass(&mut self, index: usize, fuel_mass: Numeric) -> Result<(), ShipError> {
        self.transact("set_stage_fuel_mass", |context, stages, mass| {
            let stage = stage_mut(stages, index)?;
            *mass = context.adjust(mass, &fuel_mass, &stage.fuel_mass);
            stage.total_mass = context.adjust(&stage.total_mass, &fuel_mass, &stage.fuel_mass);
            stage.fuel_mass = fuel_mass;
            Ok(())
        })
    }

    /// Point a stage at a different engine, carrying the engine mass difference.
    pub fn set_stage_engine(&mut self, index: usize, engine: Arc<Engine>) -> Result<(), ShipError> {
        self.transact("set_stage_engine", |context, stages, mass| {
            let stage = stage_mut(stages, index)?;
            *mass = context.adjust(mass, engine.mass(), stage.engine.mass());
            stage.total_mass = context.adjust(&stage.total_mass, engine.mass(), stage.engine.mass());
            stage.engine = engine;
            Ok(())
        })
    }

    pub fn remove_stage(&mut self, index: usize) -> Result<Stage, ShipError> {
        self.transact("remove_stage", |context, stages, mass| {
            stage_mut(stages, index)?;
            let removed = stages.remove(index);
            *mass = context.sub(mass, &removed.total_mass);
            Ok(removed)
        })
    }

    pub fn mass_f64(&self) -> f64 {
        self.mass.to_f64()
    }

    pub fn delta_v_f64(&self) -> f64 {
        self.delta_v.to_f64()
    }

    pub fn stage_dry_mass_f64(&self, index: usize) -> Result<f64, ShipError> {
        self.stage_dry_mass(index).map(Numeric::to_f64)
    }

    pub fn stage_fuel_mass_f64(&self, index: usize) -> Result<f64, ShipError> {
        self.stage_fuel_mass(index).map(Numeric::to_f64)
    }

    pub fn stage_total_mass_f64(&self, index: usize) -> Result<f64, ShipError> {
        self.stage_total_mass(index).map(Numeric::to_f64)
    }

    pub fn stage_delta_v_f64(&self, index: usize) -> Result<f64, ShipError> {
        self.stage_delta_v(index).map(Numeric::to_f64)
    }

    pub fn remaining_mass_f64(&self, index: usize) -> Result<f64, ShipError> {
        self.remaining_mass(index).map(|mass| mass.to_f64())
    }

    /// Apply `edit` to a copy of the stage list, regenerate, and commit only on success.
    fn transact<T>(
        &mut self,
        operation: &'static str,
        edit: impl FnOnce(&MathContext, &mut Vec<Stage>, &mut Numeric) -> Result<T, ShipError>,
    ) -> Result<T, ShipError> {
        let mut stages = self.stages.clone();
        let mut mass = self.mass.clone();
        let outcome = edit(&self.context, &mut stages, &mut mass).and_then(|value| {
            let delta_v = regenerate(&self.context, &mut stages, &mass)?;
            Ok((value, delta_v))
        });

        match outcome {
            Ok((value, delta_v)) => {
                // to_f64 renders the full mantissa; skip it unless someone is listening
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        operation,
                        stages = stages.len(),
                        mass_kg = mass.to_f64(),
                        delta_v_m_s = delta_v.to_f64(),
                        "delta-v regenerated"
                    );
                }
                self.stages = stages;
                self.mass = mass;
                self.delta_v = delta_v;
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "ship mutation rejected");
                Err(err)
            }
        }
    }
}

fn stage_mut(stages: &mut [Stage], index: usize) -> Result<&mut Stage, ShipError> {
    let len = stages.len();
    stages.get_mut(index).ok_or(ShipError::Index { index, len })
}

/// Recompute every stage's delta-V from scratch and return the ship total.
///
/// Stage `i` burns from `m0 = remaining` down to `m1 = remaining - fuel_i`, where
/// `remaining` starts at the full ship mass and drops by each stage's total mass
/// after that stage is evaluated.
fn regenerate(
    context: &MathContext,
    stages: &mut [Stage],
    ship_mass: &Numeric,
) -> Result<Numeric, ShipError> {
    let mut remaining = ship_mass.clone();
    let mut total = context.zero();

    for (index, stage) in stages.iter_mut().enumerate() {
        let burnout = context.sub(&remaining, &stage.fuel_mass);
        if !burnout.is_positive() {
            return Err(ShipError::Domain {
                stage: index,
                source: NumericError::Domain {
                    operation: "mass ratio",
                    operand: burnout.to_f64(),
                },
            });
        }
        let domain = |source| ShipError::Domain {
            stage: index,
            source,
        };
        let ratio = context.div(&remaining, &burnout).map_err(domain)?;
        let log = context.ln(&ratio).map_err(domain)?;

        stage.delta_v = context.mul(&log, stage.engine.exhaust_velocity());
        total = context.add(&total, &stage.delta_v);
        remaining = context.sub(&remaining, &stage.total_mass);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_numeric::relative_eq;

    fn engine(ctx: &MathContext, name: &str, mass: &str, ve: &str) -> Arc<Engine> {
        Arc::new(Engine::new(
            name,
            ctx.parse(mass).unwrap(),
            ctx.parse(ve).unwrap(),
        ))
    }

    #[test]
    fn empty_ship_has_zero_aggregates() {
        let ship = Ship::default();
        assert!(ship.is_empty());
        assert_eq!(ship.mass_f64(), 0.0);
        assert_eq!(ship.delta_v_f64(), 0.0);
        assert!(matches!(ship.remaining_mass(0), Err(ShipError::Index { index: 0, len: 0 })));
    }

    #[test]
    fn zero_fuel_stage_contributes_no_delta_v() {
        let ctx = MathContext::default();
        let mut ship = Ship::new(ctx);
        let e = engine(&ctx, "E", "10", "3000");
        ship.push_stage(ctx.parse("90").unwrap(), ctx.zero(), e).unwrap();
        assert_eq!(ship.delta_v_f64(), 0.0);
        assert_eq!(ship.mass_f64(), 100.0);
    }

    #[test]
    fn remove_stage_restores_previous_mass() {
        let ctx = MathContext::default();
        let mut ship = Ship::new(ctx);
        let e = engine(&ctx, "E", "5", "2500");
        ship.push_stage(ctx.parse("40").unwrap(), ctx.parse("55").unwrap(), e.clone()).unwrap();
        let before = ship.delta_v_f64();
        ship.push_stage(ctx.parse("1").unwrap(), ctx.parse("2").unwrap(), e).unwrap();
        let removed = ship.remove_stage(1).unwrap();
        assert_eq!(removed.total_mass().to_f64(), 8.0);
        assert_eq!(ship.mass_f64(), 100.0);
        assert!(relative_eq(ship.delta_v_f64(), before, 1e-12));
    }

    #[test]
    fn float_getters_mirror_the_exact_values() {
        let ctx = MathContext::default();
        let mut ship = Ship::new(ctx);
        let e = engine(&ctx, "E", "5", "2500");
        ship.push_stage(ctx.parse("40").unwrap(), ctx.parse("55").unwrap(), e.clone()).unwrap();
        ship.push_stage(ctx.parse("1").unwrap(), ctx.parse("2").unwrap(), e).unwrap();
        assert_eq!(ship.stage_dry_mass_f64(1).unwrap(), 1.0);
        assert_eq!(ship.stage_fuel_mass_f64(0).unwrap(), 55.0);
        assert_eq!(ship.stage_total_mass_f64(1).unwrap(), 8.0);
        assert_eq!(ship.remaining_mass_f64(1).unwrap(), 8.0);
        let expected = 2500.0 * (108.0f64 / 53.0).ln();
        assert!(relative_eq(ship.stage_delta_v_f64(0).unwrap(), expected, 1e-12));
        assert!(ship.stage_delta_v_f64(2).is_err());
    }

    #[test]
    fn burnout_check_names_the_stage() {
        let ctx = MathContext::default();
        let mut ship = Ship::new(ctx);
        // negative dry mass lets the fuel equal the whole remaining mass
        let e = engine(&ctx, "E", "5", "2500");
        let err = ship
            .push_stage(ctx.parse("-5").unwrap(), ctx.parse("10").unwrap(), e)
            .unwrap_err();
        assert!(matches!(err, ShipError::Domain { stage: 0, .. }));
        assert!(ship.is_empty());
    }
}
