//! Engine records and the name-keyed registry that owns them.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use budget_numeric::{MathContext, NumberInput, Numeric, NumericError};
use thiserror::Error;
use tracing::info;

/// An engine definition. Immutable once the registry has built it.
#[derive(Debug, Clone)]
pub struct Engine {
    name: String,
    mass: Numeric,
    exhaust_velocity: Numeric,
}

impl Engine {
    /// Build an engine from already-parsed values.
    ///
    /// Masses and velocities are expected to be positive; no check is made here.
    pub fn new(name: impl Into<String>, mass: Numeric, exhaust_velocity: Numeric) -> Self {
        Self {
            name: name.into(),
            mass,
            exhaust_velocity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine mass in kg.
    pub fn mass(&self) -> &Numeric {
        &self.mass
    }

    /// Effective exhaust velocity in m/s.
    pub fn exhaust_velocity(&self) -> &Numeric {
        &self.exhaust_velocity
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("engine '{0}' already exists")]
    AlreadyExists(String),
    #[error("engine '{0}' not found in registry")]
    NotFound(String),
    #[error("invalid value for engine '{name}': {source}")]
    Numeric {
        name: String,
        #[source]
        source: NumericError,
    },
}

/// Name-keyed store of engines for one session.
///
/// Engines are handed out as `Arc<Engine>` so ships can keep referencing them
/// for as long as they need. Entries are never removed or edited; a changed
/// engine is a new engine under a new name.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    context: MathContext,
    engines: HashMap<String, Arc<Engine>>,
}

impl EngineRegistry {
    pub fn new(context: MathContext) -> Self {
        Self {
            context,
            engines: HashMap::new(),
        }
    }

    pub fn context(&self) -> MathContext {
        self.context
    }

    /// Parse and store a new engine. Nothing is stored on failure.
    pub fn create_engine(
        &mut self,
        name: &str,
        mass: impl Into<NumberInput>,
        exhaust_velocity: impl Into<NumberInput>,
    ) -> Result<Arc<Engine>, RegistryError> {
        if self.engines.contains_key(name) {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }
        let numeric = |source| RegistryError::Numeric {
            name: name.to_string(),
            source,
        };
        let mass = self.context.resolve(&mass.into()).map_err(numeric)?;
        let exhaust_velocity = self
            .context
            .resolve(&exhaust_velocity.into())
            .map_err(numeric)?;
        self.insert(Engine::new(name, mass, exhaust_velocity))
    }

    /// Store an engine built elsewhere, keyed by its own name.
    pub fn insert(&mut self, engine: Engine) -> Result<Arc<Engine>, RegistryError> {
        match self.engines.entry(engine.name.clone()) {
            Entry::Occupied(entry) => Err(RegistryError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!(
                    engine = %engine.name,
                    mass_kg = engine.mass.to_f64(),
                    exhaust_velocity_m_s = engine.exhaust_velocity.to_f64(),
                    "engine registered"
                );
                Ok(Arc::clone(entry.insert(Arc::new(engine))))
            }
        }
    }

    pub fn get_engine(&self, name: &str) -> Result<Arc<Engine>, RegistryError> {
        self.engines
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Engine names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Engines sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Engine>> {
        let mut engines: Vec<&Arc<Engine>> = self.engines.values().collect();
        engines.sort_by(|a, b| a.name.cmp(&b.name));
        engines.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = EngineRegistry::default();
        registry.create_engine("Merlin", "470", "2770").unwrap();
        let err = registry.create_engine("Merlin", "1", "1").unwrap_err();
        assert_eq!(err, RegistryError::AlreadyExists("Merlin".into()));
        assert_eq!(registry.get_engine("Merlin").unwrap().mass().to_f64(), 470.0);
    }

    #[test]
    fn bad_numbers_store_nothing() {
        let mut registry = EngineRegistry::default();
        let err = registry.create_engine("RL10", "301", "fast").unwrap_err();
        assert!(matches!(err, RegistryError::Numeric { .. }));
        assert!(!registry.contains("RL10"));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = EngineRegistry::default();
        registry.create_engine("Vinci", 550.0, 4560.0).unwrap();
        registry.create_engine("Aestus", 111.0, 3187.0).unwrap();
        assert_eq!(registry.names(), vec!["Aestus", "Vinci"]);
        let order: Vec<&str> = registry.iter().map(|engine| engine.name()).collect();
        assert_eq!(order, vec!["Aestus", "Vinci"]);
    }
}
