//! Registry mapping trigger names to measurement capabilities
//!
//! Queue definitions refer to measurements by name. Names are resolved
//! here once, when the queue is built, so a typo is reported before a
//! run starts instead of halfway through it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{LooperError, Result};

use super::measurement::{CommandMeasurement, Measurement};
use super::{Comparison, Trigger};

/// Named measurements available to triggers
#[derive(Clone, Default)]
pub struct TriggerRegistry {
    measurements: BTreeMap<String, Arc<dyn Measurement>>,
}

impl TriggerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of shell-command measurements, as configured
    pub fn from_commands(commands: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();
        for (name, command) in commands {
            registry.register(name.clone(), CommandMeasurement::new(command.clone()));
        }
        registry
    }

    /// Register a measurement, replacing any previous one with that name
    pub fn register(&mut self, name: impl Into<String>, measurement: impl Measurement + 'static) {
        self.measurements.insert(name.into(), Arc::new(measurement));
    }

    /// Get a measurement by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Measurement>> {
        self.measurements.get(name).cloned()
    }

    /// Resolve a trigger definition against the registered measurements
    pub fn resolve(&self, name: &str, comparison: Comparison, threshold: f64) -> Result<Trigger> {
        if !threshold.is_finite() {
            return Err(LooperError::InvalidStep(format!(
                "trigger '{}' threshold must be a finite number",
                name
            )));
        }
        let measurement = self
            .get(name)
            .ok_or_else(|| LooperError::UnknownTrigger(name.to_string()))?;
        Ok(Trigger::new(name, measurement, comparison, threshold))
    }

    /// List all registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.measurements.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::FnMeasurement;

    #[test]
    fn test_register_and_names_sorted() {
        let mut registry = TriggerRegistry::new();
        registry.register("image_99_perc", FnMeasurement::new(|| Ok(1.0)));
        registry.register("image_max_intensity", FnMeasurement::new(|| Ok(2.0)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["image_99_perc", "image_max_intensity"]);
    }

    #[tokio::test]
    async fn test_resolve_known_trigger() {
        let mut registry = TriggerRegistry::new();
        registry.register("max", FnMeasurement::new(|| Ok(3.0)));

        let trigger = registry.resolve("max", Comparison::LessThan, 5.0).unwrap();
        assert_eq!(trigger.name(), "max");
        assert!(trigger.evaluate(0).await.is_met());
    }

    #[test]
    fn test_resolve_unknown_trigger() {
        let registry = TriggerRegistry::new();
        let err = registry
            .resolve("missing", Comparison::GreaterThan, 1.0)
            .unwrap_err();
        assert!(matches!(err, LooperError::UnknownTrigger(ref n) if n == "missing"));
    }

    #[test]
    fn test_resolve_rejects_nan_threshold() {
        let mut registry = TriggerRegistry::new();
        registry.register("max", FnMeasurement::new(|| Ok(3.0)));
        assert!(registry.resolve("max", Comparison::LessThan, f64::NAN).is_err());
    }

    #[test]
    fn test_from_commands() {
        let mut commands = HashMap::new();
        commands.insert("max".to_string(), "echo 1".to_string());
        let registry = TriggerRegistry::from_commands(&commands);
        assert!(registry.get("max").is_some());
        assert!(!registry.is_empty());
    }
}
