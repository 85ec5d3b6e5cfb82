//! Measurement-driven triggers
//!
//! A trigger pairs a registered measurement with a comparison and a
//! threshold. Loops use one to end early, conditionals use one to decide
//! whether their body runs at all.

pub mod measurement;
pub mod registry;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LooperError;

pub use measurement::{CommandMeasurement, FnMeasurement, Measurement};
pub use registry::TriggerRegistry;

/// How a measured value is compared to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
}

impl Comparison {
    /// Whether `value` satisfies this comparison against `threshold`
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => value < threshold,
            Comparison::GreaterThan => value > threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::GreaterThan => ">",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = LooperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Comparison::LessThan),
            ">" => Ok(Comparison::GreaterThan),
            other => Err(LooperError::InvalidStep(format!(
                "unsupported trigger condition '{}', expected '<' or '>'",
                other
            ))),
        }
    }
}

/// What happened when a trigger was evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Met(f64),
    NotMet(f64),
    /// The measurement itself failed; counts as not met
    Failed(String),
}

impl TriggerOutcome {
    pub fn is_met(&self) -> bool {
        matches!(self, TriggerOutcome::Met(_))
    }
}

/// A resolved trigger: measurement, comparison and threshold
#[derive(Clone)]
pub struct Trigger {
    name: String,
    measurement: Arc<dyn Measurement>,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Trigger {
    pub fn new(
        name: impl Into<String>,
        measurement: Arc<dyn Measurement>,
        comparison: Comparison,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            measurement,
            comparison,
            threshold,
        }
    }

    /// Name the measurement was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take one measurement and compare it.
    ///
    /// Never fails: a measurement error is logged and reported as
    /// [`TriggerOutcome::Failed`], which is not satisfied.
    pub async fn evaluate(&self, depth: usize) -> TriggerOutcome {
        match self.measurement.measure().await {
            Ok(value) if self.comparison.holds(value, self.threshold) => {
                tracing::info!(
                    depth,
                    trigger = %self.name,
                    value,
                    "TRIGGER MET: {:.2} {} {}",
                    value,
                    self.comparison,
                    self.threshold
                );
                TriggerOutcome::Met(value)
            }
            Ok(value) => {
                tracing::info!(
                    depth,
                    trigger = %self.name,
                    value,
                    "Trigger not met, {} returned {:.2}",
                    self.name,
                    value
                );
                TriggerOutcome::NotMet(value)
            }
            Err(e) => {
                tracing::error!(
                    depth,
                    trigger = %self.name,
                    error = %e,
                    "Error executing trigger function"
                );
                TriggerOutcome::Failed(e.to_string())
            }
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("comparison", &self.comparison)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.comparison, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f64) -> Arc<dyn Measurement> {
        Arc::new(FnMeasurement::new(move || Ok(value)))
    }

    fn failing() -> Arc<dyn Measurement> {
        Arc::new(FnMeasurement::new(|| {
            Err(LooperError::Measurement("microscope unreachable".into()))
        }))
    }

    #[test]
    fn test_comparison_holds() {
        assert!(Comparison::LessThan.holds(3.0, 5.0));
        assert!(!Comparison::LessThan.holds(5.0, 5.0));
        assert!(Comparison::GreaterThan.holds(7.0, 5.0));
        assert!(!Comparison::GreaterThan.holds(5.0, 5.0));
    }

    #[test]
    fn test_comparison_from_str() {
        assert_eq!("<".parse::<Comparison>().unwrap(), Comparison::LessThan);
        assert_eq!(" > ".parse::<Comparison>().unwrap(), Comparison::GreaterThan);
        assert!("=".parse::<Comparison>().is_err());
    }

    #[test]
    fn test_comparison_serde_symbols() {
        let parsed: Comparison = serde_yaml::from_str("\"<\"").unwrap();
        assert_eq!(parsed, Comparison::LessThan);
        let json = serde_json::to_string(&Comparison::GreaterThan).unwrap();
        assert_eq!(json, "\">\"");
    }

    #[tokio::test]
    async fn test_less_than_met() {
        let trigger = Trigger::new("t", constant(3.0), Comparison::LessThan, 5.0);
        let outcome = trigger.evaluate(0).await;
        assert_eq!(outcome, TriggerOutcome::Met(3.0));
        assert!(outcome.is_met());
    }

    #[tokio::test]
    async fn test_less_than_not_met() {
        let trigger = Trigger::new("t", constant(7.0), Comparison::LessThan, 5.0);
        let outcome = trigger.evaluate(0).await;
        assert_eq!(outcome, TriggerOutcome::NotMet(7.0));
        assert!(!outcome.is_met());
    }

    #[tokio::test]
    async fn test_greater_than() {
        let trigger = Trigger::new("t", constant(7.0), Comparison::GreaterThan, 5.0);
        assert!(trigger.evaluate(1).await.is_met());
    }

    #[tokio::test]
    async fn test_measurement_failure_is_not_met() {
        let trigger = Trigger::new("t", failing(), Comparison::LessThan, 5.0);
        let outcome = trigger.evaluate(2).await;
        assert!(matches!(outcome, TriggerOutcome::Failed(ref msg) if msg.contains("unreachable")));
        assert!(!outcome.is_met());
    }

    #[test]
    fn test_trigger_display() {
        let trigger = Trigger::new("image_99_perc", constant(0.0), Comparison::GreaterThan, 120.5);
        assert_eq!(trigger.to_string(), "image_99_perc > 120.5");
    }
}
