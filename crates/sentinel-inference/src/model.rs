//! Scoring capability and the bundled logistic-regression classifier.

use ml_sentinel_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maps an encoded feature vector to the positive-class probability.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Expected length of the input vector
    fn input_width(&self) -> usize;

    /// Probability of the positive class, in [0, 1]
    fn predict_positive_probability(&self, vector: &[f64]) -> Result<f64>;
}

/// Binary logistic regression: `sigmoid(coefficients . x + intercept)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> std::result::Result<Self, String> {
        let model = Self {
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Reject empty or non-finite parameters.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("model has no coefficients".to_string());
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(format!("coefficient {i} is not a finite number"));
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not a finite number".to_string());
        }
        Ok(())
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Logistic function, split on sign so neither branch overflows.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_positive_probability(&self, vector: &[f64]) -> Result<f64> {
        if vector.len() != self.coefficients.len() {
            return Err(Error::feature_transform(format!(
                "model expects {} inputs, got {}",
                self.coefficients.len(),
                vector.len()
            )));
        }

        let z = self
            .coefficients
            .iter()
            .zip(vector)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;

        Ok(sigmoid(z))
    }
}
