//! Densidad ponderada de la salida del modelo (`p_B`) en los shooting points
//! visitados. Se usa para corregir el sesgo de selección.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCollector {
    counts: Vec<f64>,
    total_weight: f64,
}

impl DensityCollector {
    /// Histograma de `n_bins` bins uniformes en `[0, 1]`.
    pub fn new(n_bins: usize) -> Result<Self, ModelError> {
        if n_bins == 0 {
            return Err(ModelError::InvalidValue("density collector needs at least one bin".into()));
        }
        Ok(Self { counts: vec![0.0; n_bins],
                  total_weight: 0.0 })
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    fn bin(&self, p: f64) -> usize {
        let n = self.counts.len();
        ((p.clamp(0.0, 1.0) * n as f64) as usize).min(n - 1)
    }

    pub fn add(&mut self, p: f64, weight: f64) -> Result<(), ModelError> {
        if !p.is_finite() || !weight.is_finite() || weight < 0.0 {
            return Err(ModelError::InvalidValue(format!("density point p={p} weight={weight}")));
        }
        let bin = self.bin(p);
        self.counts[bin] += weight;
        self.total_weight += weight;
        Ok(())
    }

    /// Densidad normalizada (integra 1 sobre `[0, 1]`).
    pub fn density(&self) -> Vec<f64> {
        if self.total_weight <= 0.0 {
            return vec![0.0; self.counts.len()];
        }
        let width = 1.0 / self.counts.len() as f64;
        self.counts
            .iter()
            .map(|c| c / (self.total_weight * width))
            .collect()
    }

    /// Factor `1 / densidad` en el bin de `p`; 1 si el bin está vacío.
    pub fn reweight_factor(&self, p: f64) -> f64 {
        let d = self.density()[self.bin(p)];
        if d > 0.0 {
            1.0 / d
        } else {
            1.0
        }
    }
}
