//! Conjunto de entrenamiento: descriptores del shooting point y conteo de
//! estados alcanzados por los shots.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSet {
    n_states: usize,
    descriptors: Vec<Vec<f64>>,
    shot_results: Vec<Vec<f64>>,
    weights: Vec<f64>,
}

impl TrainSet {
    pub fn new(n_states: usize) -> Self {
        Self { n_states,
               descriptors: Vec::new(),
               shot_results: Vec::new(),
               weights: Vec::new() }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Agrega un punto. `shot_results[i]` es cuántas veces se alcanzó el
    /// estado `i` desde ese shooting point.
    pub fn append_point(&mut self, descriptors: Vec<f64>, shot_results: Vec<f64>, weight: f64) -> Result<(), ModelError> {
        if shot_results.len() != self.n_states {
            return Err(ModelError::ShotResultMismatch { expected: self.n_states,
                                                        got: shot_results.len() });
        }
        if let Some(first) = self.descriptors.first() {
            if first.len() != descriptors.len() {
                return Err(ModelError::DescriptorMismatch { expected: first.len(),
                                                            got: descriptors.len() });
            }
        }
        if shot_results.iter().any(|c| !c.is_finite() || *c < 0.0) || !weight.is_finite() || weight < 0.0 {
            return Err(ModelError::InvalidValue("negative or non-finite shot count/weight".into()));
        }
        self.descriptors.push(descriptors);
        self.shot_results.push(shot_results);
        self.weights.push(weight);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[Vec<f64>] {
        &self.descriptors
    }

    pub fn shot_results(&self) -> &[Vec<f64>] {
        &self.shot_results
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Un punto es transición cuando sus shots alcanzaron al menos dos
    /// estados distintos.
    pub fn transitions(&self) -> Vec<bool> {
        self.shot_results
            .iter()
            .map(|r| r.iter().filter(|c| **c > 0.0).count() >= 2)
            .collect()
    }

    pub fn total_shots(&self) -> f64 {
        self.shot_results.iter().flatten().sum()
    }

    /// Iterador `(descriptores, shots, peso)`.
    pub fn points(&self) -> impl Iterator<Item = (&[f64], &[f64], f64)> {
        self.descriptors
            .iter()
            .zip(&self.shot_results)
            .zip(&self.weights)
            .map(|((d, s), w)| (d.as_slice(), s.as_slice(), *w))
    }
}
