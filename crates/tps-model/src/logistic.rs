//! Modelo de referencia binomial: logit lineal en los descriptores.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;
use crate::rcmodel::{sigmoid, RcModel};
use crate::trainset::TrainSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRcModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticRcModel {
    pub fn new(n_descriptors: usize) -> Self {
        Self { weights: vec![0.0; n_descriptors],
               bias: 0.0 }
    }

    pub fn from_state(state: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(state)?)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn logit(&self, descriptors: &[f64]) -> Result<f64, ModelError> {
        if descriptors.len() != self.weights.len() {
            return Err(ModelError::DescriptorMismatch { expected: self.weights.len(),
                                                        got: descriptors.len() });
        }
        Ok(self.bias + self.weights.iter().zip(descriptors).map(|(w, x)| w * x).sum::<f64>())
    }
}

/// Pérdida binomial de un punto: `n_A log(1 + e^q) + n_B log(1 + e^-q)`.
fn binomial_loss(q: f64, n_a: f64, n_b: f64) -> f64 {
    n_a * softplus(q) + n_b * softplus(-q)
}

fn softplus(x: f64) -> f64 {
    if x > 30.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

impl RcModel for LogisticRcModel {
    fn n_out(&self) -> usize {
        1
    }

    fn log_prob(&self, descriptors: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.logit(descriptors)?])
    }

    /// Descenso de gradiente full-batch; gradientes por punto en paralelo.
    fn train_epoch(&mut self, trainset: &TrainSet, lr: f64) -> Result<f64, ModelError> {
        if trainset.n_states() != 2 {
            return Err(ModelError::ShotResultMismatch { expected: 2,
                                                        got: trainset.n_states() });
        }
        let total_shots = trainset.total_shots();
        if trainset.is_empty() || total_shots <= 0.0 {
            return Ok(0.0);
        }
        let n = self.weights.len();
        let points: Vec<(&[f64], &[f64], f64)> = trainset.points().collect();
        let per_point = points.par_iter()
                              .map(|(x, shots, w)| -> Result<(Vec<f64>, f64, f64), ModelError> {
                                  let q = self.logit(x)?;
                                  let (n_a, n_b) = (shots[0], shots[1]);
                                  // d/dq de la pérdida binomial
                                  let dq = w * (n_a * sigmoid(q) - n_b * sigmoid(-q));
                                  let grad: Vec<f64> = x.iter().map(|xi| dq * xi).collect();
                                  Ok((grad, dq, w * binomial_loss(q, n_a, n_b)))
                              })
                              .collect::<Result<Vec<_>, ModelError>>()?;

        let mut grad_w = vec![0.0; n];
        let mut grad_b = 0.0;
        let mut loss = 0.0;
        for (g, db, l) in per_point {
            for (acc, gi) in grad_w.iter_mut().zip(g) {
                *acc += gi;
            }
            grad_b += db;
            loss += l;
        }
        for (w, g) in self.weights.iter_mut().zip(&grad_w) {
            *w -= lr * g / total_shots;
        }
        self.bias -= lr * grad_b / total_shots;
        let loss = loss / total_shots;
        debug!("model:epoch points={} loss={loss:.5}", trainset.len());
        Ok(loss)
    }

    fn state(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_moves_prediction_towards_observed_state() {
        let mut ts = TrainSet::new(2);
        for _ in 0..20 {
            ts.append_point(vec![1.0], vec![0.0, 2.0], 1.0).unwrap();
            ts.append_point(vec![-1.0], vec![2.0, 0.0], 1.0).unwrap();
        }
        let mut model = LogisticRcModel::new(1);
        let first = model.train_epoch(&ts, 1.0).unwrap();
        let mut last = first;
        for _ in 0..50 {
            last = model.train_epoch(&ts, 1.0).unwrap();
        }
        assert!(last < first);
        assert!(model.p(&[1.0]).unwrap()[0] > 0.9);
        assert!(model.p(&[-1.0]).unwrap()[0] < 0.1);
    }

    #[test]
    fn state_roundtrip_preserves_parameters() {
        let mut model = LogisticRcModel::new(2);
        model.weights = vec![0.5, -1.5];
        model.bias = 0.25;
        let back = LogisticRcModel::from_state(model.state().unwrap()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn wrong_descriptor_length_is_rejected() {
        let model = LogisticRcModel::new(3);
        assert_eq!(model.log_prob(&[1.0]),
                   Err(ModelError::DescriptorMismatch { expected: 3, got: 1 }));
    }
}
