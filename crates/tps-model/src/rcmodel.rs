//! Contrato del modelo predictivo de la coordenada de reacción.
//!
//! Con `n_out == 1` el modelo es binomial: `log_prob` devuelve sólo el
//! logit hacia el estado B y `p` es su sigmoide. Con `n_out > 1` es
//! multinomial: `p` es el softmax de `log_prob`.

use serde_json::Value;

use crate::errors::ModelError;
use crate::trainset::TrainSet;

pub trait RcModel: Send + Sync {
    fn n_out(&self) -> usize;

    /// Log-probabilidades sin normalizar, `n_out` valores.
    fn log_prob(&self, descriptors: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Una pasada completa sobre el trainset; devuelve la pérdida por shot.
    fn train_epoch(&mut self, trainset: &TrainSet, lr: f64) -> Result<f64, ModelError>;

    /// Estado serializable (para `save`).
    fn state(&self) -> Result<Value, ModelError>;

    /// Coordenada de reacción hacia cada estado.
    fn q(&self, descriptors: &[f64]) -> Result<Vec<f64>, ModelError> {
        let lp = self.log_prob(descriptors)?;
        if self.n_out() == 1 {
            return Ok(lp);
        }
        Ok((0..lp.len()).map(|i| {
                             let rest: f64 = lp.iter()
                                               .enumerate()
                                               .filter(|(j, _)| *j != i)
                                               .map(|(_, v)| v.exp())
                                               .sum();
                             lp[i] - rest.ln()
                         })
                        .collect())
    }

    /// `p_B` (binomial) o probabilidades de compromiso por estado.
    fn p(&self, descriptors: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.n_out() == 1 {
            return Ok(self.q(descriptors)?.into_iter().map(sigmoid).collect());
        }
        Ok(softmax(&self.log_prob(descriptors)?))
    }

    /// Coordenada de selección: 0 en el punto óptimo.
    fn z_sel(&self, descriptors: &[f64]) -> Result<f64, ModelError> {
        let n = self.n_out();
        if n == 1 {
            return self.q(descriptors)?
                       .first()
                       .copied()
                       .ok_or_else(|| ModelError::InvalidValue("empty model output".into()));
        }
        let p = self.p(descriptors)?;
        let reactive = 1.0 - p.iter().map(|x| x * x).sum::<f64>();
        let n = n as f64;
        Ok((25.0 / (1.0 - 1.0 / n)) * (1.0 - 1.0 / n - reactive))
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f64>);

    impl RcModel for Fixed {
        fn n_out(&self) -> usize {
            self.0.len()
        }
        fn log_prob(&self, _d: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(self.0.clone())
        }
        fn train_epoch(&mut self, _t: &TrainSet, _lr: f64) -> Result<f64, ModelError> {
            Ok(0.0)
        }
        fn state(&self) -> Result<Value, ModelError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn binomial_p_is_sigmoid_of_q() {
        let m = Fixed(vec![0.0]);
        assert_eq!(m.p(&[]).unwrap(), vec![0.5]);
        assert_eq!(m.z_sel(&[]).unwrap(), 0.0);
    }

    #[test]
    fn multinomial_uniform_is_optimal_selection_point() {
        let m = Fixed(vec![1.0, 1.0, 1.0]);
        let p = m.p(&[]).unwrap();
        assert!(p.iter().all(|x| (x - 1.0 / 3.0).abs() < 1e-12));
        assert!(m.z_sel(&[]).unwrap().abs() < 1e-9);
        let q = m.q(&[]).unwrap();
        assert!((q[0] - (-(2.0f64).ln())).abs() < 1e-12);
    }
}
