//! Política de entrenamiento por eficiencia esperada (EE).
//!
//! Compara las transiciones observadas en las últimas `window` entradas del
//! trainset con las esperadas según las `p` que el modelo predijo para esos
//! shooting points. Cuanto peor predice el modelo, mayor el learning rate.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::rcmodel::RcModel;
use crate::trainset::TrainSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EeParams {
    pub lr_0: f64,
    pub lr_min: f64,
    pub epochs_per_train: usize,
    /// Se intenta entrenar cada `interval` llamadas al hook.
    pub interval: u64,
    pub window: usize,
}

impl Default for EeParams {
    fn default() -> Self {
        Self { lr_0: 1e-3,
               lr_min: 1e-4,
               epochs_per_train: 5,
               interval: 3,
               window: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainDecision {
    pub train: bool,
    pub lr: f64,
    pub epochs: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub decision: Option<TrainDecision>,
    /// Pérdida por época, vacío si no se entrenó.
    pub losses: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEfficiency {
    params: EeParams,
    expected_p: Vec<Vec<f64>>,
    hook_count: u64,
    decisions: Vec<TrainDecision>,
}

impl ExpectedEfficiency {
    pub fn new(params: EeParams) -> Self {
        Self { params,
               expected_p: Vec::new(),
               hook_count: 0,
               decisions: Vec::new() }
    }

    pub fn params(&self) -> &EeParams {
        &self.params
    }

    pub fn hook_count(&self) -> u64 {
        self.hook_count
    }

    pub fn decisions(&self) -> &[TrainDecision] {
        &self.decisions
    }

    /// Registra la `p` predicha para el shooting point elegido.
    pub fn register_sp(&mut self, p: Vec<f64>) {
        self.expected_p.push(p);
    }

    pub fn expected_p(&self) -> &[Vec<f64>] {
        &self.expected_p
    }

    /// `(1 - n_TP_true / n_TP_expected)^2` sobre la ventana.
    ///
    /// Sin puntos o con `n_TP_expected == 0` devuelve 1.
    pub fn factor(&self, trainset: &TrainSet) -> f64 {
        let n_points = trainset.len().min(self.expected_p.len()).min(self.params.window);
        if n_points == 0 {
            return 1.0;
        }
        let transitions = trainset.transitions();
        let n_tp_true = transitions[transitions.len() - n_points..].iter()
                                                                  .filter(|t| **t)
                                                                  .count() as f64;
        let n_tp_expected: f64 = self.expected_p[self.expected_p.len() - n_points..].iter()
                                                                                   .map(|p| expected_transitions(p))
                                                                                   .sum();
        if n_tp_expected <= 0.0 {
            return 1.0;
        }
        let factor = (1.0 - n_tp_true / n_tp_expected).powi(2);
        debug!("ee:factor value={factor:.3e} points={n_points} true={n_tp_true} expected={n_tp_expected:.3}");
        factor
    }

    /// Cuenta una llamada al hook y decide si entrenar y con qué lr.
    pub fn decide(&mut self, trainset: &TrainSet) -> TrainDecision {
        self.hook_count += 1;
        let lr = self.params.lr_0 * self.factor(trainset);
        let train = self.hook_count % self.params.interval.max(1) == 0 && lr >= self.params.lr_min;
        let decision = TrainDecision { train,
                                       lr,
                                       epochs: self.params.epochs_per_train };
        info!("ee:decide hook={} train={train} lr={lr:.3e} epochs={}",
              self.hook_count,
              decision.epochs);
        self.decisions.push(decision);
        decision
    }

    /// Decide y, si corresponde, entrena `model` sobre `trainset`.
    pub fn train_hook<M>(&mut self, model: &mut M, trainset: &TrainSet) -> Result<TrainOutcome, ModelError>
        where M: RcModel + ?Sized
    {
        let decision = self.decide(trainset);
        let mut losses = Vec::new();
        if decision.train {
            for _ in 0..decision.epochs {
                losses.push(model.train_epoch(trainset, decision.lr)?);
            }
            info!("ee:trained epochs={} last_loss={:?}", decision.epochs, losses.last());
        }
        Ok(TrainOutcome { decision: Some(decision),
                          losses })
    }
}

impl Default for ExpectedEfficiency {
    fn default() -> Self {
        Self::new(EeParams::default())
    }
}

/// Transiciones esperadas en dos shots independientes desde un punto con
/// probabilidades de compromiso `p`.
fn expected_transitions(p: &[f64]) -> f64 {
    match p {
        [pb] => 2.0 * pb * (1.0 - pb),
        _ => {
            let mut sum = 0.0;
            for i in 0..p.len() {
                for j in (i + 1)..p.len() {
                    sum += p[i] * p[j];
                }
            }
            2.0 * sum
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainset(transitions: &[bool]) -> TrainSet {
        let mut ts = TrainSet::new(2);
        for t in transitions {
            let shots = if *t { vec![1.0, 1.0] } else { vec![2.0, 0.0] };
            ts.append_point(vec![0.0], shots, 1.0).unwrap();
        }
        ts
    }

    #[test]
    fn perfect_prediction_gives_zero_factor() {
        let ts = trainset(&[true, false]);
        let mut ee = ExpectedEfficiency::default();
        // 2 * 0.5 * 0.5 = 0.5 por punto => 1 transición esperada
        ee.register_sp(vec![0.5]);
        ee.register_sp(vec![0.5]);
        assert_eq!(ee.factor(&ts), 0.0);
    }

    #[test]
    fn no_expected_transitions_falls_back_to_one() {
        let ts = trainset(&[true]);
        let mut ee = ExpectedEfficiency::default();
        ee.register_sp(vec![1.0]);
        assert_eq!(ee.factor(&ts), 1.0);
        assert_eq!(ExpectedEfficiency::default().factor(&ts), 1.0);
    }

    #[test]
    fn multinomial_expectation_sums_pairs() {
        let p = [0.5, 0.25, 0.25];
        let expected = 2.0 * (0.5 * 0.25 + 0.5 * 0.25 + 0.25 * 0.25);
        assert!((expected_transitions(&p) - expected).abs() < 1e-12);
    }

    #[test]
    fn trains_only_every_interval_calls() {
        let ts = trainset(&[false, false, false]);
        let mut ee = ExpectedEfficiency::default();
        for _ in 0..3 {
            ee.register_sp(vec![0.5]);
        }
        let trains: Vec<bool> = (0..6).map(|_| ee.decide(&ts).train).collect();
        assert_eq!(trains, vec![false, false, true, false, false, true]);
        // factor = (1 - 0/1.5)^2 = 1 => lr = lr_0
        assert_eq!(ee.decisions()[2].lr, 1e-3);
    }

    #[test]
    fn small_lr_skips_training() {
        let ts = trainset(&[true, false]);
        let params = EeParams { interval: 1,
                                ..EeParams::default() };
        let mut ee = ExpectedEfficiency::new(params);
        ee.register_sp(vec![0.5]);
        ee.register_sp(vec![0.5]);
        assert!(!ee.decide(&ts).train);
    }
}
