use std::ops::Deref;

use super::{ArtifactRef, Step};

/// Step en su ventana mutable (entre producción y persistencia).
///
/// `chain_index` y `step_number` quedan fijos desde la creación; el resto de
/// campos se modifican con setters. La lectura pasa por `Deref<Target = Step>`.
#[derive(Debug)]
pub struct StepDraft {
    step: Step,
}

impl StepDraft {
    /// Los drafts de producción los crea el `ChainSampler`; este constructor
    /// queda público para stores y tests de tasks.
    pub fn new(step: Step) -> Self {
        Self { step }
    }

    pub fn set_accepted(&mut self, accepted: bool) {
        self.step.accepted = accepted;
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.step.weight = weight;
    }

    pub fn set_states_reached(&mut self, states: Option<Vec<f64>>) {
        self.step.states_reached = states;
    }

    pub fn set_predicted_values(&mut self, values: Option<Vec<f64>>) {
        self.step.predicted_values = values;
    }

    pub fn set_descriptors(&mut self, descriptors: Option<Vec<f64>>) {
        self.step.descriptors = descriptors;
    }

    pub fn set_artifact(&mut self, artifact: Option<ArtifactRef>) {
        self.step.artifact = artifact;
    }

    pub(crate) fn into_step(self) -> Step {
        self.step
    }
}

impl Deref for StepDraft {
    type Target = Step;

    fn deref(&self) -> &Step {
        &self.step
    }
}
