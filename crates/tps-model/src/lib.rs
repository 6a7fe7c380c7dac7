//! tps-model: modelo predictivo de la coordenada de reacción y utilidades de
//! entrenamiento.
pub mod density;
pub mod efficiency;
pub mod errors;
pub mod logistic;
pub mod rcmodel;
pub mod trainset;

pub use density::DensityCollector;
pub use efficiency::{EeParams, ExpectedEfficiency, TrainDecision, TrainOutcome};
pub use errors::ModelError;
pub use logistic::LogisticRcModel;
pub use rcmodel::{sigmoid, softmax, RcModel};
pub use trainset::TrainSet;
