//! Constantes del núcleo.
//!
//! `STEP_SCHEMA_VERSION` participa en el fingerprint de cada `StepRecord`:
//! un cambio de versión invalida deterministamente los fingerprints
//! almacenados aunque el contenido del step no cambie.

/// Versión del esquema de `Step`. Mantener estable mientras no haya cambios
/// incompatibles en los campos persistidos.
pub const STEP_SCHEMA_VERSION: &str = "S1.0";

/// Step number reservado para el seed de cada cadena.
pub const SEED_STEP_NUMBER: u64 = 0;
