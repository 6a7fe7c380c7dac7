//! tpsflow: orquestación de Transition Path Sampling.
//!
//! Este crate es el glue de aplicación sobre los crates del workspace:
//! - `config`: configuración desde entorno / .env.
//! - `errors`: `AppError`.
//! - `demo`: run de extremo a extremo sobre un sistema de juguete.
//!
//! El núcleo vive en `tps-core`; el modelo en `tps-model`; tasks y engine en
//! `tps-adapters`; Postgres en `tps-persistence`.

pub mod config;
pub mod demo;
pub mod errors;

pub use config::{app_config, AppConfig};
pub use errors::AppError;
