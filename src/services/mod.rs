//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que involucran múltiples
//! repositorios o integraciones externas.

pub mod arb_service;
pub mod auth_admin_service;
pub mod authorization_service;
pub mod import_service;
pub mod report_service;
pub mod storage_service;
