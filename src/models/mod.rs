//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL.

pub mod arb;
pub mod audit;
pub mod message;
pub mod profile;
pub mod role;
pub mod vehicle;
pub mod vehicle_records;
pub mod work_item;
