//! Repositorios de acceso a datos
//!
//! Este módulo contiene los repositorios que encapsulan las consultas SQL
//! sobre cada tabla.

pub mod arb_repository;
pub mod audit_repository;
pub mod message_repository;
pub mod profile_repository;
pub mod report_repository;
pub mod role_repository;
pub mod vehicle_records_repository;
pub mod vehicle_repository;
pub mod work_item_repository;

pub use arb_repository::ArbRepository;
pub use audit_repository::AuditRepository;
pub use message_repository::MessageRepository;
pub use profile_repository::ProfileRepository;
pub use report_repository::ReportRepository;
pub use role_repository::RoleRepository;
pub use vehicle_records_repository::VehicleRecordsRepository;
pub use vehicle_repository::{VehicleRepository, VinIndex};
pub use work_item_repository::WorkItemRepository;
