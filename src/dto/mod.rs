//! DTOs de request/response de la API

pub mod arb_dto;
pub mod common;
pub mod message_dto;
pub mod report_dto;
pub mod user_dto;
pub mod vehicle_dto;
pub mod vehicle_records_dto;
pub mod work_item_dto;
