pub mod arb_controller;
pub mod message_controller;
pub mod report_controller;
pub mod role_controller;
pub mod settings_controller;
pub mod user_controller;
pub mod vehicle_controller;
pub mod vehicle_records_controller;
pub mod work_item_controller;
