pub mod message_routes;
pub mod report_routes;
pub mod user_routes;
pub mod vehicle_records_routes;
pub mod vehicle_routes;
pub mod work_item_routes;

use axum::Router;

use crate::models::work_item::WorkItemKind;
use crate::state::AppState;

/// Todas las rutas `/api`; la autenticación se agrega en `build_router`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest(
            "/vehicles",
            vehicle_routes::create_vehicle_router()
                .merge(vehicle_records_routes::create_vehicle_records_router()),
        )
        .nest("/dispatch", vehicle_records_routes::create_dispatch_router())
        .nest("/tasks", work_item_routes::create_work_item_router(WorkItemKind::Task))
        .nest("/events", work_item_routes::create_work_item_router(WorkItemKind::Event))
        .nest("/messages", message_routes::create_message_router())
        .nest("/reports", report_routes::create_report_router())
        .nest("/users", user_routes::create_user_router())
        .nest("/roles", user_routes::create_role_router())
        .nest("/audit-logs", user_routes::create_audit_router())
        .nest("/settings", user_routes::create_settings_router())
}
