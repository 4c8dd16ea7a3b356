use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::arb_dto::{ArbInitiatedResponse, ArbResolvedResponse, InitiateArbRequest, ResolveArbRequest};
use crate::dto::common::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::arb::ArbRecord;
use crate::repositories::{ArbRepository, VehicleRepository};
use crate::services::arb_service::ArbService;
use crate::utils::errors::{not_found_error, AppError};

pub struct ArbController {
    vehicles: VehicleRepository,
    records: ArbRepository,
    service: ArbService,
}

impl ArbController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            records: ArbRepository::new(pool.clone()),
            service: ArbService::new(pool),
        }
    }

    pub async fn list(&self, user: &AuthenticatedUser, vehicle_id: Uuid) -> Result<ApiResponse<Vec<ArbRecord>>, AppError> {
        user.require("arb.view")?;
        if self.vehicles.find_by_id(vehicle_id).await?.is_none() {
            return Err(not_found_error("Vehicle", &vehicle_id.to_string()));
        }
        let records = self.records.list_for_vehicle(vehicle_id).await?;
        Ok(ApiResponse::success(records))
    }

    pub async fn initiate(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: InitiateArbRequest,
    ) -> Result<ApiResponse<ArbInitiatedResponse>, AppError> {
        user.require("arb.create")?;
        let response = self.service.initiate(vehicle_id, request, user).await?;
        Ok(ApiResponse::success_with_message(response, "ARB initiated"))
    }

    pub async fn resolve(
        &self,
        user: &AuthenticatedUser,
        vehicle_id: Uuid,
        request: ResolveArbRequest,
    ) -> Result<ApiResponse<ArbResolvedResponse>, AppError> {
        user.require("arb.resolve")?;
        let response = self.service.resolve(vehicle_id, request, user).await?;
        Ok(ApiResponse::success_with_message(response, "ARB resolved"))
    }
}
