use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, ImportReport, ImportVehiclesRequest, RecordSaleRequest,
    UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleFilters,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    vehicle::{Vehicle, VehicleStatus},
    vehicle_records::NewTimelineEntry,
};
use crate::repositories::{VehicleRecordsRepository, VehicleRepository, VinIndex};
use crate::services::import_service::ImportService;
use crate::utils::errors::{not_found_error, AppError};

/// Estados desde los que no se puede registrar una venta
const NON_SELLABLE: [VehicleStatus; 3] = [
    VehicleStatus::Sold,
    VehicleStatus::PendingArbitration,
    VehicleStatus::Withdrew,
];

pub fn check_status_change(target: VehicleStatus) -> Result<(), AppError> {
    if target == VehicleStatus::PendingArbitration {
        return Err(AppError::BadRequest(
            "Status 'Pending Arbitration' can only be set by opening an ARB".to_string(),
        ));
    }
    Ok(())
}

pub fn check_sale(vehicle: &Vehicle) -> Result<(), AppError> {
    match vehicle.status() {
        Some(status) if NON_SELLABLE.contains(&status) => Err(AppError::BadRequest(format!(
            "Cannot record a sale for a vehicle with status '{}'",
            status
        ))),
        _ => Ok(()),
    }
}

pub struct VehicleController {
    pool: PgPool,
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Vehículo existente o 404
    pub async fn load(&self, id: Uuid) -> Result<Vehicle, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    pub async fn list(&self, user: &AuthenticatedUser, filters: VehicleFilters) -> Result<ApiResponse<Vec<Vehicle>>, AppError> {
        user.require("inventory.view")?;
        let vehicles = self.repository.list(&filters).await?;
        Ok(ApiResponse::success(vehicles))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<Vehicle>, AppError> {
        user.require("inventory.view")?;
        Ok(ApiResponse::success(self.load(id).await?))
    }

    pub async fn create(&self, user: &AuthenticatedUser, request: CreateVehicleRequest) -> Result<ApiResponse<Vehicle>, AppError> {
        user.require("inventory.create")?;
        request.validate()?;

        let new_vehicle = request.into_new_vehicle();
        check_status_change(new_vehicle.status)?;

        // Verificar que el VIN no exista
        if self.repository.vin_exists(&new_vehicle.vin).await? {
            return Err(AppError::BadRequest(format!(
                "A vehicle with VIN '{}' already exists",
                new_vehicle.vin
            )));
        }

        let vehicle = self.repository.create(&new_vehicle, user.id()).await?;
        VehicleRecordsRepository::append_timeline(
            &self.pool,
            vehicle.id,
            &NewTimelineEntry::new("Vehicle Added"),
            &user.actor(),
        )
        .await?;

        tracing::info!("🚗 Vehicle {} created ({})", vehicle.vin, vehicle.display_name());
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle created successfully"))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        user.require("inventory.edit")?;
        if request.title_status.is_some() {
            user.require("title.edit")?;
        }
        request.validate()?;

        let vehicle = self.repository.update(id, request).await?;
        Ok(ApiResponse::success_with_message(vehicle, "Vehicle updated successfully"))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        user.require_admin()?;
        self.repository.delete(id).await?;
        tracing::info!("🗑️ Vehicle {} deleted by {}", id, user.id());
        Ok(ApiResponse::message("Vehicle deleted successfully"))
    }

    pub async fn update_status(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateVehicleStatusRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        user.require("inventory.edit")?;
        check_status_change(request.status)?;

        let mut tx = self.pool.begin().await?;
        let current = VehicleRepository::lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;
        if current.status() == Some(VehicleStatus::PendingArbitration) {
            return Err(AppError::Conflict(
                "Vehicle has a pending ARB; resolve it before changing the status".to_string(),
            ));
        }

        let vehicle = VehicleRepository::set_status(&mut *tx, id, request.status).await?;
        let entry = NewTimelineEntry::new(format!("Status changed from {} to {}", current.status, request.status))
            .with_note(request.note);
        VehicleRecordsRepository::append_timeline(&mut *tx, id, &entry, &user.actor()).await?;
        tx.commit().await?;

        Ok(ApiResponse::success_with_message(vehicle, "Status updated successfully"))
    }

    pub async fn record_sale(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: RecordSaleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        user.require("sold.edit")?;
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = VehicleRepository::lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;
        check_sale(&current)?;

        let buyer_name = request.buyer_name.trim();
        let vehicle =
            VehicleRepository::record_sale(&mut *tx, id, buyer_name, request.sale_invoice, request.sale_date).await?;
        let entry = NewTimelineEntry::new("Vehicle Sold")
            .with_cost(request.sale_invoice)
            .with_note(Some(format!("Sold to {}", buyer_name)));
        VehicleRecordsRepository::append_timeline(&mut *tx, id, &entry, &user.actor()).await?;
        tx.commit().await?;

        tracing::info!("💰 Vehicle {} sold for {}", vehicle.vin, request.sale_invoice);
        Ok(ApiResponse::success_with_message(vehicle, "Sale recorded successfully"))
    }

    /// El reporte se devuelve tal cual, sin envoltorio `ApiResponse`
    pub async fn import(
        &self,
        user: &AuthenticatedUser,
        request: ImportVehiclesRequest,
    ) -> Result<ImportReport, AppError> {
        user.require("inventory.import")?;
        let service = ImportService::new(VehicleRepository::new(self.pool.clone()));
        let report = service.import(&request, user.id()).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::fixtures::vehicle;

    #[test]
    fn test_pending_arbitration_is_reserved() {
        assert!(check_status_change(VehicleStatus::PendingArbitration).is_err());
        assert!(check_status_change(VehicleStatus::Complete).is_ok());
    }

    #[test]
    fn test_sale_only_from_sellable_states() {
        assert!(check_sale(&vehicle(VehicleStatus::Pending)).is_ok());
        assert!(check_sale(&vehicle(VehicleStatus::InProgress)).is_ok());
        assert!(check_sale(&vehicle(VehicleStatus::Sold)).is_err());
        assert!(check_sale(&vehicle(VehicleStatus::PendingArbitration)).is_err());
        assert!(check_sale(&vehicle(VehicleStatus::Withdrew)).is_err());
    }
}
