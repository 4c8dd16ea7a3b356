use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::vehicle_dto::{UpdateVehicleRequest, VehicleFilters};
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleStatus};
use crate::utils::errors::AppError;

/// Columnas enlazadas por fila en `bulk_insert`
const BULK_INSERT_COLUMNS: usize = 19;

/// Filas por sentencia en `bulk_insert` (19 binds por fila, máximo 65535)
pub const BULK_INSERT_CHUNK: usize = 1000;

/// Consulta de VINs existentes; la usan la creación y la importación
#[async_trait]
pub trait VinIndex: Send + Sync {
    async fn vin_exists(&self, vin: &str) -> Result<bool, AppError>;
}

/// Cambios que el procesador de ARB aplica a un vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleArbUpdate {
    pub status: VehicleStatus,
    /// buyer_name, sale_invoice y sale_date a NULL
    pub clear_sale: bool,
    /// bought_price, buy_fee y other_charges a NULL
    pub clear_purchase: bool,
    pub bought_price: Option<Decimal>,
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, vehicle: &NewVehicle, created_by: Uuid) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                vin, year, make, model, trim, exterior_color, odometer, status, title_status,
                location, lot_number, bought_price, buy_fee, other_charges, purchase_date,
                seller_name, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *
            "#,
        )
        .bind(&vehicle.vin)
        .bind(vehicle.year)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(&vehicle.trim)
        .bind(&vehicle.exterior_color)
        .bind(vehicle.odometer)
        .bind(vehicle.status.as_str())
        .bind(&vehicle.title_status)
        .bind(&vehicle.location)
        .bind(&vehicle.lot_number)
        .bind(vehicle.bought_price)
        .bind(vehicle.buy_fee)
        .bind(vehicle.other_charges)
        .bind(vehicle.purchase_date)
        .bind(&vehicle.seller_name)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Inserción masiva en una transacción, en lotes de `BULK_INSERT_CHUNK`
    /// filas para no pasar el límite de parámetros de Postgres; devuelve
    /// filas insertadas
    pub async fn bulk_insert(&self, vehicles: &[NewVehicle], created_by: Uuid) -> Result<u64, AppError> {
        if vehicles.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut inserted = 0;
        let mut tx = self.pool.begin().await?;

        for chunk in vehicles.chunks(BULK_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO vehicles (vin, year, make, model, trim, exterior_color, odometer, status, \
                 title_status, location, lot_number, bought_price, buy_fee, other_charges, purchase_date, \
                 seller_name, created_by, created_at, updated_at) ",
            );
            builder.push_values(chunk, |mut row, v| {
                row.push_bind(&v.vin)
                    .push_bind(v.year)
                    .push_bind(&v.make)
                    .push_bind(&v.model)
                    .push_bind(&v.trim)
                    .push_bind(&v.exterior_color)
                    .push_bind(v.odometer)
                    .push_bind(v.status.as_str())
                    .push_bind(&v.title_status)
                    .push_bind(&v.location)
                    .push_bind(&v.lot_number)
                    .push_bind(v.bought_price)
                    .push_bind(v.buy_fee)
                    .push_bind(v.other_charges)
                    .push_bind(v.purchase_date)
                    .push_bind(&v.seller_name)
                    .push_bind(created_by)
                    .push_bind(now)
                    .push_bind(now);
            });

            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        Self::find_by_id_with(&self.pool, id).await
    }

    pub async fn find_by_id_with<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(vehicle)
    }

    /// Igual que `find_by_id` pero bloquea la fila hasta el fin de la transacción
    pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(vehicle)
    }

    pub async fn list(&self, filters: &VehicleFilters) -> Result<Vec<Vehicle>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM vehicles WHERE TRUE");

        if let Some(status) = filters.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }

        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (vin ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR make ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR model ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR lot_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.limit.unwrap_or(100).clamp(1, 500))
            .push(" OFFSET ")
            .push_bind(filters.offset.unwrap_or(0).max(0));

        let vehicles = builder.build_query_as::<Vehicle>().fetch_all(&self.pool).await?;
        Ok(vehicles)
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> Result<Vehicle, AppError> {
        // Obtener vehículo actual
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET year = $2, make = $3, model = $4, trim = $5, exterior_color = $6, odometer = $7,
                title_status = $8, location = $9, lot_number = $10, bought_price = $11,
                buy_fee = $12, other_charges = $13, purchase_date = $14, seller_name = $15,
                buyer_name = $16, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.year.unwrap_or(current.year))
        .bind(request.make.map(|m| m.trim().to_string()).unwrap_or(current.make))
        .bind(request.model.map(|m| m.trim().to_string()).unwrap_or(current.model))
        .bind(request.trim.or(current.trim))
        .bind(request.exterior_color.or(current.exterior_color))
        .bind(request.odometer.or(current.odometer))
        .bind(request.title_status.or(current.title_status))
        .bind(request.location.or(current.location))
        .bind(request.lot_number.or(current.lot_number))
        .bind(request.bought_price.or(current.bought_price))
        .bind(request.buy_fee.or(current.buy_fee))
        .bind(request.other_charges.or(current.other_charges))
        .bind(request.purchase_date.or(current.purchase_date))
        .bind(request.seller_name.or(current.seller_name))
        .bind(request.buyer_name.or(current.buyer_name))
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn set_status<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        status: VehicleStatus,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_one(executor)
        .await?;
        Ok(vehicle)
    }

    pub async fn record_sale<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        buyer_name: &str,
        sale_invoice: Decimal,
        sale_date: NaiveDate,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = $2, buyer_name = $3, sale_invoice = $4, sale_date = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(VehicleStatus::Sold.as_str())
        .bind(buyer_name)
        .bind(sale_invoice)
        .bind(sale_date)
        .fetch_one(executor)
        .await?;
        Ok(vehicle)
    }

    /// Aplicar el resultado de un ARB sobre el vehículo
    pub async fn apply_arb_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        update: &VehicleArbUpdate,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = $2,
                buyer_name = CASE WHEN $3 THEN NULL ELSE buyer_name END,
                sale_invoice = CASE WHEN $3 THEN NULL ELSE sale_invoice END,
                sale_date = CASE WHEN $3 THEN NULL ELSE sale_date END,
                bought_price = CASE WHEN $4 THEN NULL ELSE COALESCE($5, bought_price) END,
                buy_fee = CASE WHEN $4 THEN NULL ELSE buy_fee END,
                other_charges = CASE WHEN $4 THEN NULL ELSE other_charges END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status.as_str())
        .bind(update.clear_sale)
        .bind(update.clear_purchase)
        .bind(update.bought_price)
        .fetch_one(executor)
        .await?;
        Ok(vehicle)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl VinIndex for VehicleRepository {
    async fn vin_exists(&self, vin: &str) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE vin = $1)")
            .bind(vin)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_insert_chunk_fits_bind_limit() {
        assert!(BULK_INSERT_CHUNK * BULK_INSERT_COLUMNS <= u16::MAX as usize);
    }
}
