use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{arb::ArbRecord, vehicle::{Vehicle, VehicleStatus}};
use crate::utils::errors::AppError;

/// Lecturas de sólo consulta para los reportes; la agregación es en memoria
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn sold_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE status = $1 AND sale_date BETWEEN $2 AND $3
            ORDER BY sale_date
            "#,
        )
        .bind(VehicleStatus::Sold.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn all_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles")
            .fetch_all(&self.pool)
            .await?;
        Ok(vehicles)
    }

    pub async fn arb_initiated_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ArbRecord>, AppError> {
        let records = sqlx::query_as::<_, ArbRecord>(
            r#"
            SELECT * FROM vehicle_arb_records
            WHERE initiated_at::date BETWEEN $1 AND $2
            ORDER BY initiated_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn pending_arb_count(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicle_arb_records WHERE outcome = 'Pending'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Vehículos no retirados sin título (NULL, vacío o "Absent") comprados
    /// en el rango; los que no tienen fecha de compra siempre entran
    pub async fn missing_titles(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE status <> $1
              AND (title_status IS NULL OR LOWER(TRIM(title_status)) IN ('', 'absent'))
              AND (purchase_date IS NULL OR purchase_date BETWEEN $2 AND $3)
            ORDER BY purchase_date NULLS LAST
            "#,
        )
        .bind(VehicleStatus::Withdrew.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }
}
