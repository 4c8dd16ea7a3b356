use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::arb::{ArbOutcome, ArbRecord, ArbType};
use crate::utils::errors::AppError;

/// Datos con los que se cierra un ARB pendiente
#[derive(Debug, Clone)]
pub struct ArbResolution {
    pub outcome: ArbOutcome,
    pub adjustment_amount: Option<Decimal>,
    pub transport_cost: Option<Decimal>,
    pub transport_company: Option<String>,
    pub notes: Option<String>,
    pub resolved_by: Uuid,
}

pub struct ArbRepository {
    pool: PgPool,
}

impl ArbRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<ArbRecord>, AppError> {
        let records = sqlx::query_as::<_, ArbRecord>(
            "SELECT * FROM vehicle_arb_records WHERE vehicle_id = $1 ORDER BY initiated_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Cualquier ARB pendiente del vehículo, sin importar el tipo
    pub async fn find_any_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: Uuid,
    ) -> Result<Option<ArbRecord>, AppError> {
        let record = sqlx::query_as::<_, ArbRecord>(
            r#"
            SELECT * FROM vehicle_arb_records
            WHERE vehicle_id = $1 AND outcome = $2
            ORDER BY initiated_at DESC
            LIMIT 1
            "#,
        )
        .bind(vehicle_id)
        .bind(ArbOutcome::Pending.as_str())
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    /// ARB pendiente más reciente del tipo dado, bloqueado para la transacción
    pub async fn lock_latest_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: Uuid,
        arb_type: ArbType,
    ) -> Result<Option<ArbRecord>, AppError> {
        let record = sqlx::query_as::<_, ArbRecord>(
            r#"
            SELECT * FROM vehicle_arb_records
            WHERE vehicle_id = $1 AND arb_type = $2 AND outcome = $3
            ORDER BY initiated_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(vehicle_id)
        .bind(arb_type.as_str())
        .bind(ArbOutcome::Pending.as_str())
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn create_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        vehicle_id: Uuid,
        arb_type: ArbType,
        reason: Option<&str>,
        notes: Option<&str>,
        initiated_by: Uuid,
    ) -> Result<ArbRecord, AppError> {
        let record = sqlx::query_as::<_, ArbRecord>(
            r#"
            INSERT INTO vehicle_arb_records (vehicle_id, arb_type, outcome, reason, notes, initiated_by, initiated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(vehicle_id)
        .bind(arb_type.as_str())
        .bind(ArbOutcome::Pending.as_str())
        .bind(reason)
        .bind(notes)
        .bind(initiated_by)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    pub async fn resolve<'e, E: PgExecutor<'e>>(
        executor: E,
        record_id: Uuid,
        resolution: &ArbResolution,
    ) -> Result<ArbRecord, AppError> {
        let record = sqlx::query_as::<_, ArbRecord>(
            r#"
            UPDATE vehicle_arb_records
            SET outcome = $2, adjustment_amount = $3, transport_cost = $4,
                transport_company = $5, notes = COALESCE($6, notes),
                resolved_by = $7, resolved_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(resolution.outcome.as_str())
        .bind(resolution.adjustment_amount)
        .bind(resolution.transport_cost)
        .bind(&resolution.transport_company)
        .bind(&resolution.notes)
        .bind(resolution.resolved_by)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(record)
    }
}
