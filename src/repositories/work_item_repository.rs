use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::work_item_dto::{CreateWorkItemRequest, UpdateWorkItemRequest, WorkItemFilters};
use crate::models::work_item::{WorkItem, WorkItemKind, WorkItemStatus};
use crate::utils::errors::AppError;

/// Repositorio compartido por tasks y events; la tabla la decide `kind`
pub struct WorkItemRepository {
    pool: PgPool,
    kind: WorkItemKind,
}

impl WorkItemRepository {
    pub fn new(pool: PgPool, kind: WorkItemKind) -> Self {
        Self { pool, kind }
    }

    /// `visible_to` restringe a items asignados a o creados por ese usuario
    pub async fn list(&self, filters: &WorkItemFilters, visible_to: Option<Uuid>) -> Result<Vec<WorkItem>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT * FROM {} WHERE TRUE", self.kind.table()));

        if let Some(status) = filters.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(assigned_to) = filters.assigned_to {
            builder.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(vehicle_id) = filters.vehicle_id {
            builder.push(" AND vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(user_id) = visible_to {
            builder
                .push(" AND (assigned_to = ")
                .push_bind(user_id)
                .push(" OR created_by = ")
                .push_bind(user_id)
                .push(")");
        }
        builder.push(" ORDER BY due_date, due_time NULLS LAST");

        let items = builder.build_query_as::<WorkItem>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkItem>, AppError> {
        let item = sqlx::query_as::<_, WorkItem>(&format!("SELECT * FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn create(&self, request: &CreateWorkItemRequest, created_by: Uuid) -> Result<WorkItem, AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (title, description, due_date, due_time, assigned_to, created_by, status, vehicle_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
            self.kind.table()
        );
        let item = sqlx::query_as::<_, WorkItem>(&sql)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(request.due_date)
            .bind(request.due_time)
            .bind(request.assigned_to)
            .bind(created_by)
            .bind(WorkItemStatus::Pending.as_str())
            .bind(request.vehicle_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn update(&self, current: WorkItem, request: UpdateWorkItemRequest) -> Result<WorkItem, AppError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET title = $2, description = $3, due_date = $4, due_time = $5,
                assigned_to = $6, status = $7, vehicle_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
            self.kind.table()
        );
        let item = sqlx::query_as::<_, WorkItem>(&sql)
            .bind(current.id)
            .bind(request.title.map(|t| t.trim().to_string()).unwrap_or(current.title))
            .bind(request.description.or(current.description))
            .bind(request.due_date.unwrap_or(current.due_date))
            .bind(request.due_time.or(current.due_time))
            .bind(request.assigned_to.or(current.assigned_to))
            .bind(request.status.map(|s| s.as_str().to_string()).unwrap_or(current.status))
            .bind(request.vehicle_id.or(current.vehicle_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
