//! Controller de tasks y events
//!
//! Los administradores ven todos los items; el resto sólo los que tienen
//! asignados o crearon.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::work_item_dto::{CreateWorkItemRequest, UpdateWorkItemRequest, WorkItemFilters};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::work_item::{WorkItem, WorkItemKind};
use crate::repositories::WorkItemRepository;
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

pub struct WorkItemController {
    kind: WorkItemKind,
    repository: WorkItemRepository,
}

impl WorkItemController {
    pub fn new(pool: PgPool, kind: WorkItemKind) -> Self {
        Self {
            kind,
            repository: WorkItemRepository::new(pool, kind),
        }
    }

    async fn load(&self, id: Uuid) -> Result<WorkItem, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(self.kind.label(), &id.to_string()))
    }

    fn ensure_involved(&self, user: &AuthenticatedUser, item: &WorkItem) -> Result<(), AppError> {
        if user.is_admin() || item.involves(user.id()) {
            Ok(())
        } else {
            Err(forbidden_error(
                "access item",
                "only the assignee, the creator or an administrator can access it",
            ))
        }
    }

    pub async fn list(&self, user: &AuthenticatedUser, filters: WorkItemFilters) -> Result<ApiResponse<Vec<WorkItem>>, AppError> {
        let visible_to = if user.is_admin() { None } else { Some(user.id()) };
        let items = self.repository.list(&filters, visible_to).await?;
        Ok(ApiResponse::success(items))
    }

    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<WorkItem>, AppError> {
        let item = self.load(id).await?;
        self.ensure_involved(user, &item)?;
        Ok(ApiResponse::success(item))
    }

    pub async fn create(&self, user: &AuthenticatedUser, request: CreateWorkItemRequest) -> Result<ApiResponse<WorkItem>, AppError> {
        request.validate()?;
        let item = self.repository.create(&request, user.id()).await?;
        tracing::info!("📅 {} '{}' created by {}", self.kind.label(), item.title, user.id());
        Ok(ApiResponse::success_with_message(item, format!("{} created", self.kind.label())))
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateWorkItemRequest,
    ) -> Result<ApiResponse<WorkItem>, AppError> {
        request.validate()?;
        let current = self.load(id).await?;
        self.ensure_involved(user, &current)?;

        let item = self.repository.update(current, request).await?;
        Ok(ApiResponse::success_with_message(item, format!("{} updated", self.kind.label())))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        let item = self.load(id).await?;
        if item.created_by != Some(user.id()) && !user.is_admin() {
            return Err(forbidden_error(
                "delete item",
                "only the creator or an administrator can delete it",
            ));
        }

        self.repository.delete(item.id).await?;
        Ok(ApiResponse::message(format!("{} deleted", self.kind.label())))
    }
}
