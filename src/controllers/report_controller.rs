use sqlx::PgPool;

use crate::dto::common::{ApiResponse, DateRangeQuery};
use crate::dto::report_dto::{ArbitrationReport, CarProfit, MissingTitleGroup, SalesPeriodSummary, SummaryReport};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::report_service::ReportService;
use crate::utils::errors::AppError;

pub struct ReportController {
    service: ReportService,
}

impl ReportController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: ReportService::new(pool),
        }
    }

    pub async fn sales(&self, user: &AuthenticatedUser, query: DateRangeQuery) -> Result<ApiResponse<Vec<SalesPeriodSummary>>, AppError> {
        user.require("reports.view")?;
        let (start, end) = query.resolve()?;
        Ok(ApiResponse::success(self.service.sales(start, end, query.group_by).await?))
    }

    pub async fn profit_per_car(&self, user: &AuthenticatedUser, query: DateRangeQuery) -> Result<ApiResponse<Vec<CarProfit>>, AppError> {
        user.require("reports.view")?;
        let (start, end) = query.resolve()?;
        Ok(ApiResponse::success(self.service.profit_per_car(start, end).await?))
    }

    pub async fn arbitration(&self, user: &AuthenticatedUser, query: DateRangeQuery) -> Result<ApiResponse<ArbitrationReport>, AppError> {
        user.require("reports.view")?;
        let (start, end) = query.resolve()?;
        Ok(ApiResponse::success(self.service.arbitration(start, end, query.group_by).await?))
    }

    pub async fn missing_titles(&self, user: &AuthenticatedUser, query: DateRangeQuery) -> Result<ApiResponse<Vec<MissingTitleGroup>>, AppError> {
        user.require("reports.view")?;
        let (start, end) = query.resolve()?;
        Ok(ApiResponse::success(self.service.missing_titles(start, end, query.group_by).await?))
    }

    pub async fn summary(&self, user: &AuthenticatedUser, query: DateRangeQuery) -> Result<ApiResponse<SummaryReport>, AppError> {
        user.require("reports.view")?;
        let (start, end) = query.resolve()?;
        Ok(ApiResponse::success(self.service.summary(start, end).await?))
    }
}
