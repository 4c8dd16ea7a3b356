use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{bad_request_error, AppResult};

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Agrupación temporal de los reportes
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Week,
    Month,
}

// Query de rango de fechas compartida por los reportes
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub group_by: GroupBy,
}

impl DateRangeQuery {
    /// Rango efectivo: por defecto desde el 1 de enero del año actual hasta hoy
    pub fn resolve(&self) -> AppResult<(NaiveDate, NaiveDate)> {
        let today = Utc::now().date_naive();
        let start = self
            .start_date
            .or_else(|| NaiveDate::from_ymd_opt(today.year(), 1, 1))
            .unwrap_or(today);
        let end = self.end_date.unwrap_or(today);
        if start > end {
            return Err(bad_request_error("start_date must be before end_date"));
        }
        Ok((start, end))
    }
}

// Paginación simple
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_rejects_inverted_range() {
        let query = DateRangeQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            group_by: GroupBy::Week,
        };
        assert!(query.resolve().is_err());
    }

    #[test]
    fn test_pagination_is_clamped() {
        let p = Pagination { limit: Some(10_000), offset: Some(-3) };
        assert_eq!(p.limit(), 500);
        assert_eq!(p.offset(), 0);
    }
}
