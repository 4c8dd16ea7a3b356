use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::user_dto::UpdateDropdownRequest;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::audit::DropdownSetting;
use crate::repositories::AuditRepository;
use crate::utils::errors::{bad_request_error, AppError};

/// Opciones recortadas, sin vacías ni duplicadas, en el orden recibido
pub fn normalize_options(options: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(options.len());
    for option in options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
        if !normalized.iter().any(|existing| existing == option) {
            normalized.push(option.to_string());
        }
    }
    normalized
}

pub struct SettingsController {
    repository: AuditRepository,
}

impl SettingsController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool),
        }
    }

    pub async fn dropdowns(&self, category: Option<&str>) -> Result<ApiResponse<Vec<DropdownSetting>>, AppError> {
        let settings = self.repository.dropdowns(category).await?;
        Ok(ApiResponse::success(settings))
    }

    pub async fn update_dropdown(
        &self,
        user: &AuthenticatedUser,
        category: &str,
        request: UpdateDropdownRequest,
    ) -> Result<ApiResponse<DropdownSetting>, AppError> {
        user.require_admin()?;
        request.validate()?;

        let category = category.trim();
        if category.is_empty() {
            return Err(bad_request_error("Category cannot be empty"));
        }

        let options = normalize_options(&request.options);
        let setting = self.repository.upsert_dropdown(category, &options, user.id()).await?;
        self.repository
            .record(
                user.id(),
                "settings.update_dropdown",
                "dropdown_settings",
                None,
                json!({ "category": category, "options": options.len() }),
            )
            .await?;

        Ok(ApiResponse::success_with_message(setting, "Dropdown options saved"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_are_trimmed_and_deduplicated() {
        let raw = vec![
            " Copart ".to_string(),
            "".to_string(),
            "IAA".to_string(),
            "Copart".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_options(&raw), vec!["Copart".to_string(), "IAA".to_string()]);
    }
}
