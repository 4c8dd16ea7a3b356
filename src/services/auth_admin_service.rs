//! Cliente del API admin del proveedor de auth
//!
//! Las contraseñas viven en el proveedor; aquí sólo se delega el reset.

use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::utils::errors::AppError;

pub const GENERATED_PASSWORD_LENGTH: usize = 12;

#[derive(Clone)]
pub struct AuthAdminClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl AuthAdminClient {
    pub fn new(config: &EnvironmentConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_role_key.clone(),
        })
    }

    pub async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), AppError> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);
        tracing::info!("🔑 Resetting password for user {}", user_id);

        let response = self
            .client
            .put(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "password": password }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Auth admin request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("❌ Password reset failed with status {}: {}", status, error_text);
            return Err(AppError::ExternalApi(format!("Password reset failed: {}", status)));
        }
        Ok(())
    }
}

/// Contraseña temporal alfanumérica
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }
}
