//! Utilidades JWT
//!
//! Los access tokens los emite el proveedor de auth (HS256 firmado con el
//! JWT secret del proyecto). Aquí se validan, y se acuñan tokens de
//! impersonación con el mismo secreto.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::environment::EnvironmentConfig, utils::errors::AppError};

/// Audiencia de los tokens de usuarios autenticados
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims del access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<String>,
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.impersonation_token_ttl,
        }
    }
}

/// Generar un token de impersonación para `user_id`
pub fn generate_impersonation_token(
    user_id: Uuid,
    email: Option<String>,
    impersonator_id: Uuid,
    config: &JwtConfig,
) -> Result<(String, chrono::DateTime<chrono::Utc>), AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.expiration as i64);

    let claims = JwtClaims {
        sub: user_id.to_string(),
        email,
        role: Some(AUTHENTICATED_AUDIENCE.to_string()),
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
        impersonated_by: Some(impersonator_id.to_string()),
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());

    let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))?;
    Ok((token, expires_at))
}

/// Verificar y decodificar JWT token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
        .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must start with 'Bearer '".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token cannot be empty".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "super-secret-jwt-token-with-at-least-32-characters".to_string(),
            expiration: 900,
        }
    }

    #[test]
    fn test_impersonation_token_roundtrip_keeps_impersonator() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let (token, _) =
            generate_impersonation_token(user_id, Some("seller@example.com".into()), admin_id, &config)
                .unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.impersonated_by, Some(admin_id.to_string()));
        assert_eq!(claims.aud, AUTHENTICATED_AUDIENCE);
    }

    #[test]
    fn test_token_with_wrong_secret_is_rejected() {
        let config = test_config();
        let (token, _) =
            generate_impersonation_token(Uuid::new_v4(), None, Uuid::new_v4(), &config).unwrap();

        let other = JwtConfig {
            secret: "another-secret-another-secret-another-secret".to_string(),
            expiration: 900,
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_token_from_header("Basic abc").is_err());
        assert!(extract_token_from_header("Bearer ").is_err());
    }
}
