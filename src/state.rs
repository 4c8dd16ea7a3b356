//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. No contiene estado mutable en proceso.

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::{auth_admin_service::AuthAdminClient, storage_service::StorageClient};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub storage: StorageClient,
    pub auth_admin: AuthAdminClient,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> anyhow::Result<Self> {
        Ok(Self {
            jwt: JwtConfig::from(&config),
            storage: StorageClient::new(&config)?,
            auth_admin: AuthAdminClient::new(&config)?,
            pool,
            config,
        })
    }
}
