//! Conexión a PostgreSQL
//!
//! Este módulo abre el pool contra la base de datos gestionada y, si se pide,
//! aplica el schema de `migrations/`.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::{database::mask_database_url, database::DatabaseConfig, EnvironmentConfig};

/// Conexión a la base de datos
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Crear el pool y, si está configurado, ejecutar migraciones
    pub async fn new(config: &EnvironmentConfig) -> Result<Self> {
        let db_config = DatabaseConfig::from_environment(config);
        info!("🗄️ Conectando a {}", mask_database_url(&db_config.url));

        let pool = db_config
            .create_pool()
            .await
            .context("Error conectando a la base de datos")?;

        if config.run_migrations {
            run_migrations(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("📜 Aplicando migraciones");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Error aplicando migraciones")?;
    Ok(())
}

/// Verificar que la conexión funciona
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
