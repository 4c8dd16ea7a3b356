//! Cliente de object storage
//!
//! Sube imágenes y documentos de vehículos al storage del proveedor
//! gestionado y construye sus URLs públicas.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::vehicle_records::UploadKind;
use crate::utils::errors::AppError;

#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
    images_bucket: String,
    documents_bucket: String,
    max_upload_bytes: usize,
}

/// Archivo ya subido
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub public_url: String,
}

impl StorageClient {
    pub fn new(config: &EnvironmentConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
            images_bucket: config.images_bucket.clone(),
            documents_bucket: config.documents_bucket.clone(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn bucket_for(&self, kind: UploadKind) -> &str {
        match kind {
            UploadKind::Image => &self.images_bucket,
            UploadKind::Document => &self.documents_bucket,
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    /// Decodifica el contenido base64 y verifica el tamaño máximo
    pub fn decode_payload(&self, data_base64: &str) -> Result<Vec<u8>, AppError> {
        // Acepta data URLs ("data:image/png;base64,....")
        let raw = data_base64
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or(data_base64)
            .trim();

        let bytes = STANDARD
            .decode(raw)
            .map_err(|_| AppError::BadRequest("File content is not valid base64".to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds the maximum size of {} bytes",
                self.max_upload_bytes
            )));
        }
        Ok(bytes)
    }

    pub async fn upload(
        &self,
        kind: UploadKind,
        vehicle_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, AppError> {
        let bucket = self.bucket_for(kind).to_string();
        let path = object_path(vehicle_id, file_name, Utc::now().timestamp_millis());
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);

        tracing::info!("📤 Uploading {} ({} bytes) to bucket {}", path, bytes.len(), bucket);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.service_key)
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Storage request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("❌ Storage upload failed with status {}: {}", status, error_text);
            return Err(AppError::ExternalApi(format!("Storage upload failed: {}", status)));
        }

        Ok(StoredObject {
            public_url: self.public_url(&bucket, &path),
            path,
        })
    }

    /// Si `result` es un error, borra el objeto recién subido y devuelve el
    /// error tal cual
    pub async fn remove_on_error<T>(
        &self,
        kind: UploadKind,
        path: &str,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if result.is_err() {
            tracing::warn!("🧹 File record was not saved, removing {}", path);
            self.remove(kind, path).await;
        }
        result
    }

    /// Borra el objeto; un fallo sólo se registra
    pub async fn remove(&self, kind: UploadKind, path: &str) {
        let bucket = self.bucket_for(kind);
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);

        match self
            .client
            .delete(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!("🗑️ Removed {} from bucket {}", path, bucket);
            }
            Ok(response) => {
                tracing::warn!("⚠️ Storage delete for {} returned {}", path, response.status());
            }
            Err(e) => tracing::warn!("⚠️ Storage delete for {} failed: {}", path, e),
        }
    }
}

/// `<vehicle_id>/<timestamp>-<nombre saneado>`
pub fn object_path(vehicle_id: Uuid, file_name: &str, timestamp: i64) -> String {
    let sanitized: String = file_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let sanitized = if sanitized.is_empty() { "file".to_string() } else { sanitized };

    format!("{}/{}-{}", vehicle_id, timestamp, urlencoding::encode(&sanitized))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StorageClient {
        StorageClient::new(&EnvironmentConfig::for_tests()).unwrap()
    }

    #[test]
    fn test_object_path_is_sanitized() {
        let id = Uuid::nil();
        assert_eq!(
            object_path(id, "front view (1).jpg", 42),
            format!("{}/42-front_view__1_.jpg", id)
        );
    }

    #[test]
    fn test_public_url_uses_bucket() {
        let storage = client();
        assert_eq!(
            storage.public_url("vehicle-images", "a/b.jpg"),
            "http://localhost:54321/storage/v1/object/public/vehicle-images/a/b.jpg"
        );
        assert_eq!(storage.bucket_for(UploadKind::Document), "vehicle-documents");
    }

    #[test]
    fn test_decode_payload_accepts_data_urls() {
        let storage = client();
        let bytes = storage.decode_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert!(storage.decode_payload("%%%").is_err());
        assert!(storage.decode_payload("").is_err());
    }

    #[tokio::test]
    async fn test_remove_on_error_deletes_uploaded_object() {
        use axum::{extract::{Path, State}, routing::delete, Router};
        use std::sync::{Arc, Mutex};

        let removed: Arc<Mutex<Vec<String>>> = Arc::default();
        let app = Router::new()
            .route(
                "/storage/v1/object/:bucket/*path",
                delete(
                    |State(removed): State<Arc<Mutex<Vec<String>>>>,
                     Path((bucket, path)): Path<(String, String)>| async move {
                        removed.lock().unwrap().push(format!("{}/{}", bucket, path));
                    },
                ),
            )
            .with_state(removed.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = EnvironmentConfig::for_tests();
        config.supabase_url = format!("http://{}", addr);
        let storage = StorageClient::new(&config).unwrap();

        let kept = storage
            .remove_on_error(UploadKind::Image, "v1/1-kept.jpg", Ok(7))
            .await
            .unwrap();
        assert_eq!(kept, 7);

        let failed: Result<(), AppError> = storage
            .remove_on_error(
                UploadKind::Image,
                "v1/2-front.jpg",
                Err(AppError::Internal("insert failed".to_string())),
            )
            .await;
        assert!(matches!(failed, Err(AppError::Internal(_))));
        assert_eq!(*removed.lock().unwrap(), vec!["vehicle-images/v1/2-front.jpg".to_string()]);
    }

    #[test]
    fn test_decode_payload_enforces_size_limit() {
        let storage = client();
        let big = STANDARD.encode(vec![0u8; 1024 * 1024 + 1]);
        assert!(storage.decode_payload(&big).is_err());
    }
}
