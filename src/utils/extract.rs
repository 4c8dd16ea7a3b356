//! Extractores propios
//!
//! `JsonBody` reemplaza a `axum::Json` en los handlers: un cuerpo ausente,
//! mal formado o con campos inválidos responde 400 con el envelope
//! `{ error, code }` en lugar del 422 en texto plano de axum.

use axum::extract::FromRequest;

use crate::utils::errors::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
