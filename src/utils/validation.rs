//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de inventario y montos. Las funciones que devuelven `ValidationError`
//! se usan como `#[validate(custom = "...")]` en los DTOs.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

/// Longitud exacta de un VIN
pub const VIN_LENGTH: usize = 17;

lazy_static! {
    /// Caracteres permitidos en un VIN (sin I, O, Q)
    static ref VIN_CHARSET: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]+$").expect("valid VIN regex");
}

/// Normalizar un VIN: sin espacios y en mayúsculas
pub fn normalize_vin(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Validar formato de VIN (17 caracteres)
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    let vin = normalize_vin(value);
    if vin.chars().count() != VIN_LENGTH {
        let mut error = ValidationError::new("vin_length");
        error.message = Some("VIN must be exactly 17 characters".into());
        error.add_param("actual".into(), &vin.chars().count());
        return Err(error);
    }
    if !VIN_CHARSET.is_match(&vin) {
        let mut error = ValidationError::new("vin_charset");
        error.message = Some("VIN contains invalid characters".into());
        error.add_param("value".into(), &vin);
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.message = Some("Value cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.message = Some("Value must be greater than zero".into());
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.message = Some("Value cannot be negative".into());
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Versión para `#[validate(custom)]` sobre montos
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

/// Versión para `#[validate(custom)]` sobre costos
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

/// Redondear dinero a dos decimales
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1HGCM82633A004352").is_ok());
        assert!(validate_vin(" 1hgcm82633a004352 ").is_ok());
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A0043521").is_err());
        assert!(validate_vin("1HGCM82633A00435O").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(Decimal::new(500, 0)).is_ok());
        assert!(validate_positive(Decimal::ZERO).is_err());
        assert!(validate_positive(Decimal::new(-5, 0)).is_err());
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(123456, 3)), Decimal::new(12346, 2));
    }
}
