use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::vehicle::{NewVehicle, VehicleStatus};
use crate::utils::validation::{
    normalize_vin, validate_non_negative_amount, validate_not_empty, validate_positive_amount,
    validate_vin,
};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_vin")]
    pub vin: String,

    #[validate(range(min = 1900, max = 2100, message = "Year must be between 1900 and 2100"))]
    pub year: i32,

    #[validate(custom = "validate_not_empty")]
    pub make: String,

    #[validate(custom = "validate_not_empty")]
    pub model: String,

    pub trim: Option<String>,
    pub exterior_color: Option<String>,

    #[validate(range(min = 0, message = "Odometer cannot be negative"))]
    pub odometer: Option<i32>,

    pub status: Option<VehicleStatus>,
    pub title_status: Option<String>,
    pub location: Option<String>,
    pub lot_number: Option<String>,

    #[validate(custom = "validate_non_negative_amount")]
    pub bought_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub buy_fee: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub other_charges: Option<Decimal>,

    pub purchase_date: Option<NaiveDate>,
    pub seller_name: Option<String>,
}

impl CreateVehicleRequest {
    pub fn into_new_vehicle(self) -> NewVehicle {
        NewVehicle {
            vin: normalize_vin(&self.vin),
            year: self.year,
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            trim: self.trim,
            exterior_color: self.exterior_color,
            odometer: self.odometer,
            status: self.status.unwrap_or(VehicleStatus::Pending),
            title_status: self.title_status,
            location: self.location,
            lot_number: self.lot_number,
            bought_price: self.bought_price,
            buy_fee: self.buy_fee,
            other_charges: self.other_charges,
            purchase_date: self.purchase_date,
            seller_name: self.seller_name,
        }
    }
}

// Request para actualizar un vehículo (campos ausentes se conservan)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(range(min = 1900, max = 2100, message = "Year must be between 1900 and 2100"))]
    pub year: Option<i32>,
    #[validate(custom = "validate_not_empty")]
    pub make: Option<String>,
    #[validate(custom = "validate_not_empty")]
    pub model: Option<String>,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    #[validate(range(min = 0, message = "Odometer cannot be negative"))]
    pub odometer: Option<i32>,
    pub title_status: Option<String>,
    pub location: Option<String>,
    pub lot_number: Option<String>,
    #[validate(custom = "validate_non_negative_amount")]
    pub bought_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub buy_fee: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub other_charges: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub seller_name: Option<String>,
    pub buyer_name: Option<String>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request para actualizar estado del vehículo
#[derive(Debug, Deserialize)]
pub struct UpdateVehicleStatusRequest {
    pub status: VehicleStatus,
    pub note: Option<String>,
}

/// Request para registrar una venta
#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleRequest {
    #[validate(custom = "validate_not_empty")]
    pub buyer_name: String,
    #[validate(custom = "validate_positive_amount")]
    pub sale_invoice: Decimal,
    pub sale_date: NaiveDate,
}

/// Formato del archivo importado
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportFormat {
    Csv,
    Xlsx,
    PdfText,
}

/// Request de importación masiva
#[derive(Debug, Deserialize)]
pub struct ImportVehiclesRequest {
    pub file_name: Option<String>,
    pub format: ImportFormat,
    /// Texto para csv/pdf_text, base64 para xlsx
    pub content: String,
}

/// Resultado de la importación
#[derive(Debug, Serialize, PartialEq)]
pub struct ImportReport {
    pub success: bool,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(vin: &str) -> CreateVehicleRequest {
        serde_json::from_value(serde_json::json!({
            "vin": vin,
            "year": 2019,
            "make": "Honda",
            "model": "Accord",
            "bought_price": 12500
        }))
        .unwrap()
    }

    #[test]
    fn test_vin_must_have_17_characters() {
        assert!(request("1HGCM82633A004352").validate().is_ok());
        assert!(request("1HGCM82633A00435").validate().is_err());
        assert!(request("1HGCM82633A0043521").validate().is_err());
    }

    #[test]
    fn test_blank_make_is_rejected() {
        let mut req = request("1HGCM82633A004352");
        req.make = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut req = request("1HGCM82633A004352");
        req.bought_price = Some(Decimal::new(-1, 0));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_defaults_to_pending_and_normalizes_vin() {
        let vehicle = request("1hgcm82633a004352").into_new_vehicle();
        assert_eq!(vehicle.status, VehicleStatus::Pending);
        assert_eq!(vehicle.vin, "1HGCM82633A004352");
        assert_eq!(vehicle.bought_price, Some(Decimal::new(12500, 0)));
    }
}
