//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y su ciclo de estados.
//! Mapea exactamente a la tabla `vehicles`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado del vehículo tal como se persiste en `vehicles.status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Sold")]
    Sold,
    #[serde(rename = "ARB")]
    Arb,
    #[serde(rename = "Pending Arbitration")]
    PendingArbitration,
    #[serde(rename = "Withdrew")]
    Withdrew,
    #[serde(rename = "Complete")]
    Complete,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 7] = [
        VehicleStatus::Pending,
        VehicleStatus::InProgress,
        VehicleStatus::Sold,
        VehicleStatus::Arb,
        VehicleStatus::PendingArbitration,
        VehicleStatus::Withdrew,
        VehicleStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Pending => "Pending",
            VehicleStatus::InProgress => "In Progress",
            VehicleStatus::Sold => "Sold",
            VehicleStatus::Arb => "ARB",
            VehicleStatus::PendingArbitration => "Pending Arbitration",
            VehicleStatus::Withdrew => "Withdrew",
            VehicleStatus::Complete => "Complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.as_str() == s)
    }

    /// Estados que cuentan como inventario sin vender
    pub fn is_unsold(&self) -> bool {
        matches!(self, VehicleStatus::Pending | VehicleStatus::InProgress)
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub odometer: Option<i32>,
    pub status: String,
    pub title_status: Option<String>,
    pub location: Option<String>,
    pub lot_number: Option<String>,
    pub bought_price: Option<Decimal>,
    pub buy_fee: Option<Decimal>,
    pub other_charges: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub seller_name: Option<String>,
    pub buyer_name: Option<String>,
    pub sale_invoice: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Estado tipado; `None` si la fila tiene un valor desconocido
    pub fn status(&self) -> Option<VehicleStatus> {
        VehicleStatus::from_str(&self.status)
    }

    /// Costo de compra: precio + fee + otros cargos (faltantes = 0)
    pub fn purchase_cost(&self) -> Decimal {
        self.bought_price.unwrap_or_default()
            + self.buy_fee.unwrap_or_default()
            + self.other_charges.unwrap_or_default()
    }

    /// "2019 Honda Accord"
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// Datos validados para insertar un vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub odometer: Option<i32>,
    pub status: VehicleStatus,
    pub title_status: Option<String>,
    pub location: Option<String>,
    pub lot_number: Option<String>,
    pub bought_price: Option<Decimal>,
    pub buy_fee: Option<Decimal>,
    pub other_charges: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub seller_name: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn vehicle(status: VehicleStatus) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            vin: "1HGCM82633A004352".to_string(),
            year: 2019,
            make: "Honda".to_string(),
            model: "Accord".to_string(),
            trim: None,
            exterior_color: None,
            odometer: Some(42_000),
            status: status.as_str().to_string(),
            title_status: Some("Present".to_string()),
            location: None,
            lot_number: None,
            bought_price: Some(Decimal::new(300, 0)),
            buy_fee: None,
            other_charges: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            seller_name: None,
            buyer_name: None,
            sale_invoice: None,
            sale_date: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_strings() {
        for status in VehicleStatus::ALL {
            assert_eq!(VehicleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(VehicleStatus::from_str("pending"), None);
    }

    #[test]
    fn test_status_serde_uses_display_names() {
        let json = serde_json::to_string(&VehicleStatus::PendingArbitration).unwrap();
        assert_eq!(json, "\"Pending Arbitration\"");
        let parsed: VehicleStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(parsed, VehicleStatus::InProgress);
    }

    #[test]
    fn test_purchase_cost_treats_missing_as_zero() {
        let mut vehicle = fixtures::vehicle(VehicleStatus::Pending);
        vehicle.buy_fee = Some(Decimal::new(150, 0));
        assert_eq!(vehicle.purchase_cost(), Decimal::new(450, 0));
    }
}
