//! Modelo de registros de arbitraje (ARB)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de ARB
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArbType {
    #[serde(rename = "Sold ARB")]
    SoldArb,
    #[serde(rename = "Inventory ARB")]
    InventoryArb,
}

impl ArbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArbType::SoldArb => "Sold ARB",
            ArbType::InventoryArb => "Inventory ARB",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Sold ARB" => Some(ArbType::SoldArb),
            "Inventory ARB" => Some(ArbType::InventoryArb),
            _ => None,
        }
    }
}

/// Resultado de un ARB
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArbOutcome {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Denied")]
    Denied,
    #[serde(rename = "Price Adjustment")]
    PriceAdjustment,
    #[serde(rename = "Buyer Withdrew")]
    BuyerWithdrew,
    #[serde(rename = "Withdrawn")]
    Withdrawn,
}

impl ArbOutcome {
    pub const ALL: [ArbOutcome; 5] = [
        ArbOutcome::Pending,
        ArbOutcome::Denied,
        ArbOutcome::PriceAdjustment,
        ArbOutcome::BuyerWithdrew,
        ArbOutcome::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArbOutcome::Pending => "Pending",
            ArbOutcome::Denied => "Denied",
            ArbOutcome::PriceAdjustment => "Price Adjustment",
            ArbOutcome::BuyerWithdrew => "Buyer Withdrew",
            ArbOutcome::Withdrawn => "Withdrawn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|outcome| outcome.as_str() == s)
    }
}

/// Fila de `vehicle_arb_records`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArbRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub arb_type: String,
    pub outcome: String,
    pub reason: Option<String>,
    pub adjustment_amount: Option<Decimal>,
    pub transport_cost: Option<Decimal>,
    pub transport_company: Option<String>,
    pub initiated_by: Option<Uuid>,
    pub resolved_by: Option<Uuid>,
    pub initiated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl ArbRecord {
    pub fn arb_type(&self) -> Option<ArbType> {
        ArbType::from_str(&self.arb_type)
    }

    pub fn outcome(&self) -> Option<ArbOutcome> {
        ArbOutcome::from_str(&self.outcome)
    }
}
