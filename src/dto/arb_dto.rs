use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    arb::{ArbOutcome, ArbRecord, ArbType},
    vehicle::Vehicle,
    vehicle_records::Expense,
};

// Request para abrir un ARB
#[derive(Debug, Deserialize)]
pub struct InitiateArbRequest {
    pub arb_type: ArbType,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

// Request para resolver el ARB pendiente
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveArbRequest {
    pub arb_type: Option<ArbType>,
    pub outcome: Option<ArbOutcome>,
    pub adjustment_amount: Option<Decimal>,
    pub transport_cost: Option<Decimal>,
    pub transport_company: Option<String>,
    pub notes: Option<String>,
}

// Response de apertura de ARB
#[derive(Debug, Serialize)]
pub struct ArbInitiatedResponse {
    pub record: ArbRecord,
    pub vehicle: Vehicle,
}

// Response de resolución de ARB
#[derive(Debug, Serialize)]
pub struct ArbResolvedResponse {
    pub record: ArbRecord,
    pub vehicle: Vehicle,
    pub expense: Option<Expense>,
}
