use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

// Resumen de ventas por periodo
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesPeriodSummary {
    pub period: String,
    pub vehicle_count: usize,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub average_profit: Decimal,
}

// Ganancia por vehículo vendido
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarProfit {
    pub vehicle_id: Uuid,
    pub vin: String,
    pub description: String,
    pub sale_date: Option<NaiveDate>,
    pub revenue: Decimal,
    pub purchase_cost: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
    pub margin_percent: Option<Decimal>,
}

// Resumen de arbitrajes por periodo
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationPeriodSummary {
    pub period: String,
    pub total: usize,
    pub pending: usize,
    pub denied: usize,
    pub price_adjustments: usize,
    pub buyer_withdrew: usize,
    pub withdrawn: usize,
    pub total_adjustments: Decimal,
    pub average_adjustment: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationReport {
    pub totals: ArbitrationPeriodSummary,
    pub periods: Vec<ArbitrationPeriodSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MissingTitleVehicle {
    pub vehicle_id: Uuid,
    pub vin: String,
    pub description: String,
    pub status: String,
    pub title_status: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub days_missing: Option<i64>,
    pub seller_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MissingTitleGroup {
    pub period: String,
    pub count: usize,
    pub vehicles: Vec<MissingTitleVehicle>,
}

// Resumen general del dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status_counts: BTreeMap<String, usize>,
    pub inventory_count: usize,
    pub inventory_value: Decimal,
    pub sold_count: usize,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub total_expenses: Decimal,
    pub pending_arbs: usize,
}
