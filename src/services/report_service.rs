//! Agregadores de reportes
//!
//! Este módulo agrupa filas ya leídas por semana ISO (`YYYY-Www`) o por mes
//! (`YYYY-MM`) y calcula los totales de cada grupo. Las funciones de
//! agregación son puras; `ReportService` sólo lee las filas y delega.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::GroupBy;
use crate::dto::report_dto::{
    ArbitrationPeriodSummary, ArbitrationReport, CarProfit, MissingTitleGroup, MissingTitleVehicle,
    SalesPeriodSummary, SummaryReport,
};
use crate::models::{
    arb::{ArbOutcome, ArbRecord},
    vehicle::{Vehicle, VehicleStatus},
    vehicle_records::Expense,
};
use crate::repositories::{ReportRepository, VehicleRecordsRepository};
use crate::utils::{errors::AppError, validation::round_money};

/// Clave usada para vehículos sin fecha de compra
pub const UNKNOWN_PERIOD: &str = "unknown";

/// Clave del periodo al que pertenece `date`
pub fn period_key(date: NaiveDate, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        GroupBy::Month => format!("{}-{:02}", date.year(), date.month()),
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        round_money(total / Decimal::from(count as u64))
    }
}

/// Ventas agrupadas por periodo de `sale_date`
pub fn sales_by_period(vehicles: &[Vehicle], group_by: GroupBy) -> Vec<SalesPeriodSummary> {
    let mut groups: BTreeMap<String, (usize, Decimal, Decimal)> = BTreeMap::new();

    for vehicle in vehicles {
        let Some(sale_date) = vehicle.sale_date else {
            continue;
        };
        let entry = groups
            .entry(period_key(sale_date, group_by))
            .or_insert((0, Decimal::ZERO, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += vehicle.sale_invoice.unwrap_or_default();
        entry.2 += vehicle.purchase_cost();
    }

    groups
        .into_iter()
        .map(|(period, (count, revenue, cost))| {
            let profit = revenue - cost;
            SalesPeriodSummary {
                period,
                vehicle_count: count,
                total_revenue: round_money(revenue),
                total_cost: round_money(cost),
                total_profit: round_money(profit),
                average_profit: average(profit, count),
            }
        })
        .collect()
}

/// Ganancia neta por vehículo vendido, ordenada por fecha de venta
pub fn profit_per_car(vehicles: &[Vehicle], expenses: &[Expense]) -> Vec<CarProfit> {
    let mut expense_totals: HashMap<Uuid, Decimal> = HashMap::new();
    for expense in expenses {
        *expense_totals.entry(expense.vehicle_id).or_default() += expense.cost;
    }

    let mut rows: Vec<CarProfit> = vehicles
        .iter()
        .map(|vehicle| {
            let revenue = vehicle.sale_invoice.unwrap_or_default();
            let purchase_cost = vehicle.purchase_cost();
            let expenses = expense_totals.get(&vehicle.id).copied().unwrap_or_default();
            let net_profit = revenue - purchase_cost - expenses;
            let margin_percent = (revenue > Decimal::ZERO)
                .then(|| round_money(net_profit / revenue * Decimal::ONE_HUNDRED));

            CarProfit {
                vehicle_id: vehicle.id,
                vin: vehicle.vin.clone(),
                description: vehicle.display_name(),
                sale_date: vehicle.sale_date,
                revenue: round_money(revenue),
                purchase_cost: round_money(purchase_cost),
                expenses: round_money(expenses),
                net_profit: round_money(net_profit),
                margin_percent,
            }
        })
        .collect();

    rows.sort_by_key(|row| row.sale_date);
    rows
}

fn count_arb(summary: &mut ArbitrationPeriodSummary, record: &ArbRecord) {
    summary.total += 1;
    match record.outcome() {
        Some(ArbOutcome::Pending) => summary.pending += 1,
        Some(ArbOutcome::Denied) => summary.denied += 1,
        Some(ArbOutcome::PriceAdjustment) => {
            summary.price_adjustments += 1;
            summary.total_adjustments += record.adjustment_amount.unwrap_or_default();
        }
        Some(ArbOutcome::BuyerWithdrew) => summary.buyer_withdrew += 1,
        Some(ArbOutcome::Withdrawn) => summary.withdrawn += 1,
        None => {}
    }
}

fn finish_arb(mut summary: ArbitrationPeriodSummary) -> ArbitrationPeriodSummary {
    summary.total_adjustments = round_money(summary.total_adjustments);
    summary.average_adjustment = average(summary.total_adjustments, summary.price_adjustments);
    summary
}

/// Arbitrajes agrupados por periodo de apertura
pub fn arbitration_report(records: &[ArbRecord], group_by: GroupBy) -> ArbitrationReport {
    let mut totals = ArbitrationPeriodSummary {
        period: "total".to_string(),
        ..Default::default()
    };
    let mut groups: BTreeMap<String, ArbitrationPeriodSummary> = BTreeMap::new();

    for record in records {
        let period = period_key(record.initiated_at.date_naive(), group_by);
        let summary = groups.entry(period.clone()).or_insert_with(|| ArbitrationPeriodSummary {
            period,
            ..Default::default()
        });
        count_arb(summary, record);
        count_arb(&mut totals, record);
    }

    ArbitrationReport {
        totals: finish_arb(totals),
        periods: groups.into_values().map(finish_arb).collect(),
    }
}

/// Título faltante: NULL, vacío o "Absent"
pub fn is_title_missing(title_status: Option<&str>) -> bool {
    match title_status.map(str::trim) {
        None | Some("") => true,
        Some(status) => status.eq_ignore_ascii_case("absent"),
    }
}

/// Vehículos sin título comprados en `[start, end]` (o sin fecha de compra),
/// agrupados por periodo de compra
pub fn missing_titles(
    vehicles: &[Vehicle],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    group_by: GroupBy,
) -> Vec<MissingTitleGroup> {
    let mut groups: BTreeMap<String, Vec<MissingTitleVehicle>> = BTreeMap::new();

    for vehicle in vehicles {
        if vehicle.status() == Some(VehicleStatus::Withdrew) || !is_title_missing(vehicle.title_status.as_deref()) {
            continue;
        }
        if vehicle.purchase_date.map_or(false, |date| date < start || date > end) {
            continue;
        }

        let period = vehicle
            .purchase_date
            .map(|date| period_key(date, group_by))
            .unwrap_or_else(|| UNKNOWN_PERIOD.to_string());

        groups.entry(period).or_default().push(MissingTitleVehicle {
            vehicle_id: vehicle.id,
            vin: vehicle.vin.clone(),
            description: vehicle.display_name(),
            status: vehicle.status.clone(),
            title_status: vehicle.title_status.clone(),
            purchase_date: vehicle.purchase_date,
            days_missing: vehicle.purchase_date.map(|date| (today - date).num_days().max(0)),
            seller_name: vehicle.seller_name.clone(),
        });
    }

    groups
        .into_iter()
        .map(|(period, vehicles)| MissingTitleGroup {
            period,
            count: vehicles.len(),
            vehicles,
        })
        .collect()
}

/// Resumen general: inventario actual + ventas y gastos del rango
pub fn summary(
    all_vehicles: &[Vehicle],
    sold_in_range: &[Vehicle],
    expenses_in_range: &[Expense],
    pending_arbs: usize,
    start: NaiveDate,
    end: NaiveDate,
) -> SummaryReport {
    let mut status_counts: BTreeMap<String, usize> = VehicleStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    let mut inventory_count = 0;
    let mut inventory_value = Decimal::ZERO;

    for vehicle in all_vehicles {
        *status_counts.entry(vehicle.status.clone()).or_insert(0) += 1;
        if vehicle.status().map_or(false, |s| s.is_unsold()) {
            inventory_count += 1;
            inventory_value += vehicle.bought_price.unwrap_or_default();
        }
    }

    let total_revenue: Decimal = sold_in_range.iter().map(|v| v.sale_invoice.unwrap_or_default()).sum();
    let total_cost: Decimal = sold_in_range.iter().map(Vehicle::purchase_cost).sum();
    let total_expenses: Decimal = expenses_in_range.iter().map(|e| e.cost).sum();

    SummaryReport {
        start_date: start,
        end_date: end,
        status_counts,
        inventory_count,
        inventory_value: round_money(inventory_value),
        sold_count: sold_in_range.len(),
        total_revenue: round_money(total_revenue),
        total_profit: round_money(total_revenue - total_cost),
        total_expenses: round_money(total_expenses),
        pending_arbs,
    }
}

pub struct ReportService {
    reports: ReportRepository,
    records: VehicleRecordsRepository,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            reports: ReportRepository::new(pool.clone()),
            records: VehicleRecordsRepository::new(pool),
        }
    }

    pub async fn sales(&self, start: NaiveDate, end: NaiveDate, group_by: GroupBy) -> Result<Vec<SalesPeriodSummary>, AppError> {
        let sold = self.reports.sold_between(start, end).await?;
        Ok(sales_by_period(&sold, group_by))
    }

    pub async fn profit_per_car(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CarProfit>, AppError> {
        let sold = self.reports.sold_between(start, end).await?;
        let ids: Vec<Uuid> = sold.iter().map(|v| v.id).collect();
        let expenses = self.records.expenses_for_vehicles(&ids).await?;
        Ok(profit_per_car(&sold, &expenses))
    }

    pub async fn arbitration(&self, start: NaiveDate, end: NaiveDate, group_by: GroupBy) -> Result<ArbitrationReport, AppError> {
        let records = self.reports.arb_initiated_between(start, end).await?;
        Ok(arbitration_report(&records, group_by))
    }

    pub async fn missing_titles(&self, start: NaiveDate, end: NaiveDate, group_by: GroupBy) -> Result<Vec<MissingTitleGroup>, AppError> {
        let vehicles = self.reports.missing_titles(start, end).await?;
        Ok(missing_titles(&vehicles, start, end, Utc::now().date_naive(), group_by))
    }

    pub async fn summary(&self, start: NaiveDate, end: NaiveDate) -> Result<SummaryReport, AppError> {
        let (all, sold, expenses, pending) = futures::try_join!(
            self.reports.all_vehicles(),
            self.reports.sold_between(start, end),
            self.records.expenses_between(start, end),
            self.reports.pending_arb_count(),
        )?;
        Ok(summary(&all, &sold, &expenses, pending.max(0) as usize, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::fixtures::vehicle;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sold(sale_date: NaiveDate, invoice: i64, bought: i64) -> Vehicle {
        let mut v = vehicle(VehicleStatus::Sold);
        v.id = Uuid::new_v4();
        v.sale_date = Some(sale_date);
        v.sale_invoice = Some(Decimal::new(invoice, 0));
        v.bought_price = Some(Decimal::new(bought, 0));
        v.buy_fee = None;
        v.other_charges = None;
        v
    }

    fn arb(outcome: ArbOutcome, amount: Option<i64>, initiated: NaiveDate) -> ArbRecord {
        ArbRecord {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            arb_type: "Sold ARB".to_string(),
            outcome: outcome.as_str().to_string(),
            reason: None,
            adjustment_amount: amount.map(|a| Decimal::new(a, 0)),
            transport_cost: None,
            transport_company: None,
            initiated_by: None,
            resolved_by: None,
            initiated_at: Utc.from_utc_datetime(&initiated.and_hms_opt(12, 0, 0).unwrap()),
            resolved_at: None,
            notes: None,
        }
    }

    #[test]
    fn test_period_keys() {
        assert_eq!(period_key(date(2024, 1, 2), GroupBy::Week), "2024-W01");
        assert_eq!(period_key(date(2024, 1, 9), GroupBy::Week), "2024-W02");
        // 2021-01-01 pertenece a la semana 53 de 2020
        assert_eq!(period_key(date(2021, 1, 1), GroupBy::Week), "2020-W53");
        assert_eq!(period_key(date(2024, 3, 15), GroupBy::Month), "2024-03");
    }

    #[test]
    fn test_weekly_sales_two_groups() {
        let vehicles = vec![
            sold(date(2024, 1, 2), 1400, 1000),
            sold(date(2024, 1, 9), 2800, 2000),
        ];
        let groups = sales_by_period(&vehicles, GroupBy::Week);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].period, "2024-W01");
        assert_eq!(groups[0].vehicle_count, 1);
        assert_eq!(groups[0].total_profit, Decimal::new(400, 0));
        assert_eq!(groups[1].period, "2024-W02");
        assert_eq!(groups[1].vehicle_count, 1);
        assert_eq!(groups[1].total_profit, Decimal::new(800, 0));
    }

    #[test]
    fn test_sales_cost_includes_fees() {
        let mut v = sold(date(2024, 5, 6), 1000, 500);
        v.buy_fee = Some(Decimal::new(50, 0));
        v.other_charges = Some(Decimal::new(25, 0));
        let v2 = sold(date(2024, 5, 20), 900, 900);

        let groups = sales_by_period(&[v, v2], GroupBy::Month);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_cost, Decimal::new(1475, 0));
        assert_eq!(groups[0].total_profit, Decimal::new(425, 0));
        assert_eq!(groups[0].average_profit, Decimal::new(21250, 2));
    }

    #[test]
    fn test_profit_per_car_subtracts_expenses() {
        let v = sold(date(2024, 2, 1), 2000, 1000);
        let expense = Expense {
            id: Uuid::new_v4(),
            vehicle_id: v.id,
            description: "Detail".to_string(),
            expense_date: date(2024, 1, 20),
            cost: Decimal::new(200, 0),
            notes: None,
            created_by: None,
            created_at: Utc::now(),
        };
        let rows = profit_per_car(&[v], &[expense]);

        assert_eq!(rows[0].net_profit, Decimal::new(800, 0));
        assert_eq!(rows[0].margin_percent, Some(Decimal::new(40, 0)));
    }

    #[test]
    fn test_arbitration_counts_and_averages() {
        let records = vec![
            arb(ArbOutcome::PriceAdjustment, Some(300), date(2024, 1, 2)),
            arb(ArbOutcome::PriceAdjustment, Some(100), date(2024, 1, 3)),
            arb(ArbOutcome::Pending, None, date(2024, 1, 10)),
            arb(ArbOutcome::Denied, None, date(2024, 1, 10)),
        ];
        let report = arbitration_report(&records, GroupBy::Week);

        assert_eq!(report.totals.total, 4);
        assert_eq!(report.totals.pending, 1);
        assert_eq!(report.totals.total_adjustments, Decimal::new(400, 0));
        assert_eq!(report.totals.average_adjustment, Decimal::new(200, 0));
        assert_eq!(report.periods.len(), 2);
        assert_eq!(report.periods[0].price_adjustments, 2);
        assert_eq!(report.periods[1].denied, 1);
    }

    #[test]
    fn test_missing_titles_excludes_withdrawn_and_groups_unknown() {
        let mut absent = vehicle(VehicleStatus::Pending);
        absent.title_status = Some("Absent".to_string());
        absent.purchase_date = Some(date(2024, 1, 2));

        let mut no_date = vehicle(VehicleStatus::Sold);
        no_date.title_status = None;
        no_date.purchase_date = None;

        let mut withdrawn = vehicle(VehicleStatus::Withdrew);
        withdrawn.title_status = None;

        let mut present = vehicle(VehicleStatus::Pending);
        present.title_status = Some("Present".to_string());

        let groups = missing_titles(
            &[absent, no_date, withdrawn, present],
            date(2024, 1, 1),
            date(2024, 12, 31),
            date(2024, 1, 12),
            GroupBy::Week,
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].period, "2024-W01");
        assert_eq!(groups[0].vehicles[0].days_missing, Some(10));
        assert_eq!(groups[1].period, UNKNOWN_PERIOD);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_missing_titles_respects_purchase_range() {
        let mut inside = vehicle(VehicleStatus::Pending);
        inside.title_status = Some("absent".to_string());
        inside.purchase_date = Some(date(2024, 3, 4));

        let mut before = vehicle(VehicleStatus::Pending);
        before.title_status = None;
        before.purchase_date = Some(date(2023, 12, 31));

        let mut after = vehicle(VehicleStatus::Pending);
        after.title_status = None;
        after.purchase_date = Some(date(2024, 4, 1));

        let groups = missing_titles(
            &[inside, before, after],
            date(2024, 1, 1),
            date(2024, 3, 31),
            date(2024, 3, 14),
            GroupBy::Month,
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].period, "2024-03");
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[0].vehicles[0].days_missing, Some(10));
    }

    #[test]
    fn test_title_missing_rules() {
        assert!(is_title_missing(None));
        assert!(is_title_missing(Some("  ")));
        assert!(is_title_missing(Some("Absent")));
        assert!(is_title_missing(Some(" absent ")));
        assert!(!is_title_missing(Some("Present")));
    }

    #[test]
    fn test_summary_inventory_value_counts_unsold_only() {
        let mut pending = vehicle(VehicleStatus::Pending);
        pending.bought_price = Some(Decimal::new(300, 0));
        let mut in_progress = vehicle(VehicleStatus::InProgress);
        in_progress.bought_price = Some(Decimal::new(700, 0));
        let sale = sold(date(2024, 1, 2), 1400, 1000);

        let report = summary(
            &[pending, in_progress, sale.clone()],
            &[sale],
            &[],
            2,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );

        assert_eq!(report.inventory_count, 2);
        assert_eq!(report.inventory_value, Decimal::new(1000, 0));
        assert_eq!(report.status_counts.get("Sold"), Some(&1));
        assert_eq!(report.status_counts.get("ARB"), Some(&0));
        assert_eq!(report.total_profit, Decimal::new(400, 0));
        assert_eq!(report.pending_arbs, 2);
    }
}
