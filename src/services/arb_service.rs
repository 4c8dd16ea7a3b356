//! Procesador de arbitrajes (ARB)
//!
//! Este módulo decide qué le pasa a un vehículo cuando se abre o se
//! resuelve un ARB. La decisión es pura (`Resolution::plan`); la ejecución
//! aplica el plan dentro de una transacción, bloqueando el registro
//! pendiente con `FOR UPDATE` para que dos resoluciones concurrentes no
//! puedan cerrar el mismo ARB.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::arb_dto::{
    ArbInitiatedResponse, ArbResolvedResponse, InitiateArbRequest, ResolveArbRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    arb::{ArbOutcome, ArbType},
    vehicle::{Vehicle, VehicleStatus},
    vehicle_records::{NewExpense, NewTimelineEntry},
};
use crate::repositories::{
    arb_repository::ArbResolution,
    vehicle_repository::VehicleArbUpdate,
    ArbRepository, VehicleRecordsRepository, VehicleRepository,
};
use crate::utils::{errors::AppError, validation::round_money};

/// Combinaciones válidas de tipo + resultado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    SoldDenied,
    SoldPriceAdjustment { amount: Decimal },
    SoldBuyerWithdrew { transport_cost: Decimal },
    InventoryWithdrawn,
    InventoryPriceAdjustment { amount: Decimal },
    InventoryDenied,
}

/// Efectos de una resolución sobre el vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    pub vehicle: VehicleArbUpdate,
    pub expense: Option<NewExpense>,
    pub timeline: NewTimelineEntry,
}

fn positive(value: Option<Decimal>, field: &str, outcome: ArbOutcome) -> Result<Decimal, AppError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(round_money(v)),
        _ => Err(AppError::BadRequest(format!(
            "{} must be greater than 0 for outcome '{}'",
            field,
            outcome.as_str()
        ))),
    }
}

impl Resolution {
    pub fn from_parts(
        arb_type: ArbType,
        outcome: ArbOutcome,
        adjustment_amount: Option<Decimal>,
        transport_cost: Option<Decimal>,
    ) -> Result<Self, AppError> {
        use ArbOutcome::*;
        use ArbType::*;

        match (arb_type, outcome) {
            (SoldArb, Denied) => Ok(Resolution::SoldDenied),
            (SoldArb, PriceAdjustment) => Ok(Resolution::SoldPriceAdjustment {
                amount: positive(adjustment_amount, "adjustment_amount", outcome)?,
            }),
            (SoldArb, BuyerWithdrew) => Ok(Resolution::SoldBuyerWithdrew {
                transport_cost: positive(transport_cost, "transport_cost", outcome)?,
            }),
            (InventoryArb, Withdrawn) => Ok(Resolution::InventoryWithdrawn),
            (InventoryArb, PriceAdjustment) => Ok(Resolution::InventoryPriceAdjustment {
                amount: positive(adjustment_amount, "adjustment_amount", outcome)?,
            }),
            (InventoryArb, Denied) => Ok(Resolution::InventoryDenied),
            (_, Pending) => Err(AppError::BadRequest(
                "Outcome 'Pending' cannot be used to resolve an ARB".to_string(),
            )),
            (SoldArb, Withdrawn) | (InventoryArb, BuyerWithdrew) => Err(AppError::BadRequest(format!(
                "Outcome '{}' is not valid for {}",
                outcome.as_str(),
                arb_type.as_str()
            ))),
        }
    }

    pub fn arb_type(&self) -> ArbType {
        match self {
            Resolution::SoldDenied
            | Resolution::SoldPriceAdjustment { .. }
            | Resolution::SoldBuyerWithdrew { .. } => ArbType::SoldArb,
            Resolution::InventoryWithdrawn
            | Resolution::InventoryPriceAdjustment { .. }
            | Resolution::InventoryDenied => ArbType::InventoryArb,
        }
    }

    pub fn outcome(&self) -> ArbOutcome {
        match self {
            Resolution::SoldDenied | Resolution::InventoryDenied => ArbOutcome::Denied,
            Resolution::SoldPriceAdjustment { .. } | Resolution::InventoryPriceAdjustment { .. } => {
                ArbOutcome::PriceAdjustment
            }
            Resolution::SoldBuyerWithdrew { .. } => ArbOutcome::BuyerWithdrew,
            Resolution::InventoryWithdrawn => ArbOutcome::Withdrawn,
        }
    }

    fn adjustment_amount(&self) -> Option<Decimal> {
        match self {
            Resolution::SoldPriceAdjustment { amount } | Resolution::InventoryPriceAdjustment { amount } => {
                Some(*amount)
            }
            _ => None,
        }
    }

    fn transport_cost(&self) -> Option<Decimal> {
        match self {
            Resolution::SoldBuyerWithdrew { transport_cost } => Some(*transport_cost),
            _ => None,
        }
    }

    /// Calcula los cambios sin tocar la base de datos
    pub fn plan(
        &self,
        vehicle: &Vehicle,
        today: NaiveDate,
        transport_company: Option<&str>,
        notes: Option<String>,
    ) -> ResolutionPlan {
        let action = format!("{} resolved: {}", self.arb_type().as_str(), self.outcome().as_str());
        let keep = |status| VehicleArbUpdate {
            status,
            clear_sale: false,
            clear_purchase: false,
            bought_price: None,
        };

        match *self {
            Resolution::SoldDenied => ResolutionPlan {
                vehicle: keep(VehicleStatus::Sold),
                expense: None,
                timeline: NewTimelineEntry::new(action).with_note(notes),
            },
            Resolution::SoldPriceAdjustment { amount } => ResolutionPlan {
                vehicle: keep(VehicleStatus::Sold),
                expense: Some(NewExpense {
                    description: "ARB Price Adjustment".to_string(),
                    expense_date: today,
                    cost: amount,
                    notes: notes.clone(),
                }),
                timeline: NewTimelineEntry::new(action).with_cost(amount).with_note(notes),
            },
            Resolution::SoldBuyerWithdrew { transport_cost } => {
                let description = match transport_company.map(str::trim).filter(|c| !c.is_empty()) {
                    Some(company) => format!("ARB Buyer Withdrew - Transport ({})", company),
                    None => "ARB Buyer Withdrew - Transport".to_string(),
                };
                ResolutionPlan {
                    vehicle: VehicleArbUpdate {
                        clear_sale: true,
                        ..keep(VehicleStatus::Pending)
                    },
                    expense: Some(NewExpense {
                        description,
                        expense_date: today,
                        cost: transport_cost,
                        notes: notes.clone(),
                    }),
                    timeline: NewTimelineEntry::new(action).with_cost(transport_cost).with_note(notes),
                }
            }
            Resolution::InventoryWithdrawn => ResolutionPlan {
                vehicle: VehicleArbUpdate {
                    clear_purchase: true,
                    ..keep(VehicleStatus::Withdrew)
                },
                expense: None,
                timeline: NewTimelineEntry::new(action).with_note(notes),
            },
            Resolution::InventoryPriceAdjustment { amount } => {
                let current = vehicle.bought_price.unwrap_or_default();
                let adjusted = (current - amount).max(Decimal::ZERO);
                ResolutionPlan {
                    vehicle: VehicleArbUpdate {
                        bought_price: Some(round_money(adjusted)),
                        ..keep(VehicleStatus::Pending)
                    },
                    expense: None,
                    timeline: NewTimelineEntry::new(action).with_cost(amount).with_note(notes),
                }
            }
            Resolution::InventoryDenied => ResolutionPlan {
                vehicle: keep(VehicleStatus::Pending),
                expense: None,
                timeline: NewTimelineEntry::new(action).with_note(notes),
            },
        }
    }
}

/// Reglas para abrir un ARB sobre el vehículo
pub fn check_initiate(vehicle: &Vehicle, arb_type: ArbType, has_pending: bool) -> Result<(), AppError> {
    if has_pending {
        return Err(AppError::Conflict(
            "Vehicle already has a pending ARB".to_string(),
        ));
    }

    let status = vehicle.status();
    match arb_type {
        ArbType::SoldArb if status != Some(VehicleStatus::Sold) => Err(AppError::BadRequest(format!(
            "Sold ARB requires a vehicle with status 'Sold' (current: '{}')",
            vehicle.status
        ))),
        ArbType::InventoryArb if status == Some(VehicleStatus::Sold) => Err(AppError::BadRequest(
            "Inventory ARB cannot be opened on a sold vehicle; use Sold ARB".to_string(),
        )),
        _ => Ok(()),
    }
}

pub struct ArbService {
    pool: PgPool,
}

impl ArbService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn initiate(
        &self,
        vehicle_id: Uuid,
        request: InitiateArbRequest,
        user: &AuthenticatedUser,
    ) -> Result<ArbInitiatedResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let vehicle = VehicleRepository::lock_by_id(&mut *tx, vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
        let pending = ArbRepository::find_any_pending(&mut *tx, vehicle_id).await?;
        check_initiate(&vehicle, request.arb_type, pending.is_some())?;

        let record = ArbRepository::create_pending(
            &mut *tx,
            vehicle_id,
            request.arb_type,
            request.reason.as_deref(),
            request.notes.as_deref(),
            user.id(),
        )
        .await?;
        let vehicle = VehicleRepository::set_status(&mut *tx, vehicle_id, VehicleStatus::PendingArbitration).await?;

        let entry = NewTimelineEntry::new(format!("{} Initiated", request.arb_type.as_str()))
            .with_note(request.reason.clone());
        VehicleRecordsRepository::append_timeline(&mut *tx, vehicle_id, &entry, &user.actor()).await?;

        tx.commit().await?;
        tracing::info!("⚖️ {} opened for vehicle {}", request.arb_type.as_str(), vehicle_id);

        Ok(ArbInitiatedResponse { record, vehicle })
    }

    pub async fn resolve(
        &self,
        vehicle_id: Uuid,
        request: ResolveArbRequest,
        user: &AuthenticatedUser,
    ) -> Result<ArbResolvedResponse, AppError> {
        let outcome = request
            .outcome
            .ok_or_else(|| AppError::BadRequest("outcome is required".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let vehicle = VehicleRepository::lock_by_id(&mut *tx, vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let arb_type = match request.arb_type {
            Some(arb_type) => arb_type,
            None => ArbRepository::find_any_pending(&mut *tx, vehicle_id)
                .await?
                .and_then(|record| record.arb_type())
                .ok_or_else(|| AppError::NotFound("No pending ARB for this vehicle".to_string()))?,
        };

        let resolution = Resolution::from_parts(
            arb_type,
            outcome,
            request.adjustment_amount,
            request.transport_cost,
        )?;

        let pending = ArbRepository::lock_latest_pending(&mut *tx, vehicle_id, arb_type)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No pending {} for this vehicle", arb_type.as_str()))
            })?;

        let plan = resolution.plan(
            &vehicle,
            Utc::now().date_naive(),
            request.transport_company.as_deref(),
            request.notes.clone(),
        );

        let record = ArbRepository::resolve(
            &mut *tx,
            pending.id,
            &ArbResolution {
                outcome: resolution.outcome(),
                adjustment_amount: resolution.adjustment_amount(),
                transport_cost: resolution.transport_cost(),
                transport_company: request.transport_company.clone(),
                notes: request.notes.clone(),
                resolved_by: user.id(),
            },
        )
        .await?;

        let vehicle = VehicleRepository::apply_arb_update(&mut *tx, vehicle_id, &plan.vehicle).await?;

        let expense = match &plan.expense {
            Some(expense) => {
                Some(VehicleRecordsRepository::insert_expense(&mut *tx, vehicle_id, expense, user.id()).await?)
            }
            None => None,
        };

        VehicleRecordsRepository::append_timeline(&mut *tx, vehicle_id, &plan.timeline, &user.actor()).await?;

        tx.commit().await?;
        tracing::info!(
            "⚖️ {} resolved as '{}' for vehicle {}",
            arb_type.as_str(),
            resolution.outcome().as_str(),
            vehicle_id
        );

        Ok(ArbResolvedResponse { record, vehicle, expense })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::fixtures::vehicle;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[test]
    fn test_sold_arb_requires_sold_vehicle() {
        let pending = vehicle(VehicleStatus::Pending);
        let err = check_initiate(&pending, ArbType::SoldArb, false).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let sold = vehicle(VehicleStatus::Sold);
        assert!(check_initiate(&sold, ArbType::SoldArb, false).is_ok());
    }

    #[test]
    fn test_inventory_arb_rejected_on_sold_vehicle() {
        let sold = vehicle(VehicleStatus::Sold);
        assert!(matches!(
            check_initiate(&sold, ArbType::InventoryArb, false),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_initiate(&vehicle(VehicleStatus::InProgress), ArbType::InventoryArb, false).is_ok());
    }

    #[test]
    fn test_second_pending_arb_is_a_conflict() {
        let sold = vehicle(VehicleStatus::Sold);
        assert!(matches!(
            check_initiate(&sold, ArbType::SoldArb, true),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_sold_price_adjustment_creates_single_expense() {
        let resolution =
            Resolution::from_parts(ArbType::SoldArb, ArbOutcome::PriceAdjustment, Some(dec(500)), None).unwrap();
        let plan = resolution.plan(&vehicle(VehicleStatus::PendingArbitration), today(), None, None);

        assert_eq!(plan.vehicle.status, VehicleStatus::Sold);
        let expense = plan.expense.expect("expense");
        assert_eq!(expense.cost, dec(500));
        assert_eq!(expense.expense_date, today());
        assert_eq!(plan.timeline.cost, Some(dec(500)));
        assert!(!plan.vehicle.clear_sale);
    }

    #[test]
    fn test_price_adjustment_without_amount_is_rejected() {
        for arb_type in [ArbType::SoldArb, ArbType::InventoryArb] {
            assert!(matches!(
                Resolution::from_parts(arb_type, ArbOutcome::PriceAdjustment, None, None),
                Err(AppError::BadRequest(_))
            ));
            assert!(Resolution::from_parts(arb_type, ArbOutcome::PriceAdjustment, Some(dec(0)), None).is_err());
        }
    }

    #[test]
    fn test_buyer_withdrew_clears_sale_and_books_transport() {
        let resolution =
            Resolution::from_parts(ArbType::SoldArb, ArbOutcome::BuyerWithdrew, None, Some(dec(250))).unwrap();
        let plan = resolution.plan(&vehicle(VehicleStatus::PendingArbitration), today(), Some("Acme Haul"), None);

        assert_eq!(plan.vehicle.status, VehicleStatus::Pending);
        assert!(plan.vehicle.clear_sale);
        assert!(!plan.vehicle.clear_purchase);
        let expense = plan.expense.expect("transport expense");
        assert_eq!(expense.cost, dec(250));
        assert!(expense.description.contains("Acme Haul"));

        assert!(Resolution::from_parts(ArbType::SoldArb, ArbOutcome::BuyerWithdrew, None, None).is_err());
    }

    #[test]
    fn test_inventory_price_adjustment_floors_at_zero() {
        let resolution =
            Resolution::from_parts(ArbType::InventoryArb, ArbOutcome::PriceAdjustment, Some(dec(500)), None)
                .unwrap();
        let plan = resolution.plan(&vehicle(VehicleStatus::PendingArbitration), today(), None, None);

        assert_eq!(plan.vehicle.bought_price, Some(Decimal::ZERO));
        assert_eq!(plan.vehicle.status, VehicleStatus::Pending);
        assert!(plan.expense.is_none());
    }

    #[test]
    fn test_inventory_price_adjustment_subtracts() {
        let resolution =
            Resolution::from_parts(ArbType::InventoryArb, ArbOutcome::PriceAdjustment, Some(dec(100)), None)
                .unwrap();
        let plan = resolution.plan(&vehicle(VehicleStatus::PendingArbitration), today(), None, None);
        assert_eq!(plan.vehicle.bought_price, Some(dec(200)));
    }

    #[test]
    fn test_inventory_withdrawn_clears_purchase() {
        let resolution = Resolution::from_parts(ArbType::InventoryArb, ArbOutcome::Withdrawn, None, None).unwrap();
        let plan = resolution.plan(&vehicle(VehicleStatus::PendingArbitration), today(), None, None);

        assert_eq!(plan.vehicle.status, VehicleStatus::Withdrew);
        assert!(plan.vehicle.clear_purchase);
        assert!(plan.expense.is_none());
    }

    #[test]
    fn test_denied_outcomes_restore_status() {
        let v = vehicle(VehicleStatus::PendingArbitration);
        let sold = Resolution::from_parts(ArbType::SoldArb, ArbOutcome::Denied, None, None).unwrap();
        assert_eq!(sold.plan(&v, today(), None, None).vehicle.status, VehicleStatus::Sold);

        let inventory = Resolution::from_parts(ArbType::InventoryArb, ArbOutcome::Denied, None, None).unwrap();
        let plan = inventory.plan(&v, today(), None, None);
        assert_eq!(plan.vehicle.status, VehicleStatus::Pending);
        assert_eq!(plan.vehicle.bought_price, None);
        assert!(plan.expense.is_none());
    }

    #[test]
    fn test_invalid_combinations_are_rejected() {
        let cases = [
            (ArbType::SoldArb, ArbOutcome::Withdrawn),
            (ArbType::InventoryArb, ArbOutcome::BuyerWithdrew),
            (ArbType::SoldArb, ArbOutcome::Pending),
            (ArbType::InventoryArb, ArbOutcome::Pending),
        ];
        for (arb_type, outcome) in cases {
            assert!(
                matches!(
                    Resolution::from_parts(arb_type, outcome, Some(dec(10)), Some(dec(10))),
                    Err(AppError::BadRequest(_))
                ),
                "{:?} + {:?} should be rejected",
                arb_type,
                outcome
            );
        }
    }

    #[test]
    fn test_every_plan_has_one_timeline_entry_matching_outcome() {
        let v = vehicle(VehicleStatus::PendingArbitration);
        let resolutions = [
            Resolution::SoldDenied,
            Resolution::SoldPriceAdjustment { amount: dec(1) },
            Resolution::SoldBuyerWithdrew { transport_cost: dec(1) },
            Resolution::InventoryWithdrawn,
            Resolution::InventoryPriceAdjustment { amount: dec(1) },
            Resolution::InventoryDenied,
        ];
        for resolution in resolutions {
            let plan = resolution.plan(&v, today(), None, Some("note".to_string()));
            assert!(plan.timeline.action.contains(resolution.outcome().as_str()));
            assert_eq!(plan.timeline.note.as_deref(), Some("note"));
        }
    }
}
