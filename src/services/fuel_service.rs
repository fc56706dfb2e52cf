// src/services/fuel_service.rs

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{CostRepository, EmployeeRepository, FuelRepository, VehicleRepository},
    models::{
        costs::{CostCategory, CostOrigin, NewCost},
        fuel::{ConsumptionReport, FuelLog, FuelLogFilter, FuelLogPayload, NewFuelLog},
    },
    services::cost_service::check_range,
};

#[derive(Clone)]
pub struct FuelService {
    repo: FuelRepository,
    cost_repo: CostRepository,
    vehicle_repo: VehicleRepository,
    employee_repo: EmployeeRepository,
}

impl FuelService {
    pub fn new(
        repo: FuelRepository,
        cost_repo: CostRepository,
        vehicle_repo: VehicleRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self { repo, cost_repo, vehicle_repo, employee_repo }
    }

    /// Abastecimento + custo automático + avanço do hodômetro do veículo, tudo na mesma transação.
    pub async fn create_fuel_log<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &FuelLogPayload,
    ) -> Result<FuelLog, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let total_amount = match fuel_total(payload.liters, payload.price_per_liter) {
            Some(total) if total > Decimal::ZERO && total < MAX_TOTAL_AMOUNT => total,
            Some(total) if total <= Decimal::ZERO => return Err(total_error("must_be_positive")),
            _ => return Err(total_error("range")),
        };

        let mut tx = executor.begin().await?;

        let vehicle = self
            .vehicle_repo
            .find_by_id(&mut *tx, tenant_id, payload.vehicle_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {}", payload.vehicle_id)))?;

        if let Some(driver_id) = payload.driver_id {
            self.employee_repo
                .find_by_id(&mut *tx, tenant_id, driver_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Funcionário {}", driver_id)))?;
        }

        if let Some(previous) = self.repo.max_odometer(&mut *tx, tenant_id, vehicle.id).await? {
            if payload.odometer < previous {
                return Err(AppError::OdometerRegression { previous, attempted: payload.odometer });
            }
        }

        let log = self
            .repo
            .create(
                &mut *tx,
                tenant_id,
                &NewFuelLog {
                    vehicle_id: vehicle.id,
                    driver_id: payload.driver_id,
                    fuel_date: payload.fuel_date,
                    liters: payload.liters,
                    price_per_liter: payload.price_per_liter,
                    total_amount,
                    odometer: payload.odometer,
                    station: payload.station.clone(),
                    fuel_type: payload.fuel_type,
                    full_tank: payload.full_tank,
                },
            )
            .await?;

        let cost = self
            .cost_repo
            .create(
                &mut *tx,
                tenant_id,
                &NewCost {
                    vehicle_id: Some(vehicle.id),
                    contract_id: None,
                    category: CostCategory::Fuel,
                    description: format!("Abastecimento {} L ({})", log.liters, vehicle.plate),
                    amount: total_amount,
                    cost_date: log.fuel_date,
                    origin: CostOrigin::Automatic,
                    source_id: Some(log.id),
                    is_paid: true,
                    notes: log.station.clone(),
                },
            )
            .await?;

        let log = self.repo.set_cost(&mut *tx, tenant_id, log.id, cost.id).await?;
        self.vehicle_repo
            .bump_mileage(&mut *tx, tenant_id, vehicle.id, log.odometer)
            .await?;

        tx.commit().await?;
        Ok(log)
    }

    pub async fn list_fuel_logs<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &FuelLogFilter,
    ) -> Result<Vec<FuelLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_range(filter.from, filter.to)?;
        self.repo.list(executor, tenant_id, filter).await
    }

    /// Remove o abastecimento e o custo que ele gerou.
    pub async fn delete_fuel_log<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let log = self
            .repo
            .find_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Abastecimento {}", id)))?;

        self.repo.delete(&mut *tx, tenant_id, id).await?;
        if let Some(cost_id) = log.cost_id {
            self.cost_repo.delete(&mut *tx, tenant_id, cost_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub fn consumption<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> impl Future<Output = Result<ConsumptionReport, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            let mut conn = executor.acquire().await?;

            self.vehicle_repo
                .find_by_id(&mut *conn, tenant_id, vehicle_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {}", vehicle_id)))?;

            let filter = FuelLogFilter { vehicle_id: Some(vehicle_id), ..Default::default() };
            let logs = self.repo.list(&mut *conn, tenant_id, &filter).await?;

            Ok(compute_consumption(vehicle_id, logs))
        }
    }
}

// NUMERIC(14, 2) de fuel_logs.total_amount e costs.amount
// 10^12 = 232 * 2^32 + 3_567_587_328
const MAX_TOTAL_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn total_error(code: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add("liters", ValidationError::new(code));
    AppError::ValidationError(errors)
}

/// litros × preço, arredondado a centavos (meio para cima). `None` se estourar o Decimal.
pub fn fuel_total(liters: Decimal, price_per_liter: Decimal) -> Option<Decimal> {
    liters
        .checked_mul(price_per_liter)
        .map(|total| total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Média km/l entre abastecimentos consecutivos: distância percorrida dividida
/// pelos litros do abastecimento seguinte. O primeiro registro só serve de referência.
pub fn compute_consumption(vehicle_id: Uuid, mut logs: Vec<FuelLog>) -> ConsumptionReport {
    logs.sort_by_key(|l| (l.odometer, l.fuel_date));

    let total_liters: Decimal = logs.iter().map(|l| l.liters).sum();
    let total_spent: Decimal = logs.iter().map(|l| l.total_amount).sum();

    let (distance, liters_used) = logs
        .windows(2)
        .fold((0i64, Decimal::ZERO), |(distance, liters), pair| {
            (distance + (pair[1].odometer - pair[0].odometer), liters + pair[1].liters)
        });

    let average_km_per_liter = (distance > 0 && liters_used > Decimal::ZERO)
        .then(|| (Decimal::from(distance) / liters_used).round_dp(2));

    ConsumptionReport {
        vehicle_id,
        log_count: logs.len(),
        total_liters,
        total_spent,
        distance_km: distance,
        average_km_per_liter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fuel::FuelType;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn log(vehicle_id: Uuid, day: u32, odometer: i64, liters: &str) -> FuelLog {
        let liters = dec(liters);
        let price = dec("5.00");
        FuelLog {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vehicle_id,
            driver_id: None,
            cost_id: None,
            fuel_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            liters,
            price_per_liter: price,
            total_amount: fuel_total(liters, price).unwrap(),
            odometer,
            station: None,
            fuel_type: FuelType::Gasoline,
            full_tank: true,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn total_is_rounded_to_cents() {
        assert_eq!(fuel_total(dec("42.350"), dec("5.890")), Some(dec("249.44")));
        assert_eq!(fuel_total(dec("10"), dec("0.0005")), Some(dec("0.01")));
        assert_eq!(fuel_total(dec("1"), dec("0.004")), Some(dec("0.00")));
    }

    #[test]
    fn overflowing_total_is_none_instead_of_panicking() {
        let huge = dec("100000000000000000000");
        assert_eq!(fuel_total(huge, huge), None);
        assert_eq!(fuel_total(Decimal::MAX, dec("2")), None);
        assert_eq!(MAX_TOTAL_AMOUNT, dec("1000000000000"));
        assert!(fuel_total(dec("9999999.999"), dec("9999999.999")).unwrap() > MAX_TOTAL_AMOUNT);
    }

    #[test]
    fn average_uses_liters_of_the_later_fill() {
        let v = Uuid::new_v4();
        // fora de ordem de propósito: o cálculo ordena pelo hodômetro
        let logs = vec![log(v, 20, 10_800, "40"), log(v, 1, 10_000, "35"), log(v, 10, 10_400, "40")];

        let report = compute_consumption(v, logs);
        assert_eq!(report.log_count, 3);
        assert_eq!(report.distance_km, 800);
        assert_eq!(report.total_liters, dec("115"));
        assert_eq!(report.total_spent, dec("575.00"));
        assert_eq!(report.average_km_per_liter, Some(dec("10.00")));
    }

    #[test]
    fn single_log_has_no_average() {
        let v = Uuid::new_v4();
        let report = compute_consumption(v, vec![log(v, 1, 10_000, "35")]);
        assert_eq!(report.distance_km, 0);
        assert_eq!(report.average_km_per_liter, None);

        let empty = compute_consumption(v, vec![]);
        assert_eq!(empty.log_count, 0);
        assert_eq!(empty.total_liters, Decimal::ZERO);
    }
}
