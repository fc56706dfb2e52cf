// src/services/vehicle_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CostRepository, VehicleRepository},
    models::{
        costs::{CostCategory, CostOrigin, NewCost},
        vehicles::{
            normalize_plate, MileageReport, MileageSource, MileageSources, Vehicle, VehicleFilter,
            VehiclePayload, VehicleStatus,
        },
    },
};

#[derive(Clone)]
pub struct VehicleService {
    repo: VehicleRepository,
    cost_repo: CostRepository,
}

impl VehicleService {
    pub fn new(repo: VehicleRepository, cost_repo: CostRepository) -> Self {
        Self { repo, cost_repo }
    }

    /// Cadastra o veículo. Com valor de aquisição, lança o custo de compra junto.
    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let plate = normalize_plate(&payload.plate);
        let mut tx = executor.begin().await?;

        let vehicle = self.repo.create(&mut *tx, tenant_id, &plate, payload).await?;

        if let Some(value) = payload.acquisition_value.filter(|v| *v > Decimal::ZERO) {
            let purchase = NewCost {
                vehicle_id: Some(vehicle.id),
                contract_id: None,
                category: CostCategory::Purchase,
                description: format!("Aquisição do veículo {}", vehicle.plate),
                amount: value,
                cost_date: payload.acquisition_date.unwrap_or_else(|| Utc::now().date_naive()),
                origin: CostOrigin::Automatic,
                source_id: Some(vehicle.id),
                is_paid: true,
                notes: None,
            };
            self.cost_repo.create(&mut *tx, tenant_id, &purchase).await?;
        }

        tx.commit().await?;
        Ok(vehicle)
    }

    pub async fn list_vehicles<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &VehicleFilter,
    ) -> Result<Vec<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, tenant_id, filter).await
    }

    pub async fn get_vehicle<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {}", id)))
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.get_vehicle(&mut *tx, tenant_id, id).await?;
        if let Some(mileage) = payload.current_mileage {
            check_mileage(current.current_mileage, mileage)?;
        }

        let plate = normalize_plate(&payload.plate);
        let vehicle = self.repo.update(&mut *tx, tenant_id, id, &plate, payload).await?;

        tx.commit().await?;
        Ok(vehicle)
    }

    /// Exclusão lógica: o veículo fica Inactive e o histórico é preservado.
    pub async fn deactivate_vehicle<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let affected = self
            .repo
            .set_status(executor, tenant_id, &[id], VehicleStatus::Inactive)
            .await?;

        if affected == 0 {
            return Err(AppError::ResourceNotFound(format!("Veículo {}", id)));
        }
        Ok(())
    }

    pub async fn update_mileage<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        mileage: i64,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.get_vehicle(&mut *tx, tenant_id, id).await?;
        check_mileage(current.current_mileage, mileage)?;

        self.repo.bump_mileage(&mut *tx, tenant_id, id, mileage).await?;
        let vehicle = self.get_vehicle(&mut *tx, tenant_id, id).await?;

        tx.commit().await?;
        Ok(vehicle)
    }

    pub async fn mileage_report<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<MileageReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sources = self
            .repo
            .mileage_sources(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {}", id)))?;

        Ok(compute_mileage_report(id, &sources))
    }
}

fn check_mileage(current: i64, attempted: i64) -> Result<(), AppError> {
    if attempted < current {
        return Err(AppError::MileageRegression { current, attempted });
    }
    Ok(())
}

/// Quilometragem efetiva = maior leitura conhecida. Em empate vale a ordem cadastro, abastecimento, contrato.
pub fn compute_mileage_report(vehicle_id: Uuid, sources: &MileageSources) -> MileageReport {
    let mut effective = sources.registry;
    let mut source = MileageSource::Registry;

    for (reading, origin) in [
        (sources.fuel_log, MileageSource::FuelLog),
        (sources.contract, MileageSource::Contract),
    ] {
        if let Some(km) = reading.filter(|km| *km > effective) {
            effective = km;
            source = origin;
        }
    }

    MileageReport {
        vehicle_id,
        registry_mileage: sources.registry,
        fuel_log_mileage: sources.fuel_log,
        contract_mileage: sources.contract,
        effective_mileage: effective,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(registry: i64, fuel_log: Option<i64>, contract: Option<i64>) -> MileageSources {
        MileageSources { registry, fuel_log, contract }
    }

    #[test]
    fn registry_only() {
        let report = compute_mileage_report(Uuid::new_v4(), &sources(12_000, None, None));
        assert_eq!(report.effective_mileage, 12_000);
        assert_eq!(report.source, MileageSource::Registry);
    }

    #[test]
    fn highest_reading_wins() {
        let report = compute_mileage_report(Uuid::new_v4(), &sources(10_000, Some(10_450), Some(10_300)));
        assert_eq!(report.effective_mileage, 10_450);
        assert_eq!(report.source, MileageSource::FuelLog);

        let report = compute_mileage_report(Uuid::new_v4(), &sources(10_000, Some(10_450), Some(11_020)));
        assert_eq!(report.effective_mileage, 11_020);
        assert_eq!(report.source, MileageSource::Contract);
    }

    #[test]
    fn ties_keep_the_earlier_source() {
        let report = compute_mileage_report(Uuid::new_v4(), &sources(5_000, Some(5_000), Some(5_000)));
        assert_eq!(report.source, MileageSource::Registry);

        let report = compute_mileage_report(Uuid::new_v4(), &sources(4_000, Some(5_000), Some(5_000)));
        assert_eq!(report.source, MileageSource::FuelLog);
    }

    #[test]
    fn lower_readings_are_rejected() {
        assert!(check_mileage(1_000, 1_000).is_ok());
        assert!(check_mileage(1_000, 1_200).is_ok());
        assert!(matches!(
            check_mileage(1_000, 999),
            Err(AppError::MileageRegression { current: 1_000, attempted: 999 })
        ));
    }
}
