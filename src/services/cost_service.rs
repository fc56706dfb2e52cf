// src/services/cost_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ContractRepository, CostRepository, VehicleRepository},
    models::costs::{Cost, CostFilter, CostOrigin, CostPayload, CostSummary, CostUpdate, NewCost},
};

#[derive(Clone)]
pub struct CostService {
    repo: CostRepository,
    vehicle_repo: VehicleRepository,
    contract_repo: ContractRepository,
}

impl CostService {
    pub fn new(repo: CostRepository, vehicle_repo: VehicleRepository, contract_repo: ContractRepository) -> Self {
        Self { repo, vehicle_repo, contract_repo }
    }

    pub async fn create_cost<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CostPayload,
    ) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.check_links(&mut tx, tenant_id, payload.vehicle_id, payload.contract_id).await?;
        let cost = self.repo.create(&mut *tx, tenant_id, &NewCost::from(payload)).await?;

        tx.commit().await?;
        Ok(cost)
    }

    pub async fn list_costs<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &CostFilter) -> Result<Vec<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_range(filter.from, filter.to)?;
        self.repo.list(executor, tenant_id, filter).await
    }

    pub async fn get_cost<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Custo {}", id)))
    }

    /// Em custos automáticos só descrição, pagamento e observações podem mudar.
    pub async fn update_cost<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        update: &CostUpdate,
    ) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.get_cost(&mut *tx, tenant_id, id).await?;
        if current.origin == CostOrigin::Automatic && update.touches_locked_fields() {
            return Err(AppError::AutomaticCostLocked);
        }

        self.check_links(&mut tx, tenant_id, update.vehicle_id, update.contract_id).await?;
        let cost = self.repo.update(&mut *tx, tenant_id, id, update).await?;

        tx.commit().await?;
        Ok(cost)
    }

    /// Custos automáticos saem junto com a multa/abastecimento que os gerou.
    pub async fn delete_cost<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.get_cost(&mut *tx, tenant_id, id).await?;
        if current.origin == CostOrigin::Automatic {
            return Err(AppError::AutomaticCostLocked);
        }

        self.repo.delete(&mut *tx, tenant_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub fn cost_summary<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> impl Future<Output = Result<CostSummary, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            check_range(from, to)?;
            let mut conn = executor.acquire().await?;

            let by_category = self.repo.totals_by_category(&mut *conn, tenant_id, from, to).await?;
            let by_vehicle = self.repo.totals_by_vehicle(&mut *conn, tenant_id, from, to).await?;
            let grand_total = by_category.iter().map(|c| c.total).sum::<Decimal>();

            Ok(CostSummary { from, to, by_category, by_vehicle, grand_total })
        }
    }

    // Veículo e contrato referenciados precisam ser da mesma empresa
    async fn check_links(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        vehicle_id: Option<Uuid>,
        contract_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(vehicle_id) = vehicle_id {
            self.vehicle_repo
                .find_by_id(&mut *conn, tenant_id, vehicle_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {}", vehicle_id)))?;
        }
        if let Some(contract_id) = contract_id {
            self.contract_repo
                .find_by_id(&mut *conn, tenant_id, contract_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Contrato {}", contract_id)))?;
        }
        Ok(())
    }
}

pub(crate) fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    match (from, to) {
        (Some(from), Some(to)) if to < from => Err(AppError::InvalidDateRange),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn open_ranges_are_accepted() {
        assert!(check_range(None, None).is_ok());
        assert!(check_range(d(2024, 1, 1), None).is_ok());
        assert!(check_range(None, d(2024, 1, 1)).is_ok());
        assert!(check_range(d(2024, 1, 1), d(2024, 1, 1)).is_ok());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert!(matches!(check_range(d(2024, 2, 1), d(2024, 1, 31)), Err(AppError::InvalidDateRange)));
    }
}
