// src/services/contract_service.rs

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ContractRepository, VehicleRepository},
    models::{
        contracts::{
            first_booking_conflict, CloseContractPayload, Contract, ContractDetail, ContractFilter, ContractPayload,
            ContractStatus,
        },
        vehicles::VehicleStatus,
    },
};

#[derive(Clone)]
pub struct ContractService {
    repo: ContractRepository,
    vehicle_repo: VehicleRepository,
}

impl ContractService {
    pub fn new(repo: ContractRepository, vehicle_repo: VehicleRepository) -> Self {
        Self { repo, vehicle_repo }
    }

    pub async fn create_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &ContractPayload,
    ) -> Result<ContractDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.end_date < payload.start_date {
            return Err(AppError::InvalidDateRange);
        }

        let status = payload.status.unwrap_or(ContractStatus::Draft);
        if !status.holds_vehicles() {
            return Err(transition_error(ContractStatus::Draft, status));
        }

        let vehicle_ids: Vec<Uuid> = payload.vehicle_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let mut tx = executor.begin().await?;

        // valida o cliente
        self.repo.customer_name(&mut *tx, tenant_id, payload.customer_id).await?;

        let vehicles = self.vehicle_repo.find_many(&mut *tx, tenant_id, &vehicle_ids).await?;
        if let Some(missing) = vehicle_ids.iter().find(|id| !vehicles.iter().any(|v| v.id == **id)) {
            return Err(AppError::ResourceNotFound(format!("Veículo {}", missing)));
        }

        self.ensure_free(&mut tx, tenant_id, &vehicle_ids, payload.start_date, payload.end_date, None)
            .await?;

        let number = self.repo.next_number(&mut tx, tenant_id).await?;
        let contract = self
            .repo
            .create(
                &mut *tx,
                tenant_id,
                number,
                payload.customer_id,
                payload.start_date,
                payload.end_date,
                payload.daily_rate,
                payload.deposit.unwrap_or(Decimal::ZERO),
                status,
                payload.notes.as_deref(),
            )
            .await?;

        for vehicle in &vehicles {
            self.repo
                .add_vehicle(&mut *tx, tenant_id, contract.id, vehicle.id, vehicle.current_mileage)
                .await?;
        }

        if status == ContractStatus::Active {
            self.vehicle_repo
                .set_status(&mut *tx, tenant_id, &vehicle_ids, VehicleStatus::Rented)
                .await?;
        }

        let detail = self.detail(&mut tx, tenant_id, contract).await?;
        tx.commit().await?;

        tracing::info!("📄 Contrato #{} criado com {} veículo(s)", detail.contract.number, detail.vehicles.len());
        Ok(detail)
    }

    pub async fn list_contracts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &ContractFilter,
    ) -> Result<Vec<Contract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, tenant_id, filter).await
    }

    pub fn get_contract<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> impl Future<Output = Result<ContractDetail, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let contract = self.find(&mut *conn, tenant_id, id).await?;
            self.detail(&mut *conn, tenant_id, contract).await
        }
    }

    /// Draft -> Active prende os veículos; sair de Active devolve os alugados para Available.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        next: ContractStatus,
    ) -> Result<ContractDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let contract = self.find(&mut tx, tenant_id, id).await?;
        if !contract.status.can_transition_to(next) {
            return Err(transition_error(contract.status, next));
        }

        let vehicle_ids: Vec<Uuid> = self
            .repo
            .vehicles_for(&mut *tx, tenant_id, id)
            .await?
            .into_iter()
            .map(|v| v.vehicle_id)
            .collect();

        if next == ContractStatus::Active {
            self.ensure_free(&mut tx, tenant_id, &vehicle_ids, contract.start_date, contract.end_date, Some(id))
                .await?;
            self.vehicle_repo
                .set_status(&mut *tx, tenant_id, &vehicle_ids, VehicleStatus::Rented)
                .await?;
        } else if contract.status == ContractStatus::Active {
            self.release_vehicles(&mut tx, tenant_id, id, &vehicle_ids).await?;
        }

        let contract = self.repo.set_status(&mut *tx, tenant_id, id, next).await?;
        let detail = self.detail(&mut tx, tenant_id, contract).await?;

        tx.commit().await?;
        Ok(detail)
    }

    /// Encerra o contrato: grava o hodômetro de devolução, avança a quilometragem
    /// dos veículos e libera os alugados.
    pub async fn close_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &CloseContractPayload,
    ) -> Result<ContractDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let contract = self.find(&mut tx, tenant_id, id).await?;
        if !contract.status.can_transition_to(ContractStatus::Finished) {
            return Err(transition_error(contract.status, ContractStatus::Finished));
        }

        let vehicles = self.repo.vehicles_for(&mut *tx, tenant_id, id).await?;

        for ret in &payload.returns {
            let vehicle = vehicles
                .iter()
                .find(|v| v.vehicle_id == ret.vehicle_id)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Veículo {} no contrato", ret.vehicle_id)))?;

            let pickup = vehicle.pickup_mileage.unwrap_or(0);
            if ret.return_mileage < pickup {
                return Err(AppError::MileageRegression { current: pickup, attempted: ret.return_mileage });
            }

            self.repo
                .set_return_mileage(&mut *tx, tenant_id, id, ret.vehicle_id, ret.return_mileage)
                .await?;
            self.vehicle_repo
                .bump_mileage(&mut *tx, tenant_id, ret.vehicle_id, ret.return_mileage)
                .await?;
        }

        let vehicle_ids: Vec<Uuid> = vehicles.iter().map(|v| v.vehicle_id).collect();
        self.release_vehicles(&mut tx, tenant_id, id, &vehicle_ids).await?;

        let contract = self.repo.set_status(&mut *tx, tenant_id, id, ContractStatus::Finished).await?;
        let detail = self.detail(&mut tx, tenant_id, contract).await?;

        tx.commit().await?;
        Ok(detail)
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Contract, AppError> {
        self.repo
            .find_by_id(conn, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Contrato {}", id)))
    }

    async fn detail(&self, conn: &mut PgConnection, tenant_id: Uuid, contract: Contract) -> Result<ContractDetail, AppError> {
        let customer_name = self.repo.customer_name(&mut *conn, tenant_id, contract.customer_id).await?;
        let vehicles = self.repo.vehicles_for(&mut *conn, tenant_id, contract.id).await?;
        Ok(ContractDetail { contract, customer_name, vehicles })
    }

    // Trava os veículos antes de olhar a agenda: a checagem e a gravação
    // acontecem com as linhas presas, então duas reservas não passam juntas.
    async fn ensure_free(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        vehicle_ids: &[Uuid],
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_contract: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.repo.lock_vehicles(&mut *conn, tenant_id, vehicle_ids).await?;

        let bookings = self.repo.open_bookings(&mut *conn, tenant_id, vehicle_ids, start_date).await?;
        match first_booking_conflict(&bookings, start_date, end_date, exclude_contract) {
            Some(plate) => Err(AppError::VehicleAlreadyBooked(plate)),
            None => Ok(()),
        }
    }

    async fn release_vehicles(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        contract_id: Uuid,
        ids: &[Uuid],
    ) -> Result<(), AppError> {
        let current: Vec<(Uuid, VehicleStatus)> = self
            .vehicle_repo
            .find_many(&mut *conn, tenant_id, ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v.status))
            .collect();
        let held = self.repo.held_by_other_active(&mut *conn, tenant_id, contract_id, ids).await?;

        let freed = releasable(&current, &held);
        if !freed.is_empty() {
            self.vehicle_repo
                .set_status(&mut *conn, tenant_id, &freed, VehicleStatus::Available)
                .await?;
        }
        Ok(())
    }
}

/// Volta para Available só o que está Rented e não é de outro contrato ativo.
/// Um veículo que foi para manutenção continua lá.
fn releasable(vehicles: &[(Uuid, VehicleStatus)], held_elsewhere: &[Uuid]) -> Vec<Uuid> {
    vehicles
        .iter()
        .filter(|(id, status)| *status == VehicleStatus::Rented && !held_elsewhere.contains(id))
        .map(|(id, _)| *id)
        .collect()
}

fn transition_error(from: ContractStatus, to: ContractStatus) -> AppError {
    AppError::InvalidStatusTransition {
        from: format!("{:?}", from),
        to: format!("{:?}", to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_skips_vehicles_held_by_another_active_contract() {
        let (mine, shared, shop) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let vehicles = vec![
            (mine, VehicleStatus::Rented),
            (shared, VehicleStatus::Rented),
            (shop, VehicleStatus::Maintenance),
        ];

        assert_eq!(releasable(&vehicles, &[shared]), vec![mine]);
        assert_eq!(releasable(&vehicles, &[]), vec![mine, shared]);
        assert!(releasable(&vehicles, &[mine, shared]).is_empty());
    }

    #[test]
    fn transition_error_names_both_states() {
        match transition_error(ContractStatus::Finished, ContractStatus::Active) {
            AppError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, "Finished");
                assert_eq!(to, "Active");
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }
}
