// src/services/fine_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ContractRepository, CostRepository, EmployeeRepository, FineRepository, VehicleRepository},
    models::{
        contracts::{ContractStatus, ContractWindow},
        costs::{CostCategory, CostOrigin, CostUpdate, NewCost},
        fines::{Fine, FineFilter, FinePayload, FineStatistics, FineStatus, NewFine},
    },
};

#[derive(Clone)]
pub struct FineService {
    repo: FineRepository,
    cost_repo: CostRepository,
    contract_repo: ContractRepository,
    vehicle_repo: VehicleRepository,
    employee_repo: EmployeeRepository,
}

impl FineService {
    pub fn new(
        repo: FineRepository,
        cost_repo: CostRepository,
        contract_repo: ContractRepository,
        vehicle_repo: VehicleRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self { repo, cost_repo, contract_repo, vehicle_repo, employee_repo }
    }

    /// Registra a multa, associa ao contrato vigente na data e lança o custo automático.
    pub async fn create_fine<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &FinePayload,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.due_date.is_some_and(|due| due < payload.infraction_date) {
            return Err(AppError::InvalidDateRange);
        }

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

        let (contract_id, customer_id) = match payload.contract_id {
            Some(contract_id) => {
                let contract = self
                    .contract_repo
                    .find_by_id(&mut *tx, tenant_id, contract_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound(format!("Contrato {}", contract_id)))?;
                (Some(contract.id), Some(contract.customer_id))
            }
            None => self.match_contract(&mut tx, tenant_id, vehicle.id, payload.infraction_date).await?,
        };

        let fine = self
            .repo
            .create(
                &mut *tx,
                tenant_id,
                &NewFine {
                    vehicle_id: vehicle.id,
                    contract_id,
                    customer_id,
                    driver_id: payload.driver_id,
                    infraction_date: payload.infraction_date,
                    infraction_time: payload.infraction_time,
                    infraction_code: payload.infraction_code.clone(),
                    description: payload.description.trim().to_string(),
                    location: payload.location.clone(),
                    amount: payload.amount,
                    points: payload.points,
                    due_date: payload.due_date,
                },
            )
            .await?;

        let cost = self
            .cost_repo
            .create(&mut *tx, tenant_id, &fine_cost(&fine, &vehicle.plate))
            .await?;
        let fine = self.repo.set_cost(&mut *tx, tenant_id, fine.id, Some(cost.id)).await?;

        tx.commit().await?;

        tracing::info!(
            "🚨 Multa {} registrada para {} (contrato: {:?})",
            fine.id,
            vehicle.plate,
            fine.contract_id
        );
        Ok(fine)
    }

    pub async fn list_fines<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &FineFilter) -> Result<Vec<Fine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, tenant_id, filter).await
    }

    pub async fn get_fine<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Multa {}", id)))
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        next: FineStatus,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let fine = self.get_fine(&mut *tx, tenant_id, id).await?;
        let effect = status_change_effect(fine.status, next, fine.customer_id.is_some())?;

        if let Some(cost_id) = fine.cost_id {
            match effect {
                CostEffect::Delete => {
                    self.repo.set_cost(&mut *tx, tenant_id, id, None).await?;
                    self.cost_repo.delete(&mut *tx, tenant_id, cost_id).await?;
                }
                CostEffect::MarkPaid | CostEffect::MarkUnpaid => {
                    let update = CostUpdate { is_paid: Some(effect == CostEffect::MarkPaid), ..Default::default() };
                    self.cost_repo.update(&mut *tx, tenant_id, cost_id, &update).await?;
                }
                CostEffect::Keep => {}
            }
        }

        let fine = self.repo.set_status(&mut *tx, tenant_id, id, next).await?;
        tx.commit().await?;
        Ok(fine)
    }

    /// Refaz a associação com contrato (ex.: contrato cadastrado depois da multa).
    pub async fn rematch_fine<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let fine = self.get_fine(&mut *tx, tenant_id, id).await?;
        let (contract_id, customer_id) = self
            .match_contract(&mut tx, tenant_id, fine.vehicle_id, fine.infraction_date)
            .await?;

        let fine = self.repo.set_contract(&mut *tx, tenant_id, id, contract_id, customer_id).await?;
        if let Some(cost_id) = fine.cost_id {
            self.cost_repo.set_contract(&mut *tx, tenant_id, cost_id, contract_id).await?;
        }

        tx.commit().await?;
        Ok(fine)
    }

    /// fn_fines_statistics
    pub fn fines_statistics<'e, E>(&self, executor: E, tenant_id: Uuid) -> impl Future<Output = Result<FineStatistics, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            let mut conn = executor.acquire().await?;

            let by_status = self.repo.totals_by_status(&mut *conn, tenant_id).await?;
            let (overdue_pending_count, total_points) = self.repo.overdue_and_points(&mut *conn, tenant_id).await?;

            Ok(FineStatistics {
                total_count: by_status.iter().map(|s| s.count).sum(),
                total_amount: by_status.iter().map(|s| s.amount).sum::<Decimal>(),
                by_status,
                overdue_pending_count,
                total_points,
            })
        }
    }

    async fn match_contract(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        date: NaiveDate,
    ) -> Result<(Option<Uuid>, Option<Uuid>), AppError> {
        let windows = self.contract_repo.windows_covering(conn, tenant_id, vehicle_id, date).await?;

        Ok(select_contract_for_infraction(&windows, date)
            .map(|w| (Some(w.contract_id), Some(w.customer_id)))
            .unwrap_or((None, None)))
    }
}

/// Contrato responsável pela data: ativo ou encerrado, período cobrindo a data (inclusive).
/// Com mais de um candidato vence o que começou por último.
pub fn select_contract_for_infraction(windows: &[ContractWindow], date: NaiveDate) -> Option<&ContractWindow> {
    windows
        .iter()
        .filter(|w| matches!(w.status, ContractStatus::Active | ContractStatus::Finished))
        .filter(|w| w.covers(date))
        .max_by_key(|w| w.start_date)
}

/// O que a troca de status faz com o custo automático da multa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostEffect {
    Keep,
    Delete,
    MarkPaid,
    MarkUnpaid,
}

/// Valida a troca de status e diz o que fazer com o custo: cancelar apaga,
/// pagar quita e sair de paga volta a deixar em aberto.
pub fn status_change_effect(from: FineStatus, to: FineStatus, has_customer: bool) -> Result<CostEffect, AppError> {
    if !from.can_transition_to(to) {
        return Err(AppError::InvalidStatusTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        });
    }
    if to == FineStatus::ChargedToCustomer && !has_customer {
        return Err(AppError::FineWithoutCustomer);
    }

    Ok(match (from, to) {
        (_, FineStatus::Cancelled) => CostEffect::Delete,
        (_, FineStatus::Paid) => CostEffect::MarkPaid,
        (FineStatus::Paid, _) => CostEffect::MarkUnpaid,
        _ => CostEffect::Keep,
    })
}

fn fine_cost(fine: &Fine, plate: &str) -> NewCost {
    let description = match fine.infraction_code.as_deref() {
        Some(code) => format!("Multa {} - {} ({})", code, fine.description, plate),
        None => format!("Multa - {} ({})", fine.description, plate),
    };

    NewCost {
        vehicle_id: Some(fine.vehicle_id),
        contract_id: fine.contract_id,
        category: CostCategory::Fine,
        description,
        amount: fine.amount,
        cost_date: fine.infraction_date,
        origin: CostOrigin::Automatic,
        source_id: Some(fine.id),
        is_paid: false,
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate, status: ContractStatus) -> ContractWindow {
        ContractWindow {
            contract_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            status,
        }
    }

    #[test]
    fn matches_inclusive_boundaries() {
        let windows = vec![window(d(2024, 5, 1), d(2024, 5, 10), ContractStatus::Finished)];

        assert!(select_contract_for_infraction(&windows, d(2024, 5, 1)).is_some());
        assert!(select_contract_for_infraction(&windows, d(2024, 5, 10)).is_some());
        assert!(select_contract_for_infraction(&windows, d(2024, 5, 11)).is_none());
        assert!(select_contract_for_infraction(&windows, d(2024, 4, 30)).is_none());
    }

    #[test]
    fn ignores_drafts_and_cancelled_contracts() {
        let windows = vec![
            window(d(2024, 5, 1), d(2024, 5, 10), ContractStatus::Cancelled),
            window(d(2024, 5, 1), d(2024, 5, 10), ContractStatus::Draft),
        ];
        assert!(select_contract_for_infraction(&windows, d(2024, 5, 5)).is_none());
    }

    #[test]
    fn most_recently_started_contract_wins() {
        let older = window(d(2024, 5, 1), d(2024, 5, 20), ContractStatus::Finished);
        let newer = window(d(2024, 5, 15), d(2024, 5, 25), ContractStatus::Active);
        let windows = vec![older, newer.clone()];

        let chosen = select_contract_for_infraction(&windows, d(2024, 5, 18)).unwrap();
        assert_eq!(chosen.contract_id, newer.contract_id);

        let chosen = select_contract_for_infraction(&windows, d(2024, 5, 3)).unwrap();
        assert_ne!(chosen.contract_id, newer.contract_id);
    }

    #[test]
    fn cancelling_deletes_the_cost() {
        let effect = status_change_effect(FineStatus::Pending, FineStatus::Cancelled, false).unwrap();
        assert_eq!(effect, CostEffect::Delete);
        let effect = status_change_effect(FineStatus::Appealed, FineStatus::Cancelled, true).unwrap();
        assert_eq!(effect, CostEffect::Delete);
    }

    #[test]
    fn paying_marks_the_cost_paid_and_leaving_paid_reopens_it() {
        assert_eq!(status_change_effect(FineStatus::Pending, FineStatus::Paid, false).unwrap(), CostEffect::MarkPaid);
        assert_eq!(status_change_effect(FineStatus::Paid, FineStatus::Pending, false).unwrap(), CostEffect::MarkUnpaid);
        assert_eq!(status_change_effect(FineStatus::Paid, FineStatus::Appealed, false).unwrap(), CostEffect::MarkUnpaid);
        assert_eq!(status_change_effect(FineStatus::Pending, FineStatus::Appealed, false).unwrap(), CostEffect::Keep);
    }

    #[test]
    fn charging_the_customer_needs_a_customer() {
        assert!(matches!(
            status_change_effect(FineStatus::Pending, FineStatus::ChargedToCustomer, false),
            Err(AppError::FineWithoutCustomer)
        ));
        assert_eq!(
            status_change_effect(FineStatus::Pending, FineStatus::ChargedToCustomer, true).unwrap(),
            CostEffect::Keep
        );
    }

    #[test]
    fn paid_or_cancelled_fines_reject_cancellation() {
        assert!(matches!(
            status_change_effect(FineStatus::Paid, FineStatus::Cancelled, true),
            Err(AppError::InvalidStatusTransition { .. })
        ));
        assert!(matches!(
            status_change_effect(FineStatus::Cancelled, FineStatus::Pending, true),
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn automatic_cost_mirrors_the_fine() {
        let fine = Fine {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            contract_id: Some(Uuid::new_v4()),
            customer_id: None,
            driver_id: None,
            cost_id: None,
            infraction_date: d(2024, 6, 3),
            infraction_time: None,
            infraction_code: Some("7455-0".into()),
            description: "Excesso de velocidade".into(),
            location: None,
            amount: Decimal::new(13016, 2),
            points: 4,
            due_date: None,
            status: FineStatus::Pending,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let cost = fine_cost(&fine, "ABC1D23");
        assert_eq!(cost.category, CostCategory::Fine);
        assert_eq!(cost.origin, CostOrigin::Automatic);
        assert_eq!(cost.source_id, Some(fine.id));
        assert_eq!(cost.contract_id, fine.contract_id);
        assert_eq!(cost.amount, fine.amount);
        assert!(cost.description.contains("7455-0"));
        assert!(cost.description.contains("ABC1D23"));
    }
}
