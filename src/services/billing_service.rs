// src/services/billing_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingRepository, ContractRepository, CostRepository},
    models::{
        billing::{BillableContract, BillingLine, BillingSummary, ContractCharges, ContractStatement},
        contracts::{Contract, ContractVehicle},
        costs::Cost,
    },
};

#[derive(Clone)]
pub struct BillingService {
    repo: BillingRepository,
    contract_repo: ContractRepository,
    cost_repo: CostRepository,
}

impl BillingService {
    pub fn new(repo: BillingRepository, contract_repo: ContractRepository, cost_repo: CostRepository) -> Self {
        Self { repo, contract_repo, cost_repo }
    }

    pub fn contract_statement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
    ) -> impl Future<Output = Result<ContractStatement, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            let mut conn = executor.acquire().await?;

            let contract = self
                .contract_repo
                .find_by_id(&mut *conn, tenant_id, contract_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Contrato {}", contract_id)))?;
            let customer_name = self.contract_repo.customer_name(&mut *conn, tenant_id, contract.customer_id).await?;
            let vehicles = self.contract_repo.vehicles_for(&mut *conn, tenant_id, contract_id).await?;
            let charges = self.cost_repo.list_by_contract(&mut *conn, tenant_id, contract_id).await?;

            Ok(build_statement(contract, customer_name, vehicles, charges))
        }
    }

    pub fn billing_summary<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<BillingSummary, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            if to < from {
                return Err(AppError::InvalidDateRange);
            }
            let mut conn = executor.acquire().await?;

            let contracts = self.repo.contracts_overlapping(&mut *conn, tenant_id, from, to).await?;
            let charges = self.repo.charges_by_contract(&mut *conn, tenant_id, from, to).await?;

            Ok(build_summary(from, to, &contracts, &charges))
        }
    }

    /// Receita de diárias dos contratos dentro do período (usada pelo painel).
    pub async fn rental_revenue<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contracts = self.repo.contracts_overlapping(executor, tenant_id, from, to).await?;
        Ok(contracts.iter().map(|c| period_rental(c, from, to).1).sum())
    }
}

/// Diárias contadas de forma inclusiva: retirada e devolução no mesmo dia = 1 diária.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Dias do intervalo [start, end] que caem dentro de [from, to].
pub fn overlap_days(start: NaiveDate, end: NaiveDate, from: NaiveDate, to: NaiveDate) -> i64 {
    rental_days(start.max(from), end.min(to))
}

pub fn rental_amount(days: i64, daily_rate: Decimal, vehicle_count: i64) -> Decimal {
    Decimal::from(days) * daily_rate * Decimal::from(vehicle_count)
}

// (dias faturados, valor) de um contrato dentro do período
fn period_rental(contract: &BillableContract, from: NaiveDate, to: NaiveDate) -> (i64, Decimal) {
    let days = overlap_days(contract.start_date, contract.end_date, from, to);
    (days, rental_amount(days, contract.daily_rate, contract.vehicle_count))
}

pub fn build_statement(
    contract: Contract,
    customer_name: String,
    vehicles: Vec<ContractVehicle>,
    charges: Vec<Cost>,
) -> ContractStatement {
    let days = rental_days(contract.start_date, contract.end_date);
    let rental = rental_amount(days, contract.daily_rate, vehicles.len() as i64);
    let charges_total: Decimal = charges.iter().map(|c| c.amount).sum();

    let balance = rental + charges_total - contract.deposit;

    ContractStatement {
        contract_id: contract.id,
        contract_number: contract.number,
        customer_id: contract.customer_id,
        customer_name,
        status: contract.status,
        start_date: contract.start_date,
        end_date: contract.end_date,
        rental_days: days,
        daily_rate: contract.daily_rate,
        vehicles,
        rental_amount: rental,
        charges,
        charges_total,
        deposit: contract.deposit,
        total_due: balance.max(Decimal::ZERO),
        refund_due: (-balance).max(Decimal::ZERO),
    }
}

/// Uma linha por contrato com diárias no período; contratos que só têm
/// cobranças no período entram com diárias zeradas.
pub fn build_summary(
    from: NaiveDate,
    to: NaiveDate,
    contracts: &[BillableContract],
    charges: &[ContractCharges],
) -> BillingSummary {
    let by_contract: HashMap<Uuid, Decimal> = charges.iter().map(|c| (c.contract_id, c.total)).collect();

    let mut lines: Vec<BillingLine> = contracts
        .iter()
        .map(|c| {
            let (billed_days, rental) = period_rental(c, from, to);
            let charges_amount = by_contract.get(&c.contract_id).copied().unwrap_or(Decimal::ZERO);
            BillingLine {
                contract_id: c.contract_id,
                contract_number: c.number,
                customer_name: c.customer_name.clone(),
                status: c.status,
                billed_days,
                rental_amount: rental,
                charges_amount,
                total: rental + charges_amount,
            }
        })
        .collect();

    let charge_only = charges
        .iter()
        .filter(|ch| !contracts.iter().any(|c| c.contract_id == ch.contract_id))
        .map(|ch| BillingLine {
            contract_id: ch.contract_id,
            contract_number: ch.number,
            customer_name: ch.customer_name.clone(),
            status: ch.status,
            billed_days: 0,
            rental_amount: Decimal::ZERO,
            charges_amount: ch.total,
            total: ch.total,
        })
        .collect::<Vec<_>>();
    lines.extend(charge_only);

    let rental_total: Decimal = lines.iter().map(|l| l.rental_amount).sum();
    let charges_total: Decimal = lines.iter().map(|l| l.charges_amount).sum();

    BillingSummary {
        from,
        to,
        lines,
        rental_total,
        charges_total,
        grand_total: rental_total + charges_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        contracts::ContractStatus,
        costs::{CostCategory, CostOrigin},
    };
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn contract(start: NaiveDate, end: NaiveDate, rate: Decimal, deposit: Decimal) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            number: 7,
            customer_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            daily_rate: rate,
            deposit,
            status: ContractStatus::Finished,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn vehicle(contract_id: Uuid, plate: &str) -> ContractVehicle {
        ContractVehicle {
            contract_id,
            vehicle_id: Uuid::new_v4(),
            plate: plate.into(),
            pickup_mileage: Some(1_000),
            return_mileage: None,
        }
    }

    fn charge(contract_id: Uuid, amount: Decimal) -> Cost {
        Cost {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vehicle_id: None,
            contract_id: Some(contract_id),
            category: CostCategory::Fine,
            description: "Multa".into(),
            amount,
            cost_date: d(2024, 6, 3),
            origin: CostOrigin::Automatic,
            source_id: None,
            is_paid: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn billable(start: NaiveDate, end: NaiveDate, rate: Decimal, vehicles: i64) -> BillableContract {
        BillableContract {
            contract_id: Uuid::new_v4(),
            number: 1,
            customer_name: "Cliente".into(),
            start_date: start,
            end_date: end,
            daily_rate: rate,
            vehicle_count: vehicles,
            status: ContractStatus::Active,
        }
    }

    fn charges_for(contract_id: Uuid, total: Decimal) -> ContractCharges {
        ContractCharges {
            contract_id,
            number: 9,
            customer_name: "Cliente".into(),
            status: ContractStatus::Finished,
            total,
        }
    }

    #[test]
    fn days_are_inclusive() {
        assert_eq!(rental_days(d(2024, 6, 1), d(2024, 6, 1)), 1);
        assert_eq!(rental_days(d(2024, 6, 1), d(2024, 6, 10)), 10);
        assert_eq!(rental_days(d(2024, 2, 28), d(2024, 3, 1)), 3);
    }

    #[test]
    fn overlap_clips_to_the_period() {
        let (from, to) = (d(2024, 6, 1), d(2024, 6, 30));
        assert_eq!(overlap_days(d(2024, 5, 28), d(2024, 6, 2), from, to), 2);
        assert_eq!(overlap_days(d(2024, 6, 29), d(2024, 7, 5), from, to), 2);
        assert_eq!(overlap_days(d(2024, 5, 1), d(2024, 7, 31), from, to), 30);
        assert_eq!(overlap_days(d(2024, 7, 1), d(2024, 7, 5), from, to), 0);
    }

    #[test]
    fn statement_charges_rental_plus_costs_minus_deposit() {
        let c = contract(d(2024, 6, 1), d(2024, 6, 10), money(12000), money(50000));
        let id = c.id;
        let vehicles = vec![vehicle(id, "ABC1D23"), vehicle(id, "XYZ9876")];
        let charges = vec![charge(id, money(13016)), charge(id, money(8000))];

        let st = build_statement(c, "Cliente".into(), vehicles, charges);

        assert_eq!(st.rental_days, 10);
        // 10 diárias x 120,00 x 2 veículos
        assert_eq!(st.rental_amount, money(240000));
        assert_eq!(st.charges_total, money(21016));
        assert_eq!(st.total_due, money(240000 + 21016 - 50000));
        assert_eq!(st.refund_due, Decimal::ZERO);
    }

    #[test]
    fn deposit_larger_than_bill_becomes_refund() {
        let c = contract(d(2024, 6, 1), d(2024, 6, 2), money(10000), money(50000));
        let id = c.id;

        let st = build_statement(c, "Cliente".into(), vec![vehicle(id, "ABC1D23")], vec![]);

        assert_eq!(st.rental_amount, money(20000));
        assert_eq!(st.total_due, Decimal::ZERO);
        assert_eq!(st.refund_due, money(30000));
    }

    #[test]
    fn summary_bills_only_days_inside_the_period() {
        let (from, to) = (d(2024, 6, 1), d(2024, 6, 30));
        let crossing = billable(d(2024, 5, 25), d(2024, 6, 5), money(10000), 1);
        let inside = billable(d(2024, 6, 10), d(2024, 6, 12), money(5000), 2);
        let charges = vec![charges_for(inside.contract_id, money(2500))];

        let summary = build_summary(from, to, &[crossing, inside], &charges);

        assert_eq!(summary.lines[0].billed_days, 5);
        assert_eq!(summary.lines[0].rental_amount, money(50000));
        assert_eq!(summary.lines[0].charges_amount, Decimal::ZERO);
        assert_eq!(summary.lines[1].billed_days, 3);
        assert_eq!(summary.lines[1].rental_amount, money(30000));
        assert_eq!(summary.lines[1].total, money(32500));
        assert_eq!(summary.rental_total, money(80000));
        assert_eq!(summary.charges_total, money(2500));
        assert_eq!(summary.grand_total, money(82500));
    }

    #[test]
    fn charges_of_contracts_outside_the_period_still_count() {
        let (from, to) = (d(2024, 7, 1), d(2024, 7, 31));
        let finished_in_june = Uuid::new_v4();

        let summary = build_summary(from, to, &[], &[charges_for(finished_in_june, money(15000))]);

        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].contract_id, finished_in_june);
        assert_eq!(summary.lines[0].billed_days, 0);
        assert_eq!(summary.lines[0].rental_amount, Decimal::ZERO);
        assert_eq!(summary.lines[0].total, money(15000));
        assert_eq!(summary.charges_total, money(15000));
        assert_eq!(summary.grand_total, money(15000));
    }
}
