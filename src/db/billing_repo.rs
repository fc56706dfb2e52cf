// src/db/billing_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::billing::{BillableContract, ContractCharges},
};

#[derive(Clone, Default)]
pub struct BillingRepository;

impl BillingRepository {
    pub fn new() -> Self {
        Self
    }

    /// Contratos ativos ou encerrados que tocam o período [from, to].
    pub async fn contracts_overlapping<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BillableContract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contracts = sqlx::query_as::<_, BillableContract>(
            r#"
            SELECT c.id AS contract_id, c.number, cu.name AS customer_name,
                   c.start_date, c.end_date, c.daily_rate, c.status,
                   (SELECT COUNT(*) FROM contract_vehicles cv WHERE cv.contract_id = c.id) AS vehicle_count
            FROM contracts c
            JOIN customers cu ON cu.id = c.customer_id
            WHERE c.tenant_id = $1
              AND c.status IN ('active', 'finished')
              AND c.start_date <= $3
              AND c.end_date >= $2
            ORDER BY c.number ASC
            "#,
        )
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;

        Ok(contracts)
    }

    /// Custos vinculados a contratos, lançados dentro do período.
    pub async fn charges_by_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ContractCharges>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charges = sqlx::query_as::<_, ContractCharges>(
            r#"
            SELECT k.contract_id, c.number, cu.name AS customer_name, c.status,
                   COALESCE(SUM(k.amount), 0) AS total
            FROM costs k
            JOIN contracts c ON c.id = k.contract_id
            JOIN customers cu ON cu.id = c.customer_id
            WHERE k.tenant_id = $1
              AND k.contract_id IS NOT NULL
              AND k.cost_date BETWEEN $2 AND $3
            GROUP BY k.contract_id, c.number, cu.name, c.status
            ORDER BY c.number
            "#,
        )
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;

        Ok(charges)
    }
}
