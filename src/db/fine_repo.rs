// src/db/fine_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::fines::{Fine, FineFilter, FineStatus, FineStatusTotal, NewFine},
};

#[derive(Clone, Default)]
pub struct FineRepository;

impl FineRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewFine,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fine = sqlx::query_as::<_, Fine>(
            r#"
            INSERT INTO fines (
                tenant_id, vehicle_id, contract_id, customer_id, driver_id,
                infraction_date, infraction_time, infraction_code, description,
                location, amount, points, due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(input.vehicle_id)
            .bind(input.contract_id)
            .bind(input.customer_id)
            .bind(input.driver_id)
            .bind(input.infraction_date)
            .bind(input.infraction_time)
            .bind(input.infraction_code.as_deref())
            .bind(&input.description)
            .bind(input.location.as_deref())
            .bind(input.amount)
            .bind(input.points)
            .bind(input.due_date)
            .fetch_one(executor)
            .await?;

        Ok(fine)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Fine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fine = sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(fine)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &FineFilter,
    ) -> Result<Vec<Fine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT * FROM fines
            WHERE tenant_id = $1
              AND ($2::fine_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
              AND ($4::uuid IS NULL OR contract_id = $4)
            ORDER BY infraction_date DESC, created_at DESC
            "#,
        )
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.vehicle_id)
            .bind(filter.contract_id)
            .fetch_all(executor)
            .await?;

        Ok(fines)
    }

    pub async fn set_cost<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        cost_id: Option<Uuid>,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fine = sqlx::query_as::<_, Fine>(
            "UPDATE fines SET cost_id = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
            .bind(tenant_id)
            .bind(id)
            .bind(cost_id)
            .fetch_one(executor)
            .await?;

        Ok(fine)
    }

    pub async fn set_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        contract_id: Option<Uuid>,
        customer_id: Option<Uuid>,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fine = sqlx::query_as::<_, Fine>(
            r#"
            UPDATE fines SET contract_id = $3, customer_id = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(contract_id)
            .bind(customer_id)
            .fetch_one(executor)
            .await?;

        Ok(fine)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: FineStatus,
    ) -> Result<Fine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fine = sqlx::query_as::<_, Fine>(
            "UPDATE fines SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
            .bind(tenant_id)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await?;

        Ok(fine)
    }

    // fn_fines_statistics, parte 1: contagem e valor por status
    pub async fn totals_by_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<FineStatusTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, FineStatusTotal>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount
            FROM fines
            WHERE tenant_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(totals)
    }

    // fn_fines_statistics, parte 2: (pendentes vencidas, pontos das multas não canceladas)
    pub async fn overdue_and_points<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<(i64, i64), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending' AND due_date < CURRENT_DATE),
                COALESCE(SUM(points) FILTER (WHERE status <> 'cancelled'), 0)::bigint
            FROM fines
            WHERE tenant_id = $1
            "#,
        )
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(row)
    }
}
