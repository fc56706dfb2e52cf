// src/db/cost_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::costs::{CategoryTotal, Cost, CostFilter, CostUpdate, NewCost, VehicleCostTotal},
};

#[derive(Clone, Default)]
pub struct CostRepository;

impl CostRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewCost,
    ) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>(
            r#"
            INSERT INTO costs (
                tenant_id, vehicle_id, contract_id, category, description,
                amount, cost_date, origin, source_id, is_paid, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(input.vehicle_id)
            .bind(input.contract_id)
            .bind(input.category)
            .bind(&input.description)
            .bind(input.amount)
            .bind(input.cost_date)
            .bind(input.origin)
            .bind(input.source_id)
            .bind(input.is_paid)
            .bind(input.notes.as_deref())
            .fetch_one(executor)
            .await?;

        Ok(cost)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>("SELECT * FROM costs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(cost)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &CostFilter,
    ) -> Result<Vec<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let costs = sqlx::query_as::<_, Cost>(
            r#"
            SELECT * FROM costs
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::uuid IS NULL OR contract_id = $3)
              AND ($4::cost_category IS NULL OR category = $4)
              AND ($5::date IS NULL OR cost_date >= $5)
              AND ($6::date IS NULL OR cost_date <= $6)
            ORDER BY cost_date DESC, created_at DESC
            "#,
        )
            .bind(tenant_id)
            .bind(filter.vehicle_id)
            .bind(filter.contract_id)
            .bind(filter.category)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(executor)
            .await?;

        Ok(costs)
    }

    pub async fn list_by_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
    ) -> Result<Vec<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let costs = sqlx::query_as::<_, Cost>(
            "SELECT * FROM costs WHERE tenant_id = $1 AND contract_id = $2 ORDER BY cost_date ASC",
        )
            .bind(tenant_id)
            .bind(contract_id)
            .fetch_all(executor)
            .await?;

        Ok(costs)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &CostUpdate,
    ) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>(
            r#"
            UPDATE costs SET
                vehicle_id = COALESCE($3, vehicle_id),
                contract_id = COALESCE($4, contract_id),
                category = COALESCE($5, category),
                description = COALESCE($6, description),
                amount = COALESCE($7, amount),
                cost_date = COALESCE($8, cost_date),
                is_paid = COALESCE($9, is_paid),
                notes = COALESCE($10, notes),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(input.vehicle_id)
            .bind(input.contract_id)
            .bind(input.category)
            .bind(input.description.as_deref())
            .bind(input.amount)
            .bind(input.cost_date)
            .bind(input.is_paid)
            .bind(input.notes.as_deref())
            .fetch_one(executor)
            .await?;

        Ok(cost)
    }

    /// Atualiza o vínculo de contrato de um custo automático (ex.: multa recasada).
    pub async fn set_contract<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        contract_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE costs SET contract_id = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .bind(contract_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM costs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn totals_by_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM costs
            WHERE tenant_id = $1
              AND ($2::date IS NULL OR cost_date >= $2)
              AND ($3::date IS NULL OR cost_date <= $3)
            GROUP BY category
            ORDER BY total DESC
            "#,
        )
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;

        Ok(totals)
    }

    pub async fn totals_by_vehicle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<VehicleCostTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, VehicleCostTotal>(
            r#"
            SELECT c.vehicle_id, v.plate, COUNT(*) AS count, COALESCE(SUM(c.amount), 0) AS total
            FROM costs c
            JOIN vehicles v ON v.id = c.vehicle_id
            WHERE c.tenant_id = $1
              AND ($2::date IS NULL OR c.cost_date >= $2)
              AND ($3::date IS NULL OR c.cost_date <= $3)
            GROUP BY c.vehicle_id, v.plate
            ORDER BY total DESC
            "#,
        )
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;

        Ok(totals)
    }
}
