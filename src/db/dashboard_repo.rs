// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::VehicleStatusCount};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn vehicles_by_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<VehicleStatusCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, VehicleStatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM vehicles
            WHERE tenant_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn active_contracts<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contracts WHERE tenant_id = $1 AND status = 'active'",
        )
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    // (quantidade, valor) das multas pendentes
    pub async fn pending_fines<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<(i64, Decimal), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (i64, Decimal) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount), 0)
            FROM fines
            WHERE tenant_id = $1 AND status = 'pending'
            "#,
        )
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(row)
    }

    pub async fn costs_between<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM costs
            WHERE tenant_id = $1 AND cost_date BETWEEN $2 AND $3
            "#,
        )
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }
}
