// src/db/fuel_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::fuel::{FuelLog, FuelLogFilter, NewFuelLog},
};

#[derive(Clone, Default)]
pub struct FuelRepository;

impl FuelRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewFuelLog,
    ) -> Result<FuelLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, FuelLog>(
            r#"
            INSERT INTO fuel_logs (
                tenant_id, vehicle_id, driver_id, fuel_date, liters, price_per_liter,
                total_amount, odometer, station, fuel_type, full_tank
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(input.vehicle_id)
            .bind(input.driver_id)
            .bind(input.fuel_date)
            .bind(input.liters)
            .bind(input.price_per_liter)
            .bind(input.total_amount)
            .bind(input.odometer)
            .bind(input.station.as_deref())
            .bind(input.fuel_type)
            .bind(input.full_tank)
            .fetch_one(executor)
            .await?;

        Ok(log)
    }

    pub async fn set_cost<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        cost_id: Uuid,
    ) -> Result<FuelLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, FuelLog>(
            "UPDATE fuel_logs SET cost_id = $3 WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
            .bind(tenant_id)
            .bind(id)
            .bind(cost_id)
            .fetch_one(executor)
            .await?;

        Ok(log)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<FuelLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, FuelLog>("SELECT * FROM fuel_logs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(log)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &FuelLogFilter,
    ) -> Result<Vec<FuelLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let logs = sqlx::query_as::<_, FuelLog>(
            r#"
            SELECT * FROM fuel_logs
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::date IS NULL OR fuel_date >= $3)
              AND ($4::date IS NULL OR fuel_date <= $4)
            ORDER BY fuel_date DESC, odometer DESC
            "#,
        )
            .bind(tenant_id)
            .bind(filter.vehicle_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(executor)
            .await?;

        Ok(logs)
    }

    /// Maior hodômetro já registrado em abastecimentos do veículo.
    pub async fn max_odometer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let max = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(odometer) FROM fuel_logs WHERE tenant_id = $1 AND vehicle_id = $2",
        )
            .bind(tenant_id)
            .bind(vehicle_id)
            .fetch_one(executor)
            .await?;

        Ok(max)
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM fuel_logs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
