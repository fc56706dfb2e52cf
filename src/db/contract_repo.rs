// src/db/contract_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::contracts::{Booking, Contract, ContractFilter, ContractStatus, ContractVehicle, ContractWindow},
};

#[derive(Clone, Default)]
pub struct ContractRepository;

impl ContractRepository {
    pub fn new() -> Self {
        Self
    }

    /// Próximo número de contrato da empresa. O advisory lock vale até o fim da transação
    /// e impede que duas criações simultâneas peguem o mesmo número.
    pub async fn next_number(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<i32, AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?;

        let number = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM contracts WHERE tenant_id = $1",
        )
            .bind(tenant_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(number)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        number: i32,
        customer_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        daily_rate: Decimal,
        deposit: Decimal,
        status: ContractStatus,
        notes: Option<&str>,
    ) -> Result<Contract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (
                tenant_id, number, customer_id, start_date, end_date,
                daily_rate, deposit, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(number)
            .bind(customer_id)
            .bind(start_date)
            .bind(end_date)
            .bind(daily_rate)
            .bind(deposit)
            .bind(status)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(contract)
    }

    pub async fn add_vehicle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
        vehicle_id: Uuid,
        pickup_mileage: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO contract_vehicles (tenant_id, contract_id, vehicle_id, pickup_mileage)
            VALUES ($1, $2, $3, $4)
            "#,
        )
            .bind(tenant_id)
            .bind(contract_id)
            .bind(vehicle_id)
            .bind(pickup_mileage)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Contract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            "SELECT * FROM contracts WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(contract)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &ContractFilter,
    ) -> Result<Vec<Contract>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contracts = sqlx::query_as::<_, Contract>(
            r#"
            SELECT c.* FROM contracts c
            WHERE c.tenant_id = $1
              AND ($2::contract_status IS NULL OR c.status = $2)
              AND ($3::uuid IS NULL OR c.customer_id = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM contract_vehicles cv
                    WHERE cv.contract_id = c.id AND cv.vehicle_id = $4))
            ORDER BY c.number DESC
            "#,
        )
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.customer_id)
            .bind(filter.vehicle_id)
            .fetch_all(executor)
            .await?;

        Ok(contracts)
    }

    pub async fn vehicles_for<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
    ) -> Result<Vec<ContractVehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicles = sqlx::query_as::<_, ContractVehicle>(
            r#"
            SELECT cv.contract_id, cv.vehicle_id, v.plate, cv.pickup_mileage, cv.return_mileage
            FROM contract_vehicles cv
            JOIN vehicles v ON v.id = cv.vehicle_id
            WHERE cv.tenant_id = $1 AND cv.contract_id = $2
            ORDER BY v.plate
            "#,
        )
            .bind(tenant_id)
            .bind(contract_id)
            .fetch_all(executor)
            .await?;

        Ok(vehicles)
    }

    pub async fn customer_name<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM customers WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Cliente {}", customer_id)))?;

        Ok(name)
    }

    /// Trava as linhas dos veículos até o fim da transação. Duas reservas
    /// concorrentes do mesmo veículo ficam em fila aqui.
    pub async fn lock_vehicles<'e, E>(&self, executor: E, tenant_id: Uuid, vehicle_ids: &[Uuid]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT id FROM vehicles WHERE tenant_id = $1 AND id = ANY($2) ORDER BY id FOR UPDATE")
            .bind(tenant_id)
            .bind(vehicle_ids)
            .fetch_all(executor)
            .await?;

        Ok(())
    }

    /// Reservas em aberto (rascunho ou ativo) dos veículos que terminam a partir de `from`.
    pub async fn open_bookings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vehicle_ids: &[Uuid],
        from: NaiveDate,
    ) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT c.id AS contract_id, cv.vehicle_id, v.plate, c.start_date, c.end_date, c.status
            FROM contract_vehicles cv
            JOIN contracts c ON c.id = cv.contract_id
            JOIN vehicles v ON v.id = cv.vehicle_id
            WHERE cv.tenant_id = $1
              AND cv.vehicle_id = ANY($2)
              AND c.status IN ('draft', 'active')
              AND c.end_date >= $3
            "#,
        )
            .bind(tenant_id)
            .bind(vehicle_ids)
            .bind(from)
            .fetch_all(executor)
            .await?;

        Ok(bookings)
    }

    /// Quais de `vehicle_ids` estão em outro contrato ativo além de `contract_id`.
    pub async fn held_by_other_active<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
        vehicle_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT cv.vehicle_id
            FROM contract_vehicles cv
            JOIN contracts c ON c.id = cv.contract_id
            WHERE cv.tenant_id = $1
              AND cv.vehicle_id = ANY($3)
              AND c.id <> $2
              AND c.status = 'active'
            "#,
        )
            .bind(tenant_id)
            .bind(contract_id)
            .bind(vehicle_ids)
            .fetch_all(executor)
            .await?;

        Ok(ids)
    }

    /// Contratos ativos ou encerrados do veículo que cobrem a data.
    pub async fn windows_covering<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        vehicle_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ContractWindow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let windows = sqlx::query_as::<_, ContractWindow>(
            r#"
            SELECT c.id AS contract_id, c.customer_id, c.start_date, c.end_date, c.status
            FROM contracts c
            JOIN contract_vehicles cv ON cv.contract_id = c.id
            WHERE c.tenant_id = $1
              AND cv.vehicle_id = $2
              AND c.status IN ('active', 'finished')
              AND c.start_date <= $3
              AND c.end_date >= $3
            "#,
        )
            .bind(tenant_id)
            .bind(vehicle_id)
            .bind(date)
            .fetch_all(executor)
            .await?;

        Ok(windows)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: ContractStatus,
    ) -> Result<Contract, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contract = sqlx::query_as::<_, Contract>(
            "UPDATE contracts SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
            .bind(tenant_id)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await?;

        Ok(contract)
    }

    pub async fn set_return_mileage<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        contract_id: Uuid,
        vehicle_id: Uuid,
        return_mileage: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE contract_vehicles SET return_mileage = $4
            WHERE tenant_id = $1 AND contract_id = $2 AND vehicle_id = $3
            "#,
        )
            .bind(tenant_id)
            .bind(contract_id)
            .bind(vehicle_id)
            .bind(return_mileage)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
