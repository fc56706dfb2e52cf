// src/db/vehicle_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::vehicles::{MileageSources, Vehicle, VehicleFilter, VehiclePayload, VehicleStatus},
};

#[derive(Clone, Default)]
pub struct VehicleRepository;

impl VehicleRepository {
    pub fn new() -> Self {
        Self
    }

    // `plate` já vem normalizada do serviço
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        plate: &str,
        input: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                tenant_id, plate, brand, model, year, color, renavam, chassis,
                status, current_mileage, acquisition_date, acquisition_value, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'available'::vehicle_status), $10, $11, $12, $13)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(plate)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(input.year)
            .bind(input.color.as_deref())
            .bind(input.renavam.as_deref())
            .bind(input.chassis.as_deref())
            .bind(input.status)
            .bind(input.current_mileage.unwrap_or(0))
            .bind(input.acquisition_date)
            .bind(input.acquisition_value)
            .bind(input.notes.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation(format!("placa {}", plate))))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &VehicleFilter,
    ) -> Result<Vec<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (search, plate_search) = filter.search_patterns().unzip();

        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE tenant_id = $1
              AND ($2::vehicle_status IS NULL OR status = $2)
              AND ($3::text IS NULL
                   OR plate ILIKE $4 ESCAPE '\'
                   OR model ILIKE $3 ESCAPE '\'
                   OR brand ILIKE $3 ESCAPE '\')
            ORDER BY plate ASC
            "#,
        )
            .bind(tenant_id)
            .bind(filter.status)
            .bind(search)
            .bind(plate_search)
            .fetch_all(executor)
            .await?;

        Ok(vehicles)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(vehicle)
    }

    pub async fn find_many<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE tenant_id = $1 AND id = ANY($2) ORDER BY plate",
        )
            .bind(tenant_id)
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(vehicles)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        plate: &str,
        input: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles SET
                plate = $3, brand = $4, model = $5, year = $6, color = $7,
                renavam = $8, chassis = $9,
                status = COALESCE($10, status),
                current_mileage = COALESCE($11, current_mileage),
                acquisition_date = $12, acquisition_value = $13, notes = $14,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(plate)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(input.year)
            .bind(input.color.as_deref())
            .bind(input.renavam.as_deref())
            .bind(input.chassis.as_deref())
            .bind(input.status)
            .bind(input.current_mileage)
            .bind(input.acquisition_date)
            .bind(input.acquisition_value)
            .bind(input.notes.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation(format!("placa {}", plate))))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: VehicleStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE vehicles SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = ANY($2)",
        )
            .bind(tenant_id)
            .bind(ids)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Só avança o hodômetro: leituras menores são ignoradas aqui (o serviço decide se é erro).
    pub async fn bump_mileage<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        mileage: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE vehicles
            SET current_mileage = GREATEST(current_mileage, $3), updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(mileage)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Leituras de hodômetro por fonte: cadastro, abastecimentos e devoluções de contrato.
    pub async fn mileage_sources<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<MileageSources>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sources = sqlx::query_as::<_, MileageSources>(MILEAGE_SOURCES_SQL)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(sources)
    }
}

// Do contrato só conta a hodometragem de devolução.
const MILEAGE_SOURCES_SQL: &str = r#"
    SELECT
        v.current_mileage AS registry,
        (SELECT MAX(f.odometer) FROM fuel_logs f
          WHERE f.tenant_id = v.tenant_id AND f.vehicle_id = v.id) AS fuel_log,
        (SELECT MAX(cv.return_mileage) FROM contract_vehicles cv
          WHERE cv.tenant_id = v.tenant_id AND cv.vehicle_id = v.id) AS contract
    FROM vehicles v
    WHERE v.tenant_id = $1 AND v.id = $2
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_mileage_comes_from_returns_only() {
        assert!(MILEAGE_SOURCES_SQL.contains("MAX(cv.return_mileage)"));
        assert!(!MILEAGE_SOURCES_SQL.contains("pickup_mileage"));
    }
}
