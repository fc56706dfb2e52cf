// src/services/dashboard_service.rs

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::DashboardSummary,
    services::billing_service::BillingService,
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    billing: BillingService,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, billing: BillingService) -> Self {
        Self { repo, billing }
    }

    pub fn get_summary<'e, E>(&self, executor: E, tenant_id: Uuid) -> impl Future<Output = Result<DashboardSummary, AppError>> + Send
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let (month_start, month_end) = month_bounds(Utc::now().date_naive());

            let vehicles_by_status = self.repo.vehicles_by_status(&mut *conn, tenant_id).await?;
            let active_contracts = self.repo.active_contracts(&mut *conn, tenant_id).await?;
            let (pending_fines_count, pending_fines_amount) = self.repo.pending_fines(&mut *conn, tenant_id).await?;
            let month_costs = self.repo.costs_between(&mut *conn, tenant_id, month_start, month_end).await?;
            let month_revenue = self
                .billing
                .rental_revenue(&mut *conn, tenant_id, month_start, month_end)
                .await?;

            Ok(DashboardSummary {
                total_vehicles: vehicles_by_status.iter().map(|v| v.count).sum(),
                vehicles_by_status,
                active_contracts,
                pending_fines_count,
                pending_fines_amount,
                month_costs,
                month_revenue,
            })
        }
    }
}

/// Primeiro e último dia do mês da data.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let next_month = start
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(start);
    let end = next_month.pred_opt().unwrap_or(today);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_bounds_handle_month_lengths() {
        assert_eq!(month_bounds(d(2024, 2, 14)), (d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(month_bounds(d(2023, 2, 1)), (d(2023, 2, 1), d(2023, 2, 28)));
        assert_eq!(month_bounds(d(2024, 12, 31)), (d(2024, 12, 1), d(2024, 12, 31)));
    }
}
