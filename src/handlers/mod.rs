pub mod accounting;
pub mod absence;
pub mod bank_account;
pub mod bill;
pub mod customer;
pub mod expense;
pub mod file;
pub mod nozzle;
pub mod payment;
pub mod payroll;
pub mod product;
pub mod purchase;
pub mod report;
pub mod salesman;
pub mod shift;
pub mod supplier;
pub mod tank;
pub mod user;

use uuid::Uuid;

use crate::error::AppError;

/// Confirms a referenced row exists under the caller's pump master.
/// `table` is always a literal from this crate.
pub(crate) async fn ensure_exists<'e, E>(
    executor: E,
    table: &'static str,
    id: Uuid,
    pump_master_id: Uuid,
    label: &str,
) -> Result<(), AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    let found = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1 AND pump_master_id = $2)"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_one(executor)
    .await?;

    if found {
        Ok(())
    } else {
        Err(AppError::validation(format!("{label} not found")))
    }
}
