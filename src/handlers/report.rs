use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::domain::profit::{summarize, ProductActivity};
use crate::dtos::common::DateRangeQuery;
use crate::dtos::report::ProfitReportResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

#[derive(sqlx::FromRow)]
struct ProductActivityRow {
    product_id: Uuid,
    product_name: String,
    quantity_sold: f64,
    sales_amount: f64,
    purchased_quantity: f64,
    purchased_amount: f64,
}

impl From<ProductActivityRow> for ProductActivity {
    fn from(row: ProductActivityRow) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity_sold: row.quantity_sold,
            sales_amount: row.sales_amount,
            purchased_quantity: row.purchased_quantity,
            purchased_amount: row.purchased_amount,
        }
    }
}

// GET /profit-reports?from&to
#[instrument(skip_all)]
pub async fn get_profit_report(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ProfitReportResponse>, AppError> {
    auth.require_manager("view profit reports")?;
    let (from, to) = range.require_both()?;

    // Sales from closed shifts in the window; cost from all purchases up to its end
    let activity = match sqlx::query_as::<_, ProductActivityRow>(
        "SELECT p.id AS product_id, p.product_name,
                s.quantity_sold::FLOAT8                   AS quantity_sold,
                s.sales_amount::FLOAT8                    AS sales_amount,
                COALESCE(pu.quantity, 0)::FLOAT8          AS purchased_quantity,
                COALESCE(pu.amount, 0)::FLOAT8            AS purchased_amount
         FROM products p
         JOIN (
             SELECT product_id,
                    SUM(closing_reading - opening_reading)                AS quantity_sold,
                    SUM((closing_reading - opening_reading) * product_rate) AS sales_amount
             FROM salesman_nozzle_shifts
             WHERE pump_master_id = $1
               AND status = 'CLOSED'
               AND start_datetime::DATE BETWEEN $2 AND $3
             GROUP BY product_id
         ) s ON s.product_id = p.id
         LEFT JOIN (
             SELECT product_id, SUM(quantity) AS quantity, SUM(amount) AS amount
             FROM purchases
             WHERE pump_master_id = $1 AND purchase_date <= $3
             GROUP BY product_id
         ) pu ON pu.product_id = p.id
         WHERE p.pump_master_id = $1
         ORDER BY p.product_name",
    )
    .bind(auth.pump_master_id)
    .bind(from)
    .bind(to)
    .fetch_all(&db_pool)
    .await
    {
        Ok(rows) => rows.into_iter().map(ProductActivity::from).collect::<Vec<_>>(),
        Err(e) => {
            error!(?e, "Failed to load product activity");
            return Err(e.into());
        }
    };

    let total_expenses = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(amount), 0)::FLOAT8
         FROM expenses
         WHERE pump_master_id = $1 AND expense_date BETWEEN $2 AND $3",
    )
    .bind(auth.pump_master_id)
    .bind(from)
    .bind(to)
    .fetch_one(&db_pool)
    .await?;

    Ok(Json(ProfitReportResponse {
        from,
        to,
        summary: summarize(&activity, total_expenses),
    }))
}
