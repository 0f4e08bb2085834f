use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::dtos::bank_account::{is_valid_ifsc, CreateBankAccountRequest, UpdateBankAccountRequest};
use crate::dtos::common::{clean, require_max_len, require_text};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::bank_account::{BankAccount, BANK_ACCOUNT_COLUMNS};
use crate::state::AppState;

const DUPLICATE_ACCOUNT: &str = "Bank account number already exists";

fn normalize_ifsc(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_uppercase();
    if !is_valid_ifsc(&code) {
        return Err(AppError::validation("Invalid IFSC code"));
    }
    Ok(code)
}

pub async fn list_bank_accounts(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<BankAccount>>, AppError> {
    let accounts = sqlx::query_as::<_, BankAccount>(&format!(
        "SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts
         WHERE pump_master_id = $1
         ORDER BY is_active DESC, bank_name, account_number"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(accounts))
}

pub async fn get_bank_account(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<BankAccount>, AppError> {
    let account = sqlx::query_as::<_, BankAccount>(&format!(
        "SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Bank account not found"))?;

    Ok(Json(account))
}

pub async fn create_bank_account(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateBankAccountRequest>,
) -> Result<(StatusCode, Json<BankAccount>), AppError> {
    auth.require_manager("create bank accounts")?;
    require_text(&payload.account_holder_name, "Account holder name")?;
    require_text(&payload.account_number, "Account number")?;
    require_max_len(Some(payload.account_number.trim()), 20, "Account number")?;
    require_text(&payload.bank_name, "Bank name")?;
    let ifsc = normalize_ifsc(&payload.ifsc_code)?;

    let account = sqlx::query_as::<_, BankAccount>(&format!(
        "INSERT INTO bank_accounts
            (pump_master_id, account_holder_name, account_number, bank_name, ifsc_code,
             branch_name, opening_balance)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {BANK_ACCOUNT_COLUMNS}"
    ))
    .bind(auth.pump_master_id)
    .bind(payload.account_holder_name.trim())
    .bind(payload.account_number.trim())
    .bind(payload.bank_name.trim())
    .bind(ifsc)
    .bind(clean(payload.branch_name))
    .bind(payload.opening_balance)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_ACCOUNT))?;

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_bank_account(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBankAccountRequest>,
) -> Result<Json<BankAccount>, AppError> {
    auth.require_manager("update bank accounts")?;
    if let Some(name) = payload.account_holder_name.as_deref() {
        require_text(name, "Account holder name")?;
    }
    if let Some(bank) = payload.bank_name.as_deref() {
        require_text(bank, "Bank name")?;
    }
    let ifsc = payload.ifsc_code.as_deref().map(normalize_ifsc).transpose()?;

    let account = sqlx::query_as::<_, BankAccount>(&format!(
        "UPDATE bank_accounts SET
            account_holder_name = COALESCE($1, account_holder_name),
            bank_name = COALESCE($2, bank_name),
            ifsc_code = COALESCE($3, ifsc_code),
            branch_name = COALESCE($4, branch_name),
            opening_balance = COALESCE($5, opening_balance),
            is_active = COALESCE($6, is_active)
         WHERE id = $7 AND pump_master_id = $8
         RETURNING {BANK_ACCOUNT_COLUMNS}"
    ))
    .bind(payload.account_holder_name.map(|n| n.trim().to_string()))
    .bind(payload.bank_name.map(|b| b.trim().to_string()))
    .bind(ifsc)
    .bind(clean(payload.branch_name))
    .bind(payload.opening_balance)
    .bind(payload.is_active)
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Bank account not found"))?;

    Ok(Json(account))
}

pub async fn delete_bank_account(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete bank accounts")?;

    let result = sqlx::query("DELETE FROM bank_accounts WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Bank account is referenced by payments or expenses"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Bank account not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifsc_is_trimmed_and_uppercased() {
        assert_eq!(normalize_ifsc(" sbin0001234 ").unwrap(), "SBIN0001234");
        assert!(normalize_ifsc("SBIN1001234").is_err());
    }
}
