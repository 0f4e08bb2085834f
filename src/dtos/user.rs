use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{PumpMaster, User, UserRole};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPumpMasterRequest {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_full_name: String,
    pub admin_mobile_number: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPumpMasterResponse {
    pub pump_master: PumpMaster,
    pub admin: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub mobile_number: Option<String>,
    pub role: UserRole,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub mobile_number: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: i64,
    pub user_id: Uuid,
    pub pump_master_id: Uuid,
    pub role: UserRole,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesmanRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub mobile_number: Option<String>,
}

impl From<CreateSalesmanRequest> for CreateUserRequest {
    fn from(req: CreateSalesmanRequest) -> Self {
        Self {
            username: req.username,
            password: req.password,
            full_name: req.full_name,
            mobile_number: req.mobile_number,
            role: UserRole::Salesman,
        }
    }
}
