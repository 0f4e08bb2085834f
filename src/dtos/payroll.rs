use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payroll::{AbsenceType, PayrollLine, SalaryType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalaryConfigRequest {
    pub user_id: Uuid,
    pub salary_type: SalaryType,
    pub base_salary: f64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalaryConfigRequest {
    pub salary_type: Option<SalaryType>,
    pub base_salary: Option<f64>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollEntry {
    pub user_id: Uuid,
    pub user_full_name: String,
    pub salary_config_id: Uuid,
    pub salary_type: SalaryType,
    pub base_salary: f64,
    #[serde(flatten)]
    pub line: PayrollLine,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub entries: Vec<PayrollEntry>,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAbsenceRequest {
    pub user_id: Uuid,
    pub absence_date: NaiveDate,
    pub absence_type: AbsenceType,
    pub reason: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAbsenceRequest {
    pub absence_type: Option<AbsenceType>,
    pub reason: Option<String>,
    pub is_approved: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
