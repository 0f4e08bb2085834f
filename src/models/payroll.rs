use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::payroll::{AbsenceType, SalaryType};

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSalaryConfig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_full_name: String,
    pub salary_type: SalaryType,
    pub base_salary: f64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const SALARY_CONFIG_SELECT: &str = "SELECT sc.id, sc.user_id, u.full_name AS user_full_name,
        sc.salary_type,
        sc.base_salary::FLOAT8 AS base_salary,
        sc.effective_from, sc.effective_to, sc.is_active, sc.notes, sc.created_at
     FROM employee_salary_configs sc
     JOIN users u ON u.id = sc.user_id";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAbsence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_full_name: String,
    pub absence_date: NaiveDate,
    pub absence_type: AbsenceType,
    pub reason: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

pub const ABSENCE_SELECT: &str = "SELECT a.id, a.user_id, u.full_name AS user_full_name,
        a.absence_date, a.absence_type, a.reason, a.is_approved, a.created_at
     FROM user_absences a
     JOIN users u ON u.id = a.user_id";
