use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::profit::ProfitSummary;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitReportResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub summary: ProfitSummary,
}
