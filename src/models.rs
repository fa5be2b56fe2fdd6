use chrono::NaiveDate;
use serde::Serialize;

/// Uniform response shape for every answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,
    pub suggestions: Vec<String>,
    pub ask_staff: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_note: Option<String>,
}

impl Answer {
    pub fn new(answer: impl Into<String>, suggestions: &[&str]) -> Self {
        Answer {
            answer: answer.into(),
            data: None,
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            ask_staff: false,
            next_step: None,
            data_note: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRiskRow {
    pub title: String,
    pub school_name: Option<String>,
    pub delay_days: i64,
    pub vendor_name: Option<String>,
    pub current_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverBudgetRow {
    pub title: String,
    pub school_name: Option<String>,
    pub budget_variance_pct: f64,
    pub over_amount: f64,
    pub vendor_name: Option<String>,
    pub current_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorFlagRow {
    pub vendor_name: String,
    pub project_count: i64,
    pub delayed_count: i64,
    pub over_budget_count: i64,
    pub total_value: f64,
}

/// Combined counts behind the "anything to worry about?" answer.
#[derive(Debug, Clone, Serialize)]
pub struct RiskCounts {
    pub delayed_count: i64,
    pub delayed_value: f64,
    pub over_budget_count: i64,
    pub overage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioTotals {
    pub total_budget: f64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LargestProjectRow {
    pub title: String,
    pub school_name: Option<String>,
    pub current_amount: f64,
    pub vendor_name: Option<String>,
    pub status: String,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub total_projects: i64,
    pub active: i64,
    pub completed: i64,
    pub total_budget: f64,
    pub total_spent: f64,
    pub delayed: i64,
    pub over_budget: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorSummaryRow {
    pub vendor_name: String,
    pub project_count: i64,
    pub total_value: f64,
    pub delayed_count: i64,
    pub avg_progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolRow {
    pub school_name: String,
    pub project_count: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    pub surtax_category: String,
    pub project_count: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRow {
    pub title: String,
    pub school_name: Option<String>,
    pub current_end_date: NaiveDate,
    pub percent_complete: f64,
    pub current_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub title: String,
    pub school_name: Option<String>,
    pub vendor_name: Option<String>,
    pub status: String,
    pub current_amount: f64,
    pub percent_complete: f64,
    pub is_delayed: bool,
    pub delay_days: i64,
    pub is_over_budget: bool,
    pub budget_variance_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetTrend {
    pub total: i64,
    pub increased: i64,
    pub avg_change_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDelayPattern {
    pub surtax_category: String,
    pub total: i64,
    pub delayed: i64,
    pub avg_delay_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorRates {
    pub vendor_name: String,
    pub project_count: i64,
    pub delay_rate: f64,
    pub over_budget_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEfficiency {
    pub surtax_category: String,
    pub total_budget: f64,
    pub total_spent: f64,
    pub avg_progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveProgress {
    pub total_budget: f64,
    pub total_spent: f64,
    pub avg_progress: f64,
}
