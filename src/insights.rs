use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::format;
use crate::models::{
    ActiveProgress, BudgetTrend, CategoryDelayPattern, CategoryEfficiency, VendorRates,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// One dashboard insight card.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: &'static str,
    pub title: String,
    pub detail: String,
    pub severity: Severity,
}

/// Run every portfolio analyzer and collect the insights whose threshold
/// fired. Read-only; a failed query fails the whole batch.
pub async fn generate_insights(pool: &SqlitePool) -> anyhow::Result<Vec<Insight>> {
    let mut insights = Vec::new();

    if let Some(insight) = budget_trend_insight(&db::fetch_budget_trend(pool).await?) {
        insights.push(insight);
    }
    if let Some(insight) = db::fetch_worst_delay_category(pool)
        .await?
        .and_then(|row| delay_pattern_insight(&row))
    {
        insights.push(insight);
    }
    if let Some(insight) = db::fetch_worst_vendor_rates(pool)
        .await?
        .and_then(|row| vendor_performance_insight(&row))
    {
        insights.push(insight);
    }
    if let Some(insight) = category_efficiency_insight(&db::fetch_category_efficiency(pool).await?)
    {
        insights.push(insight);
    }
    if let Some(insight) = spending_progress_insight(&db::fetch_active_progress(pool).await?) {
        insights.push(insight);
    }

    Ok(insights)
}

/// Fires when more than half of the projects grew past their original award.
pub fn budget_trend_insight(trend: &BudgetTrend) -> Option<Insight> {
    if trend.total == 0 {
        return None;
    }

    let pct_increased = trend.increased as f64 / trend.total as f64 * 100.0;
    if pct_increased <= 50.0 {
        return None;
    }

    Some(Insight {
        kind: "trend",
        title: "Budget Increases Common".to_string(),
        detail: format!(
            "{} of projects have seen budget increases, averaging {} above \
             original estimates. Consider building larger contingencies into \
             initial budgets.",
            format::percent_whole(pct_increased),
            format::percent(trend.avg_change_pct),
        ),
        severity: if trend.avg_change_pct > 10.0 {
            Severity::Warning
        } else {
            Severity::Info
        },
    })
}

/// Fires when the worst category's delay rate passes 30%.
pub fn delay_pattern_insight(pattern: &CategoryDelayPattern) -> Option<Insight> {
    if pattern.delayed == 0 || pattern.total == 0 {
        return None;
    }

    let delay_rate = pattern.delayed as f64 / pattern.total as f64 * 100.0;
    if delay_rate <= 30.0 {
        return None;
    }

    Some(Insight {
        kind: "pattern",
        title: format!("Delays Common in {}", pattern.surtax_category),
        detail: format!(
            "{} of {} projects are delayed, averaging {:.0} days. Consider \
             additional schedule buffer for this category.",
            format::percent_whole(delay_rate),
            pattern.surtax_category,
            pattern.avg_delay_days,
        ),
        severity: Severity::Warning,
    })
}

/// Fires when a vendor with at least two projects is delayed or over budget
/// on more than half of them.
pub fn vendor_performance_insight(rates: &VendorRates) -> Option<Insight> {
    if rates.delay_rate <= 50.0 && rates.over_budget_rate <= 50.0 {
        return None;
    }

    Some(Insight {
        kind: "vendor",
        title: "Vendor Performance Concern".to_string(),
        detail: format!(
            "{} has a {} delay rate and {} over-budget rate across {} \
             projects. Review performance before future awards.",
            rates.vendor_name,
            format::percent_whole(rates.delay_rate),
            format::percent_whole(rates.over_budget_rate),
            rates.project_count,
        ),
        severity: Severity::Critical,
    })
}

/// Highlights the category making the most progress per dollar spent.
/// Only categories past 10% spend count, and the best ratio must beat 1.2.
pub fn category_efficiency_insight(categories: &[CategoryEfficiency]) -> Option<Insight> {
    let mut best: Option<(&CategoryEfficiency, f64, f64)> = None;

    for category in categories {
        if category.total_budget <= 0.0 {
            continue;
        }
        let spend_rate = category.total_spent / category.total_budget * 100.0;
        if spend_rate <= 10.0 {
            continue;
        }
        let efficiency = category.avg_progress / spend_rate;
        if best.map_or(true, |(_, _, best_eff)| efficiency > best_eff) {
            best = Some((category, spend_rate, efficiency));
        }
    }

    let (category, spend_rate, efficiency) = best?;
    if efficiency <= 1.2 {
        return None;
    }

    Some(Insight {
        kind: "efficiency",
        title: format!("{} Most Efficient", category.surtax_category),
        detail: format!(
            "{} projects show the best efficiency, achieving {} completion \
             with {} of budget spent.",
            category.surtax_category,
            format::percent_whole(category.avg_progress),
            format::percent_whole(spend_rate),
        ),
        severity: Severity::Success,
    })
}

/// Compares active-portfolio spend rate against average completion.
pub fn spending_progress_insight(progress: &ActiveProgress) -> Option<Insight> {
    if progress.total_budget <= 0.0 {
        return None;
    }

    let spend_rate = progress.total_spent / progress.total_budget * 100.0;

    if spend_rate > progress.avg_progress + 20.0 {
        return Some(Insight {
            kind: "efficiency",
            title: "Spending Outpacing Progress".to_string(),
            detail: format!(
                "Active projects are {} through budget but only {} complete. \
                 This may indicate cost overruns developing.",
                format::percent_whole(spend_rate),
                format::percent_whole(progress.avg_progress),
            ),
            severity: Severity::Warning,
        });
    }

    if progress.avg_progress > spend_rate + 10.0 {
        return Some(Insight {
            kind: "efficiency",
            title: "Good Cost Control".to_string(),
            detail: format!(
                "Active projects are {} complete with only {} of budget \
                 spent. Projects are tracking efficiently.",
                format::percent_whole(progress.avg_progress),
                format::percent_whole(spend_rate),
            ),
            severity: Severity::Success,
        });
    }

    None
}
