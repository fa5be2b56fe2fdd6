use anyhow::bail;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::format;
use crate::intent::{self, Intent};
use crate::models::Answer;

/// Answer a free-text question about the surtax portfolio.
///
/// Pure request/response: classification picks a handler, the handler runs
/// its read-only aggregations and formats the reply. No state is kept
/// between calls and query failures propagate unchanged, so the caller owns
/// the uniform error response. `today` anchors any date-window answer.
pub async fn answer_question(
    pool: &SqlitePool,
    question: &str,
    today: NaiveDate,
) -> anyhow::Result<Answer> {
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }

    match intent::classify(question) {
        Intent::ScheduleRisk => schedule_risks(pool).await,
        Intent::OverBudget => over_budget_alerts(pool).await,
        Intent::VendorRedFlags => vendor_red_flags(pool).await,
        Intent::Concerns => concerns(pool).await,
        Intent::RemainingBudget => remaining_budget(pool).await,
        Intent::LargestProjects => largest_projects(pool).await,
        Intent::BudgetSummary => budget_summary(pool).await,
        Intent::TopVendor => top_vendor(pool).await,
        Intent::SchoolsByProjects => schools_by_projects(pool).await,
        Intent::CategorySplit => category_split(pool).await,
        Intent::UpcomingCompletions => upcoming_completions(pool, today).await,
        Intent::VendorQuery => vendor_query(pool).await,
        Intent::SpecificProject => specific_project(pool).await,
        Intent::Fallback => Ok(help()),
    }
}

fn to_data<T: Serialize>(rows: &[T]) -> anyhow::Result<Vec<serde_json::Value>> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(Into::into))
        .collect()
}

async fn schedule_risks(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_schedule_risks(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "**No projects** are currently more than 30 days behind schedule. \
             All major milestones on track.",
            &[
                "Show budget status",
                "Any over budget projects?",
                "Top 5 largest projects",
            ],
        ));
    }

    let total_value: f64 = rows.iter().map(|r| r.current_amount).sum();
    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            format!(
                "- **{}** at {}: {} days late (Vendor: {})",
                format::truncate(&r.title, 35),
                r.school_name.as_deref().unwrap_or("N/A"),
                r.delay_days,
                r.vendor_name.as_deref().unwrap_or("TBD"),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**{} projects** are 30+ days behind schedule, totaling **{}** at risk.\n\n{}",
            rows.len(),
            format::currency(total_value),
            lines.join("\n"),
        ),
        &[
            "Why is the most delayed project late?",
            "Which vendors have delays?",
            "Show all delayed projects",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    answer.ask_staff = true;
    answer.next_step = Some("Request status update from contractors on these projects".into());
    answer.data_note = Some("Delay days calculated from original completion date".into());
    Ok(answer)
}

async fn over_budget_alerts(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_over_budget(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "**All projects** are currently within budget. No cost overruns to report.",
            &["Show schedule risks", "Budget summary", "Upcoming completions"],
        ));
    }

    let total_overage: f64 = rows.iter().map(|r| r.over_amount).sum();
    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            format!(
                "- **{}**: +{} ({} over)",
                format::truncate(&r.title, 35),
                format::percent(r.budget_variance_pct),
                format::currency(r.over_amount),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**{} projects** are over budget by a combined **{}**.\n\n{}",
            rows.len(),
            format::currency(total_overage),
            lines.join("\n"),
        ),
        &[
            "What caused the overruns?",
            "Which vendors are over budget?",
            "Show change orders",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    answer.ask_staff = true;
    answer.next_step = Some("Review change orders and approve/deny pending requests".into());
    answer.data_note = Some("Variance calculated against original contract amount".into());
    Ok(answer)
}

async fn vendor_red_flags(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_vendor_red_flags(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "**No vendor red flags** at this time. All contractors performing \
             within acceptable parameters.",
            &["Top vendors by value", "Show all vendors", "Budget summary"],
        ));
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            let mut issues = Vec::new();
            if r.delayed_count > 0 {
                issues.push(format!("{} delayed", r.delayed_count));
            }
            if r.over_budget_count > 0 {
                issues.push(format!("{} over budget", r.over_budget_count));
            }
            format!(
                "- **{}**: {} out of {} projects ({} total)",
                r.vendor_name,
                issues.join(", "),
                r.project_count,
                format::currency(r.total_value),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**{} vendors** have performance issues:\n\n{}",
            rows.len(),
            lines.join("\n"),
        ),
        &[
            "Show vendor details",
            "Which projects are affected?",
            "Vendor performance history",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    answer.ask_staff = true;
    answer.next_step = Some("Schedule performance review meetings with flagged vendors".into());
    Ok(answer)
}

async fn concerns(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let counts = db::fetch_risk_counts(pool).await?;

    let mut issues = Vec::new();
    if counts.delayed_count > 0 {
        issues.push(format!(
            "- **{} delayed projects** worth {}",
            counts.delayed_count,
            format::currency(counts.delayed_value),
        ));
    }
    if counts.over_budget_count > 0 {
        issues.push(format!(
            "- **{} over budget** by {} combined",
            counts.over_budget_count,
            format::currency(counts.overage),
        ));
    }

    if issues.is_empty() {
        return Ok(Answer::new(
            "**Portfolio looks healthy.** No major delays or budget overruns to report.",
            &["Budget summary", "Upcoming completions", "Top vendors"],
        ));
    }

    let mut answer = Answer::new(
        format!("**Items requiring attention:**\n\n{}", issues.join("\n")),
        &[
            "Show delayed projects",
            "Show over budget projects",
            "Vendor red flags",
        ],
    );
    answer.ask_staff = true;
    answer.next_step = Some("Review flagged items before next committee meeting".into());
    Ok(answer)
}

async fn remaining_budget(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let totals = db::fetch_portfolio_totals(pool).await?;

    if totals.total_budget <= 0.0 {
        return Ok(Answer::new(
            "Unable to calculate remaining budget.",
            &["Show all projects"],
        ));
    }

    let remaining = totals.total_budget - totals.total_spent;
    let pct_remaining = remaining / totals.total_budget * 100.0;
    let pct_spent = 100.0 - pct_remaining;

    let mut answer = Answer::new(
        format!(
            "**{}** remaining to spend ({} of total budget).\n\n\
             - Total Budget: {}\n\
             - Spent to Date: {} ({})",
            format::currency(remaining),
            format::percent(pct_remaining),
            format::currency(totals.total_budget),
            format::currency(totals.total_spent),
            format::percent(pct_spent),
        ),
        &[
            "Spending by category",
            "Upcoming completions",
            "Show largest projects",
        ],
    );
    answer.data_note = Some("Based on contract values and payment records".into());
    Ok(answer)
}

async fn largest_projects(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_largest_projects(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new("No projects found.", &["Show all projects"]));
    }

    let total: f64 = rows.iter().map(|r| r.current_amount).sum();
    let lines: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. **{}**: {} ({} complete)",
                i + 1,
                format::truncate(&r.title, 40),
                format::currency(r.current_amount),
                format::percent_whole(r.percent_complete),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**Top 5 projects** total **{}**:\n\n{}",
            format::currency(total),
            lines.join("\n"),
        ),
        &[
            "Show project details",
            "Any of these delayed?",
            "Show by category",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    Ok(answer)
}

async fn budget_summary(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let summary = db::fetch_portfolio_summary(pool).await?;

    if summary.total_projects == 0 {
        return Ok(Answer::new(
            "No budget data available.",
            &["Show all projects"],
        ));
    }

    let spent_pct = if summary.total_budget > 0.0 {
        summary.total_spent / summary.total_budget * 100.0
    } else {
        0.0
    };

    Ok(Answer::new(
        format!(
            "**Surtax Program Summary**\n\n\
             - **{}** total budget across **{}** projects\n\
             - **{}** spent ({})\n\
             - **{}** active, **{}** completed\n\
             - **{}** delayed, **{}** over budget",
            format::currency(summary.total_budget),
            summary.total_projects,
            format::currency(summary.total_spent),
            format::percent(spent_pct),
            summary.active,
            summary.completed,
            summary.delayed,
            summary.over_budget,
        ),
        &[
            "Show delayed projects",
            "Show over budget",
            "Spending by category",
        ],
    ))
}

async fn top_vendor(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_vendor_summaries(pool, 1).await?;

    let Some(vendor) = rows.first() else {
        return Ok(Answer::new(
            "No vendor data available.",
            &["Show all projects"],
        ));
    };

    let status = if vendor.delayed_count == 0 {
        "on track".to_string()
    } else {
        format!("with {} delayed", vendor.delayed_count)
    };

    Ok(Answer::new(
        format!(
            "**{}** has the highest contract value:\n\n\
             - **{}** across **{}** projects\n\
             - Average progress: {}\n\
             - Status: {}",
            vendor.vendor_name,
            format::currency(vendor.total_value),
            vendor.project_count,
            format::percent_whole(vendor.avg_progress),
            status,
        ),
        &["Show all vendors", "Vendor red flags", "Top 5 vendors"],
    ))
}

async fn schools_by_projects(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_schools_by_project_count(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "No school data available.",
            &["Show all projects"],
        ));
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            format!(
                "- **{}**: {} projects ({})",
                r.school_name,
                r.project_count,
                format::currency(r.total_value),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**Schools with most surtax projects:**\n\n{}",
            lines.join("\n"),
        ),
        &[
            "Show school details",
            "Which schools have delays?",
            "Category breakdown",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    Ok(answer)
}

async fn category_split(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_category_split(pool).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "No category data available.",
            &["Show all projects"],
        ));
    }

    let grand_total: f64 = rows.iter().map(|r| r.total_value).sum();
    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            let pct = if grand_total > 0.0 {
                r.total_value / grand_total * 100.0
            } else {
                0.0
            };
            format!(
                "- **{}**: {} ({}) - {} projects",
                r.surtax_category,
                format::currency(r.total_value),
                format::percent_whole(pct),
                r.project_count,
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!("**Spending by Category:**\n\n{}", lines.join("\n")),
        &[
            "New construction details",
            "Renovation projects",
            "Safety/security spending",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    Ok(answer)
}

async fn upcoming_completions(pool: &SqlitePool, today: NaiveDate) -> anyhow::Result<Answer> {
    let rows = db::fetch_upcoming_completions(pool, today).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "**No projects** scheduled to complete in the next 90 days.",
            &["Show active projects", "Budget summary", "Delayed projects"],
        ));
    }

    let total_value: f64 = rows.iter().map(|r| r.current_amount).sum();
    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            format!(
                "- **{}**: {} ({} done)",
                format::truncate(&r.title, 35),
                r.current_end_date,
                format::percent_whole(r.percent_complete),
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!(
            "**{} projects** completing in next 90 days ({}):\n\n{}",
            rows.len(),
            format::currency(total_value),
            lines.join("\n"),
        ),
        &[
            "Any at risk of delay?",
            "Show project details",
            "Budget summary",
        ],
    );
    answer.data = Some(to_data(&rows)?);
    answer.next_step = Some("Schedule final inspections for projects near completion".into());
    Ok(answer)
}

async fn vendor_query(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let rows = db::fetch_vendor_summaries(pool, 5).await?;

    if rows.is_empty() {
        return Ok(Answer::new(
            "No vendor data available.",
            &["Show all projects"],
        ));
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|r| {
            let status = if r.delayed_count > 0 {
                format!(" ({} delayed)", r.delayed_count)
            } else {
                String::new()
            };
            format!(
                "- **{}**: {} ({} projects){}",
                r.vendor_name,
                format::currency(r.total_value),
                r.project_count,
                status,
            )
        })
        .collect();

    let mut answer = Answer::new(
        format!("**Top Vendors by Contract Value:**\n\n{}", lines.join("\n")),
        &["Vendor red flags", "Vendor performance", "Show all vendors"],
    );
    answer.data = Some(to_data(&rows)?);
    Ok(answer)
}

async fn specific_project(pool: &SqlitePool) -> anyhow::Result<Answer> {
    let Some(project) = db::fetch_site_project(pool).await? else {
        return Ok(Answer::new(
            "Project not found.",
            &["Show all projects", "Search by school"],
        ));
    };

    let mut status_note = String::new();
    if project.is_delayed {
        status_note.push_str(&format!("\n- **DELAYED** by {} days", project.delay_days));
    }
    if project.is_over_budget {
        status_note.push_str(&format!(
            "\n- **OVER BUDGET** by {}",
            format::percent(project.budget_variance_pct),
        ));
    }

    let mut answer = Answer::new(
        format!(
            "**{}**\n\n\
             - Budget: **{}**\n\
             - Vendor: {}\n\
             - Progress: {}\n\
             - Status: {}{}",
            format::truncate(&project.title, 50),
            format::currency(project.current_amount),
            project.vendor_name.as_deref().unwrap_or("TBD"),
            format::percent_whole(project.percent_complete),
            project.status,
            status_note,
        ),
        &[
            "Change orders for this project",
            "Vendor performance",
            "Similar projects",
        ],
    );
    answer.data = Some(to_data(std::slice::from_ref(&project))?);
    Ok(answer)
}

fn help() -> Answer {
    Answer::new(
        "I can answer questions like:\n\n\
         - **Budget**: \"How much is left to spend?\" \"Total budget?\"\n\
         - **Risks**: \"What projects are delayed?\" \"Any over budget?\"\n\
         - **Vendors**: \"Who are our top vendors?\" \"Any vendor issues?\"\n\
         - **Projects**: \"Top 5 largest projects\" \"Upcoming completions\"",
        &["Budget summary", "Schedule risks", "Vendor red flags"],
    )
}
