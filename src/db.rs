use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::models::{
    ActiveProgress, BudgetTrend, CategoryDelayPattern, CategoryEfficiency, CategoryRow,
    CompletionRow, LargestProjectRow, OverBudgetRow, PortfolioSummary, PortfolioTotals,
    ProjectDetail, RiskCounts, ScheduleRiskRow, SchoolRow, VendorFlagRow, VendorRates,
    VendorSummaryRow,
};

pub async fn connect(db_path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to open the contracts database")?;

    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contracts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            school_name TEXT,
            vendor_name TEXT,
            surtax_category TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            original_amount REAL,
            current_amount REAL,
            total_paid REAL,
            planned_value REAL,
            earned_value REAL,
            actual_cost REAL,
            cost_performance_index REAL,
            percent_complete REAL NOT NULL DEFAULT 0,
            is_delayed INTEGER NOT NULL DEFAULT 0,
            delay_days INTEGER NOT NULL DEFAULT 0,
            delay_reason TEXT,
            planned_end_date DATE,
            current_end_date DATE,
            is_over_budget INTEGER NOT NULL DEFAULT 0,
            budget_variance_pct REAL NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contracts_vendor ON contracts(vendor_name)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contracts_end_date ON contracts(current_end_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn ymd(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

pub async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    struct SeedProject {
        id: i64,
        title: &'static str,
        school_name: Option<&'static str>,
        vendor_name: &'static str,
        surtax_category: &'static str,
        status: &'static str,
        original_amount: f64,
        current_amount: f64,
        total_paid: f64,
        planned_value: f64,
        earned_value: f64,
        actual_cost: f64,
        percent_complete: f64,
        is_delayed: bool,
        delay_days: i64,
        delay_reason: Option<&'static str>,
        planned_end_date: NaiveDate,
        current_end_date: NaiveDate,
        is_over_budget: bool,
        budget_variance_pct: f64,
    }

    let projects = vec![
        SeedProject {
            id: 1,
            title: "South Marion High School Classroom Addition",
            school_name: Some("South Marion High School"),
            vendor_name: "Hargrove Construction Group",
            surtax_category: "New Construction",
            status: "Active",
            original_amount: 8_200_000.0,
            current_amount: 8_200_000.0,
            total_paid: 4_950_000.0,
            planned_value: 5_100_000.0,
            earned_value: 4_800_000.0,
            actual_cost: 4_950_000.0,
            percent_complete: 58.0,
            is_delayed: true,
            delay_days: 45,
            delay_reason: Some("Structural steel delivery slipped two months"),
            planned_end_date: ymd(2026, 10, 15)?,
            current_end_date: ymd(2026, 11, 29)?,
            is_over_budget: false,
            budget_variance_pct: 0.0,
        },
        SeedProject {
            id: 2,
            title: "HVAC Replacement - Lakeview Elementary",
            school_name: Some("Lakeview Elementary"),
            vendor_name: "Gulfstream Mechanical",
            surtax_category: "Renovation",
            status: "Active",
            original_amount: 1_400_000.0,
            current_amount: 1_575_000.0,
            total_paid: 1_210_000.0,
            planned_value: 1_100_000.0,
            earned_value: 1_020_000.0,
            actual_cost: 1_210_000.0,
            percent_complete: 72.0,
            is_delayed: false,
            delay_days: 0,
            delay_reason: None,
            planned_end_date: ymd(2026, 9, 30)?,
            current_end_date: ymd(2026, 9, 30)?,
            is_over_budget: true,
            budget_variance_pct: 12.5,
        },
        SeedProject {
            id: 3,
            title: "Roof Renovation - Oakcrest Middle",
            school_name: Some("Oakcrest Middle School"),
            vendor_name: "Suncoast Roofing",
            surtax_category: "Renovation",
            status: "Active",
            original_amount: 950_000.0,
            current_amount: 950_000.0,
            total_paid: 310_000.0,
            planned_value: 330_000.0,
            earned_value: 342_000.0,
            actual_cost: 310_000.0,
            percent_complete: 35.0,
            is_delayed: false,
            delay_days: 0,
            delay_reason: None,
            planned_end_date: ymd(2027, 1, 20)?,
            current_end_date: ymd(2027, 1, 20)?,
            is_over_budget: false,
            budget_variance_pct: 0.0,
        },
        SeedProject {
            id: 4,
            title: "District-Wide Security Camera Upgrade",
            school_name: None,
            vendor_name: "Sentinel Systems",
            surtax_category: "Safety & Security",
            status: "Completed",
            original_amount: 620_000.0,
            current_amount: 640_000.0,
            total_paid: 640_000.0,
            planned_value: 640_000.0,
            earned_value: 640_000.0,
            actual_cost: 640_000.0,
            percent_complete: 100.0,
            is_delayed: false,
            delay_days: 0,
            delay_reason: None,
            planned_end_date: ymd(2026, 3, 31)?,
            current_end_date: ymd(2026, 3, 31)?,
            is_over_budget: true,
            budget_variance_pct: 3.2,
        },
        SeedProject {
            id: 5,
            title: "CCC Gymnasium Retrofit",
            school_name: Some("Central Community Campus"),
            vendor_name: "Hargrove Construction Group",
            surtax_category: "Renovation",
            status: "Active",
            original_amount: 2_100_000.0,
            current_amount: 2_100_000.0,
            total_paid: 1_890_000.0,
            planned_value: 1_950_000.0,
            earned_value: 1_930_000.0,
            actual_cost: 1_890_000.0,
            percent_complete: 92.0,
            is_delayed: true,
            delay_days: 12,
            delay_reason: Some("Flooring subcontractor rescheduled"),
            planned_end_date: ymd(2026, 8, 29)?,
            current_end_date: ymd(2026, 9, 10)?,
            is_over_budget: false,
            budget_variance_pct: 0.0,
        },
        SeedProject {
            id: 6,
            title: "Track Resurfacing - Westbrook High School",
            school_name: Some("Westbrook High School"),
            vendor_name: "Atlantic Sitework",
            surtax_category: "Athletics",
            status: "Active",
            original_amount: 480_000.0,
            current_amount: 480_000.0,
            total_paid: 96_000.0,
            planned_value: 110_000.0,
            earned_value: 96_000.0,
            actual_cost: 96_000.0,
            percent_complete: 20.0,
            is_delayed: false,
            delay_days: 0,
            delay_reason: None,
            planned_end_date: ymd(2027, 3, 15)?,
            current_end_date: ymd(2027, 3, 15)?,
            is_over_budget: false,
            budget_variance_pct: 0.0,
        },
    ];

    for p in projects {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO contracts
            (id, title, school_name, vendor_name, surtax_category, status,
             original_amount, current_amount, total_paid,
             planned_value, earned_value, actual_cost, cost_performance_index,
             percent_complete, is_delayed, delay_days, delay_reason,
             planned_end_date, current_end_date, is_over_budget, budget_variance_pct,
             is_deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(p.id)
        .bind(p.title)
        .bind(p.school_name)
        .bind(p.vendor_name)
        .bind(p.surtax_category)
        .bind(p.status)
        .bind(p.original_amount)
        .bind(p.current_amount)
        .bind(p.total_paid)
        .bind(p.planned_value)
        .bind(p.earned_value)
        .bind(p.actual_cost)
        .bind(if p.actual_cost > 0.0 {
            Some(p.earned_value / p.actual_cost)
        } else {
            None
        })
        .bind(p.percent_complete)
        .bind(p.is_delayed)
        .bind(p.delay_days)
        .bind(p.delay_reason)
        .bind(p.planned_end_date)
        .bind(p.current_end_date)
        .bind(p.is_over_budget)
        .bind(p.budget_variance_pct)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &SqlitePool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        title: String,
        school_name: Option<String>,
        vendor_name: Option<String>,
        surtax_category: Option<String>,
        status: String,
        original_amount: Option<f64>,
        current_amount: Option<f64>,
        total_paid: Option<f64>,
        planned_value: Option<f64>,
        earned_value: Option<f64>,
        actual_cost: Option<f64>,
        percent_complete: f64,
        is_delayed: Option<u8>,
        delay_days: Option<i64>,
        delay_reason: Option<String>,
        planned_end_date: Option<NaiveDate>,
        current_end_date: Option<NaiveDate>,
        is_over_budget: Option<u8>,
        budget_variance_pct: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let cpi = match (row.earned_value, row.actual_cost) {
            (Some(ev), Some(ac)) if ac > 0.0 => Some(ev / ac),
            _ => None,
        };

        let outcome = sqlx::query(
            r#"
            INSERT INTO contracts
            (title, school_name, vendor_name, surtax_category, status,
             original_amount, current_amount, total_paid,
             planned_value, earned_value, actual_cost, cost_performance_index,
             percent_complete, is_delayed, delay_days, delay_reason,
             planned_end_date, current_end_date, is_over_budget, budget_variance_pct,
             is_deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&row.title)
        .bind(&row.school_name)
        .bind(&row.vendor_name)
        .bind(&row.surtax_category)
        .bind(&row.status)
        .bind(row.original_amount)
        .bind(row.current_amount)
        .bind(row.total_paid)
        .bind(row.planned_value)
        .bind(row.earned_value)
        .bind(row.actual_cost)
        .bind(cpi)
        .bind(row.percent_complete)
        .bind(i64::from(row.is_delayed.unwrap_or(0)))
        .bind(row.delay_days.unwrap_or(0))
        .bind(&row.delay_reason)
        .bind(row.planned_end_date)
        .bind(row.current_end_date)
        .bind(i64::from(row.is_over_budget.unwrap_or(0)))
        .bind(row.budget_variance_pct.unwrap_or(0.0))
        .execute(pool)
        .await?;

        inserted += outcome.rows_affected() as usize;
    }

    Ok(inserted)
}

pub async fn fetch_schedule_risks(pool: &SqlitePool) -> anyhow::Result<Vec<ScheduleRiskRow>> {
    let records = sqlx::query(
        r#"
        SELECT title, school_name, delay_days, vendor_name,
               COALESCE(current_amount, 0.0) as current_amount
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
          AND is_delayed = 1 AND delay_days > 30
        ORDER BY delay_days DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(ScheduleRiskRow {
            title: row.get("title"),
            school_name: row.get("school_name"),
            delay_days: row.get("delay_days"),
            vendor_name: row.get("vendor_name"),
            current_amount: row.get("current_amount"),
        });
    }

    Ok(rows)
}

pub async fn fetch_over_budget(pool: &SqlitePool) -> anyhow::Result<Vec<OverBudgetRow>> {
    let records = sqlx::query(
        r#"
        SELECT title, school_name, budget_variance_pct,
               COALESCE(current_amount, 0.0) - COALESCE(original_amount, 0.0) as over_amount,
               vendor_name, COALESCE(current_amount, 0.0) as current_amount
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND is_over_budget = 1
        ORDER BY budget_variance_pct DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(OverBudgetRow {
            title: row.get("title"),
            school_name: row.get("school_name"),
            budget_variance_pct: row.get("budget_variance_pct"),
            over_amount: row.get("over_amount"),
            vendor_name: row.get("vendor_name"),
            current_amount: row.get("current_amount"),
        });
    }

    Ok(rows)
}

pub async fn fetch_vendor_red_flags(pool: &SqlitePool) -> anyhow::Result<Vec<VendorFlagRow>> {
    let records = sqlx::query(
        r#"
        SELECT vendor_name,
               COUNT(*) as project_count,
               SUM(CASE WHEN is_delayed = 1 THEN 1 ELSE 0 END) as delayed_count,
               SUM(CASE WHEN is_over_budget = 1 THEN 1 ELSE 0 END) as over_budget_count,
               COALESCE(SUM(current_amount), 0.0) as total_value
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND vendor_name IS NOT NULL
        GROUP BY vendor_name
        HAVING delayed_count > 0 OR over_budget_count > 0
        ORDER BY (delayed_count + over_budget_count) DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(VendorFlagRow {
            vendor_name: row.get("vendor_name"),
            project_count: row.get("project_count"),
            delayed_count: row.get("delayed_count"),
            over_budget_count: row.get("over_budget_count"),
            total_value: row.get("total_value"),
        });
    }

    Ok(rows)
}

/// Two counting queries behind the general "should I worry?" answer. Either
/// both succeed or the whole fetch fails; there is no partial result.
pub async fn fetch_risk_counts(pool: &SqlitePool) -> anyhow::Result<RiskCounts> {
    let delayed = sqlx::query(
        r#"
        SELECT COUNT(*) as count, COALESCE(SUM(current_amount), 0.0) as value
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND is_delayed = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    let over_budget = sqlx::query(
        r#"
        SELECT COUNT(*) as count,
               COALESCE(SUM(COALESCE(current_amount, 0.0) - COALESCE(original_amount, 0.0)), 0.0) as overage
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND is_over_budget = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(RiskCounts {
        delayed_count: delayed.get("count"),
        delayed_value: delayed.get("value"),
        over_budget_count: over_budget.get("count"),
        overage: over_budget.get("overage"),
    })
}

pub async fn fetch_portfolio_totals(pool: &SqlitePool) -> anyhow::Result<PortfolioTotals> {
    let row = sqlx::query(
        r#"
        SELECT COALESCE(SUM(current_amount), 0.0) as total_budget,
               COALESCE(SUM(total_paid), 0.0) as total_spent
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(PortfolioTotals {
        total_budget: row.get("total_budget"),
        total_spent: row.get("total_spent"),
    })
}

pub async fn fetch_largest_projects(pool: &SqlitePool) -> anyhow::Result<Vec<LargestProjectRow>> {
    let records = sqlx::query(
        r#"
        SELECT title, school_name, COALESCE(current_amount, 0.0) as current_amount,
               vendor_name, status, percent_complete
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        ORDER BY current_amount DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(LargestProjectRow {
            title: row.get("title"),
            school_name: row.get("school_name"),
            current_amount: row.get("current_amount"),
            vendor_name: row.get("vendor_name"),
            status: row.get("status"),
            percent_complete: row.get("percent_complete"),
        });
    }

    Ok(rows)
}

pub async fn fetch_portfolio_summary(pool: &SqlitePool) -> anyhow::Result<PortfolioSummary> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as total_projects,
               COUNT(CASE WHEN status = 'Active' THEN 1 END) as active,
               COUNT(CASE WHEN status = 'Completed' THEN 1 END) as completed,
               COALESCE(SUM(current_amount), 0.0) as total_budget,
               COALESCE(SUM(total_paid), 0.0) as total_spent,
               COUNT(CASE WHEN is_delayed = 1 THEN 1 END) as delayed,
               COUNT(CASE WHEN is_over_budget = 1 THEN 1 END) as over_budget
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(PortfolioSummary {
        total_projects: row.get("total_projects"),
        active: row.get("active"),
        completed: row.get("completed"),
        total_budget: row.get("total_budget"),
        total_spent: row.get("total_spent"),
        delayed: row.get("delayed"),
        over_budget: row.get("over_budget"),
    })
}

pub async fn fetch_vendor_summaries(
    pool: &SqlitePool,
    limit: i64,
) -> anyhow::Result<Vec<VendorSummaryRow>> {
    let records = sqlx::query(
        r#"
        SELECT vendor_name,
               COUNT(*) as project_count,
               COALESCE(SUM(current_amount), 0.0) as total_value,
               SUM(CASE WHEN is_delayed = 1 THEN 1 ELSE 0 END) as delayed_count,
               COALESCE(AVG(percent_complete), 0.0) as avg_progress
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND vendor_name IS NOT NULL
        GROUP BY vendor_name
        ORDER BY total_value DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(VendorSummaryRow {
            vendor_name: row.get("vendor_name"),
            project_count: row.get("project_count"),
            total_value: row.get("total_value"),
            delayed_count: row.get("delayed_count"),
            avg_progress: row.get("avg_progress"),
        });
    }

    Ok(rows)
}

pub async fn fetch_schools_by_project_count(pool: &SqlitePool) -> anyhow::Result<Vec<SchoolRow>> {
    let records = sqlx::query(
        r#"
        SELECT school_name,
               COUNT(*) as project_count,
               COALESCE(SUM(current_amount), 0.0) as total_value
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND school_name IS NOT NULL
        GROUP BY school_name
        ORDER BY project_count DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(SchoolRow {
            school_name: row.get("school_name"),
            project_count: row.get("project_count"),
            total_value: row.get("total_value"),
        });
    }

    Ok(rows)
}

pub async fn fetch_category_split(pool: &SqlitePool) -> anyhow::Result<Vec<CategoryRow>> {
    let records = sqlx::query(
        r#"
        SELECT surtax_category,
               COUNT(*) as project_count,
               COALESCE(SUM(current_amount), 0.0) as total_value
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        GROUP BY surtax_category
        ORDER BY total_value DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(CategoryRow {
            surtax_category: row.get("surtax_category"),
            project_count: row.get("project_count"),
            total_value: row.get("total_value"),
        });
    }

    Ok(rows)
}

/// Active projects whose current end date lands inside [today, today + 90d].
/// The reference date is injected so answers stay reproducible.
pub async fn fetch_upcoming_completions(
    pool: &SqlitePool,
    today: NaiveDate,
) -> anyhow::Result<Vec<CompletionRow>> {
    let window_end = today + Duration::days(90);

    let records = sqlx::query(
        r#"
        SELECT title, school_name, current_end_date, percent_complete,
               COALESCE(current_amount, 0.0) as current_amount
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
          AND status = 'Active'
          AND current_end_date IS NOT NULL
          AND current_end_date >= ?
          AND current_end_date <= ?
        ORDER BY current_end_date ASC
        LIMIT 5
        "#,
    )
    .bind(today)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(CompletionRow {
            title: row.get("title"),
            school_name: row.get("school_name"),
            current_end_date: row.get("current_end_date"),
            percent_complete: row.get("percent_complete"),
            current_amount: row.get("current_amount"),
        });
    }

    Ok(rows)
}

/// First project matching the named-site markers users ask about directly.
pub async fn fetch_site_project(pool: &SqlitePool) -> anyhow::Result<Option<ProjectDetail>> {
    let record = sqlx::query(
        r#"
        SELECT title, school_name, vendor_name, status,
               COALESCE(current_amount, 0.0) as current_amount,
               percent_complete, is_delayed, delay_days, is_over_budget, budget_variance_pct
        FROM contracts
        WHERE is_deleted = 0
          AND (title LIKE '%High School%' OR title LIKE '%South Marion%' OR title LIKE '%CCC%')
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(record.map(|row| ProjectDetail {
        title: row.get("title"),
        school_name: row.get("school_name"),
        vendor_name: row.get("vendor_name"),
        status: row.get("status"),
        current_amount: row.get("current_amount"),
        percent_complete: row.get("percent_complete"),
        is_delayed: row.get("is_delayed"),
        delay_days: row.get("delay_days"),
        is_over_budget: row.get("is_over_budget"),
        budget_variance_pct: row.get("budget_variance_pct"),
    }))
}

pub async fn fetch_budget_trend(pool: &SqlitePool) -> anyhow::Result<BudgetTrend> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as total,
               SUM(CASE WHEN current_amount > original_amount THEN 1 ELSE 0 END) as increased,
               COALESCE(AVG(CASE WHEN original_amount > 0
                   THEN (current_amount - original_amount) / original_amount * 100
                   ELSE 0 END), 0.0) as avg_change_pct
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
          AND original_amount IS NOT NULL AND original_amount > 0
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(BudgetTrend {
        total: row.get("total"),
        increased: row.get::<Option<i64>, _>("increased").unwrap_or(0),
        avg_change_pct: row.get("avg_change_pct"),
    })
}

pub async fn fetch_worst_delay_category(
    pool: &SqlitePool,
) -> anyhow::Result<Option<CategoryDelayPattern>> {
    let record = sqlx::query(
        r#"
        SELECT surtax_category,
               COUNT(*) as total,
               SUM(CASE WHEN is_delayed = 1 THEN 1 ELSE 0 END) as delayed,
               COALESCE(AVG(CASE WHEN is_delayed = 1 THEN delay_days ELSE 0 END), 0.0) as avg_delay_days
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        GROUP BY surtax_category
        HAVING total >= 2
        ORDER BY (delayed * 1.0 / total) DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(record.map(|row| CategoryDelayPattern {
        surtax_category: row.get("surtax_category"),
        total: row.get("total"),
        delayed: row.get("delayed"),
        avg_delay_days: row.get("avg_delay_days"),
    }))
}

pub async fn fetch_worst_vendor_rates(pool: &SqlitePool) -> anyhow::Result<Option<VendorRates>> {
    let record = sqlx::query(
        r#"
        SELECT vendor_name,
               COUNT(*) as project_count,
               AVG(CASE WHEN is_delayed = 1 THEN 1.0 ELSE 0.0 END) * 100 as delay_rate,
               AVG(CASE WHEN is_over_budget = 1 THEN 1.0 ELSE 0.0 END) * 100 as over_budget_rate
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
          AND vendor_name IS NOT NULL AND vendor_name != ''
        GROUP BY vendor_name
        HAVING project_count >= 2
        ORDER BY (delay_rate + over_budget_rate) DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(record.map(|row| VendorRates {
        vendor_name: row.get("vendor_name"),
        project_count: row.get("project_count"),
        delay_rate: row.get("delay_rate"),
        over_budget_rate: row.get("over_budget_rate"),
    }))
}

pub async fn fetch_category_efficiency(
    pool: &SqlitePool,
) -> anyhow::Result<Vec<CategoryEfficiency>> {
    let records = sqlx::query(
        r#"
        SELECT surtax_category,
               COALESCE(SUM(current_amount), 0.0) as total_budget,
               COALESCE(SUM(total_paid), 0.0) as total_spent,
               COALESCE(AVG(percent_complete), 0.0) as avg_progress
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL
        GROUP BY surtax_category
        HAVING total_budget > 0
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut rows = Vec::new();
    for row in records {
        rows.push(CategoryEfficiency {
            surtax_category: row.get("surtax_category"),
            total_budget: row.get("total_budget"),
            total_spent: row.get("total_spent"),
            avg_progress: row.get("avg_progress"),
        });
    }

    Ok(rows)
}

pub async fn fetch_active_progress(pool: &SqlitePool) -> anyhow::Result<ActiveProgress> {
    let row = sqlx::query(
        r#"
        SELECT COALESCE(SUM(current_amount), 0.0) as total_budget,
               COALESCE(SUM(total_paid), 0.0) as total_spent,
               COALESCE(AVG(percent_complete), 0.0) as avg_progress
        FROM contracts
        WHERE is_deleted = 0 AND surtax_category IS NOT NULL AND status = 'Active'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(ActiveProgress {
        total_budget: row.get("total_budget"),
        total_spent: row.get("total_spent"),
        avg_progress: row.get("avg_progress"),
    })
}
