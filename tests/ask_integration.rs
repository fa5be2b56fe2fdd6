use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use surtax_ask::{answers, db, insights};

/// One shared in-memory database per test. A single connection keeps every
/// query on the same memory store.
async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::init_db(&pool).await.expect("schema");
    pool
}

struct Fixture {
    title: &'static str,
    school_name: Option<&'static str>,
    vendor_name: Option<&'static str>,
    surtax_category: Option<&'static str>,
    status: &'static str,
    original_amount: f64,
    current_amount: f64,
    total_paid: f64,
    percent_complete: f64,
    is_delayed: bool,
    delay_days: i64,
    current_end_date: Option<NaiveDate>,
    is_over_budget: bool,
    budget_variance_pct: f64,
    is_deleted: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture {
            title: "Generic Project",
            school_name: Some("Lakeview Elementary"),
            vendor_name: Some("Gulfstream Mechanical"),
            surtax_category: Some("Renovation"),
            status: "Active",
            original_amount: 500_000.0,
            current_amount: 500_000.0,
            total_paid: 100_000.0,
            percent_complete: 20.0,
            is_delayed: false,
            delay_days: 0,
            current_end_date: None,
            is_over_budget: false,
            budget_variance_pct: 0.0,
            is_deleted: false,
        }
    }
}

async fn insert(pool: &SqlitePool, fixture: Fixture) {
    sqlx::query(
        r#"
        INSERT INTO contracts
        (title, school_name, vendor_name, surtax_category, status,
         original_amount, current_amount, total_paid, percent_complete,
         is_delayed, delay_days, current_end_date, is_over_budget,
         budget_variance_pct, is_deleted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(fixture.title)
    .bind(fixture.school_name)
    .bind(fixture.vendor_name)
    .bind(fixture.surtax_category)
    .bind(fixture.status)
    .bind(fixture.original_amount)
    .bind(fixture.current_amount)
    .bind(fixture.total_paid)
    .bind(fixture.percent_complete)
    .bind(fixture.is_delayed)
    .bind(fixture.delay_days)
    .bind(fixture.current_end_date)
    .bind(fixture.is_over_budget)
    .bind(fixture.budget_variance_pct)
    .bind(fixture.is_deleted)
    .execute(pool)
    .await
    .expect("insert fixture");
}

fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).unwrap()
}

fn fixed_today() -> NaiveDate {
    day(2026, 8, 1)
}

#[tokio::test]
async fn blank_question_is_rejected_before_any_query() {
    // No schema at all: a handler query would fail loudly if one ran.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let result = answers::answer_question(&pool, "   ", fixed_today()).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("empty"));
}

#[tokio::test]
async fn schedule_risk_with_no_delays_returns_positive_message() {
    let pool = memory_pool().await;
    insert(&pool, Fixture::default()).await;

    let answer = answers::answer_question(&pool, "any schedule risk?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.starts_with("**No projects**"));
    assert!(answer.data.is_none());
    assert!(!answer.ask_staff);
}

#[tokio::test]
async fn schedule_risk_totals_only_projects_past_thirty_days() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "Cafeteria Expansion",
            current_amount: 100_000.0,
            is_delayed: true,
            delay_days: 45,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Playground Refresh",
            current_amount: 50_000.0,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "what is behind schedule?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**1 projects**"));
    assert!(answer.answer.contains("$100,000"));
    assert!(answer.answer.contains("Cafeteria Expansion"));
    assert!(!answer.answer.contains("Playground Refresh"));
    assert_eq!(answer.data.as_ref().map(Vec::len), Some(1));
    assert!(answer.ask_staff);
    assert!(answer.next_step.is_some());
}

#[tokio::test]
async fn mildly_delayed_projects_do_not_trip_the_thirty_day_bar() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            is_delayed: true,
            delay_days: 12,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "behind schedule?", fixed_today())
        .await
        .unwrap();
    assert!(answer.answer.starts_with("**No projects**"));
}

#[tokio::test]
async fn remaining_budget_reports_difference_and_percentages() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            current_amount: 600_000.0,
            total_paid: 150_000.0,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Second Project",
            current_amount: 400_000.0,
            total_paid: 100_000.0,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "how much is left to spend?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("$750,000"));
    assert!(answer.answer.contains("75.0%"));
    assert!(answer.answer.contains("$1,000,000"));
    assert!(answer.answer.contains("25.0%"));
}

#[tokio::test]
async fn remaining_budget_on_empty_store_is_not_an_error() {
    let pool = memory_pool().await;

    let answer = answers::answer_question(&pool, "anything unspent?", fixed_today())
        .await
        .unwrap();
    assert!(answer.answer.contains("Unable to calculate"));
}

#[tokio::test]
async fn over_budget_answer_sums_the_overages() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "HVAC Replacement",
            original_amount: 400_000.0,
            current_amount: 450_000.0,
            is_over_budget: true,
            budget_variance_pct: 12.5,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Roof Renovation",
            original_amount: 200_000.0,
            current_amount: 230_000.0,
            is_over_budget: true,
            budget_variance_pct: 15.0,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "any cost overrun?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**2 projects**"));
    assert!(answer.answer.contains("$80,000"));
    assert!(answer.answer.contains("+15.0%"));
    assert!(answer.ask_staff);
}

#[tokio::test]
async fn soft_deleted_and_uncategorized_projects_are_not_counted() {
    let pool = memory_pool().await;
    insert(&pool, Fixture::default()).await;
    insert(
        &pool,
        Fixture {
            title: "Deleted Project",
            is_deleted: true,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Uncategorized Project",
            surtax_category: None,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "give me the summary", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**1** projects"));
}

#[tokio::test]
async fn vendor_red_flags_group_issues_per_vendor() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "Gym Retrofit",
            vendor_name: Some("Hargrove Construction Group"),
            is_delayed: true,
            delay_days: 20,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Classroom Addition",
            vendor_name: Some("Hargrove Construction Group"),
            is_over_budget: true,
            budget_variance_pct: 8.0,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Clean Record Job",
            vendor_name: Some("Suncoast Roofing"),
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "any vendor red flags?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**1 vendors**"));
    assert!(answer.answer.contains("Hargrove Construction Group"));
    assert!(answer.answer.contains("1 delayed, 1 over budget"));
    assert!(!answer.answer.contains("Suncoast Roofing"));
}

#[tokio::test]
async fn upcoming_completions_respect_the_injected_date() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "Finishing Soon",
            current_end_date: Some(day(2026, 9, 15)),
            percent_complete: 90.0,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Finishing Next Year",
            current_end_date: Some(day(2027, 4, 1)),
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Already Finished",
            status: "Completed",
            current_end_date: Some(day(2026, 8, 20)),
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "what is completing soon?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**1 projects**"));
    assert!(answer.answer.contains("Finishing Soon"));
    assert!(!answer.answer.contains("Finishing Next Year"));
    assert!(!answer.answer.contains("Already Finished"));

    // Shift the reference date outside the window: nothing qualifies.
    let later = answers::answer_question(&pool, "what is completing soon?", day(2027, 1, 1))
        .await
        .unwrap();
    assert!(later.answer.starts_with("**No projects**"));
}

#[tokio::test]
async fn same_question_and_date_give_identical_answers() {
    let pool = memory_pool().await;
    db::seed(&pool).await.unwrap();

    for question in [
        "summary of where we stand",
        "top five projects",
        "what is completing in the next 90 days?",
    ] {
        let first = answers::answer_question(&pool, question, fixed_today())
            .await
            .unwrap();
        let second = answers::answer_question(&pool, question, fixed_today())
            .await
            .unwrap();
        assert_eq!(first, second, "answer for {question:?} changed between calls");
    }
}

#[tokio::test]
async fn concern_question_lists_both_risk_buckets() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "Late Job",
            current_amount: 300_000.0,
            is_delayed: true,
            delay_days: 10,
            ..Fixture::default()
        },
    )
    .await;
    insert(
        &pool,
        Fixture {
            title: "Pricey Job",
            original_amount: 100_000.0,
            current_amount: 120_000.0,
            is_over_budget: true,
            budget_variance_pct: 20.0,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "should I be worried?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("**1 delayed projects** worth $300,000"));
    assert!(answer.answer.contains("**1 over budget** by $20,000 combined"));
    assert!(answer.ask_staff);
}

#[tokio::test]
async fn healthy_portfolio_gets_the_all_clear() {
    let pool = memory_pool().await;
    insert(&pool, Fixture::default()).await;

    let answer = answers::answer_question(&pool, "any concerns?", fixed_today())
        .await
        .unwrap();
    assert!(answer.answer.contains("Portfolio looks healthy"));
    assert!(!answer.ask_staff);
}

#[tokio::test]
async fn specific_project_card_carries_risk_callouts() {
    let pool = memory_pool().await;
    insert(
        &pool,
        Fixture {
            title: "South Marion High School Classroom Addition",
            current_amount: 8_200_000.0,
            percent_complete: 58.0,
            is_delayed: true,
            delay_days: 45,
            ..Fixture::default()
        },
    )
    .await;

    let answer = answers::answer_question(&pool, "how is south marion doing?", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("$8,200,000"));
    assert!(answer.answer.contains("**DELAYED** by 45 days"));
}

#[tokio::test]
async fn unknown_question_falls_back_to_help() {
    let pool = memory_pool().await;

    let answer = answers::answer_question(&pool, "tell me a joke", fixed_today())
        .await
        .unwrap();

    assert!(answer.answer.contains("I can answer questions like"));
    assert_eq!(answer.suggestions.len(), 3);
    assert!(answer.data.is_none());
}

#[tokio::test]
async fn seeded_store_answers_every_intent_without_error() {
    let pool = memory_pool().await;
    db::seed(&pool).await.unwrap();

    for question in [
        "any schedule risk?",
        "anything over budget?",
        "vendor red flags?",
        "should I be worried?",
        "how much is remaining?",
        "top 5 largest projects",
        "budget summary",
        "who is the top vendor?",
        "which school has the most projects?",
        "spending by category",
        "upcoming completions",
        "list all vendors",
        "how is the high school project?",
        "tell me a joke",
    ] {
        let answer = answers::answer_question(&pool, question, fixed_today())
            .await
            .unwrap();
        assert!(!answer.answer.is_empty(), "empty answer for {question:?}");
        assert!(!answer.suggestions.is_empty(), "no suggestions for {question:?}");
    }
}

#[tokio::test]
async fn insights_run_against_seed_data() {
    let pool = memory_pool().await;
    db::seed(&pool).await.unwrap();

    let cards = insights::generate_insights(&pool).await.unwrap();
    // Seed data is deliberately mixed; the exact set depends on thresholds,
    // but generation itself must succeed and stay stable.
    let again = insights::generate_insights(&pool).await.unwrap();
    assert_eq!(cards.len(), again.len());
}

#[tokio::test]
async fn envelope_serializes_without_empty_optionals() {
    let pool = memory_pool().await;

    let answer = answers::answer_question(&pool, "tell me a joke", fixed_today())
        .await
        .unwrap();
    let json = serde_json::to_value(&answer).unwrap();

    assert!(json.get("answer").is_some());
    assert!(json.get("data").is_none());
    assert!(json.get("next_step").is_none());
    assert_eq!(json["ask_staff"], serde_json::Value::Bool(false));
}
