use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use surtax_ask::{answers, db, insights, models::Answer};

#[derive(Parser)]
#[command(name = "surtax-ask")]
#[command(about = "Question answering over surtax capital-project records", long_about = None)]
struct Cli {
    /// Path to the SQLite contracts database
    #[arg(long, global = true, default_value = "surtax.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import contract records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Answer a natural-language question about the portfolio
    Ask {
        /// The question, e.g. "which projects are behind schedule?"
        #[arg(required = true)]
        question: Vec<String>,
        /// Reference date for time-window answers (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Print the full response envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate portfolio insight cards
    Insights {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let pool = db::connect(&cli.db).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::init_db(&pool).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} contracts from {}.", csv.display());
        }
        Commands::Ask {
            question,
            as_of,
            json,
        } => {
            let question = question.join(" ");
            let today = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let answer = answers::answer_question(&pool, &question, today).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_answer(&answer);
            }
        }
        Commands::Insights { json } => {
            let cards = insights::generate_insights(&pool).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else if cards.is_empty() {
                println!("No insights fired for the current portfolio.");
            } else {
                for card in &cards {
                    println!("[{}] {}", card.severity, card.title);
                    println!("  {}", card.detail);
                }
            }
        }
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);

    if answer.ask_staff {
        println!("\nFlagged for staff follow-up.");
    }
    if let Some(next_step) = &answer.next_step {
        println!("Next step: {next_step}");
    }
    if let Some(note) = &answer.data_note {
        println!("Note: {note}");
    }

    if !answer.suggestions.is_empty() {
        println!("\nTry next:");
        for suggestion in &answer.suggestions {
            println!("- {suggestion}");
        }
    }
}
