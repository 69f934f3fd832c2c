use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod allowance;
mod daily;
mod db;
mod models;
mod monthly;
mod rates;
mod report;
mod route;

use models::{Instructor, MonthlySettlement};
use route::DistanceMatrix;

#[derive(Parser)]
#[command(name = "instructor-settlement")]
#[command(about = "Monthly settlement engine for dispatched instructors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import activity records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Settle a single day for one instructor
    Daily {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Settle a month, for one instructor or for everyone
    Monthly {
        #[arg(long)]
        month: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Write a markdown settlement statement
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        month: String,
        #[arg(long, default_value = "statement.md")]
        out: PathBuf,
    },
    /// Write a monthly settlement as JSON
    Export {
        #[arg(long)]
        email: String,
        #[arg(long)]
        month: String,
        #[arg(long, default_value = "settlement.json")]
        out: PathBuf,
    },
}

/// Turns a `YYYY-MM` argument into a half-open [first day, first day of the
/// next month) window.
fn month_window(month: &str) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let (year, month_number) = month
        .split_once('-')
        .with_context(|| format!("expected YYYY-MM, got {month}"))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("invalid year in {month}"))?;
    let month_number: u32 = month_number
        .parse()
        .with_context(|| format!("invalid month in {month}"))?;

    let from = NaiveDate::from_ymd_opt(year, month_number, 1)
        .with_context(|| format!("invalid month: {month}"))?;
    let to = if month_number == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_number + 1, 1)
    }
    .with_context(|| format!("invalid month: {month}"))?;

    Ok((from, to))
}

/// Settles every activity day in the window for one instructor. Returns
/// `None` when the window holds no activities at all, so callers can tell
/// "nothing to settle" apart from a settled month of zero-amount days.
async fn settle_month(
    pool: &PgPool,
    instructor: &Instructor,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Option<MonthlySettlement>> {
    let institutions = db::fetch_institutions(pool).await?;
    let matrix = DistanceMatrix::from_rows(&db::fetch_distance_rows(pool).await?);
    let activities = db::fetch_activities(pool, instructor.id, from, to).await?;

    if activities.is_empty() {
        return Ok(None);
    }

    let days: Vec<_> = daily::group_by_date(&activities)
        .into_iter()
        .map(|(date, day_activities)| {
            daily::compute_daily(instructor, date, &day_activities, &institutions, &matrix)
        })
        .collect();

    monthly::compute_monthly(days).map(Some)
}

fn print_monthly_summary(monthly: &MonthlySettlement) {
    println!(
        "{} {}-{:02}: gross {} KRW, tax {} KRW, net {} KRW across {} settled days",
        monthly.instructor_name,
        monthly.year,
        monthly.month,
        monthly.gross_amount,
        monthly.tax_withheld,
        monthly.net_amount,
        monthly.day_count
    );
    for day in &monthly.days {
        for warning in &day.warnings {
            println!("  warning ({}): {warning}", day.date);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} activities from {}.", csv.display());
        }
        Commands::Daily { email, date } => {
            let instructor = db::fetch_instructor(&pool, &email).await?;
            let institutions = db::fetch_institutions(&pool).await?;
            let matrix = DistanceMatrix::from_rows(&db::fetch_distance_rows(&pool).await?);
            let next_day = date.succ_opt().context("date out of range")?;
            let activities = db::fetch_activities(&pool, instructor.id, date, next_day).await?;

            if activities.is_empty() {
                println!("No activities for {} on {date}.", instructor.name);
                return Ok(());
            }

            let day = daily::compute_daily(&instructor, date, &activities, &institutions, &matrix);
            println!(
                "{} on {}: gross {} KRW ({} classes, {} events, {:.1} km travelled)",
                day.instructor_name,
                day.date,
                day.gross_amount,
                day.classes.len(),
                day.events.len(),
                day.travel.total_km
            );
            if day.cancelled_amount_preview > 0 {
                println!(
                    "  cancelled activities would have paid {} KRW",
                    day.cancelled_amount_preview
                );
            }
            for warning in &day.warnings {
                println!("  warning: {warning}");
            }
        }
        Commands::Monthly { month, email } => {
            let (from, to) = month_window(&month)?;
            match email {
                Some(email) => {
                    let instructor = db::fetch_instructor(&pool, &email).await?;
                    match settle_month(&pool, &instructor, from, to).await? {
                        Some(monthly) => print_monthly_summary(&monthly),
                        None => println!("No activities for {} in {month}.", instructor.name),
                    }
                }
                None => {
                    let instructors = db::fetch_instructors(&pool).await?;
                    let mut settled = 0usize;
                    for instructor in &instructors {
                        match settle_month(&pool, instructor, from, to).await {
                            Ok(Some(monthly)) => {
                                print_monthly_summary(&monthly);
                                settled += 1;
                            }
                            Ok(None) => {}
                            Err(err) => {
                                eprintln!("failed to settle {}: {err:#}", instructor.name);
                            }
                        }
                    }
                    if settled == 0 {
                        println!("No activities for any instructor in {month}.");
                    }
                }
            }
        }
        Commands::Report { email, month, out } => {
            let (from, to) = month_window(&month)?;
            let instructor = db::fetch_instructor(&pool, &email).await?;
            match settle_month(&pool, &instructor, from, to).await? {
                Some(monthly) => {
                    let statement = report::build_statement(&monthly);
                    std::fs::write(&out, statement)?;
                    println!("Statement written to {}.", out.display());
                }
                None => println!("No activities for {} in {month}.", instructor.name),
            }
        }
        Commands::Export { email, month, out } => {
            let (from, to) = month_window(&month)?;
            let instructor = db::fetch_instructor(&pool, &email).await?;
            match settle_month(&pool, &instructor, from, to).await? {
                Some(monthly) => {
                    let json = serde_json::to_string_pretty(&monthly)?;
                    std::fs::write(&out, json)?;
                    println!("Settlement written to {}.", out.display());
                }
                None => println!("No activities for {} in {month}.", instructor.name),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_covers_whole_month() {
        let (from, to) = month_window("2026-03").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn month_window_rolls_december_into_next_year() {
        let (from, to) = month_window("2025-12").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn month_window_rejects_malformed_input() {
        assert!(month_window("2026").is_err());
        assert!(month_window("2026-13").is_err());
        assert!(month_window("march").is_err());
    }
}
