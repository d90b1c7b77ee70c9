//! # History Store
//!
//! SQLite persistence for one analysis result per calendar day. Writing a day that
//! already exists replaces its meals, totals and risk; history reads return the
//! newest days first.

use crate::meal_model::{MealSlots, RiskAssessment, RiskLevel, Totals};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One recorded day
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub meals: MealSlots,
    pub totals: Totals,
    pub risk_level: RiskLevel,
    pub risk_reason: String,
    /// Time of the last write, as stored by SQLite
    pub recorded_at: String,
}

/// Open (creating if needed) the database behind `database_url`
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to {database_url}"))
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,
            meals_json TEXT NOT NULL,
            total_nutrition_json TEXT NOT NULL,
            risk_level TEXT NOT NULL,
            risk_reason TEXT NOT NULL,
            timestamp TEXT DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_history table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Record the analysis for `date`, replacing any earlier record for that day
pub async fn log_daily_entry(
    pool: &SqlitePool,
    date: NaiveDate,
    meals: &MealSlots,
    totals: &Totals,
    risk: &RiskAssessment,
) -> Result<()> {
    let date_str = date.format(DATE_FORMAT).to_string();
    info!("Recording daily entry for {}", date_str);

    let meals_json = serde_json::to_string(meals).context("Failed to serialize meals")?;
    let totals_json = serde_json::to_string(totals).context("Failed to serialize totals")?;

    sqlx::query(
        "INSERT INTO user_history (date, meals_json, total_nutrition_json, risk_level, risk_reason)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(date) DO UPDATE SET
             meals_json = excluded.meals_json,
             total_nutrition_json = excluded.total_nutrition_json,
             risk_level = excluded.risk_level,
             risk_reason = excluded.risk_reason,
             timestamp = CURRENT_TIMESTAMP",
    )
    .bind(&date_str)
    .bind(meals_json)
    .bind(totals_json)
    .bind(risk.level.as_str())
    .bind(&risk.reason)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to record entry for {date_str}"))?;

    Ok(())
}

fn row_to_entry(row: &SqliteRow) -> Result<HistoryEntry> {
    let date_str: String = row.try_get("date")?;
    let meals_json: String = row.try_get("meals_json")?;
    let totals_json: String = row.try_get("total_nutrition_json")?;
    let risk_level: String = row.try_get("risk_level")?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date: {date_str}"))?;
    let risk_level = risk_level
        .parse::<RiskLevel>()
        .map_err(anyhow::Error::msg)?;

    Ok(HistoryEntry {
        id: row.try_get("id")?,
        date,
        meals: serde_json::from_str(&meals_json).context("Invalid stored meals")?,
        totals: serde_json::from_str(&totals_json).context("Invalid stored totals")?,
        risk_level,
        risk_reason: row.try_get("risk_reason")?,
        recorded_at: row.try_get::<Option<String>, _>("timestamp")?.unwrap_or_default(),
    })
}

/// The `limit` most recent days, newest first
///
/// Rows that cannot be decoded are logged and skipped.
pub async fn get_history(pool: &SqlitePool, limit: i64) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        "SELECT id, date, meals_json, total_nutrition_json, risk_level, risk_reason, timestamp
         FROM user_history ORDER BY date DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to read history")?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        match row_to_entry(row) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping unreadable history row: {:#}", e),
        }
    }
    Ok(entries)
}

/// The record for a single day
pub async fn get_entry_by_date(pool: &SqlitePool, date: NaiveDate) -> Result<Option<HistoryEntry>> {
    let row = sqlx::query(
        "SELECT id, date, meals_json, total_nutrition_json, risk_level, risk_reason, timestamp
         FROM user_history WHERE date = ?1",
    )
    .bind(date.format(DATE_FORMAT).to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to read entry")?;

    row.as_ref().map(row_to_entry).transpose()
}
