use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use glycomeal::analysis::MealAnalyzer;
use glycomeal::annotation::RuleBasedAnnotator;
use glycomeal::config::{AppConfig, WEEKLY_HISTORY_DAYS};
use glycomeal::db;
use glycomeal::meal_model::MealSlots;
use glycomeal::nutrition_lookup::{has_usable_credentials, DisabledLookup, EdamamClient, NutritionLookup};
use glycomeal::nutrition_matcher::NutritionMatcher;
use glycomeal::nutrition_table::NutritionTable;
use glycomeal::suggestions::{GroqSuggestionClient, SuggestionGenerator};
use glycomeal::weekly_report::weekly_stats;
use serde_json::json;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  glycomeal analyze [--date YYYY-MM-DD] breakfast=\"..\" lunch=\"..\" snacks=\"..\" dinner=\"..\"
  glycomeal weekly";

/// Parsed `analyze` arguments
struct AnalyzeArgs {
    date: NaiveDate,
    meals: MealSlots,
}

fn parse_analyze_args(args: &[String]) -> Result<AnalyzeArgs> {
    let mut date = Local::now().date_naive();
    let mut meals = MealSlots::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--date" {
            let value = iter.next().context("--date needs a value")?;
            date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("Invalid date: {value}"))?;
            continue;
        }

        let Some((slot, text)) = arg.split_once('=') else {
            bail!("Expected slot=text, got '{arg}'\n{USAGE}");
        };
        if !meals.set_slot(slot, text) {
            bail!("Unknown meal slot '{slot}'\n{USAGE}");
        }
    }

    Ok(AnalyzeArgs { date, meals })
}

fn build_lookup(config: &AppConfig) -> Result<Arc<dyn NutritionLookup>> {
    let lookup = &config.lookup;
    if has_usable_credentials(lookup.app_id.as_deref(), lookup.app_key.as_deref()) {
        Ok(Arc::new(EdamamClient::new(lookup.clone())?))
    } else {
        warn!("Edamam credentials missing, external nutrition lookup disabled");
        Ok(Arc::new(DisabledLookup))
    }
}

async fn run_analyze(config: &AppConfig, args: &[String]) -> Result<()> {
    let AnalyzeArgs { date, meals } = parse_analyze_args(args)?;

    let table = Arc::new(NutritionTable::load(&config.nutrition_csv_path));
    let matcher = NutritionMatcher::with_min_confidence(table, build_lookup(config)?, config.min_match_confidence);
    let analyzer = MealAnalyzer::with_thresholds(RuleBasedAnnotator::new(), matcher, config.risk.clone());

    let analysis = analyzer.analyze_meals(&meals).await;

    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;
    db::log_daily_entry(&pool, date, &meals, &analysis.totals, &analysis.risk).await?;

    let generator = GroqSuggestionClient::new(config.suggestions.clone())?;
    let suggestions = generator.suggest(&analysis.totals, analysis.risk.level).await;

    let output = json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "items": analysis.items,
        "totals": analysis.totals,
        "risk_level": analysis.risk.level,
        "risk_reason": analysis.risk.reason,
        "suggestions": suggestions,
        "unmatched": analysis.unmatched,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_weekly(config: &AppConfig) -> Result<()> {
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;
    let history = db::get_history(&pool, WEEKLY_HISTORY_DAYS).await?;
    let stats = weekly_stats(&history);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = AppConfig::from_env();
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("analyze") => {
            info!("Analyzing meals");
            run_analyze(&config, &args[1..]).await
        }
        Some("weekly") => run_weekly(&config).await,
        _ => bail!("{USAGE}"),
    }
}
