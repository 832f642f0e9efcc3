use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod audit;
mod churn;
mod classify;
mod config;
mod db;
mod error;
mod features;
mod models;
mod pipeline;
mod report;
mod rules;
mod schema;
mod store;
mod validate;

use crate::audit::AuditLog;
use crate::churn::{ChurnModel, LogisticModel};
use crate::config::RuleConfig;
use crate::db::PgHistory;
use crate::models::{ClassifiedMessage, ClassifierResult};
use crate::store::{HistoryStore, InMemoryHistory};

#[derive(Parser)]
#[command(name = "churn-signal")]
#[command(about = "Churn risk scoring from customer conversations", long_about = None)]
struct Cli {
    /// Consistency rule configuration
    #[arg(long, global = true, default_value = "rules.yaml")]
    rules: PathBuf,
    /// Exported churn model
    #[arg(long, global = true, default_value = "churn_model.json")]
    model: PathBuf,
    /// Rule-hit audit log (JSON lines)
    #[arg(long, global = true, default_value = "logs/rule_hits.jsonl")]
    audit_log: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Reconcile one classified message and add it to the customer's history
    Analyze {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        emotion: String,
        #[arg(long)]
        emotion_confidence: f64,
        #[arg(long)]
        sentiment: String,
        #[arg(long)]
        sentiment_confidence: f64,
        #[arg(long)]
        intent: String,
        #[arg(long)]
        intent_confidence: f64,
    },
    /// Import classified messages from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Churn score for one customer
    Score {
        #[arg(long)]
        customer: String,
    },
    /// Generate a markdown report for one customer
    Report {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Score every customer in a CSV without touching the database
    Simulate {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Load configuration and model and verify the pipeline contracts
    Check,
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn self_check(config: &RuleConfig, model: &dyn ChurnModel) -> anyhow::Result<()> {
    let record = rules::reconcile(
        "just checking, all good now",
        &ClassifierResult::new("Sad", 0.55),
        &ClassifierResult::new("Negative", 0.88),
        &ClassifierResult::new("Inquiry", 0.57),
        config,
    );
    validate::validate_ci_output(&record, &config.schema_version)?;

    let features = features::map_to_features(&record);
    validate::validate_feature_mapping(&features)?;
    validate::validate_aggregation_output(&aggregate::aggregate(&[features.clone(), features]))?;
    validate::validate_aggregation_output(&aggregate::aggregate(&[]))?;

    let defaults = models::AggregateRecord::default();
    for name in model.feature_names() {
        if defaults.value(name).is_none() {
            tracing::warn!(feature = %name, "model feature is not produced by aggregation, scoring it as 0");
        }
    }
    Ok(())
}

async fn print_score<S: HistoryStore>(
    store: &S,
    model: &dyn ChurnModel,
    customer: &str,
) -> anyhow::Result<()> {
    match pipeline::churn_score(store, model, customer).await? {
        Some(score) => println!(
            "{} churn risk {:.2} ({})",
            score.customer_id, score.probability, score.risk_level
        ),
        None => println!("No messages found for customer {customer}."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Analyze {
            customer,
            text,
            emotion,
            emotion_confidence,
            sentiment,
            sentiment_confidence,
            intent,
            intent_confidence,
        } => {
            let config = RuleConfig::load(&cli.rules)?;
            let audit = AuditLog::open(&cli.audit_log)?;
            let store = PgHistory::new(connect().await?);
            let message = ClassifiedMessage {
                customer_id: customer,
                text,
                emotion,
                emotion_confidence,
                sentiment,
                sentiment_confidence,
                intent,
                intent_confidence,
            };
            let record =
                pipeline::analyze_classified(&store, &config, Some(&audit), &message).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Import { csv } => {
            let config = RuleConfig::load(&cli.rules)?;
            let audit = AuditLog::open(&cli.audit_log)?;
            let store = PgHistory::new(connect().await?);
            let messages = pipeline::read_messages(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;
            let imported =
                pipeline::import_messages(&store, &config, Some(&audit), &messages).await?;
            println!("Analyzed {imported} messages from {}.", csv.display());
        }
        Commands::Score { customer } => {
            let model = LogisticModel::load(&cli.model)?;
            let store = PgHistory::new(connect().await?);
            print_score(&store, &model, &customer).await?;
        }
        Commands::Report { customer, out } => {
            let model = LogisticModel::load(&cli.model)?;
            let store = PgHistory::new(connect().await?);
            let score = pipeline::churn_score(&store, &model, &customer).await?;
            let history = store.get(&customer).await?.unwrap_or_default();
            let recent = store.timeline(&customer, 5).await?;
            let report = report::build_report(&customer, score.as_ref(), &history, &recent);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Simulate { csv, limit } => {
            let config = RuleConfig::load(&cli.rules)?;
            let model = LogisticModel::load(&cli.model)?;
            let store = InMemoryHistory::new();
            let messages = pipeline::read_messages(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;
            pipeline::import_messages(&store, &config, None, &messages).await?;

            let mut scores = Vec::new();
            for customer in store.customers().await {
                if let Some(score) = pipeline::churn_score(&store, &model, &customer).await? {
                    scores.push(score);
                }
            }

            if scores.is_empty() {
                println!("No messages found in {}.", csv.display());
                return Ok(());
            }

            scores.sort_by(|a, b| b.probability.total_cmp(&a.probability));
            println!("Top customers by churn risk:");
            for score in scores.iter().take(limit) {
                println!(
                    "- {} churn risk {:.2} ({})",
                    score.customer_id, score.probability, score.risk_level
                );
            }
        }
        Commands::Check => {
            let config = RuleConfig::load(&cli.rules)?;
            let model = LogisticModel::load(&cli.model)?;
            self_check(&config, &model)?;
            println!("Contracts validated for rules {}.", config.schema_version);
        }
    }

    Ok(())
}
