//! # Infermedica API Command Line Entry Point
//!
//! Loads configuration, registers the configured connectors and runs a single
//! API call, printing the JSON response.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use infermedica_api::{
    config::ConfigLoader,
    connectors::{Registry, RequestOptions},
    models::{Age, AgeUnit, ConceptType, DiagnosticData, Evidence, SearchConceptType, Sex},
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "infermedica-api", version, about = "Query the Infermedica API")]
struct Cli {
    /// Configured connector alias (defaults to the default connector)
    #[arg(long, global = true)]
    alias: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show API and knowledge base information
    Info,
    /// Search observations by phrase
    Search {
        phrase: String,
        #[command(flatten)]
        age: AgeArgs,
        #[arg(long)]
        sex: Option<Sex>,
        #[arg(long)]
        max_results: Option<u32>,
        /// Observation type filter (symptom, risk_factor, lab_test)
        #[arg(long = "type")]
        types: Vec<SearchConceptType>,
    },
    /// List concepts, optionally filtered by ids and types
    Concepts {
        #[arg(long = "id")]
        ids: Vec<String>,
        #[arg(long = "type")]
        types: Vec<ConceptType>,
    },
    /// Show a single concept
    Concept { id: String },
    /// Run a diagnosis step for the given evidence
    Diagnosis(PatientArgs),
    /// Estimate triage level for the given evidence
    Triage(PatientArgs),
}

#[derive(Debug, Args)]
struct AgeArgs {
    #[arg(long, default_value_t = 30)]
    age: u16,
    #[arg(long)]
    age_unit: Option<AgeUnit>,
}

impl AgeArgs {
    fn age(&self) -> Age {
        Age::new(self.age, self.age_unit)
    }
}

#[derive(Debug, Args)]
struct PatientArgs {
    #[arg(long)]
    sex: Sex,
    #[command(flatten)]
    age: AgeArgs,
    /// Evidence as `<id>:<present|absent|unknown>`, repeatable
    #[arg(long = "evidence", required = true)]
    evidence: Vec<Evidence>,
    #[arg(long)]
    interview_id: Option<String>,
}

impl PatientArgs {
    fn diagnostic_data(&self) -> DiagnosticData {
        DiagnosticData::new(self.sex, self.age.age()).with_evidence(self.evidence.iter().cloned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;
    info!(profile = %config.profile, "Loaded configuration");

    let registry = Registry::from_config(&config).context("registering connectors")?;
    let connector = registry
        .lookup(cli.alias.as_deref())
        .context("selecting connector")?;

    let response: Value = match cli.command {
        Command::Info => connector.basic().info(RequestOptions::new()).await?,
        Command::Search {
            phrase,
            age,
            sex,
            max_results,
            types,
        } => {
            connector
                .standard()?
                .search(
                    &phrase,
                    age.age(),
                    sex,
                    max_results,
                    &types,
                    RequestOptions::new(),
                )
                .await?
        }
        Command::Concepts { ids, types } => {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            connector
                .standard()?
                .concept_list(&ids, &types, RequestOptions::new())
                .await?
        }
        Command::Concept { id } => {
            connector
                .standard()?
                .concept_details(&id, RequestOptions::new())
                .await?
        }
        Command::Diagnosis(patient) => {
            connector
                .standard()?
                .diagnosis(
                    &patient.diagnostic_data(),
                    patient.interview_id.as_deref(),
                    RequestOptions::new(),
                )
                .await?
        }
        Command::Triage(patient) => {
            connector
                .standard()?
                .triage(
                    &patient.diagnostic_data(),
                    patient.interview_id.as_deref(),
                    RequestOptions::new(),
                )
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
