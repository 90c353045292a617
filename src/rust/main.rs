use medpredict::{
    ArtifactInfo, ArtifactStore, ExplainerModel, Predictor, PredictionRequest, PredictorError,
    default_rules, detect_urgency, load_rules_with_defaults, parse_symptom_list,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank likely diseases with the trained classifier
    Predict {
        /// Comma-separated symptoms, e.g. "skin rash,itching"
        #[arg(short, long)]
        symptoms: String,
        /// Number of diseases to show
        #[arg(short = 'k', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=5))]
        top_k: u8,
        #[command(flatten)]
        artifact: ArtifactArgs,
        /// Write the ranked table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// JSON file with extra triage rules, checked after the built-in ones
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Explain how the demo overlap model reasons about symptoms
    Explain {
        /// Comma-separated symptoms
        #[arg(short, long, default_value = "fever,cough")]
        symptoms: String,
    },
    /// Show the size of the loaded vocabulary and label set
    Info {
        #[command(flatten)]
        artifact: ArtifactArgs,
    },
}

#[derive(clap::Args)]
struct ArtifactArgs {
    /// Artifact root directory (defaults to $MEDPREDICT_HOME/artifacts)
    #[arg(long)]
    artifacts: Option<PathBuf>,
    /// Artifact name inside the root
    #[arg(short, long, default_value = "symptom-ann")]
    name: String,
    /// Base URL to download the artifact from when it is missing
    #[arg(long)]
    fetch: Option<String>,
    /// Expected SHA-256 of the model file
    #[arg(long)]
    model_hash: Option<String>,
}

async fn load_predictor(args: &ArtifactArgs) -> anyhow::Result<Predictor> {
    let store = match &args.artifacts {
        Some(root) => ArtifactStore::new(root),
        None => ArtifactStore::new_default(),
    }
    .context("Failed to open artifact store")?;

    let mut artifact = ArtifactInfo::new(&args.name);
    if let Some(url) = &args.fetch {
        artifact = artifact.with_base_url(url);
    }
    if let Some(hash) = &args.model_hash {
        artifact = artifact.with_model_hash(hash);
    }
    store.ensure_artifact(&artifact).await
        .with_context(|| format!("Artifact '{}' is not usable", args.name))?;

    let start_time = Instant::now();
    let predictor = Predictor::builder()
        .with_artifact(&store, &args.name)?
        .build()?;
    info!("Predictor loaded in {:.2?}", start_time.elapsed());
    Ok(predictor)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Predict { symptoms, top_k, artifact, csv, rules } => {
            let predictor = load_predictor(&artifact).await?;
            let symptoms = parse_symptom_list(&symptoms);
            let triage_rules = match rules {
                Some(path) => load_rules_with_defaults(path)?,
                None => default_rules().to_vec(),
            };

            for alert in detect_urgency(&symptoms, &triage_rules) {
                println!("{}", alert);
            }

            let request = PredictionRequest::new(symptoms).with_top_k(top_k as usize);
            let result = match predictor.predict(&request) {
                Ok(result) => result,
                Err(PredictorError::InsufficientInput { recognized, required }) => {
                    eprintln!("Select at least {} known symptoms ({} recognized)", required, recognized);
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            };

            if !result.ignored.is_empty() {
                println!("Ignored unknown symptoms: {}", result.ignored.join(", "));
            }
            println!("\nRanked results:");
            for entry in &result.entries {
                println!(
                    "  #{} {} - Doctor to visit: {} (confidence {:.2}%)",
                    entry.rank, entry.disease, entry.doctor, entry.confidence_percent()
                );
            }
            if let Some(summary) = result.summary() {
                println!(
                    "\nAverage confidence {:.1}% across top {}, spread {:.1}% (max {:.1}% / min {:.1}%)",
                    summary.average_percent, result.len(), summary.spread_percent,
                    summary.max_percent, summary.min_percent
                );
            }

            if let Some(path) = csv {
                std::fs::write(&path, result.to_csv()?)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("Results written to {:?}", path);
            }
        }
        Command::Explain { symptoms } => {
            let symptoms = parse_symptom_list(&symptoms);
            for alert in detect_urgency(&symptoms, default_rules()) {
                println!("{}", alert);
            }

            let explanations = ExplainerModel::demo().score(&symptoms);
            if explanations.is_empty() {
                println!("Not enough signal. Try adding 2-3 more symptoms.");
            }
            for (i, explanation) in explanations.iter().enumerate() {
                println!("#{} - {}", i + 1, explanation.disease);
                println!("  Confidence: {}%", (explanation.confidence * 100.0).round() as u32);
                println!("  Why this appears: {}", explanation.overlap.join(", "));
                println!("  Doctor to visit: {}", explanation.doctor);
            }
        }
        Command::Info { artifact } => {
            let predictor = load_predictor(&artifact).await?;
            let info = predictor.info();
            println!("Diseases: {}", info.num_diseases);
            println!("Symptoms: {}", info.num_symptoms);
        }
    }

    Ok(ExitCode::SUCCESS)
}
