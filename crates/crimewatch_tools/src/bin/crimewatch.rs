#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crimewatch_tools::model_cli::{execute_check_model, execute_fit, execute_predict};
use crimewatch_tools::store_cli::{execute_list_reports, execute_list_users};

#[derive(Parser)]
#[command(name = "crimewatch")]
#[command(about = "Offline model fitting and store inspection for CrimeWatch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the prediction artifacts once; does nothing if they already exist
    Fit {
        /// Historical dataset (wide CSV with State, Year and crime-type count columns)
        #[arg(short, long, default_value = "dataset/CrimesOnWomenData.csv")]
        dataset: PathBuf,

        #[arg(short, long, env = "CRIMEWATCH_MODEL_PATH", default_value = "models")]
        model_dir: PathBuf,

        /// Fit one vocabulary on states and apply it to both columns
        #[arg(long)]
        shared_encoder: bool,
    },

    /// Load the persisted artifacts and describe them
    CheckModel {
        #[arg(short, long, env = "CRIMEWATCH_MODEL_PATH", default_value = "models")]
        model_dir: PathBuf,
    },

    /// Predict a count for one (state, year, crime type)
    Predict {
        #[arg(short, long, env = "CRIMEWATCH_MODEL_PATH", default_value = "models")]
        model_dir: PathBuf,

        #[arg(long)]
        state: String,

        #[arg(long)]
        year: String,

        #[arg(long)]
        crime_type: String,
    },

    /// List stored crime reports
    Reports {
        #[arg(short, long, env = "CRIMEWATCH_STORE_PATH", default_value = "data")]
        store_path: PathBuf,
    },

    /// List registered usernames
    Users {
        #[arg(short, long, env = "CRIMEWATCH_STORE_PATH", default_value = "data")]
        store_path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crimewatch=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let output = match cli.command {
        Commands::Fit {
            dataset,
            model_dir,
            shared_encoder,
        } => execute_fit(&dataset, &model_dir, shared_encoder)?,
        Commands::CheckModel { model_dir } => execute_check_model(&model_dir)?,
        Commands::Predict {
            model_dir,
            state,
            year,
            crime_type,
        } => execute_predict(&model_dir, &state, &year, &crime_type)?,
        Commands::Reports { store_path } => execute_list_reports(&store_path)?,
        Commands::Users { store_path } => execute_list_users(&store_path)?,
    };
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
