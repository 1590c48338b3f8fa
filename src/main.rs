use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use camp_donations::{InvalidFeaturePolicy, Pipeline, PipelineConfig, PipelineError, Result};
use clap::Parser;
use log::info;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "camp-donations",
    about = "Denormalize health camp data to Parquet and predict donations",
    version
)]
struct Args {
    /// Camp metadata file
    #[arg(long)]
    camps: Option<PathBuf>,

    /// Attendance and donation records file
    #[arg(long)]
    attendance: Option<PathBuf>,

    /// Patient profiles file
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Parquet output directory, replaced on every run
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON configuration; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed of the train/test split
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows used for training
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Null feature handling: error, skip or zero
    #[arg(long, value_name = "POLICY")]
    invalid_features: Option<InvalidFeaturePolicy>,

    /// Held-out rows shown in the report
    #[arg(long)]
    show_rows: Option<usize>,

    /// Show a stage progress bar
    #[arg(long, default_value_t = false)]
    progress: bool,

    /// Write the run summary as JSON to this path
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(PipelineConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(camps) = self.camps {
            config.inputs.camps = camps;
        }
        if let Some(attendance) = self.attendance {
            config.inputs.attendance = attendance;
        }
        if let Some(profiles) = self.profiles {
            config.inputs.profiles = profiles;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
        if let Some(ratio) = self.train_ratio {
            config.model.train_ratio = ratio;
        }
        if let Some(policy) = self.invalid_features {
            config.features.invalid_policy = policy;
        }
        if let Some(rows) = self.show_rows {
            config.show_rows = rows;
        }
        config.show_progress |= self.progress;

        for (flag, path) in [
            ("--camps", &config.inputs.camps),
            ("--attendance", &config.inputs.attendance),
            ("--profiles", &config.inputs.profiles),
        ] {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::Config(format!(
                    "no input path given; pass {flag} or set it in --config"
                ))
                .into());
            }
        }

        Ok((config, self.summary_json))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, summary_json) = Args::parse().into_config()?;
    let summary = Pipeline::new(config).run()?;

    if let Some(path) = summary_json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))?;
        info!("Wrote run summary to {}", path.display());
    }

    Ok(())
}
