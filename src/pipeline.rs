//! Two-stage pipeline: ETL (load, transform, write) then ML (features,
//! split, fit, predict, evaluate, report).
//!
//! Stages run strictly in order and hand their outputs to the next stage by
//! value. The first error aborts the run.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Local};
use indicatif::ProgressBar;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::features::{FEATURE_COLUMNS, prepare_features};
use crate::loader::load_sources;
use crate::model::{
    BinaryClassificationEvaluator, Estimator, LogisticRegressionEstimator, Predictor, random_split,
};
use crate::schema::col;
use crate::transform::denormalize;
use crate::utils::logging::{
    begin_stage, create_stage_progress_bar, finish_progress_bar, finish_stage,
    print_evaluation_report,
};
use crate::writer::{WriteSummary, write_parquet};

const STAGES: [&str; 9] = [
    "load", "transform", "write", "features", "split", "fit", "predict", "evaluate", "report",
];

/// Row counts observed after each stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageRows {
    pub camps: usize,
    pub attendance: usize,
    pub profiles: usize,
    pub profiles_exploded: usize,
    pub denormalized: usize,
    pub features: usize,
    pub train: usize,
    pub test: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub elapsed_secs: f64,
    pub rows: StageRows,
    pub output: WriteSummary,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub area_under_roc: f64,
    /// Held-out rows with `prediction` and `probability`
    #[serde(skip_serializing)]
    pub predictions: Dataset,
}

impl RunSummary {
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .path
            .parent()
            .map_or_else(|| self.output.path.clone(), PathBuf::from)
    }
}

/// Runs the whole pipeline for one configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration and run every stage in a dedicated worker pool
    pub fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        log::info!("{}", self.config);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads)
            .thread_name(|i| format!("camp-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;

        pool.install(|| self.run_stages())
    }

    fn run_stages(&self) -> Result<RunSummary> {
        let config = &self.config;
        let started_at = Local::now();
        let start = Instant::now();
        let pb = create_stage_progress_bar(STAGES.len() as u64, config.show_progress);
        let mut rows = StageRows::default();

        // ETL
        stage(&pb, "load");
        let sources = load_sources(&config.inputs, &config.loader)?;
        rows.camps = sources.camps.num_rows();
        rows.attendance = sources.attendance.num_rows();
        rows.profiles = sources.profiles.num_rows();
        finish_stage(&pb);

        stage(&pb, "transform");
        let transformed = denormalize(sources, &config.transform)?;
        rows.profiles_exploded = transformed.profiles.num_rows();
        rows.denormalized = transformed.denormalized.num_rows();
        finish_stage(&pb);

        stage(&pb, "write");
        let output = write_parquet(&transformed.denormalized, &config.output_dir)?;
        finish_stage(&pb);

        // ML
        stage(&pb, "features");
        let features = prepare_features(&transformed.denormalized, &config.features)?.retain()?;
        rows.features = features.num_rows();
        finish_stage(&pb);

        stage(&pb, "split");
        let (train, test) = random_split(&features, config.model.train_ratio, config.model.seed)?;
        rows.train = train.num_rows();
        rows.test = test.num_rows();
        finish_stage(&pb);

        stage(&pb, "fit");
        let model = LogisticRegressionEstimator::new(config.model.alpha).fit(
            &train,
            col::DONATION_LABEL,
            col::FEATURES,
        )?;
        log::info!("{}", model.summary(&FEATURE_COLUMNS));
        finish_stage(&pb);

        stage(&pb, "predict");
        let predictions = model.predict(&test)?.with_name("predictions");
        finish_stage(&pb);

        stage(&pb, "evaluate");
        let area_under_roc = BinaryClassificationEvaluator::default().area_under_roc(&predictions)?;
        finish_stage(&pb);

        stage(&pb, "report");
        pb.suspend(|| print_evaluation_report(area_under_roc, &predictions, config.show_rows))?;
        finish_stage(&pb);

        finish_progress_bar(&pb, Some("Pipeline complete"));
        let elapsed = start.elapsed();
        log::info!("Pipeline finished in {elapsed:?}");

        Ok(RunSummary {
            started_at,
            elapsed_secs: elapsed.as_secs_f64(),
            rows,
            output,
            coefficients: model.coefficients().to_vec(),
            intercept: model.intercept(),
            area_under_roc,
            predictions,
        })
    }
}

fn stage(pb: &ProgressBar, name: &str) {
    log::debug!("Starting stage '{name}'");
    begin_stage(pb, name);
}
