//! In-memory tabular dataset built on Arrow record batches.
//!
//! A [`Dataset`] is an immutable value: every transformation returns a new
//! dataset. [`Dataset::retain`] compacts the batches into one and marks the
//! dataset as kept for reuse by later stages.

use std::time::Instant;

use anyhow::Context;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::utils::arrow::select_columns;

/// Named collection of record batches sharing one schema
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    retained: bool,
}

impl Dataset {
    /// Create a dataset, checking that every batch matches `schema`
    pub fn try_new(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(bad) = batches.iter().find(|b| b.schema() != schema) {
            anyhow::bail!(
                "Batch schema {:?} does not match dataset '{}' schema {:?}",
                bad.schema(),
                name,
                schema
            );
        }
        Ok(Self {
            name,
            schema,
            batches,
            retained: false,
        })
    }

    /// Wrap a single batch
    #[must_use]
    pub fn from_batch(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            schema: batch.schema(),
            batches: vec![batch],
            retained: false,
        }
    }

    /// An empty dataset with the given schema
    #[must_use]
    pub fn empty(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            name: name.into(),
            schema,
            batches: Vec::new(),
            retained: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Whether the dataset has been marked for reuse
    #[must_use]
    pub fn is_retained(&self) -> bool {
        self.retained
    }

    /// Rename the dataset, keeping its data
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Materialize the dataset as a single batch and mark it for reuse
    pub fn retain(self) -> Result<Self> {
        if self.retained {
            return Ok(self);
        }

        let start = Instant::now();
        let batch = self.to_batch()?;
        log::debug!(
            "Retained dataset '{}' ({} rows, {} batches) in {:?}",
            self.name,
            batch.num_rows(),
            self.batches.len(),
            start.elapsed()
        );

        Ok(Self {
            name: self.name,
            schema: self.schema,
            batches: vec![batch],
            retained: true,
        })
    }

    /// Concatenate all batches into one
    pub fn to_batch(&self) -> Result<RecordBatch> {
        match self.batches.as_slice() {
            [single] => Ok(single.clone()),
            batches => concat_batches(&self.schema, batches)
                .with_context(|| format!("Failed to concatenate batches of '{}'", self.name)),
        }
    }

    /// Apply a batch transformation in parallel, producing a new dataset
    ///
    /// Empty output batches are dropped. The output schema is taken from the
    /// transformation itself, so an empty input still yields the right schema.
    pub fn map_batches<F>(&self, name: impl Into<String>, transformation: F) -> Result<Self>
    where
        F: Fn(&RecordBatch) -> Result<RecordBatch> + Send + Sync,
    {
        let name = name.into();
        let results: Vec<RecordBatch> = if self.batches.is_empty() {
            vec![transformation(&RecordBatch::new_empty(self.schema.clone()))?]
        } else {
            self.batches
                .par_iter()
                .map(|batch| transformation(batch))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Failed to derive '{name}' from '{}'", self.name))?
        };

        let schema = results
            .first()
            .map_or_else(|| self.schema.clone(), RecordBatch::schema);
        let batches = results.into_iter().filter(|b| b.num_rows() > 0).collect();

        Self::try_new(name, schema, batches)
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, columns: &[&str]) -> Result<Self> {
        let empty = RecordBatch::new_empty(self.schema.clone());
        let schema = select_columns(&empty, columns)?.schema();
        let batches = self
            .batches
            .iter()
            .map(|b| select_columns(b, columns))
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(self.name.clone(), schema, batches)
    }

    /// Deserialize every row into `T` using `serde_arrow`
    pub fn to_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let rows: Vec<T> = serde_arrow::from_record_batch(batch)
                .map_err(|e| anyhow::anyhow!("Failed to deserialize '{}': {}", self.name, e))?;
            records.extend(rows);
        }
        Ok(records)
    }
}
