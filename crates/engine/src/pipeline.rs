// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed three-step pipeline run for every job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use th_adapters::{
    DatasetRegistry, ExternalValidator, LogAnalyzer, LogArtifact, SourceFetcher, StatusSink,
    ValidationRequest,
};
use th_core::Job;

use crate::cancel::CancellationController;
use crate::error::PipelineError;
use crate::reporter::StatusReporter;

/// Result recorded when any validation log shows errors.
pub const LOG_ERRORS_RESULT: &str = "Failed: errors found in log";

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FetchSource,
    RunExternalValidation,
    AnalyzeLogs,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::FetchSource, Step::RunExternalValidation, Step::AnalyzeLogs];
}

th_core::simple_display! {
    Step {
        FetchSource => "fetch-source",
        RunExternalValidation => "run-external-validation",
        AnalyzeLogs => "analyze-logs",
    }
}

/// How a pipeline run ended when no error escaped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// All steps ran and no log showed errors; nothing terminal sent yet
    Passed,
    /// Log analysis found errors; fail has been sent
    Failed,
}

/// Collaborators the pipeline drives.
#[derive(Clone)]
pub struct PipelineDeps {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub validator: Arc<dyn ExternalValidator>,
    pub analyzer: Arc<dyn LogAnalyzer>,
    pub registry: Arc<dyn DatasetRegistry>,
}

/// Runs FetchSource, RunExternalValidation and AnalyzeLogs for one job.
///
/// Each step is entered the same way: checkpoint, advance progress, report
/// it, execute. A step failing with anything other than a log finding
/// propagates as an error for the worker loop to report.
pub struct StepPipeline {
    deps: PipelineDeps,
    work_dir: PathBuf,
}

impl StepPipeline {
    pub fn new(deps: PipelineDeps, work_dir: impl Into<PathBuf>) -> Self {
        Self { deps, work_dir: work_dir.into() }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub async fn run<S: StatusSink>(
        &self,
        job: &mut Job,
        cancel: &CancellationController,
        reporter: &mut StatusReporter<S>,
    ) -> Result<PipelineOutcome, PipelineError> {
        self.enter(Step::FetchSource, job, cancel, reporter).await?;
        let source = self.deps.fetcher.fetch(&job.args.repo, &job.args.reference).await?;

        self.enter(Step::RunExternalValidation, job, cancel, reporter).await?;
        let artifacts = self.validate(job, &source).await?;

        self.enter(Step::AnalyzeLogs, job, cancel, reporter).await?;
        self.analyze(job, &artifacts, reporter).await
    }

    async fn enter<S: StatusSink>(
        &self,
        step: Step,
        job: &mut Job,
        cancel: &CancellationController,
        reporter: &mut StatusReporter<S>,
    ) -> Result<(), PipelineError> {
        cancel.checkpoint(job, reporter).await?;
        job.progress.advance();
        reporter.send_progress(job.progress).await?;
        tracing::info!(%step, progress = %job.progress, "step started");
        Ok(())
    }

    /// Run the validator once per preset, in registry order.
    async fn validate(&self, job: &Job, source: &Path) -> Result<Vec<LogArtifact>, PipelineError> {
        let presets = self.deps.registry.list_presets().await?;
        if presets.is_empty() {
            tracing::info!("no dataset presets, nothing to validate");
        }

        let mut artifacts = Vec::with_capacity(presets.len());
        for preset in &presets {
            tracing::info!(preset = %preset.name, "validating against dataset");
            let artifact = self
                .deps
                .validator
                .run(ValidationRequest {
                    job_id: &job.id,
                    work_dir: &self.work_dir,
                    source_path: source,
                    preset,
                })
                .await?;
            tracing::debug!(
                preset = %artifact.preset,
                exit = %artifact.exit,
                log = %artifact.path.display(),
                "validation finished"
            );
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }

    /// Scan every artifact; any finding fails the job.
    async fn analyze<S: StatusSink>(
        &self,
        job: &mut Job,
        artifacts: &[LogArtifact],
        reporter: &mut StatusReporter<S>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut failing = Vec::new();
        for artifact in artifacts {
            if self.deps.analyzer.scan(artifact).await? {
                failing.push(artifact.preset.as_str());
            }
        }

        if failing.is_empty() {
            return Ok(PipelineOutcome::Passed);
        }

        tracing::info!(presets = ?failing, "errors found in validation logs");
        job.set_result(LOG_ERRORS_RESULT);
        reporter.send_progress(job.progress).await?;
        reporter.send_fail().await?;
        Ok(PipelineOutcome::Failed)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
