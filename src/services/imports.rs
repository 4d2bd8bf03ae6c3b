//! Bulk import: optional enrichment, then one atomic bulk write

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::batch::{BatchEnricher, ProgressSink};
use crate::{
    error::AppResult,
    models::{Asset, BatchFailure, ImportCandidate, ImportReport},
    repository::{AssetStore, MAX_BULK_WRITE},
};

#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn AssetStore>,
    enricher: Option<BatchEnricher>,
    max_persisted: usize,
}

impl ImportService {
    pub fn new(store: Arc<dyn AssetStore>, enricher: Option<BatchEnricher>, max_persisted: usize) -> Self {
        Self {
            store,
            enricher,
            max_persisted: max_persisted.clamp(1, MAX_BULK_WRITE),
        }
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.enricher.is_some()
    }

    /// Import `candidates`, overwriting any existing asset with the same id.
    ///
    /// Enrichment problems never fail the import; they end up in the report.
    /// Candidates with a blank name are skipped and listed. Candidates beyond
    /// the persisted-batch limit are dropped and listed.
    pub async fn run(
        &self,
        mut candidates: Vec<ImportCandidate>,
        enrich: bool,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> AppResult<ImportReport> {
        let mut report = ImportReport {
            received: candidates.len(),
            ..Default::default()
        };

        let (named, unnamed): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| !c.name.trim().is_empty());
        if !unnamed.is_empty() {
            tracing::warn!(skipped = unnamed.len(), "Skipping import candidates without a name");
            report.skipped = unnamed.len();
            report.skipped_ids = unnamed.into_iter().map(|c| c.id).collect();
        }
        candidates = named;

        if candidates.is_empty() {
            return Ok(report);
        }

        tracing::info!(received = report.received, enrich, "Starting import");

        if enrich {
            match self.enricher {
                Some(ref enricher) => {
                    let outcome = enricher.enrich(&mut candidates, progress, cancel).await;
                    report.enriched = outcome.enriched;
                    report.failures = outcome.failures;
                    report.enrichment_aborted = outcome.aborted;
                    report.enrichment_cancelled = outcome.cancelled;
                }
                None => {
                    tracing::warn!("Enrichment requested but no completion endpoint is configured");
                    report.failures.push(BatchFailure {
                        batch_index: 0,
                        total_batches: 0,
                        permanent: true,
                        message: "AI enrichment is not configured".to_string(),
                    });
                    report.enrichment_aborted = true;
                }
            }
        }

        if candidates.len() > self.max_persisted {
            let dropped = candidates.split_off(self.max_persisted);
            tracing::warn!(
                dropped = dropped.len(),
                limit = self.max_persisted,
                "Import truncated to the bulk write limit"
            );
            report.truncated = true;
            report.dropped = dropped.len();
            report.dropped_ids = dropped.into_iter().map(|c| c.id).collect();
        }

        let assets: Vec<Asset> = candidates.into_iter().map(ImportCandidate::into_asset).collect();
        self.store.bulk_set(&assets).await?;
        report.persisted = assets.len();

        tracing::info!(
            persisted = report.persisted,
            dropped = report.dropped,
            skipped = report.skipped,
            enriched = report.enriched,
            "Import completed"
        );
        Ok(report)
    }
}
