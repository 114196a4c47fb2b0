//! Reconciliation of claimed odometer readings against inspection photos.
//!
//! Each candidate inspection is compared with its prior inspection. When the
//! implied daily usage is below the configured limit the odometer and plate
//! photos are read by OCR and scored, and the outcome is written as an audit
//! record. Per-record failures are logged and counted; they never abort the
//! pass.

mod types;
mod usage;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ReconcileSettings;
use crate::matching::{extract, ExtractionResult, MatchStrategy};
use crate::models::{InspectionRecord, MatchAuditRecord, PhotoCategory, PhotoReference};
use crate::ocr::{read_image, PollPolicy, ReadOutcome, ReadProvider};
use crate::repository::{InspectionStore, StoreError};

pub use types::{PassSummary, ReconcileError, ReconcileEvent, RecordOutcome, SkipReason};
pub use usage::UsageRateEstimate;

/// Options for one pass.
#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    /// Cap on candidates fetched.
    pub limit: Option<usize>,
    /// Compute outcomes without writing anything.
    pub dry_run: bool,
    /// Records processed concurrently.
    pub workers: usize,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            limit: None,
            dry_run: false,
            workers: 1,
        }
    }
}

/// Drives reconciliation over a store and an OCR provider.
pub struct ReconcileService {
    store: Arc<dyn InspectionStore>,
    provider: Arc<dyn ReadProvider>,
    strategy: Arc<dyn MatchStrategy>,
    settings: ReconcileSettings,
    poll: PollPolicy,
}

impl ReconcileService {
    pub fn new(
        store: Arc<dyn InspectionStore>,
        provider: Arc<dyn ReadProvider>,
        settings: ReconcileSettings,
        poll: PollPolicy,
    ) -> Self {
        let strategy = Arc::from(settings.strategy.build(settings.thresholds));
        Self {
            store,
            provider,
            strategy,
            settings,
            poll,
        }
    }

    /// Run one pass over the current candidates.
    ///
    /// Only the candidate fetch can fail the pass as a whole.
    pub async fn run_pass(
        &self,
        options: PassOptions,
        event_tx: mpsc::Sender<ReconcileEvent>,
    ) -> Result<PassSummary, StoreError> {
        let records = self.store.fetch_candidate_records(options.limit).await?;
        info!(
            "Reconciling {} candidate records ({} strategy, max limit {}{})",
            records.len(),
            self.strategy.name(),
            self.settings.max_limit,
            if options.dry_run { ", dry run" } else { "" }
        );
        let _ = event_tx
            .send(ReconcileEvent::PassStarted {
                candidates: records.len(),
            })
            .await;

        let mut summary = PassSummary::default();
        let mut outcomes = stream::iter(records)
            .map(|record| async move {
                let outcome = self.reconcile_record(&record, options.dry_run).await;
                (record.id, outcome)
            })
            .buffer_unordered(options.workers.max(1));

        while let Some((record_id, outcome)) = outcomes.next().await {
            summary.record(&outcome);
            let _ = event_tx
                .send(ReconcileEvent::for_outcome(record_id, &outcome))
                .await;
        }

        info!(
            "Pass complete: {} recorded ({} fully matched), {} skipped, {} failed",
            summary.recorded, summary.fully_matched, summary.skipped, summary.failed
        );
        let _ = event_tx.send(ReconcileEvent::PassComplete { summary }).await;
        Ok(summary)
    }

    /// Reconcile a single record, including the processed stamp.
    ///
    /// Recorded and skipped records are stamped processed; failed ones are
    /// not, so the next pass picks them up again.
    pub async fn reconcile_record(&self, record: &InspectionRecord, dry_run: bool) -> RecordOutcome {
        let outcome = match self.evaluate(record, dry_run).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Record {}: failed: {}", record.id, e);
                return RecordOutcome::Failed(e);
            }
        };

        if !dry_run {
            if let Err(e) = self.store.mark_processed(record.id).await {
                error!("Record {}: failed to mark processed: {}", record.id, e);
                return RecordOutcome::Failed(e.into());
            }
        }
        outcome
    }

    async fn evaluate(
        &self,
        record: &InspectionRecord,
        dry_run: bool,
    ) -> Result<RecordOutcome, ReconcileError> {
        let Some(prior) = self
            .store
            .fetch_prior_record(record.id, record.sequence_number)
            .await?
        else {
            info!("Record {}: no prior record, skipping", record.id);
            return Ok(RecordOutcome::Skipped(SkipReason::NoPriorRecord));
        };

        let estimate = UsageRateEstimate::between(record, &prior);
        let Some(rate) = estimate.rate() else {
            warn!(
                "Record {}: {} elapsed days since record {}, skipping",
                record.id, estimate.elapsed_days, prior.id
            );
            return Ok(RecordOutcome::Skipped(SkipReason::ZeroElapsedDays));
        };
        info!(
            "Record {}: {} km over {} days since record {} ({:.2}/day)",
            record.id, estimate.odometer_delta, estimate.elapsed_days, prior.id, rate
        );

        if rate >= self.settings.max_limit {
            return Ok(RecordOutcome::Skipped(SkipReason::UsagePlausible));
        }

        let photos = self.store.fetch_photos(record.id).await?;
        if photos.is_empty() {
            info!("Record {}: no photos, skipping", record.id);
            return Ok(RecordOutcome::Skipped(SkipReason::InsufficientData));
        }
        let Some(plate) = self.store.fetch_reference_plate(record.id).await? else {
            info!("Record {}: no registered plate, skipping", record.id);
            return Ok(RecordOutcome::Skipped(SkipReason::InsufficientData));
        };

        let odometer = record.odometer_reading.to_string();
        let mut audit = MatchAuditRecord::new(record.id);
        for photo in &photos {
            let reference = match photo.category {
                PhotoCategory::Odometer => odometer.as_str(),
                PhotoCategory::Plate => plate.as_str(),
            };
            let extraction = self.read_photo(photo, reference).await?;
            info!(
                "Record {}: {} expected {:?}, read {:?}, {}",
                record.id,
                photo.category,
                reference,
                extraction.aggregated_digits,
                if extraction.matched { "matched" } else { "not matched" }
            );
            audit.apply(&extraction);
        }

        if dry_run {
            info!("Record {}: dry run, audit not written: {:?}", record.id, audit);
            return Ok(RecordOutcome::Recorded(audit));
        }

        self.store.write_audit_record(&audit).await?;
        if self.settings.auto_verify && audit.fully_matched() {
            self.store.mark_ocr_verified(record.id).await?;
            info!("Record {}: marked OCR verified", record.id);
        }
        Ok(RecordOutcome::Recorded(audit))
    }

    /// Read one photo and score it. Unreadable and rejected images yield an
    /// unmatched extraction; other OCR errors, credential refusals included,
    /// fail the record.
    async fn read_photo(
        &self,
        photo: &PhotoReference,
        reference: &str,
    ) -> Result<ExtractionResult, ReconcileError> {
        debug!(
            "Record {}: reading {} photo {}",
            photo.record_id, photo.category, photo.image_url
        );

        match read_image(self.provider.as_ref(), &photo.image_url, &self.poll).await {
            Ok(outcome @ ReadOutcome::Succeeded(_)) => Ok(extract(
                photo.category,
                outcome.lines(),
                reference,
                self.strategy.as_ref(),
            )),
            Ok(ReadOutcome::Unreadable) => {
                warn!(
                    "Record {}: {} photo not clear enough to process",
                    photo.record_id, photo.category
                );
                Ok(ExtractionResult::unmatched(photo.category))
            }
            Err(e) if e.rejects_image() => {
                warn!(
                    "Record {}: {} photo rejected: {}",
                    photo.record_id, photo.category, e
                );
                Ok(ExtractionResult::unmatched(photo.category))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::matching::{MatchThresholds, StrategyKind};
    use crate::ocr::{OcrError, ReadOperation, ReadStatus, RecognizedLine, RecognizedPage};

    #[derive(Default)]
    struct MemoryStore {
        records: Vec<InspectionRecord>,
        priors: HashMap<i32, InspectionRecord>,
        photos: HashMap<i32, Vec<PhotoReference>>,
        plates: HashMap<i32, String>,
        audits: Mutex<Vec<MatchAuditRecord>>,
        processed: Mutex<Vec<i32>>,
        verified: Mutex<Vec<i32>>,
    }

    impl MemoryStore {
        fn processed(&self) -> Vec<i32> {
            let mut ids = self.processed.lock().unwrap().clone();
            ids.sort();
            ids
        }

        fn audits(&self) -> Vec<MatchAuditRecord> {
            self.audits.lock().unwrap().clone()
        }

        fn verified(&self) -> Vec<i32> {
            self.verified.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InspectionStore for MemoryStore {
        async fn fetch_candidate_records(
            &self,
            limit: Option<usize>,
        ) -> Result<Vec<InspectionRecord>, StoreError> {
            let processed = self.processed.lock().unwrap().clone();
            Ok(self
                .records
                .iter()
                .filter(|r| !processed.contains(&r.id))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect())
        }

        async fn fetch_prior_record(
            &self,
            record_id: i32,
            _sequence_number: i32,
        ) -> Result<Option<InspectionRecord>, StoreError> {
            Ok(self.priors.get(&record_id).cloned())
        }

        async fn fetch_photos(&self, record_id: i32) -> Result<Vec<PhotoReference>, StoreError> {
            Ok(self.photos.get(&record_id).cloned().unwrap_or_default())
        }

        async fn fetch_reference_plate(
            &self,
            record_id: i32,
        ) -> Result<Option<String>, StoreError> {
            Ok(self.plates.get(&record_id).cloned())
        }

        async fn write_audit_record(&self, record: &MatchAuditRecord) -> Result<(), StoreError> {
            self.audits.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn mark_processed(&self, record_id: i32) -> Result<(), StoreError> {
            let mut processed = self.processed.lock().unwrap();
            if !processed.contains(&record_id) {
                processed.push(record_id);
            }
            Ok(())
        }

        async fn mark_ocr_verified(&self, record_id: i32) -> Result<(), StoreError> {
            self.verified.lock().unwrap().push(record_id);
            Ok(())
        }
    }

    #[derive(Clone)]
    enum Script {
        Lines(Vec<&'static str>),
        Unreadable,
        Rejected,
        Unavailable,
        BadKey,
    }

    /// Provider answering by image URL.
    #[derive(Default)]
    struct ScriptedProvider {
        scripts: HashMap<String, Script>,
        submitted: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn with(mut self, url: &str, script: Script) -> Self {
            self.scripts.insert(url.to_string(), script);
            self
        }

        fn submitted(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReadProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn submit(&self, image_url: &str) -> Result<ReadOperation, OcrError> {
            self.submitted.lock().unwrap().push(image_url.to_string());
            match self.scripts.get(image_url) {
                Some(Script::Rejected) => Err(OcrError::Permanent("InvalidImageUrl".into())),
                Some(Script::Unavailable) => Err(OcrError::Transient("503".into())),
                Some(Script::BadKey) => Err(OcrError::Unauthorized("401".into())),
                Some(_) => Ok(ReadOperation::new(image_url)),
                None => Err(OcrError::Permanent(format!("unknown image {}", image_url))),
            }
        }

        async fn poll(&self, operation: &ReadOperation) -> Result<ReadStatus, OcrError> {
            match self.scripts.get(&operation.location) {
                Some(Script::Lines(lines)) => Ok(ReadStatus::Succeeded(vec![RecognizedPage {
                    page: 1,
                    lines: lines.iter().map(|l| RecognizedLine::new(*l)).collect(),
                }])),
                Some(Script::Unreadable) => Ok(ReadStatus::Failed),
                _ => Ok(ReadStatus::Pending),
            }
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn inspection(id: i32, odometer: i64, sequence_number: i32, day: u32) -> InspectionRecord {
        InspectionRecord {
            id,
            odometer_reading: odometer,
            sequence_number,
            start_date: date(day),
        }
    }

    fn photo(record_id: i32, category: PhotoCategory, url: &str) -> PhotoReference {
        PhotoReference {
            record_id,
            category,
            image_url: url.to_string(),
        }
    }

    /// Record 1: odometer 10000 at sequence 5, prior 9000 at sequence 4 ten
    /// days earlier.
    fn flagged_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.records.push(inspection(1, 10000, 5, 11));
        store.priors.insert(1, inspection(100, 9000, 4, 1));
        store.photos.insert(
            1,
            vec![
                photo(1, PhotoCategory::Odometer, "odo-1"),
                photo(1, PhotoCategory::Plate, "plate-1"),
            ],
        );
        store.plates.insert(1, "B 1234 XYZ".to_string());
        store
    }

    fn settings(max_limit: f64) -> ReconcileSettings {
        ReconcileSettings {
            max_limit,
            strategy: StrategyKind::Membership,
            thresholds: MatchThresholds::default(),
            auto_verify: true,
        }
    }

    fn service(
        store: &Arc<MemoryStore>,
        provider: &Arc<ScriptedProvider>,
        settings: ReconcileSettings,
    ) -> ReconcileService {
        ReconcileService::new(
            store.clone(),
            provider.clone(),
            settings,
            PollPolicy {
                interval: Duration::ZERO,
                max_attempts: 3,
            },
        )
    }

    #[tokio::test]
    async fn test_flagged_record_both_matched() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["ODO", "10001 km", "55555"]))
                .with("plate-1", Script::Lines(vec!["B 1243 KZT"])),
        );
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        let RecordOutcome::Recorded(audit) = outcome else {
            panic!("expected recorded outcome, got {:?}", outcome);
        };

        assert_eq!(audit.odo_result, "10001");
        assert_eq!(audit.odo_raw_text, "ODO10001 km");
        assert!(audit.odo_matched);
        assert_eq!(audit.plate_result, "1243");
        assert!(audit.plate_matched);

        assert_eq!(store.audits(), vec![audit]);
        assert_eq!(store.processed(), vec![1]);
        assert_eq!(store.verified(), vec![1]);
        assert_eq!(provider.submitted(), vec!["odo-1", "plate-1"]);
    }

    #[tokio::test]
    async fn test_unrelated_digits_do_not_match() {
        // "9999" shares no digit with "10000".
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["9999", "noise$$"]))
                .with("plate-1", Script::Lines(vec!["B 1234 XYZ"])),
        );
        let service = service(&store, &provider, settings(200.0));

        let RecordOutcome::Recorded(audit) =
            service.reconcile_record(&store.records[0], false).await
        else {
            panic!("expected recorded outcome");
        };

        assert_eq!(audit.odo_result, "9999");
        assert_eq!(audit.odo_raw_text, "9999noise$$");
        assert!(!audit.odo_matched);
        assert!(audit.plate_matched);
        assert!(store.verified().is_empty());
        assert_eq!(store.processed(), vec![1]);
    }

    #[tokio::test]
    async fn test_zero_elapsed_days_skips() {
        let mut store = MemoryStore::default();
        store.records.push(inspection(2, 10000, 5, 11));
        store.priors.insert(2, inspection(200, 9000, 4, 11));
        let store = Arc::new(store);
        let provider = Arc::new(ScriptedProvider::default());
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Skipped(SkipReason::ZeroElapsedDays)
        ));
        assert_eq!(store.processed(), vec![2]);
        assert!(provider.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_no_prior_record_skips() {
        let mut store = MemoryStore::default();
        store.records.push(inspection(3, 10000, 1, 11));
        let store = Arc::new(store);
        let provider = Arc::new(ScriptedProvider::default());
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Skipped(SkipReason::NoPriorRecord)
        ));
    }

    #[tokio::test]
    async fn test_rate_at_limit_is_plausible() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(ScriptedProvider::default());
        let service = service(&store, &provider, settings(100.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Skipped(SkipReason::UsagePlausible)
        ));
        assert!(provider.submitted().is_empty());
        assert!(store.audits().is_empty());
    }

    #[tokio::test]
    async fn test_missing_plate_is_insufficient() {
        let mut store = flagged_store();
        store.plates.clear();
        let store = Arc::new(store);
        let provider = Arc::new(ScriptedProvider::default());
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Skipped(SkipReason::InsufficientData)
        ));
        assert!(provider.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_and_rejected_photos_are_unmatched() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Unreadable)
                .with("plate-1", Script::Rejected),
        );
        let service = service(&store, &provider, settings(200.0));

        let RecordOutcome::Recorded(audit) =
            service.reconcile_record(&store.records[0], false).await
        else {
            panic!("expected recorded outcome");
        };
        assert_eq!(audit.odo_result, "");
        assert!(!audit.odo_matched);
        assert_eq!(audit.plate_raw_text, "");
        assert!(!audit.plate_matched);
        assert_eq!(store.audits().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_error_leaves_record_for_retry() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["10000"]))
                .with("plate-1", Script::Unavailable),
        );
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Failed(ReconcileError::Ocr(OcrError::Transient(_)))
        ));
        assert!(store.audits().is_empty());
        assert!(store.processed().is_empty());
    }

    #[tokio::test]
    async fn test_refused_credentials_fail_without_audit() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::BadKey)
                .with("plate-1", Script::BadKey),
        );
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Failed(ReconcileError::Ocr(OcrError::Unauthorized(_)))
        ));
        assert!(store.audits().is_empty());
        assert!(store.processed().is_empty());
        assert_eq!(provider.submitted(), vec!["odo-1"]);
    }

    #[tokio::test]
    async fn test_poll_timeout_fails_record() {
        let store = Arc::new(flagged_store());
        let service = ReconcileService::new(
            store.clone(),
            Arc::new(PendingProvider),
            settings(200.0),
            PollPolicy {
                interval: Duration::ZERO,
                max_attempts: 2,
            },
        );

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Failed(ReconcileError::Ocr(OcrError::Timeout { attempts: 2 }))
        ));
        assert!(store.audits().is_empty());
        assert!(store.processed().is_empty());
    }

    /// Provider whose operations never finish.
    struct PendingProvider;

    #[async_trait]
    impl ReadProvider for PendingProvider {
        fn name(&self) -> &str {
            "pending"
        }

        async fn submit(&self, image_url: &str) -> Result<ReadOperation, OcrError> {
            Ok(ReadOperation::new(image_url))
        }

        async fn poll(&self, _operation: &ReadOperation) -> Result<ReadStatus, OcrError> {
            Ok(ReadStatus::Pending)
        }
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["10000"]))
                .with("plate-1", Script::Lines(vec!["1234"])),
        );
        let service = service(&store, &provider, settings(200.0));

        let outcome = service.reconcile_record(&store.records[0], true).await;
        let RecordOutcome::Recorded(audit) = outcome else {
            panic!("expected recorded outcome");
        };
        assert!(audit.fully_matched());
        assert!(store.audits().is_empty());
        assert!(store.processed().is_empty());
        assert!(store.verified().is_empty());
    }

    #[tokio::test]
    async fn test_auto_verify_disabled() {
        let store = Arc::new(flagged_store());
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["10000"]))
                .with("plate-1", Script::Lines(vec!["1234"])),
        );
        let mut settings = settings(200.0);
        settings.auto_verify = false;
        let service = service(&store, &provider, settings);

        let outcome = service.reconcile_record(&store.records[0], false).await;
        assert!(matches!(outcome, RecordOutcome::Recorded(_)));
        assert_eq!(store.audits().len(), 1);
        assert!(store.verified().is_empty());
    }

    #[tokio::test]
    async fn test_pass_summary_and_events() {
        let mut store = flagged_store();
        // Plausible usage: 3000 km in 10 days.
        store.records.push(inspection(2, 12000, 5, 11));
        store.priors.insert(2, inspection(200, 9000, 4, 1));
        // No prior.
        store.records.push(inspection(3, 500, 1, 11));
        // Flagged, OCR unavailable.
        store.records.push(inspection(4, 9100, 5, 11));
        store.priors.insert(4, inspection(400, 9000, 4, 1));
        store
            .photos
            .insert(4, vec![photo(4, PhotoCategory::Odometer, "odo-4")]);
        store.plates.insert(4, "B 1 A".to_string());

        let store = Arc::new(store);
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("odo-1", Script::Lines(vec!["10000"]))
                .with("plate-1", Script::Lines(vec!["1234"]))
                .with("odo-4", Script::Unavailable),
        );
        let service = service(&store, &provider, settings(200.0));

        let (tx, mut rx) = mpsc::channel(32);
        let summary = service
            .run_pass(
                PassOptions {
                    workers: 2,
                    ..PassOptions::default()
                },
                tx,
            )
            .await
            .unwrap();

        assert_eq!(
            summary,
            PassSummary {
                recorded: 1,
                skipped: 2,
                failed: 1,
                fully_matched: 1,
            }
        );
        assert_eq!(store.processed(), vec![1, 2, 3]);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(matches!(
            events.first(),
            Some(ReconcileEvent::PassStarted { candidates: 4 })
        ));
        assert!(matches!(
            events.last(),
            Some(ReconcileEvent::PassComplete { .. })
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            ReconcileEvent::RecordFailed { record_id: 4, .. }
        )));
        assert_eq!(events.len(), 6);

        // Only the failed record is left for the next pass.
        let (tx, _rx) = mpsc::channel(32);
        let again = service.run_pass(PassOptions::default(), tx).await.unwrap();
        assert_eq!(again.total(), 1);
        assert_eq!(again.failed, 1);
    }

    #[tokio::test]
    async fn test_pass_limit() {
        let mut store = MemoryStore::default();
        for id in 1..=5 {
            store.records.push(inspection(id, 100, 1, 11));
        }
        let store = Arc::new(store);
        let provider = Arc::new(ScriptedProvider::default());
        let service = service(&store, &provider, settings(200.0));

        let (tx, _rx) = mpsc::channel(32);
        let summary = service
            .run_pass(
                PassOptions {
                    limit: Some(2),
                    ..PassOptions::default()
                },
                tx,
            )
            .await
            .unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(store.processed(), vec![1, 2]);
    }
}
