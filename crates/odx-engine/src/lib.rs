//! Extraction engine: pages through the remote source and stores cleaned records

use std::time::Duration;

use odx_config::Config;
use odx_core::{Record, record_id, strip_metadata};
use odx_security::Anonymizer;
use odx_sources::{FetchError, ODataSettings, ODataSource, PageRequest, PageSource};
use odx_storage::{JsonFileSink, RecordSink, StorageError};
use thiserror::Error;
use tracing::{debug, error, info};

/// Why a run stopped before exhausting the collection
#[derive(Error, Debug)]
pub enum AbortReason {
    #[error("total count could not be read: {0}")]
    TotalCount(odx_core::Error),

    #[error("page request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("record rejected: {0}")]
    Record(odx_core::Error),

    #[error("record could not be stored: {0}")]
    Sink(#[from] StorageError),
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    Aborted(AbortReason),
}

#[derive(Debug)]
pub struct RunSummary {
    pub processed: u64,
    pub outcome: Outcome,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub page_size: u64,
    /// Ceiling on records extracted; `None` and `Some(0)` both mean no ceiling.
    pub max_records: Option<u64>,
    pub id_field: String,
}

/// Paging position. `effective_total` is fixed by the first page.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    skip: u64,
    effective_total: Option<u64>,
}

impl Cursor {
    fn remaining(&self) -> u64 {
        self.effective_total
            .map_or(u64::MAX, |total| total.saturating_sub(self.skip))
    }

    fn exhausted(&self) -> bool {
        self.effective_total.is_some_and(|total| self.skip >= total)
    }

    fn finish(self, outcome: Outcome) -> RunSummary {
        let processed = self
            .effective_total
            .map_or(self.skip, |total| self.skip.min(total));
        RunSummary { processed, outcome }
    }
}

pub struct Extractor {
    source: Box<dyn PageSource>,
    sink: Box<dyn RecordSink>,
    anonymizer: Anonymizer,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(
        source: Box<dyn PageSource>,
        sink: Box<dyn RecordSink>,
        anonymizer: Anonymizer,
        options: ExtractOptions,
    ) -> Self {
        Self {
            source,
            sink,
            anonymizer,
            options,
        }
    }

    /// Wire the HTTP source and file sink described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let source = ODataSource::new(ODataSettings {
            host: config.host.clone(),
            service_path: config.service_path.clone(),
            user: config.auth.user.clone(),
            password: config.auth.pass.clone(),
            params: config.query_params(),
            accept_invalid_certs: config.accept_invalid_certs,
            timeout: Duration::from_secs(config.timeout_secs),
        })?;

        Ok(Self::new(
            Box::new(source),
            Box::new(JsonFileSink::new(&config.output_dir)),
            Anonymizer::new(&config.anonymize_fields),
            ExtractOptions {
                page_size: config.page_size,
                max_records: config.max_records,
                id_field: config.id_field.clone(),
            },
        ))
    }

    /// Fetch pages one at a time until the effective total is reached, the
    /// server returns an empty page, or something fails.
    ///
    /// Failures never escape: they end the run and are reported in the summary.
    pub async fn run(&mut self) -> RunSummary {
        let mut cursor = Cursor::default();

        loop {
            let request = PageRequest {
                top: self.options.page_size,
                skip: cursor.skip,
            };

            let page = match self.source.fetch(request).await {
                Ok(page) => page,
                Err(e) => {
                    log_fetch_error(&e);
                    return cursor.finish(Outcome::Aborted(AbortReason::Fetch(e)));
                }
            };

            if cursor.effective_total.is_none() {
                let total = match page.total() {
                    Ok(total) => total,
                    Err(e) => {
                        error!(error = %e, "Could not read the total record count");
                        return cursor.finish(Outcome::Aborted(AbortReason::TotalCount(e)));
                    }
                };
                let effective = self
                    .options
                    .max_records
                    .filter(|&max| max > 0)
                    .map_or(total, |max| total.min(max));
                info!(total, effective, "Total records reported by server");
                cursor.effective_total = Some(effective);
            }

            if page.is_empty() {
                info!(skip = cursor.skip, "Server returned an empty page");
                return cursor.finish(Outcome::Completed);
            }

            let mut records = page.records;
            let remaining = usize::try_from(cursor.remaining()).unwrap_or(usize::MAX);
            records.truncate(remaining);

            if !records.is_empty() {
                info!(
                    "Processing {} records ({} to {})",
                    records.len(),
                    cursor.skip + 1,
                    cursor.skip + records.len() as u64
                );
            }

            for record in records {
                if let Err(reason) = self.process(record).await {
                    error!(error = %reason, "Stopping extraction");
                    return cursor.finish(Outcome::Aborted(reason));
                }
                cursor.skip += 1;
            }

            if cursor.exhausted() {
                return cursor.finish(Outcome::Completed);
            }
        }
    }

    async fn process(&mut self, mut record: Record) -> Result<(), AbortReason> {
        let id = record_id(&record, &self.options.id_field).map_err(AbortReason::Record)?;

        strip_metadata(&mut record);
        let infos = self.anonymizer.anonymize(&mut record);

        self.sink.write(&id, &record).await?;

        debug!(
            id = %id,
            anonymized = infos.iter().map(|i| i.count).sum::<usize>(),
            "Record stored"
        );
        Ok(())
    }
}

fn log_fetch_error(err: &FetchError) {
    match err {
        FetchError::Status { status, body } => {
            error!(status = %status, body = %body, "Server responded with an error status");
        }
        FetchError::NoResponse { url, message } => {
            error!(url = %url, error = %message, "No response received from server");
        }
        FetchError::Request(message) => {
            error!(error = %message, "Request could not be constructed");
        }
        FetchError::Decode(message) => {
            error!(error = %message, "Server response is not an OData collection");
        }
    }
}
