use std::error::Error;
use std::sync::Arc;

use tracing::error;

use super::{ErrorReport, ErrorStore, FailureStage};
use crate::metrics;

/// Surfaces task failures through logs and the error store.
///
/// Reporting never fails the caller: a store error is logged and dropped.
#[derive(Clone)]
pub struct ErrorReporter {
    store: Arc<dyn ErrorStore>,
}

impl ErrorReporter {
    pub fn new(store: Arc<dyn ErrorStore>) -> Self {
        Self { store }
    }

    /// Records a failed attempt for `video_id` at `stage`.
    ///
    /// Returns the persisted record ID, or `None` if persistence failed.
    pub fn report(&self, video_id: i64, stage: FailureStage, err: &dyn Error) -> Option<i64> {
        let report = ErrorReport::new(video_id, stage, error_chain(err));
        metrics::TASK_FAILURES
            .with_label_values(&[stage.as_str()])
            .inc();

        let serialized = serde_json::to_string(&report).unwrap_or_default();
        error!(
            video_id,
            stage = stage.as_str(),
            detail = %report.detail,
            error_details = %serialized,
            "{}",
            report.message
        );

        match self.store.insert(&report) {
            Ok(id) => Some(id),
            Err(e) => {
                error!(
                    video_id,
                    stage = stage.as_str(),
                    error = %e,
                    "Failed to persist error record"
                );
                None
            }
        }
    }
}

/// Renders an error and its `source()` chain as `outer: inner: root`.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
