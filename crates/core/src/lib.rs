pub mod chunks;
pub mod config;
pub mod failures;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod testing;
pub mod transcoder;

pub use chunks::{list_fragments, merge_chunks, order_key, Fragment, MergeError, MergeSummary};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    LogFormat, LoggingConfig, MetricsConfig,
};
pub use failures::{
    ErrorFilter, ErrorRecord, ErrorReport, ErrorReporter, ErrorStore, ErrorStoreError,
    FailureStage, SqliteErrorStore,
};
pub use ledger::{LedgerError, ProcessingLedger, ProcessingRecord, SqliteLedger};
pub use pipeline::{AssemblyConfig, DecodeError, TaskError, TaskOutcome, TaskPipeline, VideoTask};
pub use transcoder::{
    FfmpegTranscoder, TranscodeError, TranscodeOutput, Transcoder, TranscoderConfig,
};
