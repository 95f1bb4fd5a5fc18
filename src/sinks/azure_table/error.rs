use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum ConfigError {
    #[snafu(display("Batch timeout must be a positive number of seconds, got {}", timeout_secs))]
    InvalidBatchTimeout { timeout_secs: f64 },

    #[snafu(display("Partition bucket must be at least one second"))]
    InvalidPartitionBucket,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum AzureTableSinkError {
    #[snafu(display("Invalid configuration: {}", source))]
    Config { source: ConfigError },

    #[snafu(display("Failed to create table {:?}: {}", table, source))]
    CreateTable {
        table: String,
        source: crate::Error,
    },

    #[snafu(display(
        "Failed to submit batch of {} operations for partition {:?}: {}",
        count,
        partition_key,
        source
    ))]
    SubmitBatch {
        partition_key: String,
        count: usize,
        source: crate::Error,
    },

    #[snafu(display("Flush cancelled after submitting {} of {} batches", submitted, total))]
    Cancelled { submitted: usize, total: usize },
}

impl From<ConfigError> for AzureTableSinkError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}
