use metrics::counter;

use super::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub struct AzureTableBatchSubmitted<'a> {
    pub table: &'a str,
    pub partition_key: &'a str,
    pub count: usize,
}

impl InternalEvent for AzureTableBatchSubmitted<'_> {
    fn emit(self) {
        trace!(
            message = "Batch submitted.",
            table = %self.table,
            partition_key = %self.partition_key,
            count = %self.count,
        );
        counter!("component_sent_events_total", "table" => self.table.to_owned())
            .increment(self.count as u64);
    }
}

#[derive(Debug)]
pub struct AzureTableEnsured<'a> {
    pub table: &'a str,
}

impl InternalEvent for AzureTableEnsured<'_> {
    fn emit(self) {
        debug!(message = "Table is available.", table = %self.table);
    }
}

/// Table creation failed but the sink was configured to carry on regardless.
#[derive(Debug)]
pub struct AzureTableCreationBypassed<'a> {
    pub table: &'a str,
    pub error: &'a crate::Error,
}

impl InternalEvent for AzureTableCreationBypassed<'_> {
    fn emit(self) {
        warn!(
            message = "Failed to create table; continuing because table creation validation is bypassed.",
            table = %self.table,
            error = %self.error,
            error_type = error_type::CONFIGURATION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::CONFIGURATION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

/// A periodic flush failed. The events in it are not retried.
#[derive(Debug)]
pub struct AzureTableFlushError<'a, E> {
    pub error: &'a E,
    pub count: usize,
}

impl<E: std::fmt::Display> InternalEvent for AzureTableFlushError<'_, E> {
    fn emit(self) {
        error!(
            message = "Failed to flush events to table storage.",
            error = %self.error,
            count = %self.count,
            error_type = error_type::REQUEST_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::REQUEST_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("component_discarded_events_total", "intentional" => "false")
            .increment(self.count as u64);
    }
}
