use std::sync::Arc;

use futures::stream::BoxStream;
use snafu::ResultExt;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};

use super::{
    batch::plan_batches,
    config::BatcherSettings,
    entity::EntityFactory,
    error::{AzureTableSinkError, CancelledSnafu, SubmitBatchSnafu},
    keys::KeyGenerator,
    service::{TableBatchRequest, TableBatchResponse},
};
use crate::{
    event::LogEvent,
    internal_events::{AzureTableBatchSubmitted, AzureTableFlushError},
};

/// Writes log events to a table, one batch transaction per partition run.
pub struct AzureTableSink<S> {
    table: String,
    entity_factory: EntityFactory,
    batch_settings: BatcherSettings,
    service: S,
}

impl<S> AzureTableSink<S> {
    pub fn new(
        table: impl Into<String>,
        entity_factory: EntityFactory,
        batch_settings: BatcherSettings,
        service: S,
    ) -> Self {
        Self {
            table: table.into(),
            entity_factory,
            batch_settings,
            service,
        }
    }

    /// Replaces the key generator, e.g. with a custom implementation.
    #[must_use]
    pub fn with_key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.entity_factory = self.entity_factory.with_key_generator(key_generator);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl<S> AzureTableSink<S>
where
    S: Service<TableBatchRequest, Response = TableBatchResponse> + Send,
    S::Error: Into<crate::Error> + Send,
    S::Future: Send,
{
    /// Writes `events` to the table.
    ///
    /// Batches are submitted one at a time, in the order the events were given. The first
    /// failing submission ends the flush; batches before it stay written.
    pub async fn flush(&mut self, events: &[LogEvent]) -> Result<(), AzureTableSinkError> {
        self.flush_inner(events, None).await
    }

    /// Like [`flush`](Self::flush), but stops before submitting the next batch once `token` is
    /// cancelled. A submission already in flight is allowed to finish.
    pub async fn flush_until_cancelled(
        &mut self,
        events: &[LogEvent],
        token: &CancellationToken,
    ) -> Result<(), AzureTableSinkError> {
        self.flush_inner(events, Some(token)).await
    }

    async fn flush_inner(
        &mut self,
        events: &[LogEvent],
        token: Option<&CancellationToken>,
    ) -> Result<(), AzureTableSinkError> {
        if events.is_empty() {
            return Ok(());
        }

        let entity_factory = &self.entity_factory;
        let batches = plan_batches(
            events
                .iter()
                .map(|event| entity_factory.create_entity(event)),
        );
        let total = batches.len();

        for (submitted, batch) in batches.into_iter().enumerate() {
            if token.is_some_and(CancellationToken::is_cancelled) {
                return CancelledSnafu { submitted, total }.fail();
            }

            let partition_key = batch.partition_key().to_owned();
            let count = batch.len();
            let request = TableBatchRequest {
                table: self.table.clone(),
                batch,
            };

            let result = match self.service.ready().await {
                Ok(service) => service.call(request).await,
                Err(error) => Err(error),
            };
            let response = result
                .map_err(Into::<crate::Error>::into)
                .context(SubmitBatchSnafu {
                    partition_key,
                    count,
                })?;

            emit!(AzureTableBatchSubmitted {
                table: &self.table,
                partition_key: &response.partition_key,
                count: response.count,
            });
        }

        Ok(())
    }

    /// Flushes events from `input` whenever `batch.max_events` of them are waiting or
    /// `batch.timeout_secs` has passed, until the stream ends.
    ///
    /// A failed flush is reported and its events are dropped; the driver keeps going.
    pub async fn run(mut self, input: BoxStream<'_, LogEvent>) -> Result<(), ()> {
        let chunks = input.chunks_timeout(
            self.batch_settings.max_events.get(),
            self.batch_settings.timeout,
        );
        tokio::pin!(chunks);

        while let Some(events) = chunks.next().await {
            if let Err(error) = self.flush(&events).await {
                emit!(AzureTableFlushError {
                    error: &error,
                    count: events.len(),
                });
            }
        }

        Ok(())
    }
}
