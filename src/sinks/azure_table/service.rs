use std::{
    result::Result as StdResult,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tower::Service;
use tracing::Instrument;

use super::batch::TableBatch;

/// The storage operations the sink needs from a table service client.
///
/// Transport, authentication and retries are the client's concern.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Creates `table`, succeeding if it already exists.
    async fn create_table_if_not_exists(&self, table: &str) -> crate::Result<()>;

    /// Submits all operations of `batch` to `table` as a single transaction.
    async fn submit_batch(&self, table: &str, batch: TableBatch) -> crate::Result<()>;
}

#[derive(Clone, Debug)]
pub struct TableBatchRequest {
    pub table: String,
    pub batch: TableBatch,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableBatchResponse {
    pub partition_key: String,
    pub count: usize,
}

pub struct TableService<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> TableService<C> {
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C: ?Sized> Clone for TableService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: TableClient + ?Sized + 'static> Service<TableBatchRequest> for TableService<C> {
    type Response = TableBatchResponse;
    type Error = crate::Error;
    type Future = BoxFuture<'static, StdResult<Self::Response, Self::Error>>;

    // Emission of an internal event in case of errors is handled upstream by the caller.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<StdResult<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: TableBatchRequest) -> Self::Future {
        let client = Arc::clone(&self.client);

        Box::pin(async move {
            let response = TableBatchResponse {
                partition_key: request.batch.partition_key().to_owned(),
                count: request.batch.len(),
            };

            client
                .submit_batch(&request.table, request.batch)
                .instrument(info_span!("request").or_current())
                .await
                .map(|()| response)
        })
    }
}
