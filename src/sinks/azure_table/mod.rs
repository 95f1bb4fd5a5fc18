//! Sink that writes structured log events to Azure Table Storage.
//!
//! Each event becomes one entity. Entities are grouped into batch transactions by partition key
//! and submitted in order through a [`TableClient`], which owns transport and authentication.

mod batch;
mod config;
mod entity;
mod error;
mod formatter;
mod keys;
mod service;
mod sink;


pub use self::{
    batch::{MAX_OPERATIONS_PER_BATCH, TableBatch, TableOperation, plan_batches},
    config::{
        AzureTableSinkConfig, BatchConfig, BatcherSettings, DEFAULT_TABLE_NAME,
        KeyGeneratorConfig,
    },
    entity::{
        AGGREGATED_PROPERTIES, EXCEPTION, EntityFactory, LEVEL, MAX_PROPERTIES_PER_ROW,
        MESSAGE_TEMPLATE, RENDERED_MESSAGE, TableEntity, create_entity, is_valid_column_name,
    },
    error::{AzureTableSinkError, ConfigError},
    formatter::{CellValue, to_entity_value},
    keys::{DefaultKeyGenerator, KeyGenerator, MAX_KEY_LENGTH, sanitize_key, ticks},
    service::{TableBatchRequest, TableBatchResponse, TableClient, TableService},
    sink::AzureTableSink,
};
