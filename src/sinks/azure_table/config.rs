use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use snafu::IntoError;

use super::{
    entity::EntityFactory,
    error::{AzureTableSinkError, ConfigError, CreateTableSnafu},
    keys::{DefaultKeyGenerator, KeyGenerator},
    service::{TableClient, TableService},
    sink::AzureTableSink,
};
use crate::internal_events::{AzureTableCreationBypassed, AzureTableEnsured};

pub const DEFAULT_TABLE_NAME: &str = "LogEventEntity";

const fn default_max_events() -> NonZeroUsize {
    NonZeroUsize::new(50).unwrap()
}

const fn default_timeout_secs() -> f64 {
    2.0
}

const fn default_partition_bucket_secs() -> u64 {
    1
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_owned()
}

/// Configuration for the Azure Table Storage log sink.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AzureTableSinkConfig {
    /// The table log events are written to. Created on startup if it does not exist.
    #[serde(default = "default_table_name")]
    pub storage_table_name: String,

    /// Appended verbatim to every row key, e.g. to keep rows written by several hosts apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_row_key_postfix: Option<String>,

    /// Properties that may be stored as columns of their own when `only_specific_properties`
    /// is set.
    #[serde(default)]
    pub property_columns: Vec<String>,

    /// Store only the properties listed in `property_columns` as columns. All other properties
    /// end up in `AggregatedProperties`.
    #[serde(default)]
    pub only_specific_properties: bool,

    /// Log table creation failures instead of refusing to start, for credentials that may write
    /// entities but not create tables.
    #[serde(default)]
    pub bypass_table_creation_validation: bool,

    #[serde(default)]
    pub key_generator: KeyGeneratorConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl Default for AzureTableSinkConfig {
    fn default() -> Self {
        Self {
            storage_table_name: default_table_name(),
            additional_row_key_postfix: None,
            property_columns: Vec::new(),
            only_specific_properties: false,
            bypass_table_creation_validation: false,
            key_generator: KeyGeneratorConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

/// How partition and row keys are generated.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyGeneratorConfig {
    /// Time bucketed partition keys and content addressed row keys.
    Default {
        /// Width of the time bucket that groups events into one partition.
        #[serde(default = "default_partition_bucket_secs")]
        partition_bucket_secs: u64,
    },
}

impl Default for KeyGeneratorConfig {
    fn default() -> Self {
        KeyGeneratorConfig::Default {
            partition_bucket_secs: default_partition_bucket_secs(),
        }
    }
}

impl KeyGeneratorConfig {
    pub fn build(&self) -> Result<Arc<dyn KeyGenerator>, ConfigError> {
        match *self {
            KeyGeneratorConfig::Default {
                partition_bucket_secs: 0,
            } => Err(ConfigError::InvalidPartitionBucket),
            KeyGeneratorConfig::Default {
                partition_bucket_secs,
            } => Ok(Arc::new(DefaultKeyGenerator::with_partition_bucket(
                Duration::from_secs(partition_bucket_secs),
            ))),
        }
    }
}

/// Bounds for the chunks the periodic driver flushes.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Flush once this many events are waiting.
    #[serde(default = "default_max_events")]
    pub max_events: NonZeroUsize,

    /// Flush events that have waited this long, even if fewer than `max_events` arrived.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BatchConfig {
    pub fn into_batcher_settings(self) -> Result<BatcherSettings, ConfigError> {
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or(ConfigError::InvalidBatchTimeout {
                timeout_secs: self.timeout_secs,
            })?;

        Ok(BatcherSettings {
            max_events: self.max_events,
            timeout,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BatcherSettings {
    pub max_events: NonZeroUsize,
    pub timeout: Duration,
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            timeout: Duration::from_secs(2),
        }
    }
}

impl AzureTableSinkConfig {
    /// A config with every option at its default, in TOML form.
    pub fn generate_config() -> Result<toml::Value, toml::ser::Error> {
        toml::Value::try_from(Self::default())
    }

    pub fn entity_factory(&self) -> Result<EntityFactory, ConfigError> {
        Ok(EntityFactory::new(self.key_generator.build()?)
            .with_row_key_suffix(self.additional_row_key_postfix.clone())
            .with_property_columns(
                self.property_columns.clone(),
                self.only_specific_properties,
            ))
    }

    /// Validates the config, makes sure the table exists and returns a sink writing to it.
    pub async fn build<C>(
        &self,
        client: Arc<C>,
    ) -> Result<AzureTableSink<TableService<C>>, AzureTableSinkError>
    where
        C: TableClient + ?Sized + 'static,
    {
        let entity_factory = self.entity_factory()?;
        let batch_settings = self.batch.into_batcher_settings()?;
        let table = self.storage_table_name.as_str();

        match client.create_table_if_not_exists(table).await {
            Ok(()) => emit!(AzureTableEnsured { table }),
            Err(error) if self.bypass_table_creation_validation => {
                emit!(AzureTableCreationBypassed {
                    table,
                    error: &error,
                })
            }
            Err(error) => {
                return Err(CreateTableSnafu { table }.into_error(error));
            }
        }

        Ok(AzureTableSink::new(
            table,
            entity_factory,
            batch_settings,
            TableService::new(client),
        ))
    }
}
