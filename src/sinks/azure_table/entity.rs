//! Mapping of log events onto table entities.
//!
//! Every entity carries the fixed columns `MessageTemplate`, `Level`, `RenderedMessage` and,
//! when the event has one, `Exception`. Each property whose name is a valid column name becomes
//! a column of its own while the row has room for it; the rest are collected into a single
//! `AggregatedProperties` column.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeMap};

use super::{
    formatter::{CellValue, to_entity_value},
    keys::{DefaultKeyGenerator, KeyGenerator},
};
use crate::{
    event::{LogEvent, PropertyValue, ScalarValue},
    format::{FormatProvider, provider_or_default},
};

/// Columns available to an entity: the service allows 255 per row, three of which are the
/// partition key, row key and timestamp.
pub const MAX_PROPERTIES_PER_ROW: usize = 252;

pub const MESSAGE_TEMPLATE: &str = "MessageTemplate";
pub const LEVEL: &str = "Level";
pub const RENDERED_MESSAGE: &str = "RenderedMessage";
pub const EXCEPTION: &str = "Exception";
pub const AGGREGATED_PROPERTIES: &str = "AggregatedProperties";

const MAX_COLUMN_NAME_LENGTH: usize = 255;

const RESERVED_COLUMNS: [&str; 8] = [
    "PartitionKey",
    "RowKey",
    "Timestamp",
    MESSAGE_TEMPLATE,
    LEVEL,
    RENDERED_MESSAGE,
    EXCEPTION,
    AGGREGATED_PROPERTIES,
];

// One or two dot-separated identifiers, none starting with a digit.
static COLUMN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w&&[^\d]]\w*(?:\.[\w&&[^\d]]\w*)?$").expect("column name regex is valid")
});

/// A single row of the log table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub timestamp: DateTime<Utc>,
    pub properties: IndexMap<String, CellValue>,
}

impl TableEntity {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.properties.get(column)
    }

    /// Number of columns besides the partition key, row key and timestamp.
    pub fn column_count(&self) -> usize {
        self.properties.len()
    }
}

/// The JSON body of an insert operation, with OData type annotations where the service can't
/// infer the type.
impl Serialize for TableEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let annotations = self
            .properties
            .values()
            .filter(|value| value.edm_type().is_some())
            .count();
        let mut map = serializer.serialize_map(Some(4 + self.properties.len() + annotations))?;
        map.serialize_entry("PartitionKey", &self.partition_key)?;
        map.serialize_entry("RowKey", &self.row_key)?;
        map.serialize_entry(
            "Timestamp",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )?;
        map.serialize_entry("Timestamp@odata.type", "Edm.DateTime")?;
        for (name, value) in &self.properties {
            if let Some(edm_type) = value.edm_type() {
                map.serialize_entry(&format!("{name}@odata.type"), edm_type)?;
            }
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Whether `name` can be used as a column of its own.
pub fn is_valid_column_name(name: &str) -> bool {
    name.chars().count() <= MAX_COLUMN_NAME_LENGTH
        && !RESERVED_COLUMNS.contains(&name)
        && COLUMN_NAME.is_match(name)
}

/// Accounts for one more property column.
///
/// The running count is compared before it is incremented, so at most
/// `MAX_PROPERTIES_PER_ROW - 1` columns are ever taken and one always stays free for
/// `AggregatedProperties`. Returns whether the property fits, and the updated count.
pub const fn admit_column(column_count: usize) -> (bool, usize) {
    (
        column_count < MAX_PROPERTIES_PER_ROW - 1,
        column_count + 1,
    )
}

#[derive(Debug)]
struct Columns {
    properties: IndexMap<String, CellValue>,
    overflow: Vec<(ScalarValue, PropertyValue)>,
    column_count: usize,
}

/// Builds the table entity for a log event.
///
/// When `only_specific_properties` is set, only properties named in `property_columns` may
/// become columns; all others go to `AggregatedProperties`.
pub fn create_entity(
    event: &LogEvent,
    provider: Option<&dyn FormatProvider>,
    row_key_suffix: Option<&str>,
    key_generator: &dyn KeyGenerator,
    property_columns: &[String],
    only_specific_properties: bool,
) -> TableEntity {
    let provider = provider_or_default(provider);

    let mut properties = IndexMap::with_capacity(4 + event.properties().len());
    properties.insert(
        MESSAGE_TEMPLATE.to_owned(),
        CellValue::String(event.message_template().text().to_owned()),
    );
    properties.insert(
        LEVEL.to_owned(),
        CellValue::String(event.level().as_str().to_owned()),
    );
    properties.insert(
        RENDERED_MESSAGE.to_owned(),
        CellValue::String(event.render_message(provider)),
    );
    if let Some(exception) = event.exception() {
        properties.insert(EXCEPTION.to_owned(), CellValue::String(exception.to_owned()));
    }

    let initial = Columns {
        column_count: properties.len(),
        properties,
        overflow: Vec::new(),
    };
    let mut columns = event
        .properties()
        .iter()
        .fold(initial, |mut columns, (name, value)| {
            let admitted = !only_specific_properties || property_columns.contains(name);
            if admitted && is_valid_column_name(name) {
                let (fits, column_count) = admit_column(columns.column_count);
                columns.column_count = column_count;
                if fits {
                    let cell = to_entity_value(value, None, Some(provider));
                    columns.properties.insert(name.clone(), cell);
                    return columns;
                }
            }
            columns
                .overflow
                .push((ScalarValue::String(name.clone()), value.clone()));
            columns
        });

    if !columns.overflow.is_empty() {
        let aggregated = PropertyValue::Dictionary(columns.overflow);
        columns.properties.insert(
            AGGREGATED_PROPERTIES.to_owned(),
            to_entity_value(&aggregated, None, Some(provider)),
        );
    }

    TableEntity {
        partition_key: key_generator.partition_key(event),
        row_key: key_generator.row_key(event, row_key_suffix),
        timestamp: event.timestamp(),
        properties: columns.properties,
    }
}

/// Holds the settings used to turn log events into table entities.
#[derive(Clone, Debug)]
pub struct EntityFactory {
    key_generator: Arc<dyn KeyGenerator>,
    format_provider: Option<Arc<dyn FormatProvider>>,
    row_key_suffix: Option<String>,
    property_columns: Vec<String>,
    only_specific_properties: bool,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultKeyGenerator::default()))
    }
}

impl EntityFactory {
    pub fn new(key_generator: Arc<dyn KeyGenerator>) -> Self {
        Self {
            key_generator,
            format_provider: None,
            row_key_suffix: None,
            property_columns: Vec::new(),
            only_specific_properties: false,
        }
    }

    #[must_use]
    pub fn with_key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = key_generator;
        self
    }

    #[must_use]
    pub fn with_format_provider(mut self, provider: Arc<dyn FormatProvider>) -> Self {
        self.format_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_row_key_suffix(mut self, suffix: Option<String>) -> Self {
        self.row_key_suffix = suffix;
        self
    }

    #[must_use]
    pub fn with_property_columns(
        mut self,
        property_columns: Vec<String>,
        only_specific_properties: bool,
    ) -> Self {
        self.property_columns = property_columns;
        self.only_specific_properties = only_specific_properties;
        self
    }

    pub fn create_entity(&self, event: &LogEvent) -> TableEntity {
        create_entity(
            event,
            self.format_provider.as_deref(),
            self.row_key_suffix.as_deref(),
            self.key_generator.as_ref(),
            &self.property_columns,
            self.only_specific_properties,
        )
    }
}
