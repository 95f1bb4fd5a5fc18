use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use azure_table_logs::{
    event::{Level, LogEvent, PropertyValue},
    format::CultureFormat,
    sinks::azure_table::{
        AzureTableSinkConfig, AzureTableSinkError, CellValue, EntityFactory, TableBatch,
        TableClient,
    },
};
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};

/// Stores submitted entities in their JSON wire form, keyed by table.
#[derive(Debug, Default)]
struct InMemoryTables {
    rows: Mutex<Vec<(String, Value)>>,
    transactions: Mutex<usize>,
    reject_partition: Option<String>,
}

#[async_trait]
impl TableClient for InMemoryTables {
    async fn create_table_if_not_exists(&self, _table: &str) -> azure_table_logs::Result<()> {
        Ok(())
    }

    async fn submit_batch(&self, table: &str, batch: TableBatch) -> azure_table_logs::Result<()> {
        if self.reject_partition.as_deref() == Some(batch.partition_key()) {
            return Err("partition rejected".into());
        }

        *self.transactions.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        for entity in batch.entities() {
            rows.push((table.to_owned(), serde_json::to_value(entity)?));
        }
        Ok(())
    }
}

fn order_event(offset_secs: i64, order: i64) -> LogEvent {
    LogEvent::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + TimeDelta::seconds(offset_secs),
        Level::Information,
        "Order {OrderId} shipped to {Address}",
    )
    .with_property("OrderId", order)
    .with_property(
        "Address",
        PropertyValue::structure(
            Some("Address"),
            [
                ("City", PropertyValue::from("Oslo")),
                ("Zip", PropertyValue::from("0150")),
            ],
        ),
    )
    .with_property("2ndAttempt", false)
}

#[tokio::test]
async fn writes_entities_in_wire_form() {
    let tables = Arc::new(InMemoryTables::default());
    let config: AzureTableSinkConfig = toml::from_str(r#"storage_table_name = "Orders""#).unwrap();
    let mut sink = config.build(Arc::clone(&tables)).await.unwrap();

    sink.flush(&[order_event(0, 1), order_event(0, 2), order_event(3, 3)])
        .await
        .unwrap();

    assert_eq!(*tables.transactions.lock().unwrap(), 2);
    let rows = tables.rows.lock().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|(table, _)| table == "Orders"));

    let first = &rows[0].1;
    assert_eq!(first["PartitionKey"], json!("0638501508000000000"));
    assert_eq!(first["Level"], json!("Information"));
    assert_eq!(
        first["RenderedMessage"],
        json!(r#"Order 1 shipped to Address { City: "Oslo", Zip: "0150" }"#)
    );
    assert_eq!(first["OrderId"], json!("1"));
    assert_eq!(first["OrderId@odata.type"], json!("Edm.Int64"));
    assert_eq!(
        first["Address"],
        json!(r#"Address { City: "Oslo", Zip: "0150" }"#)
    );
    assert_eq!(first["AggregatedProperties"], json!(r#"[("2ndAttempt": false)]"#));
    assert!(first.get("2ndAttempt").is_none());
    assert!(
        first["RowKey"]
            .as_str()
            .unwrap()
            .starts_with("Information|Order {OrderId} shipped to {Address}|0638501508000000000|")
    );
}

#[tokio::test]
async fn failed_partition_aborts_the_flush() {
    let tables = Arc::new(InMemoryTables {
        reject_partition: Some("0638501508010000000".into()),
        ..Default::default()
    });
    let mut sink = AzureTableSinkConfig::default()
        .build(Arc::clone(&tables))
        .await
        .unwrap();

    let error = sink
        .flush(&[order_event(0, 1), order_event(1, 2), order_event(2, 3)])
        .await
        .unwrap_err();

    assert!(matches!(error, AzureTableSinkError::SubmitBatch { count: 1, .. }));
    assert_eq!(
        error.to_string(),
        "Failed to submit batch of 1 operations for partition \"0638501508010000000\": partition rejected"
    );
    assert_eq!(*tables.transactions.lock().unwrap(), 1);
}

#[test]
fn entity_factory_is_usable_on_its_own() {
    let entity = EntityFactory::default()
        .with_format_provider(Arc::new(CultureFormat::new(',')))
        .create_entity(
            &LogEvent::new(
                Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
                Level::Warning,
                "Load at {Load:F1}",
            )
            .with_property("Load", 0.875),
        );

    assert_eq!(
        entity.get("RenderedMessage"),
        Some(&CellValue::String("Load at 0,9".into()))
    );
    assert_eq!(entity.get("Load"), Some(&CellValue::Double(0.875)));
}
