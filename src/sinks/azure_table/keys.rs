use std::{fmt, hash::Hasher, time::Duration};

use chrono::{DateTime, Utc};
use twox_hash::XxHash64;

use crate::{event::LogEvent, format::InvariantFormat};

/// Maximum size of a partition or row key accepted by the table service.
pub const MAX_KEY_LENGTH: usize = 1024;

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Ticks between 0001-01-01T00:00:00Z and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Produces the partition and row keys a log event is stored under.
///
/// Implementations must be deterministic: the same event always yields the same keys.
pub trait KeyGenerator: fmt::Debug + Send + Sync {
    fn partition_key(&self, event: &LogEvent) -> String;

    /// Generates the row key. A suffix, when given, is appended verbatim.
    fn row_key(&self, event: &LogEvent, suffix: Option<&str>) -> String;
}

/// Partitions events by time bucket and builds row keys from the level, template, timestamp and
/// a hash of the event content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultKeyGenerator {
    bucket_ticks: i64,
}

impl DefaultKeyGenerator {
    /// Groups events whose timestamps fall in the same `bucket` into one partition.
    ///
    /// Buckets shorter than one tick (100ns) are rounded up to a tick.
    pub fn with_partition_bucket(bucket: Duration) -> Self {
        let ticks = bucket.as_nanos() / NANOS_PER_TICK as u128;
        Self {
            bucket_ticks: i64::try_from(ticks).unwrap_or(i64::MAX).max(1),
        }
    }
}

impl Default for DefaultKeyGenerator {
    fn default() -> Self {
        Self {
            bucket_ticks: TICKS_PER_SECOND,
        }
    }
}

impl KeyGenerator for DefaultKeyGenerator {
    fn partition_key(&self, event: &LogEvent) -> String {
        let ticks = ticks(&event.timestamp());
        format!("0{}", ticks - ticks.rem_euclid(self.bucket_ticks))
    }

    fn row_key(&self, event: &LogEvent, suffix: Option<&str>) -> String {
        let suffix = suffix.unwrap_or_default();
        let postfix = format!(
            "|{:019}|{:016x}",
            ticks(&event.timestamp()),
            content_hash(event)
        );

        let mut key = format!(
            "{}|{}",
            event.level(),
            sanitize_key(event.message_template().text())
        );
        truncate_at_char_boundary(
            &mut key,
            MAX_KEY_LENGTH.saturating_sub(postfix.len() + suffix.len()),
        );
        key.push_str(&postfix);
        key.push_str(suffix);
        key
    }
}

/// Converts a timestamp to .NET ticks: 100ns intervals since 0001-01-01T00:00:00Z.
pub fn ticks(timestamp: &DateTime<Utc>) -> i64 {
    timestamp
        .timestamp()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(i64::from(timestamp.timestamp_subsec_nanos()) / NANOS_PER_TICK)
        .saturating_add(UNIX_EPOCH_TICKS)
        .max(0)
}

/// Removes the characters the table service rejects in keys: `/`, `\`, `#`, `?` and control
/// characters.
pub fn sanitize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| {
            !matches!(*c, '/' | '\\' | '#' | '?' | '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
        })
        .collect()
}

fn truncate_at_char_boundary(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

fn content_hash(event: &LogEvent) -> u64 {
    const SEPARATOR: &[u8] = &[0xff];

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&ticks(&event.timestamp()).to_le_bytes());
    hasher.write(event.level().as_str().as_bytes());
    hasher.write(SEPARATOR);
    hasher.write(event.message_template().text().as_bytes());
    hasher.write(SEPARATOR);
    if let Some(exception) = event.exception() {
        hasher.write(exception.as_bytes());
    }
    for (name, value) in event.properties() {
        hasher.write(SEPARATOR);
        hasher.write(name.as_bytes());
        hasher.write(SEPARATOR);
        hasher.write(value.to_display_string(None, &InvariantFormat).as_bytes());
    }
    hasher.finish()
}
