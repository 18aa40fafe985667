//! Interval message loading
//!
//! The server keeps one loaded message window per session. Every load here is
//! bracketed: the previous window is unloaded first, and the new one is
//! unloaded again on every exit path so no stale window outlives the call.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::client::Session;
use crate::error::{Result, WialonError};
use crate::flags::{join, Flag, MessageFlag};
use crate::types::{LoadIntervalResponse, Message, MessageBatch};

/// Default `flagsMask`: compare the message type byte only
pub const DEFAULT_FLAGS_MASK: u32 = 0xFF00;
/// `loadCount` requesting every message in the interval
pub const LOAD_ALL: u32 = 0xFFFF_FFFF;

/// POSIX time in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl From<f64> for Timestamp {
    fn from(secs: f64) -> Self {
        Self(secs.trunc() as i64)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(time: DateTime<Tz>) -> Self {
        Self(time.timestamp())
    }
}

/// Naive date/times are taken as UTC
impl From<NaiveDateTime> for Timestamp {
    fn from(time: NaiveDateTime) -> Self {
        Self(time.and_utc().timestamp())
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self(since.as_secs() as i64),
            Err(before) => Self(-(before.duration().as_secs() as i64)),
        }
    }
}

/// Parameters of a `messages/load_interval` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalQuery {
    pub item_id: i64,
    pub time_from: i64,
    pub time_to: i64,
    pub flags: u32,
    pub flags_mask: u32,
}

impl IntervalQuery {
    /// Data messages of `item_id` between `begin` and `end`
    pub fn new(item_id: i64, begin: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        Self {
            item_id,
            time_from: begin.into().as_secs(),
            time_to: end.into().as_secs(),
            flags: join([MessageFlag::Data]),
            flags_mask: DEFAULT_FLAGS_MASK,
        }
    }

    pub fn flags<F: Flag>(mut self, flags: impl IntoIterator<Item = F>) -> Self {
        self.flags = join(flags);
        self
    }

    pub fn flags_mask(mut self, mask: u32) -> Self {
        self.flags_mask = mask;
        self
    }

    fn params(&self, load_count: u32) -> Value {
        json!({
            "itemId": self.item_id,
            "timeFrom": self.time_from,
            "timeTo": self.time_to,
            "flags": self.flags,
            "flagsMask": self.flags_mask,
            "loadCount": load_count
        })
    }
}

impl Session {
    /// Number of messages in the interval
    #[instrument(skip(self))]
    pub async fn count_messages(&self, query: &IntervalQuery) -> Result<u64> {
        self.load_interval(query, 0, false)
            .await
            .map(|batch| batch.count)
    }

    /// Every message in the interval, optionally with calculated sensor values
    ///
    /// With `with_sensors` each message gets the sensor entry at the same
    /// position. A length mismatch fails with
    /// [`WialonError::SensorDataMismatch`] and leaves no message annotated.
    #[instrument(skip(self))]
    pub async fn load_messages(
        &self,
        query: &IntervalQuery,
        with_sensors: bool,
    ) -> Result<MessageBatch> {
        self.load_interval(query, LOAD_ALL, with_sensors).await
    }

    async fn load_interval(
        &self,
        query: &IntervalQuery,
        load_count: u32,
        with_sensors: bool,
    ) -> Result<MessageBatch> {
        self.unload_messages().await?;

        let outcome = self.load_window(query, load_count, with_sensors).await;
        let released = self.unload_messages().await;

        match (outcome, released) {
            (Ok(batch), Ok(())) => Ok(batch),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(unload_err)) => {
                warn!("Message unload failed after an earlier error: {}", unload_err);
                Err(e)
            }
        }
    }

    async fn load_window(
        &self,
        query: &IntervalQuery,
        load_count: u32,
        with_sensors: bool,
    ) -> Result<MessageBatch> {
        let response: LoadIntervalResponse = self
            .call_as("messages/load_interval", query.params(load_count))
            .await?;
        debug!(
            item_id = query.item_id,
            count = response.count,
            loaded = response.messages.len(),
            "Message interval loaded"
        );

        let mut batch = MessageBatch {
            count: response.count,
            messages: response.messages,
        };
        if with_sensors && !batch.messages.is_empty() {
            let sensors = self
                .calc_sensors(query.item_id, batch.messages.len())
                .await?;
            attach_sensors(&mut batch.messages, sensors)?;
        }
        Ok(batch)
    }

    /// Sensor values for messages `0..count` of the loaded window
    async fn calc_sensors(&self, item_id: i64, count: usize) -> Result<Vec<Value>> {
        self.call_as(
            "unit/calc_sensors",
            json!({
                "source": "",
                "indexFrom": 0,
                "indexTo": count - 1,
                "unitId": item_id,
                "sensorId": 0
            }),
        )
        .await
    }

    /// Drop the session's loaded message window
    ///
    /// Invalid input means nothing was loaded and is not an error.
    pub async fn unload_messages(&self) -> Result<()> {
        match self.call("messages/unload", json!({})).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_invalid_input() => {
                debug!("No message window to unload");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn attach_sensors(messages: &mut [Message], sensors: Vec<Value>) -> Result<()> {
    if sensors.len() != messages.len() {
        return Err(WialonError::SensorDataMismatch {
            messages: messages.len(),
            sensors: sensors.len(),
        });
    }
    for (message, values) in messages.iter_mut().zip(sensors) {
        message.sensors = Some(values);
    }
    Ok(())
}
