//! Count and messages commands - interval message loading

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use futures::FutureExt;
use wialon_client::{IntervalQuery, Session, SessionBuilder, Timestamp};

use crate::output::{format_time, MessageRow, OutputContext};

/// Parse `--from`/`--to`: POSIX seconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` in UTC
pub fn parse_time(value: &str) -> std::result::Result<Timestamp, String> {
    if let Ok(secs) = value.parse::<i64>() {
        return Ok(Timestamp::from(secs));
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(Timestamp::from(time));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(Timestamp::from)
        .map_err(|_| {
            format!(
                "invalid time '{}': expected seconds, RFC 3339 or 'YYYY-MM-DD HH:MM:SS'",
                value
            )
        })
}

/// Print the number of messages in an interval
pub async fn count(
    builder: SessionBuilder,
    item: i64,
    from: Timestamp,
    to: Timestamp,
    ctx: &OutputContext,
) -> Result<()> {
    let query = IntervalQuery::new(item, from, to);
    let count = Session::scoped(builder, move |session| {
        async move { session.count_messages(&query).await }.boxed()
    })
    .await
    .with_context(|| format!("Failed to count messages of item {}", item))?;

    ctx.info(&format!(
        "Item {} from {} to {}:",
        item,
        format_time(from.as_secs()),
        format_time(to.as_secs())
    ));
    println!("{}", count);
    Ok(())
}

/// Print the messages of an interval
pub async fn messages(
    builder: SessionBuilder,
    item: i64,
    from: Timestamp,
    to: Timestamp,
    sensors: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let query = IntervalQuery::new(item, from, to);
    let batch = Session::scoped(builder, move |session| {
        async move { session.load_messages(&query, sensors).await }.boxed()
    })
    .await
    .with_context(|| format!("Failed to load messages of item {}", item))?;

    let rows: Vec<MessageRow> = batch
        .messages
        .into_iter()
        .map(|m| {
            let (latitude, longitude, speed) = match m.position {
                Some(pos) => (
                    format!("{:.6}", pos.latitude),
                    format!("{:.6}", pos.longitude),
                    format!("{}", pos.speed),
                ),
                None => Default::default(),
            };
            MessageRow {
                time: format_time(m.time),
                kind: m.kind,
                latitude,
                longitude,
                speed,
                sensors: m.sensors.map(|s| s.to_string()).unwrap_or_default(),
            }
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
