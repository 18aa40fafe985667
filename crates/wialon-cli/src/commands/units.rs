//! Units command - list visible units

use anyhow::{Context, Result};
use futures::FutureExt;
use wialon_client::{Session, SessionBuilder};

use crate::output::{OutputContext, UnitRow};

/// List every unit the user can see
pub async fn units(builder: SessionBuilder, ctx: &OutputContext) -> Result<()> {
    let units = Session::scoped(builder, |session| {
        async move { session.load_units(None).await }.boxed()
    })
    .await
    .context("Failed to load units")?;

    let rows: Vec<UnitRow> = units
        .into_iter()
        .map(|u| UnitRow {
            id: u.id,
            name: u.name,
            class: u.class_id.map(|c| c.to_string()).unwrap_or_default(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
