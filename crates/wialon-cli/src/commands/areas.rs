//! Areas command - list geofences

use anyhow::{Context, Result};
use futures::FutureExt;
use wialon_client::{AreaType, Session, SessionBuilder};

use crate::output::{AreaRow, OutputContext};

/// List every visible geofence, optionally with full records
pub async fn areas(builder: SessionBuilder, detail: bool, ctx: &OutputContext) -> Result<()> {
    let records = Session::scoped(builder, move |session| {
        async move { session.list_areas(detail).await }.boxed()
    })
    .await
    .context("Failed to list areas")?;

    let rows: Vec<AreaRow> = records
        .into_iter()
        .map(|a| AreaRow {
            resource: a.resource_id,
            id: a.id,
            area_type: AreaType::try_from(a.area_type)
                .map(|t| t.to_string())
                .unwrap_or_else(|_| a.area_type.to_string()),
            name: a.name,
            description: a.description,
            points: a.points.len(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
