//! Query command - run an arbitrary service from a YAML file

use std::path::Path;

use anyhow::{Context, Result};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use wialon_client::{Session, SessionBuilder};

use crate::output::OutputContext;

/// Request description read from a YAML file
///
/// ```yaml
/// svc: core/search_items
/// params:
///   spec: { itemsType: avl_unit, propName: sys_name, propValueMask: "*", sortType: sys_name }
///   force: 1
///   flags: 1
///   from: 0
///   to: 0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct QueryFile {
    pub svc: String,
    #[serde(default)]
    pub params: Value,
}

impl QueryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse query file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut query: Self = serde_yaml::from_str(content)?;
        if query.params.is_null() {
            query.params = json!({});
        }
        Ok(query)
    }
}

/// Execute the service described in `file` and print its result
pub async fn query(builder: SessionBuilder, file: &Path, ctx: &OutputContext) -> Result<()> {
    let QueryFile { svc, params } = QueryFile::load(file)?;

    ctx.info(&format!("Request {}:", svc));
    ctx.print_json(&params);

    let method = svc.clone();
    let result = Session::scoped(builder, move |session| {
        async move { session.call(&method, params).await }.boxed()
    })
    .await
    .with_context(|| format!("{} failed", svc))?;

    ctx.info("Result:");
    ctx.print_json(&result);
    Ok(())
}
