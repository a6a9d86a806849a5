//! Layout position persistence.
//!
//! Each position is an independent statement. A position whose node is gone
//! is skipped; a failed statement aborts the rest of the batch, and the
//! positions already written stay written.

use anyhow::{Context, Result};
use paperkg_core::store::{LAYOUT_UPDATED_AT, LAYOUT_X, LAYOUT_Y};
use paperkg_core::{LayoutPosition, LayoutReport};
use tracing::debug;

use crate::cypher::{known_labels, CypherQuery, ParamValue};
use crate::GraphClient;

pub fn build_layout_query(position: &LayoutPosition, updated_at: &str) -> CypherQuery {
    let text = format!(
        "MATCH (n)
         WHERE n.id = $id AND {labels}
         SET n.{x} = $x, n.{y} = $y, n.{at} = $updated_at
         RETURN n.id AS id",
        labels = known_labels("n"),
        x = LAYOUT_X,
        y = LAYOUT_Y,
        at = LAYOUT_UPDATED_AT,
    );
    CypherQuery::new(text)
        .param("id", ParamValue::Str(position.node_id.as_str().to_string()))
        .param("x", ParamValue::Float(position.x))
        .param("y", ParamValue::Float(position.y))
        .param("updated_at", ParamValue::Str(updated_at.to_string()))
}

pub async fn save_layout(client: &GraphClient, positions: &[LayoutPosition]) -> Result<LayoutReport> {
    let mut report = LayoutReport::default();
    let updated_at = chrono::Utc::now().to_rfc3339();

    for position in positions {
        let rows = client
            .query(build_layout_query(position, &updated_at).into_query())
            .await
            .with_context(|| format!("Failed to save layout for {}", position.node_id))?;

        if rows.is_empty() {
            debug!(node_id = %position.node_id, "Layout target missing");
            report.skipped.push(position.node_id.clone());
        } else {
            report.applied.push(position.node_id.clone());
        }
    }
    Ok(report)
}
