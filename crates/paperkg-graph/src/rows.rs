//! Row decoding into raw assembler records.
//!
//! Reads the columns produced by [`crate::cypher::node_columns`] and
//! [`crate::cypher::rel_columns`]. A null element id means the variable was
//! unbound by an `OPTIONAL MATCH`.

use anyhow::{anyhow, Result};
use neo4rs::Row;
use paperkg_core::assembler::{RawNode, RawRelationship};
use paperkg_core::{InternalId, Properties};

/// Decode a single column through serde.
pub(crate) fn column<T>(row: &Row, name: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    row.get(name)
        .map_err(|e| anyhow!("Failed to decode column '{}': {:?}", name, e))
}

/// Decode the node projected under `var`, or `None` if it was null.
pub fn raw_node(row: &Row, var: &str) -> Result<Option<RawNode>> {
    let eid: Option<String> = column(row, &format!("{}_eid", var))?;
    let Some(eid) = eid else {
        return Ok(None);
    };
    let labels: Option<Vec<String>> = column(row, &format!("{}_labels", var))?;
    let properties: Option<Properties> = column(row, &format!("{}_props", var))?;

    Ok(Some(RawNode {
        internal_id: InternalId::new(eid),
        labels: labels.unwrap_or_default(),
        properties: properties.unwrap_or_default(),
    }))
}

/// Decode the relationship projected under `var`, or `None` if it was null.
pub fn raw_rel(row: &Row, var: &str) -> Result<Option<RawRelationship>> {
    let start: Option<String> = column(row, &format!("{}_start", var))?;
    let end: Option<String> = column(row, &format!("{}_end", var))?;
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };
    let rel_type: String = column(row, &format!("{}_type", var))?;
    let properties: Option<Properties> = column(row, &format!("{}_props", var))?;

    Ok(Some(RawRelationship {
        start: InternalId::new(start),
        end: InternalId::new(end),
        rel_type,
        properties: properties.unwrap_or_default(),
    }))
}
