//! Root graph traversal.
//!
//! Starts from author/organization affiliation (a stored `AFFILIATED_WITH`
//! relationship or the author's `org_id` property) and optionally extends to
//! authored papers. Unset filters are left out of the generated Cypher
//! entirely instead of being guarded with `$param IS NULL`.

use anyhow::Result;
use paperkg_core::assembler::RootRecord;
use paperkg_core::RootFilters;
use tracing::debug;

use crate::cypher::{node_columns, rel_columns, CypherQuery, ParamValue};
use crate::rows::{raw_node, raw_rel};
use crate::GraphClient;

/// Build the root traversal for `filters`.
pub fn build_root_query(filters: &RootFilters) -> CypherQuery {
    let filters = filters.normalized();
    let mut params = vec![("limit", ParamValue::Int(i64::from(filters.limit)))];

    let mut pair_conditions =
        vec!["(EXISTS { (a)-[:AFFILIATED_WITH]->(o) } OR a.org_id = o.id)".to_string()];
    if !filters.org_names.is_empty() {
        pair_conditions.push("(o.name IN $org_names OR o.abbreviation IN $org_names)".to_string());
        params.push(("org_names", ParamValue::List(filters.org_names.clone())));
    }
    if let Some(name) = &filters.author_name_contains {
        pair_conditions.push("toLower(a.name) CONTAINS toLower($author_name)".to_string());
        params.push(("author_name", ParamValue::Str(name.clone())));
    }

    let mut paper_conditions = Vec::new();
    if let Some(from) = filters.year_from {
        paper_conditions.push("p.year >= $year_from");
        params.push(("year_from", ParamValue::Int(from)));
    }
    if let Some(to) = filters.year_to {
        paper_conditions.push("p.year <= $year_to");
        params.push(("year_to", ParamValue::Int(to)));
    }
    let paper_where = if paper_conditions.is_empty() {
        String::new()
    } else {
        format!("\n         WHERE {}", paper_conditions.join(" AND "))
    };

    let text = format!(
        "MATCH (a:Author), (o:Organization)
         WHERE {pair}
         OPTIONAL MATCH (a)-[af:AFFILIATED_WITH]->(o)
         WITH a, o, head(collect(af)) AS af
         OPTIONAL MATCH (a)-[au:AUTHORED]->(p:Paper){paper_where}
         WITH a, o, af, au, p
         ORDER BY o.id, a.id, p.id
         LIMIT $limit
         RETURN {a}, {o}, {af}, {p}, {au}",
        pair = pair_conditions.join("\n           AND "),
        paper_where = paper_where,
        a = node_columns("a"),
        o = node_columns("o"),
        af = rel_columns("af"),
        p = node_columns("p"),
        au = rel_columns("au"),
    );

    params
        .into_iter()
        .fold(CypherQuery::new(text), |q, (name, value)| q.param(name, value))
}

/// Run the root traversal and decode its records.
pub async fn fetch_root_records(client: &GraphClient, filters: &RootFilters) -> Result<Vec<RootRecord>> {
    let query = build_root_query(filters);
    debug!(params = query.params.len(), "Running root traversal");

    let rows = client.query(query.into_query()).await?;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(author) = raw_node(row, "a")? else {
            continue;
        };
        records.push(RootRecord {
            author,
            organization: raw_node(row, "o")?,
            affiliation: raw_rel(row, "af")?,
            paper: raw_node(row, "p")?,
            authored: raw_rel(row, "au")?,
        });
    }
    Ok(records)
}
