//! Corpus loading.
//!
//! Loads organizations, authors, papers and their links into a [`GraphStore`].
//! Affiliations are always written as real `AFFILIATED_WITH` relationships,
//! and the author also keeps its `org_id` property.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::KgResult;
use crate::identity::BusinessId;
use crate::model::{NodeLabel, Properties, RelType};
use crate::store::GraphStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub abbreviation: Option<String>,
    pub rank_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub org_id: Option<String>,
    pub h_index: Option<i64>,
    pub orcid: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub year: Option<i64>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub keywords: Option<String>,
    pub citation_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authorship {
    pub paper_id: String,
    pub author_id: String,
    pub order: i64,
    #[serde(default)]
    pub is_corresponding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub citing: String,
    pub cited: String,
    pub year: Option<i64>,
}

/// A complete corpus to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub papers: Vec<Paper>,
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// What a load wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub nodes: usize,
    pub relationships: usize,
    pub skipped: usize,
}

/// Serialize a record into a property map, dropping null fields.
fn to_properties<T: Serialize>(record: &T) -> KgResult<Properties> {
    let value = serde_json::to_value(record)?;
    Ok(match value {
        serde_json::Value::Object(map) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Properties::new(),
    })
}

impl Dataset {
    /// Small demo corpus: three universities, three authors, three papers.
    pub fn sample() -> Self {
        let org = |id: &str, name: &str, country: &str, abbreviation: &str, rank: f64| Organization {
            id: id.into(),
            name: name.into(),
            country: Some(country.into()),
            abbreviation: Some(abbreviation.into()),
            rank_score: Some(rank),
        };
        let author = |id: &str, name: &str, org_id: &str, h_index: i64, orcid: &str, email: &str| Author {
            id: id.into(),
            name: name.into(),
            org_id: Some(org_id.into()),
            h_index: Some(h_index),
            orcid: Some(orcid.into()),
            email: Some(email.into()),
        };
        let paper = |id: &str, title: &str, year: i64, venue: &str, doi: &str, keywords: &str, cited: i64| Paper {
            id: id.into(),
            title: title.into(),
            year: Some(year),
            venue: Some(venue.into()),
            doi: Some(doi.into()),
            keywords: Some(keywords.into()),
            citation_count: Some(cited),
        };
        let authorship = |paper_id: &str, author_id: &str, order: i64, is_corresponding: bool| Authorship {
            paper_id: paper_id.into(),
            author_id: author_id.into(),
            order,
            is_corresponding,
        };

        Self {
            organizations: vec![
                org("org_001", "Tsinghua University", "China", "THU", 98.5),
                org("org_002", "Peking University", "China", "PKU", 97.8),
                org("org_003", "Stanford University", "USA", "Stanford", 99.2),
            ],
            authors: vec![
                author("author_001", "Zhang San", "org_001", 25, "0000-0001-2345-6789", "zhangsan@example.com"),
                author("author_002", "Li Si", "org_002", 18, "0000-0002-3456-7890", "lisi@example.com"),
                author("author_003", "John Smith", "org_003", 42, "0000-0003-4567-8901", "jsmith@stanford.edu"),
            ],
            papers: vec![
                paper(
                    "paper_001",
                    "Deep Learning for Knowledge Graph Construction",
                    2023,
                    "AAAI 2023",
                    "10.1609/aaai.v37i1.12345",
                    "deep learning;knowledge graph;neural network",
                    25,
                ),
                paper(
                    "paper_002",
                    "Graph Neural Networks for Scientific Publication Analysis",
                    2023,
                    "KDD 2023",
                    "10.1145/3580305.3599123",
                    "graph neural network;publication analysis;scientometrics",
                    18,
                ),
                paper(
                    "paper_003",
                    "Knowledge Graph Embedding with Attention Mechanism",
                    2022,
                    "ACL 2022",
                    "10.18653/v1/2022.acl-long.123",
                    "knowledge graph embedding;attention;representation learning",
                    42,
                ),
            ],
            authorships: vec![
                authorship("paper_001", "author_001", 1, true),
                authorship("paper_001", "author_002", 2, false),
                authorship("paper_002", "author_003", 1, true),
                authorship("paper_002", "author_001", 2, false),
                authorship("paper_003", "author_002", 1, true),
                authorship("paper_003", "author_003", 2, false),
            ],
            citations: vec![
                Citation { citing: "paper_001".into(), cited: "paper_002".into(), year: Some(2023) },
                Citation { citing: "paper_002".into(), cited: "paper_003".into(), year: Some(2023) },
            ],
        }
    }
}

/// Load a dataset. Links whose endpoints are missing are skipped and counted.
pub async fn load_dataset(store: &dyn GraphStore, dataset: &Dataset) -> KgResult<LoadSummary> {
    let mut summary = LoadSummary::default();

    for org in &dataset.organizations {
        store.create_node(NodeLabel::Organization, to_properties(org)?).await?;
        summary.nodes += 1;
    }
    info!(count = dataset.organizations.len(), "Organizations loaded");

    for author in &dataset.authors {
        let id = store.create_node(NodeLabel::Author, to_properties(author)?).await?;
        summary.nodes += 1;

        if let Some(org_id) = &author.org_id {
            link(store, &id, &BusinessId::new(org_id.as_str()), RelType::AffiliatedWith, Properties::new(), &mut summary).await?;
        }
    }
    info!(count = dataset.authors.len(), "Authors loaded");

    for paper in &dataset.papers {
        store.create_node(NodeLabel::Paper, to_properties(paper)?).await?;
        summary.nodes += 1;
    }
    info!(count = dataset.papers.len(), "Papers loaded");

    for authorship in &dataset.authorships {
        let mut properties = Properties::new();
        properties.insert("order".into(), authorship.order.into());
        properties.insert("is_corresponding".into(), authorship.is_corresponding.into());
        link(
            store,
            &BusinessId::new(authorship.author_id.as_str()),
            &BusinessId::new(authorship.paper_id.as_str()),
            RelType::Authored,
            properties,
            &mut summary,
        )
        .await?;
    }

    for citation in &dataset.citations {
        let mut properties = Properties::new();
        if let Some(year) = citation.year {
            properties.insert("year".into(), year.into());
        }
        link(
            store,
            &BusinessId::new(citation.citing.as_str()),
            &BusinessId::new(citation.cited.as_str()),
            RelType::Cites,
            properties,
            &mut summary,
        )
        .await?;
    }

    info!(
        nodes = summary.nodes,
        relationships = summary.relationships,
        skipped = summary.skipped,
        "Dataset loaded"
    );
    Ok(summary)
}

async fn link(
    store: &dyn GraphStore,
    source: &BusinessId,
    target: &BusinessId,
    rel_type: RelType,
    properties: Properties,
    summary: &mut LoadSummary,
) -> KgResult<()> {
    match store.create_relationship(source, target, rel_type, properties).await {
        Ok(()) => summary.relationships += 1,
        Err(e) if e.is_not_found() => {
            warn!(%source, %target, %rel_type, "Skipping link with missing endpoint");
            summary.skipped += 1;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGraphStore;

    #[tokio::test]
    async fn test_load_sample() {
        let store = MemoryGraphStore::new();
        let summary = load_dataset(&store, &Dataset::sample()).await.unwrap();
        assert_eq!(summary.nodes, 9);
        // 3 affiliations + 6 authorships + 2 citations
        assert_eq!(summary.relationships, 11);
        assert_eq!(summary.skipped, 0);
        assert_eq!(store.counts().await.unwrap().relationships, 11);
    }

    #[tokio::test]
    async fn test_load_is_repeatable() {
        let store = MemoryGraphStore::new();
        load_dataset(&store, &Dataset::sample()).await.unwrap();
        load_dataset(&store, &Dataset::sample()).await.unwrap();
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.nodes, 9);
        assert_eq!(counts.relationships, 11);
    }

    #[tokio::test]
    async fn test_load_skips_dangling_links() {
        let store = MemoryGraphStore::new();
        let mut dataset = Dataset::sample();
        dataset.authors[0].org_id = Some("org_999".into());
        let summary = load_dataset(&store, &dataset).await.unwrap();
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_properties_drop_nulls() {
        let author = Author {
            id: "author_009".into(),
            name: "Wang Wu".into(),
            org_id: None,
            h_index: Some(3),
            orcid: None,
            email: None,
        };
        let props = to_properties(&author).unwrap();
        assert_eq!(props.len(), 3);
        assert!(!props.contains_key("org_id"));
    }

    #[test]
    fn test_dataset_from_json() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"organizations":[{"id":"org_9","name":"MIT"}],"citations":[]}"#,
        )
        .unwrap();
        assert_eq!(dataset.organizations.len(), 1);
        assert!(dataset.authors.is_empty());
    }
}
