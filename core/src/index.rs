//! Hierarchical aggregation of a message's event history.

use indexmap::IndexMap;
use reglens_protocol::AnalysisEvent;
use reglens_protocol::model::ArticleEntry;
use reglens_protocol::model::Citation;
use reglens_protocol::model::Consideration;
use reglens_protocol::model::RelatedDocument;
use reglens_protocol::model::Summary;
use serde::Serialize;

/// One regulation with its articles, keyed and ordered by first mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegulationNode {
    pub description: String,
    pub articles: IndexMap<String, ArticleNode>,
}

/// One article with the citations and documents attached under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleNode {
    pub description: String,
    pub citations: Vec<Citation>,
    pub related_documents: Vec<RelatedDocument>,
}

/// Records whose parent was never named anywhere in the history. They stay
/// out of the tree but are retained here; a later rebuild attaches them
/// automatically once the parent arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Unresolved {
    pub articles: Vec<ArticleEntry>,
    pub citations: Vec<Citation>,
    pub related_documents: Vec<RelatedDocument>,
}

impl Unresolved {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty() && self.citations.is_empty() && self.related_documents.is_empty()
    }

    pub fn total(&self) -> usize {
        self.articles.len() + self.citations.len() + self.related_documents.len()
    }
}

/// The regulation → article → {citations, documents} view of an event
/// history.
///
/// Always derived in full by [`RegulationIndex::rebuild`]; never the source
/// of truth. Rebuilding the same history yields a structurally identical
/// value, so a render may hold one snapshot while new events are appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegulationIndex {
    pub regulations: IndexMap<String, RegulationNode>,
    pub summary: Option<Summary>,
    pub unresolved: Unresolved,
}

impl RegulationIndex {
    /// Replays the full history in five fixed passes: regulations, then
    /// articles, citations, related documents, and finally the summary.
    /// Arrival order within the history therefore never leaves a child
    /// orphaned when its parent shows up later in the stream.
    pub fn rebuild(events: &[AnalysisEvent]) -> Self {
        let mut index = Self::default();

        for event in events {
            if let AnalysisEvent::Regulations(entries) = event {
                for entry in entries {
                    let node = index
                        .regulations
                        .entry(entry.regulation.clone())
                        .or_default();
                    // Latest description wins; articles already attached stay.
                    node.description = entry.description.clone();
                }
            }
        }

        for event in events {
            if let AnalysisEvent::Articles(entries) = event {
                for entry in entries {
                    match index.regulations.get_mut(&entry.regulation) {
                        Some(regulation) => {
                            let node = regulation
                                .articles
                                .entry(entry.article.clone())
                                .or_default();
                            node.description = entry.description.clone();
                        }
                        None => index.unresolved.articles.push(entry.clone()),
                    }
                }
            }
        }

        for event in events {
            if let AnalysisEvent::Citations(citations) = event {
                for citation in citations {
                    match article_slot(
                        &mut index.regulations,
                        &citation.regulation,
                        &citation.article,
                    ) {
                        Some(article) => article.citations.push(citation.clone()),
                        None => index.unresolved.citations.push(citation.clone()),
                    }
                }
            }
        }

        for event in events {
            if let AnalysisEvent::RelatedDocument(document) = event {
                match article_slot(
                    &mut index.regulations,
                    &document.regulation,
                    &document.article,
                ) {
                    Some(article) => article.related_documents.push(document.clone()),
                    None => index.unresolved.related_documents.push(document.clone()),
                }
            }
        }

        for event in events {
            if let AnalysisEvent::Summary(summary) = event {
                index.summary = Some(summary.clone());
            }
        }

        index
    }

    /// Considerations of the latest summary, or none.
    pub fn considerations(&self) -> &[Consideration] {
        self.summary
            .as_ref()
            .map(|summary| summary.considerations.as_slice())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.regulations.is_empty() && self.summary.is_none() && self.unresolved.is_empty()
    }
}

fn article_slot<'a>(
    regulations: &'a mut IndexMap<String, RegulationNode>,
    regulation: &str,
    article: &str,
) -> Option<&'a mut ArticleNode> {
    regulations.get_mut(regulation)?.articles.get_mut(article)
}
