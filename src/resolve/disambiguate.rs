//! Context-based disambiguation of same-named entities

use super::scorer::{HybridScorer, SimilarityScorer};
use super::{ResolveResult, ResolverConfig};
use crate::graph::{Label, Node, NodeId};
use crate::naming::{configured_name, NameKind};
use crate::store::GraphReader;
use serde::Serialize;
use tracing::debug;

/// Score of one candidate entity against the context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub node: NodeId,
    pub label: Label,
    /// Relationship summary the context was compared with
    pub feature: String,
    pub score: f64,
}

/// The entity chosen for a name in a context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisambiguationMatch {
    pub node: NodeId,
    pub label: Label,
    pub score: f64,
    /// Every candidate, in creation order
    pub candidates: Vec<CandidateScore>,
}

/// Outcome of a disambiguation query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Disambiguation {
    Match(DisambiguationMatch),
    /// No entity carries the name
    NoMatch,
}

impl Disambiguation {
    pub fn chosen(&self) -> Option<NodeId> {
        match self {
            Disambiguation::Match(m) => Some(m.node),
            Disambiguation::NoMatch => None,
        }
    }
}

/// Picks which same-named entity a text refers to.
///
/// Each candidate is summarized by its outgoing relationships as
/// `"<type><neighbor>"` items joined with spaces, and the candidate whose
/// summary scores highest against the context wins. Ties go to the
/// earliest-created candidate.
pub struct Disambiguator<S: SimilarityScorer = HybridScorer> {
    name_property: String,
    scorer: S,
}

impl Disambiguator<HybridScorer> {
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_scorer(config, HybridScorer::new(config.similarity))
    }
}

impl<S: SimilarityScorer> Disambiguator<S> {
    pub fn with_scorer(config: &ResolverConfig, scorer: S) -> Self {
        Disambiguator {
            name_property: configured_name(&config.name_property, NameKind::Property),
            scorer,
        }
    }

    pub fn disambiguate(&self, reader: &dyn GraphReader, name: &str, context: &str) -> ResolveResult<Disambiguation> {
        let nodes = reader.nodes_by_property(&self.name_property, name)?;
        let mut candidates = Vec::with_capacity(nodes.len());
        for node in nodes {
            let feature = self.feature_text(reader, &node)?;
            let score = self.scorer.score(context, &feature);
            debug!("Candidate {} ({}) scored {:.3} on '{}'", node.id, node.label, score, feature);
            candidates.push(CandidateScore {
                node: node.id,
                label: node.label,
                feature,
                score,
            });
        }

        let mut best: Option<&CandidateScore> = None;
        for candidate in &candidates {
            if best.map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }

        Ok(match best {
            Some(best) => Disambiguation::Match(DisambiguationMatch {
                node: best.node,
                label: best.label.clone(),
                score: best.score,
                candidates: candidates.clone(),
            }),
            None => Disambiguation::NoMatch,
        })
    }

    fn feature_text(&self, reader: &dyn GraphReader, node: &Node) -> ResolveResult<String> {
        let mut items = Vec::new();
        for edge in reader.outgoing(node.id)? {
            let neighbor = reader
                .node(edge.target)?
                .and_then(|n| {
                    n.get_property(&self.name_property)
                        .or_else(|| n.get_property("id"))
                        .map(|v| v.to_plain_string())
                })
                .unwrap_or_default();
            items.push(format!("{}{}", edge.edge_type, neighbor));
        }
        Ok(items.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;
    use crate::store::{GraphBackend, MemoryGraph, NodeKey};

    fn apple_graph() -> (MemoryGraph, NodeId, NodeId) {
        let mut backend = MemoryGraph::new();
        let (org, fruit) = backend
            .write(|tx| {
                let none = PropertyMap::new();
                let org = tx.upsert_node(&NodeKey::new("ORG", "name", "苹果"), &none)?.id;
                let iphone = tx.upsert_node(&NodeKey::new("Product", "name", "iPhone"), &none)?.id;
                tx.upsert_edge(org, &"生产".into(), iphone, &none)?;

                let fruit = tx.upsert_node(&NodeKey::new("FRUIT", "name", "苹果"), &none)?.id;
                let shandong = tx.upsert_node(&NodeKey::new("LOC", "name", "山东"), &none)?.id;
                tx.upsert_edge(fruit, &"生长于".into(), shandong, &none)?;
                Ok((org, fruit))
            })
            .unwrap();
        (backend, org, fruit)
    }

    #[test]
    fn test_context_picks_company() {
        let (backend, org, fruit) = apple_graph();
        let disambiguator = Disambiguator::new(&ResolverConfig::default());

        let result = disambiguator
            .disambiguate(backend.graph(), "苹果", "苹果发布新款iPhone")
            .unwrap();
        assert_eq!(result.chosen(), Some(org));

        let Disambiguation::Match(m) = result else {
            panic!("expected a match");
        };
        assert_eq!(m.label, Label::new("ORG"));
        assert_eq!(m.candidates.len(), 2);
        assert_eq!(m.candidates[0].feature, "生产iPhone");
        assert_eq!(m.candidates[1].node, fruit);
        assert_eq!(m.candidates[1].feature, "生长于山东");
        assert!(m.candidates[0].score > m.candidates[1].score);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let (backend, org, _) = apple_graph();
        let disambiguator = Disambiguator::with_scorer(&ResolverConfig::default(), |_: &str, _: &str| 0.5);

        let result = disambiguator.disambiguate(backend.graph(), "苹果", "anything").unwrap();
        assert_eq!(result.chosen(), Some(org));
    }

    #[test]
    fn test_unknown_name_is_no_match() {
        let (backend, _, _) = apple_graph();
        let result = Disambiguator::new(&ResolverConfig::default())
            .disambiguate(backend.graph(), "香蕉", "香蕉很甜")
            .unwrap();
        assert_eq!(result, Disambiguation::NoMatch);
    }

    #[test]
    fn test_neighbor_without_name_uses_id() {
        let mut backend = MemoryGraph::new();
        backend
            .write(|tx| {
                let none = PropertyMap::new();
                let a = tx.upsert_node(&NodeKey::new("ORG", "name", "苹果"), &none)?.id;
                let b = tx.upsert_node(&NodeKey::new("Resource", "id", "BookX"), &none)?.id;
                let c = tx.upsert_node(&NodeKey::new("Resource", "uri", "urn:x"), &none)?.id;
                tx.upsert_edge(a, &"published".into(), b, &none)?;
                tx.upsert_edge(a, &"mentions".into(), c, &none)?;
                Ok(())
            })
            .unwrap();

        let result = Disambiguator::new(&ResolverConfig::default())
            .disambiguate(backend.graph(), "苹果", "x")
            .unwrap();
        let Disambiguation::Match(m) = result else {
            panic!("expected a match");
        };
        assert_eq!(m.candidates[0].feature, "publishedBookX mentions");
    }
}
