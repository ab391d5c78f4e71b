//! Entity alignment: merge same-label entities with near-identical names

use super::candidates::{AllPairs, CandidateFilter, SharedCharacters};
use super::scorer::{HybridScorer, SimilarityScorer};
use super::{CandidateMode, ResolutionReport, ResolveResult, ResolverConfig};
use crate::graph::{Label, NodeId};
use crate::store::{GraphBackend, GraphTransaction, RetryPolicy, StoreResult};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info, warn};

/// One merge: `merged` was folded into `kept` and deleted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRecord {
    pub label: String,
    pub kept: NodeId,
    pub kept_name: String,
    pub merged: NodeId,
    pub merged_name: String,
    pub score: f64,
    /// Relationships moved onto the kept entity
    pub edges_redirected: usize,
    /// Relationships between the pair, dropped instead of becoming self-loops
    pub self_loops_dropped: usize,
}

/// A pair that scored above threshold but could not be merged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairFailure {
    pub kept: NodeId,
    pub merged: NodeId,
    pub reason: String,
}

#[derive(Debug, Default)]
struct MergeStats {
    edges_redirected: usize,
    self_loops_dropped: usize,
}

/// Merges entities of one label whose names score at or above the threshold.
///
/// Entities are visited in creation order. The first of a matching pair is
/// kept; later entities are always compared against a kept entity's own
/// name, and an absorbed entity is never compared again.
pub struct EntityAligner<S: SimilarityScorer = HybridScorer> {
    config: ResolverConfig,
    scorer: S,
    filter: Box<dyn CandidateFilter>,
    retry: RetryPolicy,
}

impl EntityAligner<HybridScorer> {
    /// Aligner scoring with the hybrid text similarity
    pub fn new(config: ResolverConfig) -> Self {
        let scorer = HybridScorer::new(config.similarity);
        Self::with_scorer(config, scorer)
    }
}

impl<S: SimilarityScorer> EntityAligner<S> {
    pub fn with_scorer(mut config: ResolverConfig, scorer: S) -> Self {
        config.sanitize_names();
        let filter: Box<dyn CandidateFilter> = match config.candidates {
            CandidateMode::AllPairs => Box::new(AllPairs),
            CandidateMode::SharedCharacters => Box::new(SharedCharacters),
        };
        EntityAligner {
            config,
            scorer,
            filter,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the candidate prefilter
    pub fn with_filter(mut self, filter: impl CandidateFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Align every configured label, or every label in the graph if none
    /// are configured
    pub fn align<B: GraphBackend>(&self, backend: &mut B) -> ResolveResult<ResolutionReport> {
        self.config.validate()?;
        let labels: Vec<Label> = if self.config.labels.is_empty() {
            backend.read(|r| r.labels())?
        } else {
            self.config.labels.iter().map(|l| Label::sanitized(l)).collect()
        };

        let mut report = ResolutionReport::default();
        for label in &labels {
            report.absorb(self.align_label(backend, label)?);
        }
        info!(
            "Aligned {} label(s): {} merge(s), {} failure(s)",
            labels.len(),
            report.merges.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Align the entities of one label.
    ///
    /// A merge that fails is recorded and both entities stay in place.
    pub fn align_label<B: GraphBackend>(&self, backend: &mut B, label: &Label) -> ResolveResult<ResolutionReport> {
        self.config.validate()?;
        let name_property = self.config.name_property.as_str();
        let entities: Vec<(NodeId, String)> = backend
            .read(|r| r.nodes_by_label(label))?
            .into_iter()
            .filter_map(|node| {
                let name = node.get_property(name_property)?.to_plain_string();
                Some((node.id, name))
            })
            .collect();
        debug!("Aligning {} {} entities", entities.len(), label);

        let mut report = ResolutionReport::default();
        let mut absorbed: FxHashSet<usize> = FxHashSet::default();

        for i in 0..entities.len() {
            if absorbed.contains(&i) {
                continue;
            }
            let (kept, kept_name) = &entities[i];

            for (j, (other, other_name)) in entities.iter().enumerate().skip(i + 1) {
                if absorbed.contains(&j) {
                    continue;
                }
                // At threshold 0 every pair merges, so nothing may be filtered
                if self.config.threshold > 0.0 && !self.filter.admits(kept_name, other_name) {
                    report.pairs_filtered += 1;
                    continue;
                }

                report.comparisons += 1;
                let score = self.scorer.score(kept_name, other_name);
                if score < self.config.threshold {
                    continue;
                }

                let redirect_incoming = self.config.redirect_incoming;
                let result = self
                    .retry
                    .run(|| backend.write(|tx| merge_into(tx, *kept, *other, redirect_incoming)));
                match result {
                    Ok(stats) => {
                        info!(
                            "Merged {} '{}' into '{}' (score {:.3})",
                            label, other_name, kept_name, score
                        );
                        absorbed.insert(j);
                        report.merges.push(MergeRecord {
                            label: label.to_string(),
                            kept: *kept,
                            kept_name: kept_name.clone(),
                            merged: *other,
                            merged_name: other_name.clone(),
                            score,
                            edges_redirected: stats.edges_redirected,
                            self_loops_dropped: stats.self_loops_dropped,
                        });
                    }
                    Err(e) => {
                        warn!("Could not merge {} into {}: {}", other, kept, e);
                        report.failures.push(PairFailure {
                            kept: *kept,
                            merged: *other,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Move `merged`'s relationships onto `kept`, then delete `merged`
fn merge_into(
    tx: &mut dyn GraphTransaction,
    kept: NodeId,
    merged: NodeId,
    redirect_incoming: bool,
) -> StoreResult<MergeStats> {
    let mut stats = MergeStats::default();
    let pair = |id: NodeId| id == kept || id == merged;

    for edge in tx.outgoing(merged)? {
        if pair(edge.target) {
            stats.self_loops_dropped += 1;
            continue;
        }
        tx.upsert_edge(kept, &edge.edge_type, edge.target, &edge.properties)?;
        stats.edges_redirected += 1;
    }

    if redirect_incoming {
        for edge in tx.incoming(merged)? {
            if pair(edge.source) {
                // merged -> merged was already counted above
                if edge.source == kept {
                    stats.self_loops_dropped += 1;
                }
                continue;
            }
            tx.upsert_edge(edge.source, &edge.edge_type, kept, &edge.properties)?;
            stats.edges_redirected += 1;
        }
    }

    tx.detach_delete_node(merged)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;
    use crate::store::{MemoryGraph, NodeKey};

    fn org(backend: &mut MemoryGraph, name: &str) -> NodeId {
        backend
            .write(|tx| tx.upsert_node(&NodeKey::new("ORG", "name", name), &PropertyMap::new()))
            .unwrap()
            .id
    }

    fn link(backend: &mut MemoryGraph, from: NodeId, rel: &str, to: NodeId) {
        backend
            .write(|tx| tx.upsert_edge(from, &rel.into(), to, &PropertyMap::new()))
            .unwrap();
    }

    #[test]
    fn test_merge_keeps_union_of_relationships() {
        let mut backend = MemoryGraph::new();
        let a = org(&mut backend, "阿里巴巴");
        let b = org(&mut backend, "阿里集团");
        let hz = org(&mut backend, "杭州");
        let taobao = org(&mut backend, "淘宝");
        link(&mut backend, a, "LOCATED_IN", hz);
        link(&mut backend, b, "LOCATED_IN", hz);
        link(&mut backend, b, "OWNS", taobao);
        link(&mut backend, b, "PARTNER", a);

        let scorer = |x: &str, y: &str| {
            if (x, y) == ("阿里巴巴", "阿里集团") {
                0.82
            } else {
                0.1
            }
        };
        let aligner = EntityAligner::with_scorer(ResolverConfig::default(), scorer);
        let report = aligner.align_label(&mut backend, &Label::new("ORG")).unwrap();

        assert_eq!(report.merged_pairs(), vec![(a, b)]);
        assert_eq!(report.merges[0].edges_redirected, 2);
        assert_eq!(report.merges[0].self_loops_dropped, 1);

        let graph = backend.graph();
        assert!(!graph.has_node(b));
        let mut targets: Vec<&str> = graph
            .get_outgoing_edges(a)
            .iter()
            .map(|e| e.edge_type.as_str())
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["LOCATED_IN", "OWNS"]);
    }

    fn person(backend: &mut MemoryGraph, name: &str) -> NodeId {
        backend
            .write(|tx| tx.upsert_node(&NodeKey::new("PERSON", "name", name), &PropertyMap::new()))
            .unwrap()
            .id
    }

    #[test]
    fn test_incoming_relationships_follow_the_merge() {
        let mut backend = MemoryGraph::new();
        let a = org(&mut backend, "Tencent");
        let b = org(&mut backend, "Tencent Holdings");
        let pony = person(&mut backend, "Pony Ma");
        link(&mut backend, pony, "FOUNDED", b);

        let aligner = EntityAligner::with_scorer(ResolverConfig::default(), |_: &str, _: &str| 0.9);
        let report = aligner.align_label(&mut backend, &Label::new("ORG")).unwrap();
        assert_eq!(report.merges[0].edges_redirected, 1);

        let graph = backend.graph();
        let founded = graph.get_outgoing_edges(pony);
        assert_eq!(founded.len(), 1);
        assert_eq!(founded[0].target, a);
    }

    #[test]
    fn test_incoming_redirect_can_be_disabled() {
        let mut backend = MemoryGraph::new();
        let a = org(&mut backend, "Tencent");
        let b = org(&mut backend, "Tencent Holdings");
        let pony = person(&mut backend, "Pony Ma");
        link(&mut backend, pony, "FOUNDED", b);

        let config = ResolverConfig {
            redirect_incoming: false,
            ..ResolverConfig::default()
        };
        EntityAligner::with_scorer(config, |_: &str, _: &str| 0.9)
            .align_label(&mut backend, &Label::new("ORG"))
            .unwrap();

        let graph = backend.graph();
        assert!(graph.has_node(a));
        assert!(!graph.has_node(b));
        assert!(graph.get_outgoing_edges(pony).is_empty());
    }

    #[test]
    fn test_below_threshold_is_untouched() {
        let mut backend = MemoryGraph::new();
        org(&mut backend, "阿里巴巴");
        org(&mut backend, "阿里集团");
        org(&mut backend, "腾讯");

        let report = EntityAligner::new(ResolverConfig::default())
            .align_label(&mut backend, &Label::new("ORG"))
            .unwrap();
        assert!(report.merges.is_empty());
        assert_eq!(report.comparisons, 3);
        assert_eq!(backend.graph().node_count(), 3);
    }

    #[test]
    fn test_filter_skips_pairs() {
        let mut backend = MemoryGraph::new();
        org(&mut backend, "阿里巴巴");
        org(&mut backend, "阿里集团");
        org(&mut backend, "腾讯");

        let config = ResolverConfig {
            candidates: CandidateMode::SharedCharacters,
            ..ResolverConfig::default()
        };
        let report = EntityAligner::new(config)
            .align_label(&mut backend, &Label::new("ORG"))
            .unwrap();
        assert_eq!(report.comparisons, 1);
        assert_eq!(report.pairs_filtered, 2);
    }

    #[test]
    fn test_zero_threshold_ignores_filter() {
        let run = |candidates: CandidateMode| {
            let mut backend = MemoryGraph::new();
            org(&mut backend, "阿里巴巴");
            org(&mut backend, "阿里集团");
            org(&mut backend, "腾讯");
            let config = ResolverConfig {
                threshold: 0.0,
                candidates,
                ..ResolverConfig::default()
            };
            let report = EntityAligner::new(config)
                .align_label(&mut backend, &Label::new("ORG"))
                .unwrap();
            (report, backend.graph().node_count())
        };

        let (all, all_left) = run(CandidateMode::AllPairs);
        let (shared, shared_left) = run(CandidateMode::SharedCharacters);
        assert_eq!(all.merges.len(), 2);
        assert_eq!(all_left, 1);
        assert_eq!(shared.merged_pairs(), all.merged_pairs());
        assert_eq!(shared.comparisons, all.comparisons);
        assert_eq!(shared.pairs_filtered, 0);
        assert_eq!(shared_left, all_left);
    }

    #[test]
    fn test_unnamed_entities_are_ignored() {
        let mut backend = MemoryGraph::new();
        backend
            .write(|tx| tx.upsert_node(&NodeKey::new("ORG", "id", "x1"), &PropertyMap::new()))
            .unwrap();
        org(&mut backend, "腾讯");

        let report = EntityAligner::with_scorer(ResolverConfig::default(), |_: &str, _: &str| 1.0)
            .align_label(&mut backend, &Label::new("ORG"))
            .unwrap();
        assert_eq!(report.comparisons, 0);
        assert_eq!(backend.graph().node_count(), 2);
    }
}
