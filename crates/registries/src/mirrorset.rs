//! Merging mirror policy entries into per-source mirror sets.

use std::collections::BTreeMap;

use crate::k8sapitypes::MirrorSourcePolicy;
use crate::topograph::TopoGraph;

/// One `(source, mirrors)` entry taken from a single policy object.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MirrorRule<'a> {
    pub(crate) source: &'a str,
    pub(crate) mirrors: &'a [String],
    pub(crate) policy: MirrorSourcePolicy,
}

/// The merged configuration for one source: its mirrors, ordered to
/// respect every contributing entry's preference order, and the
/// strictest source policy any entry declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedMirrorSet {
    pub(crate) source: String,
    pub(crate) mirrors: Vec<String>,
    pub(crate) policy: MirrorSourcePolicy,
}

/// A mirror list only counts if it names at least one mirror that is not
/// just the source itself; listing the source among its own mirrors
/// expresses a fallback order, not a redirection.
pub(crate) fn mirrors_contain_a_real_mirror(source: &str, mirrors: &[String]) -> bool {
    mirrors.iter().any(|mirror| mirror != source)
}

/// Merge all entries of one origin kind into per-source mirror sets,
/// sorted by source. Sources whose entries never name a real mirror are
/// dropped entirely.
pub(crate) fn merged_mirror_sets(rules: &[MirrorRule<'_>]) -> Vec<MergedMirrorSet> {
    #[derive(Default)]
    struct SourceState {
        graph: TopoGraph,
        policy: MirrorSourcePolicy,
        real_mirror: bool,
    }

    let mut sources: BTreeMap<&str, SourceState> = BTreeMap::new();
    for rule in rules {
        let state = sources.entry(rule.source).or_default();
        state.graph.add_sequence(rule.mirrors);
        state.real_mirror |= mirrors_contain_a_real_mirror(rule.source, rule.mirrors);
        if rule.policy == MirrorSourcePolicy::NeverContactSource {
            state.policy = MirrorSourcePolicy::NeverContactSource;
        }
    }
    sources
        .into_iter()
        .filter(|(_, state)| state.real_mirror)
        .map(|(source, state)| MergedMirrorSet {
            source: source.to_owned(),
            mirrors: state.graph.result(),
            policy: state.policy,
        })
        .collect()
}
