//! Depth computation.
//!
//! `depth(a)` is 0 when `a` has no known producer or its producer has no
//! recorded inputs, and otherwise `1 + max(depth(input))` over the
//! producer's input edges. Results are memoized per artifact, so each
//! artifact is evaluated once however many paths reach it.

use std::collections::{BTreeMap, HashSet};

use crate::builder::ProvenanceMaps;
use crate::types::{ArtifactId, InputEdge};

/// Memoized depth calculator over one build's maps.
pub struct DepthCalculator<'a> {
    maps: &'a ProvenanceMaps,
    memo: BTreeMap<ArtifactId, usize>,
}

impl<'a> DepthCalculator<'a> {
    /// Create a calculator over `maps`.
    pub fn new(maps: &'a ProvenanceMaps) -> Self {
        Self {
            maps,
            memo: BTreeMap::new(),
        }
    }

    fn inputs(&self, artifact: &ArtifactId) -> &'a [InputEdge] {
        let maps: &'a ProvenanceMaps = self.maps;
        match maps.action_of(artifact) {
            Some(action) => maps.inputs_of(&action),
            None => &[],
        }
    }

    /// Depth of `artifact`.
    ///
    /// Evaluated with an explicit work stack, so chains of any length are
    /// safe. Each artifact is pushed for expansion, then revisited once all
    /// of its inputs are memoized.
    pub fn depth(&mut self, artifact: &ArtifactId) -> usize {
        if let Some(depth) = self.memo.get(artifact) {
            return *depth;
        }

        let mut stack = vec![(*artifact, false)];
        let mut open: HashSet<ArtifactId> = HashSet::new();

        while let Some((current, inputs_done)) = stack.pop() {
            let edges = self.inputs(&current);

            if inputs_done {
                // An input still missing here closes a cycle and counts as 0.
                let deepest = edges
                    .iter()
                    .map(|edge| self.memo.get(&edge.source).copied().unwrap_or(0))
                    .max();
                self.memo.insert(current, deepest.map_or(0, |d| d + 1));
                open.remove(&current);
                continue;
            }

            if self.memo.contains_key(&current) || open.contains(&current) {
                continue;
            }
            if edges.is_empty() {
                self.memo.insert(current, 0);
                continue;
            }

            open.insert(current);
            stack.push((current, true));
            stack.extend(
                edges
                    .iter()
                    .rev()
                    .filter(|edge| !self.memo.contains_key(&edge.source))
                    .map(|edge| (edge.source, false)),
            );
        }

        self.memo.get(artifact).copied().unwrap_or(0)
    }

    /// Depth of every artifact in the maps.
    pub fn all(mut self) -> BTreeMap<ArtifactId, usize> {
        let maps = self.maps;
        for artifact in maps.artifact_to_action.keys() {
            self.depth(artifact);
        }
        self.memo
    }
}
