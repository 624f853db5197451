use crate::model::{ClusterId, NOISE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Majority outcome per cluster id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterLabelMap {
    labels: BTreeMap<ClusterId, u8>,
}

impl ClusterLabelMap {
    /// Build from per-point cluster ids and outcomes of the same corpus.
    ///
    /// Noise points are ignored. Each cluster takes its most frequent
    /// outcome; on a tie the outcome encountered first in corpus order wins.
    pub fn from_assignments(cluster_ids: &[ClusterId], outcomes: &[u8]) -> Self {
        // per cluster: (outcome, count, first index)
        let mut tallies: BTreeMap<ClusterId, Vec<(u8, usize, usize)>> = BTreeMap::new();

        for (idx, (&cluster, &outcome)) in cluster_ids.iter().zip(outcomes).enumerate() {
            if cluster == NOISE {
                continue;
            }
            let tally = tallies.entry(cluster).or_default();
            match tally.iter_mut().find(|(o, _, _)| *o == outcome) {
                Some((_, count, _)) => *count += 1,
                None => tally.push((outcome, 1, idx)),
            }
        }

        let labels = tallies
            .into_iter()
            .filter_map(|(cluster, tally)| {
                tally
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
                    .map(|(outcome, _, _)| (cluster, outcome))
            })
            .collect::<BTreeMap<_, _>>();

        debug!("Cluster label map: {:?}", labels);
        Self { labels }
    }

    /// Majority outcome for `cluster`, `None` for noise or unmapped ids
    pub fn resolve(&self, cluster: ClusterId) -> Option<u8> {
        if cluster == NOISE {
            return None;
        }
        self.labels.get(&cluster).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, u8)> + '_ {
        self.labels.iter().map(|(&c, &o)| (c, o))
    }
}
