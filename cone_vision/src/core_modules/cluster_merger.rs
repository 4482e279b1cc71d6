// THEORY:
// Inflated candidates belonging to the same cone overlap, and overlap is
// transitive for our purpose: if A and C both overlap B, all three describe one
// object even when A and C do not touch. The `ClusterMerger` computes exactly
// that closure with a disjoint-set forest over candidate indices, then collapses
// every group into the smallest box enclosing its members.
//
// Groups are numbered in order of their first member in the candidate list, so
// the output is stable for a given input. Reordering the input may renumber the
// clusters but never changes the set of enclosing boxes.
//
// The enclosing boxes are filtered once more: a cluster covering too much of the
// frame, or one much wider than tall, cannot be a single upright cone.

use crate::config::DetectorConfig;
use crate::core_modules::bounding_box::BoundingBox;

/// Union-find over `0..len` with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `element`.
    pub fn find(&mut self, mut element: usize) -> usize {
        while self.parent[element] != element {
            self.parent[element] = self.parent[self.parent[element]];
            element = self.parent[element];
        }
        element
    }

    /// Merges the sets of `a` and `b`. Returns `false` if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
        true
    }

    /// Every set as a sorted list of members. Sets are ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut group_of_root = vec![usize::MAX; self.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for element in 0..self.len() {
            let root = self.find(element);
            if group_of_root[root] == usize::MAX {
                group_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[group_of_root[root]].push(element);
        }
        groups
    }
}

/// A group of transitively overlapping candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Discovery-order label, starting at 0.
    pub label: usize,
    /// Indices into the candidate list.
    pub members: Vec<usize>,
    /// Smallest box enclosing every member.
    pub enclosing_box: BoundingBox,
}

/// Groups candidates by transitive overlap, without any filtering.
pub fn cluster_candidates(candidates: &[BoundingBox]) -> Vec<Cluster> {
    let mut sets = DisjointSet::new(candidates.len());
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if candidates[i].intersects(&candidates[j]) {
                sets.union(i, j);
            }
        }
    }

    sets.groups()
        .into_iter()
        .enumerate()
        .map(|(label, members)| {
            let enclosing_box = members
                .iter()
                .fold(BoundingBox::default(), |acc, &i| acc.union(&candidates[i]));
            Cluster {
                label,
                members,
                enclosing_box,
            }
        })
        .collect()
}

/// Clusters candidates and keeps the clusters whose enclosing box could hold a cone.
pub fn merge_clusters(
    candidates: &[BoundingBox],
    frame_width: u32,
    frame_height: u32,
    config: &DetectorConfig,
) -> Vec<Cluster> {
    let area_ceiling = config.max_cone_area_fraction * frame_width as f64 * frame_height as f64;

    cluster_candidates(candidates)
        .into_iter()
        .filter(|cluster| {
            let bbox = &cluster.enclosing_box;
            let small_enough = (bbox.area() as f64) < area_ceiling;
            let upright_enough = bbox
                .aspect_ratio()
                .is_some_and(|aspect| aspect >= config.cluster_min_aspect);
            small_enough && upright_enough
        })
        .collect()
}
