//! Bottom-up merge clustering.
//!
//! Every sample starts as its own cluster and the two clusters with the
//! closest centroids are merged until the requested number remains. Ties go
//! to the first pair in `(i, j)` scan order, `i < j`.
//!
//! Each cluster caches its nearest later neighbour so a merge only rescans
//! the clusters whose cached neighbour was affected, rather than every pair.
//! The merge order is identical to a full pairwise scan.

use crate::color::{Accumulator, Pixel, distance_squared, sort_by_luminance};

#[derive(Debug, Clone)]
struct Cluster {
    id: usize,
    members: Accumulator,
    centroid: Pixel,
}

/// Nearest cluster after this one in scan order.
#[derive(Debug, Clone, Copy)]
struct Neighbour {
    distance: u32,
    index: usize,
}

/// Outcome of a single merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Position of the surviving cluster; it keeps its position.
    pub kept: usize,
    /// Position the absorbed cluster held before it was removed.
    pub absorbed: usize,
    /// Identity of the surviving cluster.
    pub id: usize,
    /// Mean of the union of both clusters' members.
    pub centroid: Pixel,
}

/// Working set of clusters, merged one step at a time.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
    nearest: Vec<Option<Neighbour>>,
}

impl ClusterSet {
    /// One singleton cluster per pixel, in input order.
    pub fn new(pixels: &[Pixel]) -> Self {
        let clusters = pixels
            .iter()
            .enumerate()
            .map(|(id, &pixel)| Cluster {
                id,
                members: Accumulator::of(pixel),
                centroid: pixel,
            })
            .collect();
        let mut set = Self {
            clusters,
            nearest: vec![None; pixels.len()],
        };
        for k in 0..set.clusters.len() {
            set.nearest[k] = set.scan_from(k);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Current centroids in cluster order.
    pub fn centroids(&self) -> Vec<Pixel> {
        self.clusters.iter().map(|c| c.centroid).collect()
    }

    /// Number of samples in each cluster, in cluster order.
    pub fn sizes(&self) -> Vec<u64> {
        self.clusters.iter().map(|c| c.members.count()).collect()
    }

    fn scan_from(&self, k: usize) -> Option<Neighbour> {
        let origin = self.clusters[k].centroid;
        let mut best: Option<Neighbour> = None;
        for (index, other) in self.clusters.iter().enumerate().skip(k + 1) {
            let distance = distance_squared(origin, other.centroid);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(Neighbour { distance, index });
            }
        }
        best
    }

    /// The pair a full `(i, j)` scan would pick first.
    pub fn closest_pair(&self) -> Option<(usize, usize)> {
        let mut best: Option<(u32, usize, usize)> = None;
        for (i, neighbour) in self.nearest.iter().enumerate() {
            if let Some(n) = neighbour {
                if best.is_none_or(|(d, _, _)| n.distance < d) {
                    best = Some((n.distance, i, n.index));
                }
            }
        }
        best.map(|(_, i, j)| (i, j))
    }

    /// Merges the closest pair, shrinking the set by exactly one.
    ///
    /// Returns `None` once fewer than two clusters remain.
    pub fn merge_closest(&mut self) -> Option<Merge> {
        let (kept, absorbed) = self.closest_pair()?;

        let removed = self.clusters.remove(absorbed);
        self.nearest.remove(absorbed);

        let survivor = &mut self.clusters[kept];
        survivor.members.merge(&removed.members);
        if let Some(mean) = survivor.members.mean() {
            survivor.centroid = mean;
        }
        let merge = Merge {
            kept,
            absorbed,
            id: survivor.id,
            centroid: survivor.centroid,
        };

        self.refresh_neighbours(kept, absorbed);
        Some(merge)
    }

    fn refresh_neighbours(&mut self, kept: usize, absorbed: usize) {
        let centroid = self.clusters[kept].centroid;
        for k in 0..self.clusters.len() {
            let stale = match self.nearest[k] {
                None => k == kept,
                Some(n) => k == kept || n.index == kept || n.index == absorbed,
            };
            if stale {
                self.nearest[k] = self.scan_from(k);
                continue;
            }

            let Some(mut n) = self.nearest[k] else {
                continue;
            };
            if n.index > absorbed {
                n.index -= 1;
            }
            if k < kept {
                // The merged centroid moved and may now beat the cached neighbour.
                let distance = distance_squared(self.clusters[k].centroid, centroid);
                if distance < n.distance || (distance == n.distance && kept < n.index) {
                    n = Neighbour {
                        distance,
                        index: kept,
                    };
                }
            }
            self.nearest[k] = Some(n);
        }
    }
}

/// Reduces `pixels` to at most `num_colors` centroids, brightest first.
///
/// Returns fewer colors than requested when there are fewer pixels than
/// `num_colors`. At least one cluster always survives a non-empty input.
pub fn cluster(pixels: &[Pixel], num_colors: usize) -> Vec<Pixel> {
    let mut set = ClusterSet::new(pixels);
    let mut merges = 0usize;
    while set.len() > num_colors {
        let Some(merge) = set.merge_closest() else {
            break;
        };
        merges += 1;
        tracing::trace!(
            "merged cluster at {} into {} (id {}), {} left",
            merge.absorbed,
            merge.kept,
            merge.id,
            set.len()
        );
    }
    tracing::debug!(
        "agglomerative clustering: {} samples, {merges} merges, {} clusters",
        pixels.len(),
        set.len()
    );

    let mut centroids = set.centroids();
    sort_by_luminance(&mut centroids);
    centroids
}
