//! Spatial aggregation of records at effectively identical coordinates
//!
//! Records are bucketed into a grid keyed by coordinates rounded to the
//! tolerance, so both the neighborhood query and the full partition stay
//! near-linear instead of falling into a pairwise scan. Each lookup probes
//! the 3x3 cell neighborhood, so pairs straddling a cell boundary are not
//! missed; actual membership is always confirmed with the strict per-axis
//! tolerance test.

use std::collections::HashMap;

use crate::model::{Coordinate, Occurrence, COORD_TOLERANCE};

/// Grid index over the coordinates of a record set
///
/// Built from scratch on every recomputation; membership is a pure function
/// of coordinates and tolerance, independent of record order.
pub struct SpatialIndex {
    cells: HashMap<(i64, i64), Vec<usize>>,
    coordinates: Vec<Option<Coordinate>>,
}

fn cell_of(coordinate: Coordinate) -> (i64, i64) {
    (
        (coordinate.lon / COORD_TOLERANCE).floor() as i64,
        (coordinate.lat / COORD_TOLERANCE).floor() as i64,
    )
}

impl SpatialIndex {
    /// Index the records that carry a coordinate; malformed records are
    /// excluded from spatial computation entirely
    pub fn new(records: &[Occurrence]) -> Self {
        let coordinates: Vec<Option<Coordinate>> =
            records.iter().map(|r| r.coordinate).collect();
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (index, coordinate) in coordinates.iter().enumerate() {
            if let Some(coordinate) = coordinate {
                cells.entry(cell_of(*coordinate)).or_default().push(index);
            }
        }
        Self { cells, coordinates }
    }

    /// Indices of all records within tolerance of the candidate coordinate,
    /// in record order
    pub fn neighbors_of(&self, candidate: Coordinate) -> Vec<usize> {
        let (cx, cy) = cell_of(candidate);
        let mut matches = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &index in indices {
                        if let Some(coordinate) = self.coordinates[index] {
                            if coordinate.matches(&candidate) {
                                matches.push(index);
                            }
                        }
                    }
                }
            }
        }
        matches.sort_unstable();
        matches
    }

    /// Partition all indexed records into clusters: connected components of
    /// the within-tolerance relation.
    ///
    /// Components make the result independent of processing order, at the
    /// cost of tolerance chaining (A near B and B near C cluster all three
    /// even if A and C are slightly farther apart). Members are listed in
    /// record order and clusters ordered by their first member.
    pub fn partition(&self) -> Vec<Vec<usize>> {
        let mut sets = DisjointSets::new(self.coordinates.len());
        for (index, coordinate) in self.coordinates.iter().enumerate() {
            if let Some(coordinate) = coordinate {
                for neighbor in self.neighbors_of(*coordinate) {
                    sets.union(index, neighbor);
                }
            }
        }

        let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, coordinate) in self.coordinates.iter().enumerate() {
            if coordinate.is_some() {
                by_root.entry(sets.find(index)).or_default().push(index);
            }
        }

        let mut clusters: Vec<Vec<usize>> = by_root.into_values().collect();
        for members in &mut clusters {
            members.sort_unstable();
        }
        clusters.sort_unstable_by_key(|members| members[0]);
        clusters
    }
}

/// All records within tolerance of the candidate, in record order
pub fn neighbors_of<'a>(records: &'a [Occurrence], candidate: &Occurrence) -> Vec<&'a Occurrence> {
    let Some(coordinate) = candidate.coordinate else {
        return Vec::new();
    };
    SpatialIndex::new(records)
        .neighbors_of(coordinate)
        .into_iter()
        .map(|index| &records[index])
        .collect()
}

/// Union-find with path halving, for the cluster partition
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecordId, Status};
    use chrono::NaiveDateTime;

    fn occurrence(id: RecordId, lon: f64, lat: f64) -> Occurrence {
        Occurrence {
            id,
            kind: String::new(),
            status_text: String::new(),
            status: Status::Unknown,
            description: String::new(),
            km: None,
            local: None,
            admin_code: None,
            recorded_at_text: String::new(),
            recorded_at: NaiveDateTime::UNIX_EPOCH,
            coordinate: Some(Coordinate::new(lon, lat)),
        }
    }

    #[test]
    fn test_neighbors_within_tolerance() {
        let records = vec![
            occurrence(1, -50.1, -29.6),
            occurrence(2, -50.1, -29.600000000001),
            occurrence(3, -50.2, -29.6),
        ];
        let neighbors = neighbors_of(&records, &records[0]);
        let ids: Vec<_> = neighbors.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_partition_two_clusters() {
        let records = vec![
            occurrence(1, -50.1, -29.6),
            occurrence(2, -50.1, -29.600000000001),
            occurrence(3, -50.2, -29.6),
        ];
        let clusters = SpatialIndex::new(&records).partition();
        assert_eq!(clusters, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_partition_order_independent() {
        let a = occurrence(1, -50.1, -29.6);
        let b = occurrence(2, -50.1, -29.600000000001);
        let c = occurrence(3, -50.2, -29.6);
        let d = occurrence(4, -50.2, -29.6000000004);

        let forward = vec![a.clone(), b.clone(), c.clone(), d.clone()];
        let reversed = vec![d, c, b, a];

        let cluster_ids = |records: &[Occurrence]| -> Vec<Vec<RecordId>> {
            let mut clusters: Vec<Vec<RecordId>> = SpatialIndex::new(records)
                .partition()
                .into_iter()
                .map(|members| {
                    let mut ids: Vec<_> = members.iter().map(|&i| records[i].id).collect();
                    ids.sort_unstable();
                    ids
                })
                .collect();
            clusters.sort();
            clusters
        };

        assert_eq!(cluster_ids(&forward), cluster_ids(&reversed));
        assert_eq!(cluster_ids(&forward), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_cell_boundary_pairs_found() {
        // Two points closer than tolerance but falling into adjacent grid
        // cells; the 3x3 probe must still pair them
        let records = vec![
            occurrence(1, 1e-6 - 1e-9, 0.0),
            occurrence(2, 1e-6 + 1e-9, 0.0),
        ];
        let clusters = SpatialIndex::new(&records).partition();
        assert_eq!(clusters, vec![vec![0, 1]]);
    }

    #[test]
    fn test_records_without_coordinate_excluded() {
        let mut no_coord = occurrence(9, 0.0, 0.0);
        no_coord.coordinate = None;
        let records = vec![occurrence(1, -50.1, -29.6), no_coord];
        let clusters = SpatialIndex::new(&records).partition();
        assert_eq!(clusters, vec![vec![0]]);
        assert!(neighbors_of(&records, &records[1]).is_empty());
    }

    #[test]
    fn test_partition_scales_past_pairwise() {
        // A few hundred well-separated points all become singletons
        let records: Vec<Occurrence> = (0..500)
            .map(|i| occurrence(i as RecordId, -50.0 + (i as f64) * 1e-3, -29.6))
            .collect();
        let clusters = SpatialIndex::new(&records).partition();
        assert_eq!(clusters.len(), 500);
        assert!(clusters.iter().all(|members| members.len() == 1));
    }
}
