//! Board topology derived from a row/column hex layout.
//!
//! Tiles are laid out in rows of varying width (the standard board is
//! 3-4-5-4-3). Every tile exposes six local corners and six local sides;
//! this module maps each `(tile, corner)` pair to a canonical
//! [`IntersectionId`] and each `(tile, side)` pair to a canonical [`PathId`],
//! so that neighbouring tiles that touch the same physical point or border
//! resolve to the same id.
//!
//! The mapping is computed once from geometry and never changes afterwards:
//! - tile centers sit on a unit-radius hex grid (rows `1.5` apart,
//!   columns `sqrt(3)` apart, narrower rows shifted to stay centered)
//! - corner `k` sits at angle `60k - 30` degrees from the center
//! - side `k` spans corners `k` and `k + 1 (mod 6)`
//!
//! Points computed from different tiles are merged when they fall within
//! [`CLUSTER_TOLERANCE`] of each other. Ids are handed out first-seen-wins
//! in tile order, corner order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The standard 19-tile layout
pub const STANDARD_ROWS: [usize; 5] = [3, 4, 5, 4, 3];

/// Corners and sides per tile
pub const HEX_SIDES: usize = 6;

/// Maximum distance at which two computed points are the same point.
///
/// Distinct intersections are one radius apart and distinct path midpoints
/// `sqrt(3)/2` apart, so anything well below half of that is safe.
pub const CLUSTER_TOLERANCE: f64 = 1e-3;

const CORNER_ANGLES_DEG: [f64; HEX_SIDES] = [-30.0, 30.0, 90.0, 150.0, 210.0, 270.0];

/// Canonical id of a board intersection (a corner shared by 1-3 tiles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntersectionId(pub u16);

impl IntersectionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Canonical id of a board path (a border shared by 1-2 tiles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(pub u16);

impl PathId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A point in board space (unit hex radius)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A canonical intersection and what touches it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intersection {
    /// Position of the first corner that produced this intersection
    pub point: Point,
    /// Tiles having this intersection as one of their corners
    pub tiles: Vec<usize>,
    /// Paths ending at this intersection
    pub paths: Vec<PathId>,
}

/// A canonical path and what touches it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    /// Midpoint of the first side that produced this path
    pub midpoint: Point,
    /// The two intersections joined by this path
    pub endpoints: [IntersectionId; 2],
    /// Tiles having this path as one of their sides
    pub tiles: Vec<usize>,
}

/// Immutable lookup tables for a tile layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    rows: Vec<usize>,
    positions: Vec<(usize, usize)>,
    centers: Vec<Point>,
    corners: Vec<[IntersectionId; HEX_SIDES]>,
    sides: Vec<[PathId; HEX_SIDES]>,
    intersections: Vec<Intersection>,
    paths: Vec<Path>,
}

impl Topology {
    /// Topology of the standard 3-4-5-4-3 board
    pub fn standard() -> Self {
        Self::build(&STANDARD_ROWS)
    }

    /// Derive the topology of an arbitrary row layout
    pub fn build(rows: &[usize]) -> Self {
        let widest = rows.iter().copied().max().unwrap_or(0);

        let mut positions = Vec::new();
        let mut centers = Vec::new();
        for (row, &width) in rows.iter().enumerate() {
            for col in 0..width {
                positions.push((row, col));
                centers.push(tile_center(row, col, width, widest));
            }
        }

        // Intersections: cluster every tile corner
        let mut intersections: Vec<Intersection> = Vec::new();
        let mut corners = Vec::with_capacity(centers.len());
        for (tile, center) in centers.iter().enumerate() {
            let mut ids = [IntersectionId(0); HEX_SIDES];
            for (corner, slot) in ids.iter_mut().enumerate() {
                let point = corner_point(*center, corner);
                let index = match intersections
                    .iter()
                    .position(|i| i.point.distance_to(point) <= CLUSTER_TOLERANCE)
                {
                    Some(existing) => existing,
                    None => {
                        intersections.push(Intersection {
                            point,
                            tiles: Vec::new(),
                            paths: Vec::new(),
                        });
                        intersections.len() - 1
                    }
                };
                intersections[index].tiles.push(tile);
                *slot = IntersectionId(index as u16);
            }
            corners.push(ids);
        }

        // Paths: cluster every side midpoint
        let mut paths: Vec<Path> = Vec::new();
        let mut sides = Vec::with_capacity(centers.len());
        for (tile, center) in centers.iter().enumerate() {
            let mut ids = [PathId(0); HEX_SIDES];
            for (side, slot) in ids.iter_mut().enumerate() {
                let next = (side + 1) % HEX_SIDES;
                let midpoint = corner_point(*center, side).midpoint(corner_point(*center, next));
                let index = match paths
                    .iter()
                    .position(|p| p.midpoint.distance_to(midpoint) <= CLUSTER_TOLERANCE)
                {
                    Some(existing) => existing,
                    None => {
                        paths.push(Path {
                            midpoint,
                            endpoints: [corners[tile][side], corners[tile][next]],
                            tiles: Vec::new(),
                        });
                        paths.len() - 1
                    }
                };
                paths[index].tiles.push(tile);
                *slot = PathId(index as u16);
            }
            sides.push(ids);
        }

        for (index, path) in paths.iter().enumerate() {
            for endpoint in path.endpoints {
                intersections[endpoint.index()].paths.push(PathId(index as u16));
            }
        }

        Self {
            rows: rows.to_vec(),
            positions,
            centers,
            corners,
            sides,
            intersections,
            paths,
        }
    }

    /// Row widths this topology was built from
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn tile_count(&self) -> usize {
        self.positions.len()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// (row, column) of a tile
    pub fn position(&self, tile: usize) -> Option<(usize, usize)> {
        self.positions.get(tile).copied()
    }

    /// Center of a tile in board space
    pub fn center(&self, tile: usize) -> Option<Point> {
        self.centers.get(tile).copied()
    }

    /// Canonical intersection for a tile's local corner
    pub fn intersection_at(&self, tile: usize, corner: usize) -> Option<IntersectionId> {
        self.corners.get(tile)?.get(corner).copied()
    }

    /// Canonical path for a tile's local side
    pub fn path_at(&self, tile: usize, side: usize) -> Option<PathId> {
        self.sides.get(tile)?.get(side).copied()
    }

    /// All six corners of a tile, in local order
    pub fn corners_of(&self, tile: usize) -> Option<&[IntersectionId; HEX_SIDES]> {
        self.corners.get(tile)
    }

    /// All six sides of a tile, in local order
    pub fn sides_of(&self, tile: usize) -> Option<&[PathId; HEX_SIDES]> {
        self.sides.get(tile)
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id.index())
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id.index())
    }

    pub fn intersections(&self) -> impl Iterator<Item = (IntersectionId, &Intersection)> {
        self.intersections
            .iter()
            .enumerate()
            .map(|(i, v)| (IntersectionId(i as u16), v))
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &Path)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, p)| (PathId(i as u16), p))
    }

    /// Tiles touching an intersection (empty for unknown ids)
    pub fn tiles_at(&self, id: IntersectionId) -> &[usize] {
        self.intersection(id).map_or(&[][..], |i| i.tiles.as_slice())
    }

    /// Intersections one path away from `id`
    pub fn adjacent_intersections(&self, id: IntersectionId) -> Vec<IntersectionId> {
        let Some(intersection) = self.intersection(id) else {
            return Vec::new();
        };
        intersection
            .paths
            .iter()
            .filter_map(|p| self.path(*p))
            .filter_map(|p| p.endpoints.iter().copied().find(|e| *e != id))
            .collect()
    }

    /// Tiles sharing a side with `tile`
    pub fn tile_neighbors(&self, tile: usize) -> Vec<usize> {
        let Some(sides) = self.sides_of(tile) else {
            return Vec::new();
        };
        sides
            .iter()
            .filter_map(|p| self.path(*p))
            .filter_map(|p| p.tiles.iter().copied().find(|t| *t != tile))
            .collect()
    }
}

fn tile_center(row: usize, col: usize, width: usize, widest: usize) -> Point {
    let column_spacing = 3.0_f64.sqrt();
    let row_offset = (widest - width) as f64 * column_spacing / 2.0;
    Point::new(col as f64 * column_spacing + row_offset, row as f64 * 1.5)
}

fn corner_point(center: Point, corner: usize) -> Point {
    let angle = CORNER_ANGLES_DEG[corner % HEX_SIDES].to_radians();
    Point::new(center.x + angle.cos(), center.y + angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_layout_has_19_tiles() {
        let topology = Topology::standard();
        assert_eq!(topology.tile_count(), 19);
        assert_eq!(topology.position(0), Some((0, 0)));
        assert_eq!(topology.position(18), Some((4, 2)));
        assert_eq!(topology.position(19), None);
    }

    #[test]
    fn test_standard_layout_counts() {
        let topology = Topology::standard();
        assert_eq!(topology.intersection_count(), 54);
        assert_eq!(topology.path_count(), 72);
    }

    #[test]
    fn test_intersection_sharing_distribution() {
        let topology = Topology::standard();
        let mut by_tiles = [0usize; 4];
        for (_, intersection) in topology.intersections() {
            by_tiles[intersection.tiles.len()] += 1;
        }
        // coast corners touch 1 or 2 tiles, inland corners touch 3
        assert_eq!(by_tiles, [0, 18, 12, 24]);
    }

    #[test]
    fn test_paths_touch_one_or_two_tiles() {
        let topology = Topology::standard();
        let coastal = topology.paths().filter(|(_, p)| p.tiles.len() == 1).count();
        let inland = topology.paths().filter(|(_, p)| p.tiles.len() == 2).count();
        assert_eq!(coastal, 30);
        assert_eq!(inland, 42);
        assert_eq!(coastal + inland, topology.path_count());
    }

    #[test]
    fn test_same_row_neighbors_share_east_west_side() {
        let topology = Topology::standard();
        // Tiles 0 and 1 sit side by side in the first row
        assert_eq!(topology.path_at(0, 0), topology.path_at(1, 3));
        assert_eq!(topology.intersection_at(0, 0), topology.intersection_at(1, 4));
        assert_eq!(topology.intersection_at(0, 1), topology.intersection_at(1, 3));
    }

    #[test]
    fn test_diagonal_neighbors_share_side() {
        let topology = Topology::standard();
        // Tile 3 is the first tile of the second row, below-left of tile 0
        assert_eq!(topology.path_at(0, 2), topology.path_at(3, 5));
    }

    #[test]
    fn test_adjacent_tiles_share_exactly_two_corners_and_one_side() {
        let topology = Topology::standard();
        let neighbor_distance = 3.0_f64.sqrt();

        for a in 0..topology.tile_count() {
            for b in (a + 1)..topology.tile_count() {
                let distance = topology
                    .center(a)
                    .unwrap()
                    .distance_to(topology.center(b).unwrap());
                let corners_a: HashSet<_> = topology.corners_of(a).unwrap().iter().collect();
                let corners_b: HashSet<_> = topology.corners_of(b).unwrap().iter().collect();
                let sides_a: HashSet<_> = topology.sides_of(a).unwrap().iter().collect();
                let sides_b: HashSet<_> = topology.sides_of(b).unwrap().iter().collect();
                let shared_corners = corners_a.intersection(&corners_b).count();
                let shared_sides = sides_a.intersection(&sides_b).count();

                if (distance - neighbor_distance).abs() < CLUSTER_TOLERANCE {
                    assert_eq!(shared_corners, 2, "tiles {} and {}", a, b);
                    assert_eq!(shared_sides, 1, "tiles {} and {}", a, b);
                } else {
                    assert_eq!(shared_corners, 0, "tiles {} and {}", a, b);
                    assert_eq!(shared_sides, 0, "tiles {} and {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_path_endpoints_are_side_corners() {
        let topology = Topology::standard();
        for tile in 0..topology.tile_count() {
            for side in 0..HEX_SIDES {
                let path = topology.path(topology.path_at(tile, side).unwrap()).unwrap();
                let a = topology.intersection_at(tile, side).unwrap();
                let b = topology.intersection_at(tile, (side + 1) % HEX_SIDES).unwrap();
                let mut expected = [a, b];
                let mut actual = path.endpoints;
                expected.sort();
                actual.sort();
                assert_eq!(actual, expected);
            }
        }
    }

    #[test]
    fn test_first_seen_ids_are_assigned_in_tile_order() {
        let topology = Topology::standard();
        let first: Vec<_> = topology.corners_of(0).unwrap().iter().map(|i| i.0).collect();
        assert_eq!(first, vec![0, 1, 2, 3, 4, 5]);
        let first_sides: Vec<_> = topology.sides_of(0).unwrap().iter().map(|p| p.0).collect();
        assert_eq!(first_sides, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(Topology::standard(), Topology::standard());
    }

    #[test]
    fn test_adjacent_intersections() {
        let topology = Topology::standard();
        for (id, intersection) in topology.intersections() {
            let adjacent = topology.adjacent_intersections(id);
            assert_eq!(adjacent.len(), intersection.paths.len());
            assert!((2..=3).contains(&adjacent.len()));
            assert!(!adjacent.contains(&id));
        }
    }

    #[test]
    fn test_center_tile_has_six_neighbors() {
        let topology = Topology::standard();
        // Tile 9 is the middle of the five-wide row
        assert_eq!(topology.position(9), Some((2, 2)));
        assert_eq!(topology.tile_neighbors(9).len(), 6);
        assert_eq!(topology.tile_neighbors(0).len(), 3);
    }

    #[test]
    fn test_single_tile_layout() {
        let topology = Topology::build(&[1]);
        assert_eq!(topology.intersection_count(), 6);
        assert_eq!(topology.path_count(), 6);
        assert!(topology.tile_neighbors(0).is_empty());
        assert_eq!(topology.tiles_at(IntersectionId(3)), &[0]);
        assert!(topology.tiles_at(IntersectionId(6)).is_empty());
    }
}
