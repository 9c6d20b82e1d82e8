//! Game board representation including tiles and buildings.
//!
//! This module contains:
//! - Resource and tile types
//! - Building types on intersections and paths
//! - The board: tile list, occupancy tables and the derived topology
//! - Production lookup for a dice roll

use crate::game::{GameError, SnapshotError};
use crate::player::ResourceHand;
use crate::topology::{IntersectionId, PathId, Topology};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Player identifier (seat index)
pub type PlayerId = u8;

/// Number carried by the desert; never produces
pub const DESERT_NUMBER: u8 = 7;

/// Producible resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

/// Type of hex tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// No production
    Desert,
}

/// Kind of building standing on an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Settlement,
    City,
}

impl BuildingKind {
    /// Resources produced per matching roll
    pub fn yield_amount(&self) -> u32 {
        match self {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A single hex tile on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// What the tile produces
    pub tile_type: TileType,
    /// Dice number that triggers production (7 on the desert)
    pub number: u8,
    /// Strongest building each player has on one of this tile's corners
    #[serde(default)]
    pub buildings: BTreeMap<PlayerId, BuildingKind>,
}

impl Tile {
    /// Create a new resource tile
    pub fn new_resource(resource: Resource, number: u8) -> Self {
        Self {
            tile_type: TileType::Resource(resource),
            number,
            buildings: BTreeMap::new(),
        }
    }

    /// Create a desert tile
    pub fn desert() -> Self {
        Self {
            tile_type: TileType::Desert,
            number: DESERT_NUMBER,
            buildings: BTreeMap::new(),
        }
    }

    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.tile_type {
            TileType::Resource(r) => Some(r),
            TileType::Desert => None,
        }
    }

    pub fn is_desert(&self) -> bool {
        matches!(self.tile_type, TileType::Desert)
    }

    /// Whether this tile produces on the given roll (robber not considered)
    pub fn produces_on(&self, roll: u8) -> bool {
        !self.is_desert() && self.number == roll
    }
}

/// What's built on an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VertexBuilding {
    /// Nothing built
    #[default]
    Empty,
    Settlement(PlayerId),
    City(PlayerId),
}

impl VertexBuilding {
    /// Get the owner of this building, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    pub fn kind(&self) -> Option<BuildingKind> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(_) => Some(BuildingKind::Settlement),
            VertexBuilding::City(_) => Some(BuildingKind::City),
        }
    }
}

/// What's built on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBuilding {
    /// Nothing built
    #[default]
    Empty,
    Road(PlayerId),
}

impl EdgeBuilding {
    /// Get the owner of this road, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            EdgeBuilding::Empty => None,
            EdgeBuilding::Road(p) => Some(*p),
        }
    }
}

/// The complete game board.
///
/// The topology is derived from the standard layout on construction and on
/// load; it is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BoardJson", into = "BoardJson")]
pub struct Board {
    /// Tiles in layout order (row by row)
    tiles: Vec<Tile>,
    /// Lookup tables for corners and sides
    topology: Topology,
    /// Buildings by intersection id
    intersections: Vec<VertexBuilding>,
    /// Roads by path id
    paths: Vec<EdgeBuilding>,
}

impl Board {
    /// Create the standard board with randomized tiles and numbers
    pub fn standard() -> Self {
        let mut rng = rand::thread_rng();
        Self::standard_with_rng(&mut rng)
    }

    /// Create the standard board with a provided RNG.
    ///
    /// Resources and numbers are shuffled independently, then numbers are
    /// dealt to the non-desert tiles in order.
    pub fn standard_with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // 4 wood, 3 brick, 4 sheep, 4 wheat, 3 ore, 1 desert
        let mut tile_types: Vec<Option<Resource>> = Vec::with_capacity(19);
        for (resource, count) in [
            (Resource::Wood, 4),
            (Resource::Brick, 3),
            (Resource::Sheep, 4),
            (Resource::Wheat, 4),
            (Resource::Ore, 3),
        ] {
            tile_types.extend(std::iter::repeat(Some(resource)).take(count));
        }
        tile_types.push(None);
        tile_types.shuffle(rng);

        let mut numbers: Vec<u8> = vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];
        numbers.shuffle(rng);

        let tiles = tile_types
            .into_iter()
            .map(|tile_type| match tile_type {
                Some(resource) => Tile::new_resource(resource, numbers.pop().unwrap_or(DESERT_NUMBER)),
                None => Tile::desert(),
            })
            .collect();

        Self::with_tiles(tiles, Topology::standard())
    }

    /// Build a standard-layout board from an explicit tile list
    pub fn from_tiles(tiles: Vec<Tile>) -> Result<Self, SnapshotError> {
        let topology = Topology::standard();
        if tiles.len() != topology.tile_count() {
            return Err(SnapshotError::TileCount {
                expected: topology.tile_count(),
                found: tiles.len(),
            });
        }
        Ok(Self::with_tiles(tiles, topology))
    }

    fn with_tiles(tiles: Vec<Tile>, topology: Topology) -> Self {
        Self {
            intersections: vec![VertexBuilding::Empty; topology.intersection_count()],
            paths: vec![EdgeBuilding::Empty; topology.path_count()],
            tiles,
            topology,
        }
    }

    // ==================== Query Methods ====================

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_valid_tile(&self, index: usize) -> bool {
        index < self.tiles.len()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Index of the desert tile
    pub fn desert_index(&self) -> Option<usize> {
        self.tiles.iter().position(Tile::is_desert)
    }

    /// Building at an intersection (empty for unknown ids)
    pub fn intersection(&self, id: IntersectionId) -> VertexBuilding {
        self.intersections.get(id.index()).copied().unwrap_or_default()
    }

    /// Road on a path (empty for unknown ids)
    pub fn path(&self, id: PathId) -> EdgeBuilding {
        self.paths.get(id.index()).copied().unwrap_or_default()
    }

    /// Intersections with nothing built on them
    pub fn free_intersections(&self) -> impl Iterator<Item = IntersectionId> + '_ {
        self.intersections
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == VertexBuilding::Empty)
            .map(|(i, _)| IntersectionId(i as u16))
    }

    /// Paths with no road on them
    pub fn free_paths(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == EdgeBuilding::Empty)
            .map(|(i, _)| PathId(i as u16))
    }

    /// Intersections holding one of the player's buildings
    pub fn player_intersections(&self, player: PlayerId) -> Vec<IntersectionId> {
        self.intersections
            .iter()
            .enumerate()
            .filter(|(_, b)| b.owner() == Some(player))
            .map(|(i, _)| IntersectionId(i as u16))
            .collect()
    }

    /// Players with a building on one of the tile's corners
    pub fn players_adjacent_to_tile(&self, tile: usize) -> BTreeSet<PlayerId> {
        self.topology
            .corners_of(tile)
            .into_iter()
            .flatten()
            .filter_map(|id| self.intersection(*id).owner())
            .collect()
    }

    // ==================== Mutation Methods ====================

    /// Put a building on an empty intersection.
    ///
    /// Fails without mutation if the id is unknown, the intersection is
    /// already occupied, or `building` is empty.
    pub fn occupy_intersection(
        &mut self,
        id: IntersectionId,
        building: VertexBuilding,
    ) -> Result<(), GameError> {
        let (Some(owner), Some(kind)) = (building.owner(), building.kind()) else {
            return Err(GameError::InvalidTarget);
        };
        let slot = self
            .intersections
            .get_mut(id.index())
            .ok_or(GameError::InvalidTarget)?;
        if *slot != VertexBuilding::Empty {
            return Err(GameError::AlreadyOccupied);
        }
        *slot = building;

        for &tile in self.topology.tiles_at(id) {
            if let Some(tile) = self.tiles.get_mut(tile) {
                let entry = tile.buildings.entry(owner).or_insert(kind);
                *entry = (*entry).max(kind);
            }
        }
        Ok(())
    }

    /// Put a road on an empty path
    pub fn occupy_path(&mut self, id: PathId, player: PlayerId) -> Result<(), GameError> {
        let slot = self.paths.get_mut(id.index()).ok_or(GameError::InvalidTarget)?;
        if *slot != EdgeBuilding::Empty {
            return Err(GameError::AlreadyOccupied);
        }
        *slot = EdgeBuilding::Road(player);
        Ok(())
    }

    // ==================== Resource Distribution ====================

    /// Resources owed to each player for a roll, before any bank limit.
    ///
    /// Skips the desert and the robber's tile. Each tile credits every
    /// player in its `buildings` map once, at the yield of their best
    /// building there, so two settlements on one tile still yield one.
    pub fn production(&self, roll: u8, robber_tile: usize) -> BTreeMap<PlayerId, ResourceHand> {
        let mut owed: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();

        for (index, tile) in self.tiles.iter().enumerate() {
            if index == robber_tile || !tile.produces_on(roll) {
                continue;
            }
            let Some(resource) = tile.resource() else {
                continue;
            };
            for (&owner, kind) in &tile.buildings {
                owed.entry(owner).or_default().add(resource, kind.yield_amount());
            }
        }

        owed
    }

    /// Per-tile building maps implied by the intersection table
    fn buildings_from_intersections(&self) -> Vec<BTreeMap<PlayerId, BuildingKind>> {
        let mut derived = vec![BTreeMap::new(); self.tiles.len()];
        for (index, building) in self.intersections.iter().enumerate() {
            let (Some(owner), Some(kind)) = (building.owner(), building.kind()) else {
                continue;
            };
            for &tile in self.topology.tiles_at(IntersectionId(index as u16)) {
                if let Some(map) = derived.get_mut(tile) {
                    let entry = map.entry(owner).or_insert(kind);
                    *entry = (*entry).max(kind);
                }
            }
        }
        derived
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

/// JSON-friendly board representation with sparse occupancy lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardJson {
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub intersections: Vec<VertexJson>,
    #[serde(default)]
    pub paths: Vec<EdgeJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexJson {
    pub id: IntersectionId,
    pub building: VertexBuilding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeJson {
    pub id: PathId,
    pub building: EdgeBuilding,
}

impl From<Board> for BoardJson {
    fn from(board: Board) -> Self {
        BoardJson {
            intersections: board
                .intersections
                .iter()
                .enumerate()
                .filter(|(_, b)| **b != VertexBuilding::Empty)
                .map(|(i, b)| VertexJson {
                    id: IntersectionId(i as u16),
                    building: *b,
                })
                .collect(),
            paths: board
                .paths
                .iter()
                .enumerate()
                .filter(|(_, b)| **b != EdgeBuilding::Empty)
                .map(|(i, b)| EdgeJson {
                    id: PathId(i as u16),
                    building: *b,
                })
                .collect(),
            tiles: board.tiles,
        }
    }
}

impl TryFrom<BoardJson> for Board {
    type Error = SnapshotError;

    fn try_from(json: BoardJson) -> Result<Self, Self::Error> {
        let mut board = Board::from_tiles(json.tiles)?;
        for vertex in json.intersections {
            let slot = board
                .intersections
                .get_mut(vertex.id.index())
                .ok_or(SnapshotError::UnknownIntersection(vertex.id))?;
            *slot = vertex.building;
        }
        for edge in json.paths {
            let slot = board
                .paths
                .get_mut(edge.id.index())
                .ok_or(SnapshotError::UnknownPath(edge.id))?;
            *slot = edge.building;
        }

        // Without an intersection table the tile maps are the only record
        // of who owns what, so they are kept as listed.
        if board.intersections.iter().any(|b| *b != VertexBuilding::Empty) {
            let derived = board.buildings_from_intersections();
            for (index, (tile, buildings)) in board.tiles.iter_mut().zip(derived).enumerate() {
                if !tile.buildings.is_empty() && tile.buildings != buildings {
                    return Err(SnapshotError::TileBuildings(index));
                }
                tile.buildings = buildings;
            }
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Board whose tile `index` is a wheat 8 and every other tile a desert
    fn board_with_wheat_eight(index: usize) -> Board {
        let mut tiles = vec![Tile::desert(); 19];
        tiles[index] = Tile::new_resource(Resource::Wheat, 8);
        Board::from_tiles(tiles).unwrap()
    }

    #[test]
    fn test_standard_board_has_19_tiles() {
        let board = Board::standard();
        assert_eq!(board.tile_count(), 19);
        assert_eq!(board.topology().intersection_count(), 54);
        assert_eq!(board.topology().path_count(), 72);
    }

    #[test]
    fn test_standard_board_has_one_desert_with_seven() {
        let board = Board::standard();
        let deserts: Vec<_> = board.tiles().iter().filter(|t| t.is_desert()).collect();
        assert_eq!(deserts.len(), 1);
        assert_eq!(deserts[0].number, DESERT_NUMBER);
    }

    #[test]
    fn test_standard_board_has_correct_resource_counts() {
        let board = Board::standard();
        for (resource, expected) in [
            (Resource::Wood, 4),
            (Resource::Brick, 3),
            (Resource::Sheep, 4),
            (Resource::Wheat, 4),
            (Resource::Ore, 3),
        ] {
            let count = board
                .tiles()
                .iter()
                .filter(|t| t.resource() == Some(resource))
                .count();
            assert_eq!(count, expected, "wrong count for {:?}", resource);
        }
    }

    #[test]
    fn test_standard_board_has_correct_number_distribution() {
        let board = Board::standard();
        let mut numbers: Vec<u8> = board
            .tiles()
            .iter()
            .filter(|t| !t.is_desert())
            .map(|t| t.number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(
            numbers,
            vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12]
        );
    }

    #[test]
    fn test_seeded_boards_are_reproducible() {
        let a = Board::standard_with_rng(&mut StdRng::seed_from_u64(7));
        let b = Board::standard_with_rng(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.tiles(), b.tiles());
    }

    #[test]
    fn test_from_tiles_rejects_wrong_layout() {
        let result = Board::from_tiles(vec![Tile::desert(); 18]);
        assert!(matches!(
            result,
            Err(SnapshotError::TileCount {
                expected: 19,
                found: 18
            })
        ));
    }

    #[test]
    fn test_occupied_intersection_cannot_be_reused() {
        let mut board = Board::standard();
        let id = IntersectionId(10);

        board
            .occupy_intersection(id, VertexBuilding::Settlement(0))
            .unwrap();
        let result = board.occupy_intersection(id, VertexBuilding::Settlement(1));

        assert_eq!(result, Err(GameError::AlreadyOccupied));
        assert_eq!(board.intersection(id), VertexBuilding::Settlement(0));
    }

    #[test]
    fn test_occupy_unknown_ids() {
        let mut board = Board::standard();
        assert_eq!(
            board.occupy_intersection(IntersectionId(54), VertexBuilding::Settlement(0)),
            Err(GameError::InvalidTarget)
        );
        assert_eq!(
            board.occupy_path(PathId(72), 0),
            Err(GameError::InvalidTarget)
        );
    }

    #[test]
    fn test_occupied_path_cannot_be_reused() {
        let mut board = Board::standard();
        board.occupy_path(PathId(5), 1).unwrap();
        assert_eq!(board.occupy_path(PathId(5), 0), Err(GameError::AlreadyOccupied));
        assert_eq!(board.path(PathId(5)), EdgeBuilding::Road(1));
    }

    #[test]
    fn test_settlement_marks_every_touching_tile() {
        let mut board = Board::standard();
        // Intersection shared by tiles 0, 1 and 4
        let id = board.topology().intersection_at(0, 1).unwrap();
        let touching = board.topology().tiles_at(id).to_vec();
        assert_eq!(touching.len(), 3);

        board
            .occupy_intersection(id, VertexBuilding::Settlement(2))
            .unwrap();

        for tile in touching {
            assert_eq!(
                board.tile(tile).unwrap().buildings.get(&2),
                Some(&BuildingKind::Settlement)
            );
        }
    }

    #[test]
    fn test_settlement_production() {
        let mut board = board_with_wheat_eight(4);
        let id = board.topology().intersection_at(4, 0).unwrap();
        board
            .occupy_intersection(id, VertexBuilding::Settlement(0))
            .unwrap();

        let owed = board.production(8, 0);
        assert_eq!(owed.get(&0), Some(&ResourceHand::single(Resource::Wheat, 1)));
        assert!(board.production(9, 0).is_empty());
    }

    #[test]
    fn test_city_gives_double_resources() {
        let mut board = board_with_wheat_eight(4);
        let id = board.topology().intersection_at(4, 2).unwrap();
        board.occupy_intersection(id, VertexBuilding::City(1)).unwrap();

        let owed = board.production(8, 0);
        assert_eq!(owed.get(&1), Some(&ResourceHand::single(Resource::Wheat, 2)));
    }

    #[test]
    fn test_two_settlements_on_one_tile_credit_once() {
        let mut board = board_with_wheat_eight(4);
        let first = board.topology().intersection_at(4, 0).unwrap();
        let second = board.topology().intersection_at(4, 3).unwrap();
        board
            .occupy_intersection(first, VertexBuilding::Settlement(0))
            .unwrap();
        board
            .occupy_intersection(second, VertexBuilding::Settlement(0))
            .unwrap();

        let owed = board.production(8, 0);
        assert_eq!(owed.get(&0), Some(&ResourceHand::single(Resource::Wheat, 1)));
    }

    #[test]
    fn test_robber_blocks_production() {
        let mut board = board_with_wheat_eight(4);
        let id = board.topology().intersection_at(4, 0).unwrap();
        board
            .occupy_intersection(id, VertexBuilding::Settlement(0))
            .unwrap();

        assert!(board.production(8, 4).is_empty());
    }

    #[test]
    fn test_desert_never_produces() {
        let board = Board::from_tiles(vec![Tile::desert(); 19]).unwrap();
        assert!(!board.tile(0).unwrap().produces_on(DESERT_NUMBER));
        assert!(board.production(DESERT_NUMBER, 18).is_empty());
    }

    #[test]
    fn test_players_adjacent_to_tile() {
        let mut board = Board::standard();
        let a = board.topology().intersection_at(9, 0).unwrap();
        let b = board.topology().intersection_at(9, 3).unwrap();
        board.occupy_intersection(a, VertexBuilding::Settlement(1)).unwrap();
        board.occupy_intersection(b, VertexBuilding::Settlement(3)).unwrap();

        let players: Vec<_> = board.players_adjacent_to_tile(9).into_iter().collect();
        assert_eq!(players, vec![1, 3]);
    }

    #[test]
    fn test_json_round_trip_keeps_occupancy() {
        let mut board = Board::standard();
        board
            .occupy_intersection(IntersectionId(3), VertexBuilding::Settlement(1))
            .unwrap();
        board.occupy_path(PathId(7), 1).unwrap();

        let json = serde_json::to_string(&board).unwrap();
        let loaded: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.tiles(), board.tiles());
        assert_eq!(loaded.intersection(IntersectionId(3)), VertexBuilding::Settlement(1));
        assert_eq!(loaded.path(PathId(7)), EdgeBuilding::Road(1));
        assert_eq!(loaded.free_intersections().count(), 53);
        assert_eq!(loaded.topology(), board.topology());
    }

    #[test]
    fn test_json_rejects_unknown_intersection() {
        let tiles = serde_json::to_value(vec![Tile::desert(); 19]).unwrap();
        let json = serde_json::json!({
            "tiles": tiles,
            "intersections": [{"id": 99, "building": {"settlement": 0}}],
        });
        assert!(serde_json::from_value::<Board>(json).is_err());
    }
}
