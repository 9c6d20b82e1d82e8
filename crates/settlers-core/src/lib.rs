//! Settlers - a hex-board resource game engine
//!
//! This crate provides the core game logic, including:
//! - Board topology derived from a row/column hex layout
//! - Board representation with tiles, intersections, and paths
//! - A finite bank and the resource ledger
//! - Development card economy
//! - Game state machine with phase enforcement
//!
//! # Architecture
//!
//! The engine is synchronous and single-writer: one caller at a time issues
//! actions, and every rejected action leaves the state untouched. It can be
//! compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for a browser renderer (feature `wasm`)
//!
//! # Modules
//!
//! - [`topology`]: Canonical intersection and path ids for a tile layout
//! - [`board`]: Tiles, occupancy and production lookup
//! - [`ledger`]: Bank and resource transfers
//! - [`dev_cards`]: Development card pile and knight play
//! - [`game`]: Game state machine
//! - [`bot`]: Automated players

pub mod actions;
pub mod board;
pub mod bot;
pub mod dev_cards;
pub mod game;
pub mod ledger;
pub mod player;
pub mod topology;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{Board, BoardJson, BuildingKind, EdgeBuilding, EdgeJson, PlayerId, Resource, Tile, TileType, VertexBuilding, VertexJson};
pub use bot::{Bot, BotDifficulty};
pub use dev_cards::{DevCardPile, DevelopmentCard};
pub use game::{GameConfig, GameError, GamePhase, GameState, RollOutcome, SetupPlacing, SnapshotError, Status};
pub use ledger::{Bank, Production};
pub use player::{costs, Player, ResourceHand};
pub use topology::{IntersectionId, PathId, Topology};
