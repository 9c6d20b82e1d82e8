//! Game actions that players can take.
//!
//! This module defines every action on the public surface and the events
//! that result from those actions.

use crate::board::PlayerId;
use crate::dev_cards::DevelopmentCard;
use crate::ledger::Production;
use crate::topology::{IntersectionId, PathId};
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Setup Phase ====================
    /// Place a free settlement during setup
    PlaceSetupSettlement(IntersectionId),
    /// Place a free road during setup
    PlaceSetupRoad(PathId),

    // ==================== Turn Actions ====================
    /// Roll the dice (once per turn)
    Roll,
    /// Relocate the robber after a 7
    MoveRobber(usize),
    /// Build a road for 1 wood and 1 brick
    BuildRoad,
    /// Buy a development card for 1 sheep, 1 wheat and 1 ore
    BuyDevelopmentCard,
    /// Play a knight, moving the robber to the given tile
    PlayKnight(usize),

    // ==================== Turn Management ====================
    /// End your turn
    EndTurn,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Dice were rolled
    DiceRolled {
        player: PlayerId,
        roll: (u8, u8),
        total: u8,
    },

    /// Resources were paid out after a roll
    ResourcesProduced { production: Production },

    /// A setup settlement was placed
    SettlementPlaced {
        player: PlayerId,
        intersection: IntersectionId,
    },

    /// A road was placed (setup roads carry their path)
    RoadBuilt {
        player: PlayerId,
        path: Option<PathId>,
    },

    /// The setup draft finished; regular turns begin
    SetupCompleted,

    /// A development card was bought
    DevelopmentCardPurchased {
        player: PlayerId,
        card: DevelopmentCard,
    },

    /// A knight was played
    KnightPlayed { player: PlayerId, tile: usize },

    /// The robber moved to a new tile
    RobberMoved { player: PlayerId, tile: usize },

    /// Control passed to the next player
    TurnEnded { player: PlayerId, next: PlayerId },
}
