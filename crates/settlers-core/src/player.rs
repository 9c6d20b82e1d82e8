//! Player state and resource hands.
//!
//! This module contains:
//! - ResourceHand for counting the five producible resources
//! - Player struct with holdings, piece counters and development cards
//! - Building costs

use crate::board::{PlayerId, Resource};
use crate::dev_cards::DevelopmentCard;
use crate::game::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A count of each producible resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Same amount of every resource
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Wood => self.wood = count,
            Resource::Brick => self.brick = count,
            Resource::Sheep => self.sheep = count,
            Resource::Wheat => self.wheat = count,
            Resource::Ore => self.ore = count,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Check if this hand covers a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        cost.iter().all(|(resource, amount)| self.get(resource) >= amount)
    }

    /// Subtract a cost, leaving the hand untouched when it does not cover it
    pub fn subtract(&mut self, cost: &ResourceHand) -> Result<(), GameError> {
        if !self.can_afford(cost) {
            return Err(GameError::InsufficientResources);
        }
        for (resource, amount) in cost.iter() {
            self.set(resource, self.get(resource) - amount);
        }
        Ok(())
    }

    /// Iterate over (resource, count) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }
}

impl fmt::Display for ResourceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(resource, count)| format!("{}:{}", resource.name(), count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to buy a development card: 1 sheep, 1 wheat, 1 ore
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat index in the match
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Seat is driven by an automated policy. Only callers read this;
    /// the engine treats every seat the same.
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub resources: ResourceHand,
    #[serde(default)]
    pub roads: u32,
    #[serde(default)]
    pub settlements: u32,
    #[serde(default)]
    pub cities: u32,
    #[serde(default)]
    pub victory_points: u32,
    /// Development cards held (victory point cards stay here once banked)
    #[serde(default)]
    pub dev_cards: Vec<DevelopmentCard>,
    /// Number of knights played
    #[serde(default)]
    pub played_knights: u32,
}

impl Player {
    /// Create a new human-driven player
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_ai: false,
            resources: ResourceHand::new(),
            roads: 0,
            settlements: 0,
            cities: 0,
            victory_points: 0,
            dev_cards: Vec::new(),
            played_knights: 0,
        }
    }

    /// Create a new player seat flagged for an automated policy
    pub fn new_ai(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            is_ai: true,
            ..Self::new(id, name)
        }
    }

    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        self.resources.can_afford(cost)
    }

    /// Check if player holds a card of the given kind
    pub fn has_dev_card(&self, card: DevelopmentCard) -> bool {
        self.dev_cards.contains(&card)
    }

    /// Count held cards of the given kind
    pub fn dev_card_count(&self, card: DevelopmentCard) -> usize {
        self.dev_cards.iter().filter(|c| **c == card).count()
    }

    /// Remove one card of the given kind, returning false if none is held
    pub fn take_dev_card(&mut self, card: DevelopmentCard) -> bool {
        if let Some(pos) = self.dev_cards.iter().position(|c| *c == card) {
            self.dev_cards.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resource_hand_total() {
        let hand = ResourceHand::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
    }

    #[test]
    fn test_resource_hand_can_afford() {
        let hand = ResourceHand::uniform(2);
        assert!(hand.can_afford(&ResourceHand::uniform(1)));
        assert!(!hand.can_afford(&ResourceHand::single(Resource::Ore, 3)));
    }

    #[test]
    fn test_resource_hand_subtract() {
        let mut hand = ResourceHand::uniform(3);
        hand.subtract(&ResourceHand::uniform(1)).unwrap();
        assert_eq!(hand, ResourceHand::uniform(2));
    }

    #[test]
    fn test_failed_subtract_leaves_hand_untouched() {
        let mut hand = ResourceHand::with_amounts(5, 0, 0, 0, 0);
        let result = hand.subtract(&costs::road());
        assert_eq!(result, Err(GameError::InsufficientResources));
        assert_eq!(hand, ResourceHand::with_amounts(5, 0, 0, 0, 0));
    }

    #[test]
    fn test_building_costs() {
        assert_eq!(costs::road(), ResourceHand::with_amounts(1, 1, 0, 0, 0));
        assert_eq!(costs::development_card().total(), 3);
        assert_eq!(costs::development_card().get(Resource::Wood), 0);
    }

    #[test]
    fn test_hand_display() {
        let hand = ResourceHand::with_amounts(1, 0, 2, 0, 3);
        assert_eq!(hand.to_string(), "wood:1, brick:0, sheep:2, wheat:0, ore:3");
    }

    #[test]
    fn test_take_dev_card() {
        let mut player = Player::new(0, "Test");
        player.dev_cards = vec![DevelopmentCard::Knight, DevelopmentCard::Monopoly];

        assert!(player.take_dev_card(DevelopmentCard::Knight));
        assert!(!player.take_dev_card(DevelopmentCard::Knight));
        assert_eq!(player.dev_cards, vec![DevelopmentCard::Monopoly]);
    }

    #[test]
    fn test_missing_counters_default_on_load() {
        let player: Player = serde_json::from_str(r#"{"id": 2, "name": "AI 1"}"#).unwrap();
        assert_eq!(player.id, 2);
        assert!(!player.is_ai);
        assert!(player.resources.is_empty());
        assert_eq!(player.victory_points, 0);
    }

    #[test]
    fn test_new_ai_seat() {
        let player = Player::new_ai(3, "AI 2");
        assert!(player.is_ai);
        assert_eq!(player.name, "AI 2");
    }
}
