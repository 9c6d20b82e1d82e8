//! Development card deck, purchases and knight play.

use crate::game::GameError;
use crate::ledger::Bank;
use crate::player::{costs, Player};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentCard {
    /// Moves the robber
    Knight,
    /// Worth 1 VP as soon as it is drawn
    VictoryPoint,
    RoadBuilding,
    YearOfPlenty,
    Monopoly,
}

impl DevelopmentCard {
    /// Cards and copies in the standard deck (25 total)
    pub const DISTRIBUTION: [(DevelopmentCard, usize); 5] = [
        (DevelopmentCard::Knight, 14),
        (DevelopmentCard::VictoryPoint, 5),
        (DevelopmentCard::RoadBuilding, 2),
        (DevelopmentCard::YearOfPlenty, 2),
        (DevelopmentCard::Monopoly, 2),
    ];

    /// Unshuffled standard deck
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let mut deck = Vec::with_capacity(25);
        for (card, count) in Self::DISTRIBUTION {
            deck.extend(std::iter::repeat(card).take(count));
        }
        deck
    }
}

/// The draw pile. The last card is the top of the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevCardPile {
    cards: Vec<DevelopmentCard>,
}

impl DevCardPile {
    /// Pile in the exact order given (last card drawn first)
    pub fn from_cards(cards: Vec<DevelopmentCard>) -> Self {
        Self { cards }
    }

    /// Standard deck, shuffled once
    pub fn shuffled() -> Self {
        Self::shuffled_with_rng(&mut rand::thread_rng())
    }

    pub fn shuffled_with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = DevelopmentCard::standard_deck();
        cards.shuffle(rng);
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card that the next purchase would draw
    pub fn peek(&self) -> Option<DevelopmentCard> {
        self.cards.last().copied()
    }

    pub fn cards(&self) -> &[DevelopmentCard] {
        &self.cards
    }

    /// Sell the top card to `player`.
    ///
    /// A drawn victory point card scores immediately and stays in the hand
    /// as a record; it is never played.
    pub fn buy(&mut self, bank: &mut Bank, player: &mut Player) -> Result<DevelopmentCard, GameError> {
        let cost = costs::development_card();
        if !player.can_afford(&cost) {
            return Err(GameError::InsufficientResources);
        }
        let Some(card) = self.peek() else {
            return Err(GameError::EmptyDrawPile);
        };

        bank.spend(player, &cost)?;
        self.cards.pop();
        player.dev_cards.push(card);
        if card == DevelopmentCard::VictoryPoint {
            player.victory_points += 1;
        }
        Ok(card)
    }
}

/// Spend one knight from `player`'s hand. Moving the robber is up to the caller.
pub fn play_knight(player: &mut Player) -> Result<(), GameError> {
    if !player.take_dev_card(DevelopmentCard::Knight) {
        return Err(GameError::MissingCard);
    }
    player.played_knights += 1;
    Ok(())
}
