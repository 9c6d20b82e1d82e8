//! WebAssembly bindings for the settlers engine.
//!
//! This module exposes the game engine to a JavaScript renderer through
//! wasm-bindgen. Everything crosses the boundary as JSON.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::bot::{Bot, BotDifficulty};
use crate::game::{GameConfig, GameState};
use crate::player::Player;
use serde::Deserialize;

/// One seat as sent by the browser
#[derive(Deserialize)]
struct Seat {
    name: String,
    #[serde(default)]
    is_ai: bool,
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON array of seats: `[{"name": "Ana", "is_ai": false}, ...]`
    #[wasm_bindgen(constructor)]
    pub fn new(seats_json: &str) -> Result<WasmGame, JsValue> {
        let seats: Vec<Seat> = serde_json::from_str(seats_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid seats: {}", e)))?;
        if seats.is_empty() {
            return Err(JsValue::from_str("At least one seat is required"));
        }

        let players = seats
            .into_iter()
            .enumerate()
            .map(|(i, seat)| {
                let id = i as u8;
                if seat.is_ai {
                    Player::new_ai(id, seat.name)
                } else {
                    Player::new(id, seat.name)
                }
            })
            .collect();

        Ok(WasmGame {
            state: GameState::new(players, GameConfig::default()),
        })
    }

    /// Restore a game from a saved snapshot
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(json: &str) -> Result<WasmGame, JsValue> {
        GameState::from_json(json)
            .map(|state| WasmGame { state })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current player ID
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.state.current_player
    }

    /// Get valid actions for the current player as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self) -> String {
        serde_json::to_string(&self.state.valid_actions()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or the error kind
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.state.apply_action(action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(
                &serde_json::to_string(&e).unwrap_or_else(|_| e.to_string()),
            )),
        }
    }

    /// One-line status: phase, current player, their score and resources
    #[wasm_bindgen(js_name = status)]
    pub fn status(&self) -> String {
        self.state.status().to_string()
    }

    /// Winner by score, if anyone has reached it
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.state.winner()
    }

    /// Get the last dice roll (if any)
    #[wasm_bindgen(js_name = getDiceRoll)]
    pub fn get_dice_roll(&self) -> Option<Vec<u8>> {
        self.state.last_roll.map(|(a, b)| vec![a, b])
    }

    /// Board topology as JSON: corner and side ids per tile, for rendering
    #[wasm_bindgen(js_name = getTopology)]
    pub fn get_topology(&self) -> String {
        serde_json::to_string(self.state.board.topology()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Let a bot play the current seat until control passes on.
    /// difficulty: "easy" or "medium"
    #[wasm_bindgen(js_name = playBotTurn)]
    pub fn play_bot_turn(&mut self, difficulty: &str) -> Result<String, JsValue> {
        let difficulty = difficulty.parse::<BotDifficulty>().unwrap_or_default();
        let mut bot = Bot::new(self.state.current_player, difficulty);
        bot.take_turn(&mut self.state)
            .map(|events| serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
