use std::collections::HashMap;

use rand::Rng;

use crate::constants::{PLAYER_ID_ALPHABET, PLAYER_ID_LEN};
use crate::types::{Player, PlayerSnapshot, TaskRole};

#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
    join_order: Vec<String>,
    channel_by_player: HashMap<String, String>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<R: Rng + ?Sized>(&mut self, name: &str, rng: &mut R) -> String {
        self.create_with(name, || make_player_id(&mut *rng))
    }

    pub fn create_with(&mut self, name: &str, mut next_id: impl FnMut() -> String) -> String {
        let id = loop {
            let candidate = next_id();
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
            log::debug!("player id collision on {candidate}, resampling");
        };
        self.players
            .insert(id.clone(), Player::new(id.clone(), name.to_string()));
        self.join_order.push(id.clone());
        id
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn bind_channel(&mut self, id: &str, connection_id: &str) -> Option<String> {
        let player = self.players.get_mut(id)?;
        player.connected = true;
        let previous = self
            .channel_by_player
            .insert(id.to_string(), connection_id.to_string());
        previous.filter(|old| old != connection_id)
    }

    /// Clears the binding only when `connection_id` is still the current one,
    /// so a late disconnect from a superseded connection is a no-op.
    pub fn unbind_channel(&mut self, id: &str, connection_id: &str) -> bool {
        if self.channel_by_player.get(id).map(String::as_str) != Some(connection_id) {
            return false;
        }
        self.channel_by_player.remove(id);
        if let Some(player) = self.players.get_mut(id) {
            player.connected = false;
        }
        true
    }

    pub fn channel_of(&self, id: &str) -> Option<&str> {
        self.channel_by_player.get(id).map(String::as_str)
    }

    pub fn reset_roles(&mut self) {
        for player in self.players.values_mut() {
            player.task_role = TaskRole::None;
            player.is_imposter = false;
        }
    }

    pub fn set_alive(&mut self, id: &str, alive: bool) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.alive = alive;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> + '_ {
        self.join_order
            .iter()
            .filter_map(|id| self.players.get(id))
    }

    pub fn living_ids(&self) -> Vec<String> {
        self.iter()
            .filter(|player| player.alive)
            .map(|player| player.id.clone())
            .collect()
    }

    pub fn list(&self, admin_view: bool) -> Vec<PlayerSnapshot> {
        self.iter().map(|player| player.snapshot(admin_view)).collect()
    }

    pub fn len(&self) -> usize {
        self.join_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_order.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.join_order.clear();
        self.channel_by_player.clear();
    }
}

pub fn make_player_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PLAYER_ID_LEN)
        .map(|_| char::from(PLAYER_ID_ALPHABET[rng.random_range(0..PLAYER_ID_ALPHABET.len())]))
        .collect()
}
