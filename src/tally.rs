use std::collections::HashMap;

use crate::registry::PlayerRegistry;
use crate::types::{EliminationResults, SuspicionEntry, TargetCount};

#[derive(Debug, Default)]
pub struct VoteTally {
    votes: HashMap<String, String>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast_vote(&mut self, registry: &PlayerRegistry, voter_id: &str, target_id: &str) -> bool {
        let Some(voter) = registry.get(voter_id) else {
            return false;
        };
        if !voter.alive || registry.channel_of(voter_id).is_none() {
            return false;
        }
        self.votes
            .insert(voter_id.to_string(), target_id.to_string());
        true
    }

    pub fn vote_of(&self, voter_id: &str) -> Option<&str> {
        self.votes.get(voter_id).map(String::as_str)
    }

    pub fn remove_voter(&mut self, voter_id: &str) -> Option<String> {
        self.votes.remove(voter_id)
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    fn counts(&self) -> HashMap<&str, u32> {
        let mut counts = HashMap::new();
        for target in self.votes.values() {
            *counts.entry(target.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn suspicion_snapshot(&self, registry: &PlayerRegistry) -> Vec<SuspicionEntry> {
        let counts = self.counts();
        let mut entries: Vec<SuspicionEntry> = registry
            .iter()
            .filter(|player| player.alive)
            .map(|player| {
                let raw_vote_count = counts.get(player.id.as_str()).copied().unwrap_or(0);
                SuspicionEntry {
                    id: player.id.clone(),
                    name: player.name.clone(),
                    raw_vote_count,
                    score: raw_vote_count * raw_vote_count,
                }
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    pub fn results_for_elimination(&self, registry: &PlayerRegistry) -> EliminationResults {
        let counts = self.counts();
        let per_target_counts: Vec<TargetCount> = registry
            .iter()
            .filter(|player| player.alive)
            .filter_map(|player| {
                let count = counts.get(player.id.as_str()).copied()?;
                Some(TargetCount {
                    id: player.id.clone(),
                    count,
                })
            })
            .collect();
        let max_count = per_target_counts
            .iter()
            .map(|entry| entry.count)
            .max()
            .unwrap_or(0);
        let tied_top_targets = per_target_counts
            .iter()
            .filter(|entry| max_count > 0 && entry.count == max_count)
            .map(|entry| entry.id.clone())
            .collect();
        EliminationResults {
            per_target_counts,
            max_count,
            tied_top_targets,
        }
    }
}
