use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, RngCore};

use crate::catalog::TaskCatalog;
use crate::constants::{PAIRED_MIN_PLAYERS, SINGLE_IMPOSTER_MIN_PLAYERS, UNIFORM_MIN_PLAYERS};
use crate::types::{GameMode, TaskRole};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub player_id: String,
    pub task: String,
    pub role: TaskRole,
    pub is_imposter: bool,
}

impl Assignment {
    fn new(player_id: &str, task: &str, role: TaskRole) -> Self {
        Self {
            player_id: player_id.to_string(),
            task: task.to_string(),
            role,
            is_imposter: role == TaskRole::Target,
        }
    }
}

/// A policy for handing out tasks to the living players of a round.
pub trait AssignmentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn min_players(&self) -> usize;

    fn starts_new_vote_round(&self) -> bool {
        false
    }

    fn assign(
        &self,
        living: &[String],
        catalog: &TaskCatalog,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<Assignment>>;
}

pub fn strategy_for(mode: GameMode) -> Box<dyn AssignmentStrategy> {
    match mode {
        GameMode::Uniform => Box::new(UniformStrategy),
        GameMode::Paired => Box::new(PairedStrategy),
        GameMode::Deduction => Box::new(SingleImposterStrategy),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UniformStrategy;

impl AssignmentStrategy for UniformStrategy {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn min_players(&self) -> usize {
        UNIFORM_MIN_PLAYERS
    }

    fn assign(
        &self,
        living: &[String],
        catalog: &TaskCatalog,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<Assignment>> {
        if living.len() < self.min_players() || catalog.single_tasks().is_empty() {
            return None;
        }
        let tasks = catalog.single_tasks();
        Some(
            living
                .iter()
                .map(|id| {
                    let task = tasks[rng.random_range(0..tasks.len())];
                    Assignment::new(id, task, TaskRole::None)
                })
                .collect(),
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PairedStrategy;

impl AssignmentStrategy for PairedStrategy {
    fn name(&self) -> &'static str {
        "paired"
    }

    fn min_players(&self) -> usize {
        PAIRED_MIN_PLAYERS
    }

    fn assign(
        &self,
        living: &[String],
        catalog: &TaskCatalog,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<Assignment>> {
        let pairs = catalog.pairs();
        if living.len() < self.min_players() || pairs.is_empty() {
            return None;
        }

        let mut shuffled = living.to_vec();
        shuffled.shuffle(rng);

        let mut assignments = Vec::with_capacity(shuffled.len());
        let mut chunks = shuffled.chunks_exact(2);
        for (pair_index, chunk) in chunks.by_ref().enumerate() {
            let pair = pairs[pair_index % pairs.len()];
            assignments.push(Assignment::new(&chunk[0], pair.hunted, TaskRole::Hunted));
            assignments.push(Assignment::new(&chunk[1], pair.hunter, TaskRole::Hunter));
        }
        if let [leftover] = chunks.remainder() {
            let pair = pairs.choose(rng)?;
            assignments.push(Assignment::new(leftover, pair.hunted, TaskRole::Hunted));
        }
        Some(assignments)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SingleImposterStrategy;

impl AssignmentStrategy for SingleImposterStrategy {
    fn name(&self) -> &'static str {
        "single-imposter"
    }

    fn min_players(&self) -> usize {
        SINGLE_IMPOSTER_MIN_PLAYERS
    }

    fn starts_new_vote_round(&self) -> bool {
        true
    }

    fn assign(
        &self,
        living: &[String],
        catalog: &TaskCatalog,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<Assignment>> {
        if living.len() < self.min_players() {
            return None;
        }
        let pair = *catalog.pairs().choose(rng)?;

        let mut shuffled = living.to_vec();
        shuffled.shuffle(rng);

        let assignments = shuffled
            .iter()
            .enumerate()
            .map(|(index, id)| match index {
                0 => Assignment::new(id, pair.hunted, TaskRole::Target),
                1 => Assignment::new(id, pair.hunter, TaskRole::Detective),
                _ => Assignment::new(id, catalog.comrade_task(), TaskRole::Comrade),
            })
            .collect();
        Some(assignments)
    }
}
