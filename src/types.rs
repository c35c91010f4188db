use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRole {
    #[default]
    None,
    Hunted,
    Hunter,
    Comrade,
    Target,
    Detective,
}

impl TaskRole {
    pub fn display_role(self) -> Option<&'static str> {
        match self {
            Self::Target => Some("imposter"),
            Self::Detective => Some("detective"),
            Self::Comrade => Some("comrade"),
            Self::Hunted | Self::Hunter | Self::None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RevealedRole {
    #[serde(rename = "IMPOSTER")]
    Imposter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Lobby,
    Active,
    Voting,
    Revealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Uniform,
    Paired,
    Deduction,
}

impl GameMode {
    pub fn has_voting(self) -> bool {
        self == Self::Deduction
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub alive: bool,
    pub connected: bool,
    pub task: Option<String>,
    pub task_role: TaskRole,
    pub is_imposter: bool,
    pub was_actual_imposter: bool,
    pub revealed_role: Option<RevealedRole>,
}

impl Player {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            alive: true,
            connected: false,
            task: None,
            task_role: TaskRole::None,
            is_imposter: false,
            was_actual_imposter: false,
            revealed_role: None,
        }
    }

    pub fn snapshot(&self, admin_view: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            alive: self.alive,
            connected: self.connected,
            has_task: self.task.is_some(),
            revealed_role: self.revealed_role,
            task_type: admin_view.then_some(self.task_role),
            is_imposter: admin_view.then_some(self.is_imposter),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub alive: bool,
    pub connected: bool,
    pub has_task: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_role: Option<RevealedRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_imposter: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspicionEntry {
    pub id: String,
    pub name: String,
    pub raw_vote_count: u32,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCount {
    pub id: String,
    pub count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationResults {
    pub per_target_counts: Vec<TargetCount>,
    pub max_count: u32,
    pub tied_top_targets: Vec<String>,
}
