use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{
    EliminationResults, PlayerSnapshot, RevealedRole, SessionPhase, SuspicionEntry, TaskRole,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCommand {
    Register { player_id: String },
    RegisterAdmin,
    StartGame,
    AssignRoles,
    CastVote { target_id: String },
    ForceVoting,
    RevealResults { message: Option<String> },
    KillPlayer { player_id: String },
    ResetGame,
    BroadcastMessage { text: String },
    SendTask { player_id: String, task: String },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::RegisterAdmin => "registerAdmin",
            Self::StartGame => "startGame",
            Self::AssignRoles => "assignRoles",
            Self::CastVote { .. } => "castVote",
            Self::ForceVoting => "forceVoting",
            Self::RevealResults { .. } => "revealResults",
            Self::KillPlayer { .. } => "killPlayer",
            Self::ResetGame => "resetGame",
            Self::BroadcastMessage { .. } => "broadcastMessage",
            Self::SendTask { .. } => "sendTask",
        }
    }

    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Self::Register { .. } | Self::RegisterAdmin | Self::CastVote { .. }
        )
    }
}

pub fn parse_client_message(raw: &str) -> Option<ClientCommand> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "register" => Some(ClientCommand::Register {
            player_id: required_string(object, &["playerId", "playerID"])?,
        }),
        "registerAdmin" => Some(ClientCommand::RegisterAdmin),
        "startGame" => Some(ClientCommand::StartGame),
        "assignRoles" | "assignRandomTasks" => Some(ClientCommand::AssignRoles),
        "castVote" => Some(ClientCommand::CastVote {
            target_id: required_string(object, &["targetId", "targetID"])?,
        }),
        "forceVoting" => Some(ClientCommand::ForceVoting),
        "revealResults" => Some(ClientCommand::RevealResults {
            message: optional_string(object, "message")?.filter(|text| !text.trim().is_empty()),
        }),
        "killPlayer" => Some(ClientCommand::KillPlayer {
            player_id: required_string(object, &["playerId", "playerID"])?,
        }),
        "resetGame" => Some(ClientCommand::ResetGame),
        "broadcastMessage" => Some(ClientCommand::BroadcastMessage {
            text: required_string(object, &["message"])?,
        }),
        "sendTask" => Some(ClientCommand::SendTask {
            player_id: required_string(object, &["playerId", "playerID"])?,
            task: required_string(object, &["task"])?,
        }),
        _ => None,
    }
}

fn required_string(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let value = keys.iter().find_map(|key| object.get(*key))?;
    Some(value.as_str()?.to_string())
}

fn optional_string(object: &Map<String, Value>, key: &str) -> Option<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(value) => Some(Some(value.as_str()?.to_string())),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Raw(String),
    Detailed {
        task: String,
        #[serde(rename = "type")]
        kind: TaskRole,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<&'static str>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_role: Option<RevealedRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_actual_imposter: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    PlayerInfo {
        name: String,
    },
    NewTask(TaskPayload),
    PlayerListUpdate(Vec<PlayerSnapshot>),
    SuspicionUpdate(Vec<SuspicionEntry>),
    VoteConfirmed {
        target: String,
        #[serde(rename = "targetID")]
        target_id: String,
    },
    SystemMessage(String),
    Dead(DeadPayload),
    GameReset,
    PhaseUpdate(SessionPhase),
    VoteResults(EliminationResults),
}
