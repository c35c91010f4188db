use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::assignment::{strategy_for, AssignmentStrategy};
use crate::catalog::TaskCatalog;
use crate::constants::{
    ASSIGNED_NOTICE, DEFAULT_REVEAL_NOTICE, ELIMINATED_NOTICE, RESET_NOTICE, START_NOTICE,
    SUPERSEDED_CLOSE_CODE, VOTING_NOTICE,
};
use crate::error::JoinError;
use crate::fanout::{ClientRole, Fanout, OutboundMessage};
use crate::protocol::{parse_client_message, ClientCommand, DeadPayload, ServerMessage, TaskPayload};
use crate::registry::PlayerRegistry;
use crate::tally::VoteTally;
use crate::types::{
    EliminationResults, GameMode, Player, PlayerSnapshot, RevealedRole, SessionPhase, TaskRole,
};

#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub mode: GameMode,
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: GameMode::Deduction,
            seed: None,
        }
    }
}

pub struct GameSession {
    mode: GameMode,
    strategy: Box<dyn AssignmentStrategy>,
    catalog: TaskCatalog,
    rng: StdRng,
    registry: PlayerRegistry,
    tally: VoteTally,
    phase: SessionPhase,
    fanout: Fanout,
}

impl GameSession {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_catalog(options, TaskCatalog::builtin())
    }

    pub fn with_catalog(options: SessionOptions, catalog: TaskCatalog) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            mode: options.mode,
            strategy: strategy_for(options.mode),
            catalog,
            rng,
            registry: PlayerRegistry::new(),
            tally: VoteTally::new(),
            phase: SessionPhase::Lobby,
            fanout: Fanout::new(),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.registry.get(player_id)
    }

    pub fn roster(&self, admin_view: bool) -> Vec<PlayerSnapshot> {
        self.registry.list(admin_view)
    }

    pub fn elimination_results(&self) -> EliminationResults {
        self.tally.results_for_elimination(&self.registry)
    }

    pub fn join(&mut self, name: &str) -> Result<String, JoinError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JoinError::NameRequired);
        }
        let player_id = self.registry.create(name, &mut self.rng);
        log::info!("new player joined: {name} ({player_id})");
        self.broadcast_roster();
        Ok(player_id)
    }

    pub fn connect(&mut self, connection_id: &str, tx: mpsc::Sender<OutboundMessage>) {
        self.fanout.attach(connection_id, tx);
        log::debug!("client connected: {connection_id}");
    }

    pub fn disconnect(&mut self, connection_id: &str) {
        log::debug!("client disconnected: {connection_id}");
        let Some(ClientRole::Player(player_id)) = self.fanout.detach(connection_id) else {
            return;
        };
        if self.registry.unbind_channel(&player_id, connection_id) {
            self.broadcast_roster();
        }
    }

    pub fn handle_raw(&mut self, connection_id: &str, raw: &str) {
        match parse_client_message(raw) {
            Some(command) => self.handle_command(connection_id, command),
            None => log::debug!("ignoring malformed message from {connection_id}"),
        }
    }

    pub fn handle_command(&mut self, connection_id: &str, command: ClientCommand) {
        if command.requires_admin() && !self.fanout.is_admin(connection_id) {
            log::debug!(
                "dropping {} from non-admin connection {connection_id}",
                command.name()
            );
            return;
        }

        match command {
            ClientCommand::Register { player_id } => self.register(connection_id, &player_id),
            ClientCommand::RegisterAdmin => self.register_admin(connection_id),
            ClientCommand::StartGame => self.start_game(),
            ClientCommand::AssignRoles => self.assign_roles(),
            ClientCommand::CastVote { target_id } => self.cast_vote(connection_id, &target_id),
            ClientCommand::ForceVoting => self.force_voting(),
            ClientCommand::RevealResults { message } => self.reveal_results(message.as_deref()),
            ClientCommand::KillPlayer { player_id } => self.kill_player(&player_id),
            ClientCommand::ResetGame => self.reset_game(),
            ClientCommand::BroadcastMessage { text } => self.system_message(&text),
            ClientCommand::SendTask { player_id, task } => self.send_task(&player_id, &task),
        }
    }

    fn register(&mut self, connection_id: &str, player_id: &str) {
        if !self.registry.contains(player_id) {
            log::debug!("register for unknown player {player_id} from {connection_id}");
            return;
        }

        match self.fanout.role_of(connection_id) {
            Some(ClientRole::Player(previous)) if previous != player_id => {
                let previous = previous.clone();
                self.registry.unbind_channel(&previous, connection_id);
            }
            Some(_) => {}
            None => return,
        }

        if let Some(superseded) = self.registry.bind_channel(player_id, connection_id) {
            self.fanout.set_role(&superseded, ClientRole::Unbound);
            self.fanout.close(
                &superseded,
                SUPERSEDED_CLOSE_CODE,
                "superseded by new connection",
            );
        }
        self.fanout
            .set_role(connection_id, ClientRole::Player(player_id.to_string()));

        let Some(player) = self.registry.get(player_id) else {
            return;
        };
        log::info!(
            "player {} ({player_id}) registered with connection {connection_id}",
            player.name
        );
        self.fanout.send_to(
            connection_id,
            &ServerMessage::PlayerInfo {
                name: player.name.clone(),
            },
        );
        if let Some(payload) = task_payload(player) {
            self.fanout
                .send_to(connection_id, &ServerMessage::NewTask(payload));
        }
        if !player.alive {
            self.fanout
                .send_to(connection_id, &ServerMessage::Dead(self.dead_payload(player)));
        }
        self.broadcast_roster();
    }

    fn register_admin(&mut self, connection_id: &str) {
        if let Some(ClientRole::Player(player_id)) =
            self.fanout.set_role(connection_id, ClientRole::Admin)
        {
            if self.registry.unbind_channel(&player_id, connection_id) {
                self.broadcast_roster();
            }
        }
        log::info!("admin connected on {connection_id}");

        self.fanout.send_to(
            connection_id,
            &ServerMessage::PlayerListUpdate(self.registry.list(true)),
        );
        self.fanout
            .send_to(connection_id, &ServerMessage::PhaseUpdate(self.phase));
        if self.mode.has_voting() {
            self.fanout.send_to(
                connection_id,
                &ServerMessage::SuspicionUpdate(self.tally.suspicion_snapshot(&self.registry)),
            );
        }
    }

    fn start_game(&mut self) {
        log::info!("game started");
        self.set_phase(SessionPhase::Active);
        self.system_message(START_NOTICE);
    }

    fn assign_roles(&mut self) {
        let living = self.registry.living_ids();
        let Some(assignments) = self
            .strategy
            .assign(&living, &self.catalog, &mut self.rng)
        else {
            log::warn!(
                "not enough players for {} assignment (need at least {}, have {})",
                self.strategy.name(),
                self.strategy.min_players(),
                living.len()
            );
            return;
        };

        if self.strategy.starts_new_vote_round() {
            self.tally.clear();
        }
        self.registry.reset_roles();

        for assignment in &assignments {
            let Some(player) = self.registry.get_mut(&assignment.player_id) else {
                continue;
            };
            player.task = Some(assignment.task.clone());
            player.task_role = assignment.role;
            player.is_imposter = assignment.is_imposter;

            let Some(connection_id) = self.registry.channel_of(&assignment.player_id) else {
                continue;
            };
            if let Some(player) = self.registry.get(&assignment.player_id) {
                if let Some(payload) = task_payload(player) {
                    self.fanout
                        .send_to(connection_id, &ServerMessage::NewTask(payload));
                }
            }
        }
        log::info!(
            "{} tasks assigned to {} players",
            self.strategy.name(),
            assignments.len()
        );

        self.system_message(ASSIGNED_NOTICE);
        self.broadcast_roster();
        self.broadcast_suspicion();
    }

    fn cast_vote(&mut self, connection_id: &str, target_id: &str) {
        if !self.mode.has_voting() {
            log::debug!("castVote ignored: {:?} mode has no voting", self.mode);
            return;
        }
        let Some(ClientRole::Player(voter_id)) = self.fanout.role_of(connection_id).cloned() else {
            log::debug!("castVote from unregistered connection {connection_id}");
            return;
        };
        if !self.tally.cast_vote(&self.registry, &voter_id, target_id) {
            log::debug!("vote from {voter_id} rejected");
            return;
        }

        let target = self
            .registry
            .get(target_id)
            .map(|player| player.name.clone())
            .unwrap_or_else(|| target_id.to_string());
        log::info!("{voter_id} voted for {target_id}");
        self.fanout.send_to(
            connection_id,
            &ServerMessage::VoteConfirmed {
                target,
                target_id: target_id.to_string(),
            },
        );
        self.broadcast_suspicion();
    }

    fn force_voting(&mut self) {
        log::info!("voting phase started");
        self.set_phase(SessionPhase::Voting);
        self.system_message(VOTING_NOTICE);
    }

    fn reveal_results(&mut self, message: Option<&str>) {
        log::info!("voting results revealed");
        self.set_phase(SessionPhase::Revealed);
        self.system_message(message.unwrap_or(DEFAULT_REVEAL_NOTICE));
        if self.mode.has_voting() {
            self.fanout
                .send_to_admins(&ServerMessage::VoteResults(self.elimination_results()));
        }
    }

    fn kill_player(&mut self, player_id: &str) {
        let reveal = self.mode.has_voting();
        match self.registry.get(player_id) {
            None => {
                log::debug!("killPlayer for unknown player {player_id}");
                return;
            }
            Some(player) if !player.alive => {
                log::debug!("killPlayer for already eliminated player {player_id}");
                return;
            }
            Some(_) => {}
        }
        self.registry.set_alive(player_id, false);
        if let Some(player) = self.registry.get_mut(player_id) {
            player.was_actual_imposter = player.is_imposter;
            if reveal {
                player.revealed_role = Some(RevealedRole::Imposter);
            }
        }
        self.tally.remove_voter(player_id);

        if let Some(player) = self.registry.get(player_id) {
            let payload = self.dead_payload(player);
            if let Some(connection_id) = self.registry.channel_of(player_id) {
                self.fanout
                    .send_to(connection_id, &ServerMessage::Dead(payload));
            }
        }
        log::info!("player {player_id} has been eliminated");

        self.system_message(ELIMINATED_NOTICE);
        self.broadcast_roster();
        self.broadcast_suspicion();
    }

    fn reset_game(&mut self) {
        for player in self.registry.iter() {
            if let Some(connection_id) = self.registry.channel_of(&player.id) {
                self.fanout.send_to(connection_id, &ServerMessage::GameReset);
            }
        }
        self.fanout.unbind_players();
        self.registry.clear();
        self.tally.clear();
        log::info!("game reset");

        self.set_phase(SessionPhase::Lobby);
        self.system_message(RESET_NOTICE);
        self.broadcast_roster();
        self.broadcast_suspicion();
    }

    fn send_task(&mut self, player_id: &str, task: &str) {
        let Some(player) = self.registry.get_mut(player_id) else {
            log::debug!("sendTask for unknown player {player_id}");
            return;
        };
        player.task = Some(task.to_string());
        if let Some(connection_id) = self.registry.channel_of(player_id) {
            self.fanout.send_to(
                connection_id,
                &ServerMessage::NewTask(TaskPayload::Raw(task.to_string())),
            );
        }
        log::info!("task sent to {player_id}: {task}");
        self.broadcast_roster();
    }

    fn dead_payload(&self, player: &Player) -> DeadPayload {
        if self.mode.has_voting() {
            DeadPayload {
                revealed_role: player.revealed_role,
                was_actual_imposter: Some(player.was_actual_imposter),
            }
        } else {
            DeadPayload::default()
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.fanout.broadcast(&ServerMessage::PhaseUpdate(phase));
    }

    fn system_message(&self, text: &str) {
        log::info!("broadcast: {text}");
        self.fanout
            .broadcast(&ServerMessage::SystemMessage(text.to_string()));
    }

    fn broadcast_roster(&self) {
        self.fanout.broadcast_split(
            &ServerMessage::PlayerListUpdate(self.registry.list(false)),
            &ServerMessage::PlayerListUpdate(self.registry.list(true)),
        );
    }

    fn broadcast_suspicion(&self) {
        if self.mode.has_voting() {
            self.fanout.broadcast(&ServerMessage::SuspicionUpdate(
                self.tally.suspicion_snapshot(&self.registry),
            ));
        }
    }
}

fn task_payload(player: &Player) -> Option<TaskPayload> {
    let task = player.task.clone()?;
    Some(match player.task_role {
        TaskRole::None => TaskPayload::Raw(task),
        role => TaskPayload::Detailed {
            task,
            kind: role,
            role: role.display_role(),
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct Client {
        id: String,
        rx: mpsc::Receiver<OutboundMessage>,
    }

    impl Client {
        fn connect(session: &mut GameSession, id: &str) -> Self {
            let (tx, rx) = mpsc::channel(256);
            session.connect(id, tx);
            Self {
                id: id.to_string(),
                rx,
            }
        }

        fn send(&self, session: &mut GameSession, raw: &str) {
            session.handle_raw(&self.id, raw);
        }

        fn drain(&mut self) -> Vec<Value> {
            let mut out = Vec::new();
            while let Ok(message) = self.rx.try_recv() {
                if let OutboundMessage::Text(text) = message {
                    out.push(serde_json::from_str(&text).expect("valid json"));
                }
            }
            out
        }

        fn last_of(&mut self, kind: &str) -> Option<Value> {
            self.drain()
                .into_iter()
                .filter(|message| message["type"] == kind)
                .last()
        }
    }

    fn session(mode: GameMode) -> GameSession {
        GameSession::new(SessionOptions {
            mode,
            seed: Some(42),
        })
    }

    fn admin(session: &mut GameSession) -> Client {
        let client = Client::connect(session, "admin");
        client.send(session, r#"{"type":"registerAdmin"}"#);
        client
    }

    fn joined_player(session: &mut GameSession, name: &str) -> (String, Client) {
        let id = session.join(name).expect("valid name");
        let client = Client::connect(session, &format!("conn_{name}"));
        client.send(session, &format!(r#"{{"type":"register","playerId":"{id}"}}"#));
        (id, client)
    }

    #[test]
    fn join_rejects_blank_names_and_trims() {
        let mut session = session(GameMode::Deduction);
        assert_eq!(session.join("   "), Err(JoinError::NameRequired));
        assert_eq!(session.join(""), Err(JoinError::NameRequired));
        let id = session.join("  Ann ").expect("valid name");
        assert_eq!(session.player(&id).expect("exists").name, "Ann");
    }

    #[test]
    fn register_sends_player_info_and_marks_connected() {
        let mut session = session(GameMode::Deduction);
        let (id, mut client) = joined_player(&mut session, "Ann");
        let messages = client.drain();
        assert!(messages
            .iter()
            .any(|m| m["type"] == "playerInfo" && m["data"]["name"] == "Ann"));
        assert!(session.player(&id).expect("exists").connected);
    }

    #[test]
    fn non_admin_commands_are_dropped() {
        let mut session = session(GameMode::Deduction);
        let (_ann, ann) = joined_player(&mut session, "Ann");
        joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");

        ann.send(&mut session, r#"{"type":"startGame"}"#);
        ann.send(&mut session, r#"{"type":"assignRoles"}"#);
        ann.send(&mut session, r#"{"type":"resetGame"}"#);

        assert_eq!(session.phase(), SessionPhase::Lobby);
        assert_eq!(session.registry().len(), 3);
        assert!(session.registry().iter().all(|p| p.task.is_none()));
    }

    #[test]
    fn phase_transitions_follow_admin_commands() {
        let mut session = session(GameMode::Paired);
        let admin = admin(&mut session);
        admin.send(&mut session, r#"{"type":"startGame"}"#);
        assert_eq!(session.phase(), SessionPhase::Active);
        admin.send(&mut session, r#"{"type":"forceVoting"}"#);
        assert_eq!(session.phase(), SessionPhase::Voting);
        admin.send(&mut session, r#"{"type":"revealResults"}"#);
        assert_eq!(session.phase(), SessionPhase::Revealed);
        admin.send(&mut session, r#"{"type":"resetGame"}"#);
        assert_eq!(session.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn reveal_uses_default_or_custom_text() {
        let mut session = session(GameMode::Paired);
        let mut admin = admin(&mut session);
        admin.drain();
        admin.send(&mut session, r#"{"type":"revealResults"}"#);
        let last = admin.last_of("systemMessage").expect("message");
        assert_eq!(last["data"], DEFAULT_REVEAL_NOTICE);

        admin.send(&mut session, r#"{"type":"revealResults","message":"Bob did it"}"#);
        let last = admin.last_of("systemMessage").expect("message");
        assert_eq!(last["data"], "Bob did it");
    }

    #[test]
    fn broadcast_message_is_relayed_verbatim_without_phase_change() {
        let mut session = session(GameMode::Uniform);
        let admin = admin(&mut session);
        let (_, mut ann) = joined_player(&mut session, "Ann");
        ann.drain();
        admin.send(&mut session, r#"{"type":"broadcastMessage","message":"Gather round"}"#);
        let last = ann.last_of("systemMessage").expect("message");
        assert_eq!(last["data"], "Gather round");
        assert_eq!(session.phase(), SessionPhase::Lobby);
    }

    #[test]
    fn paired_assignment_is_noop_with_one_player() {
        let mut session = session(GameMode::Paired);
        let mut admin = admin(&mut session);
        let (id, _) = joined_player(&mut session, "Ann");
        admin.drain();
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        assert!(session.player(&id).expect("exists").task.is_none());
        assert!(admin.drain().is_empty());
    }

    #[test]
    fn assignment_delivers_tasks_and_stores_for_offline_players() {
        let mut session = session(GameMode::Paired);
        let admin = admin(&mut session);
        let (_, mut ann) = joined_player(&mut session, "Ann");
        let offline = session.join("Bob").expect("valid name");
        ann.drain();

        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        let task = ann.last_of("newTask").expect("task delivered");
        assert!(task["data"]["task"].is_string());
        assert!(session.player(&offline).expect("exists").task.is_some());

        let mut bob = Client::connect(&mut session, "conn_bob");
        bob.send(
            &mut session,
            &format!(r#"{{"type":"register","playerId":"{offline}"}}"#),
        );
        let redelivered = bob.last_of("newTask").expect("task redelivered on bind");
        let stored = session.player(&offline).expect("exists").task.clone();
        assert_eq!(redelivered["data"]["task"].as_str(), stored.as_deref());
    }

    #[test]
    fn uniform_mode_sends_raw_task_text() {
        let mut session = session(GameMode::Uniform);
        let admin = admin(&mut session);
        let (_, mut ann) = joined_player(&mut session, "Ann");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        let task = ann.last_of("newTask").expect("task delivered");
        assert!(task["data"].is_string());
    }

    #[test]
    fn reconnect_supersedes_previous_connection() {
        let mut session = session(GameMode::Paired);
        let (id, mut first) = joined_player(&mut session, "Ann");
        first.drain();

        let second = Client::connect(&mut session, "conn_second");
        second.send(&mut session, &format!(r#"{{"type":"register","playerId":"{id}"}}"#));
        assert_eq!(session.registry().channel_of(&id), Some("conn_second"));

        let mut closed = false;
        while let Ok(message) = first.rx.try_recv() {
            if matches!(message, OutboundMessage::Close { code, .. } if code == SUPERSEDED_CLOSE_CODE) {
                closed = true;
            }
        }
        assert!(closed);

        session.disconnect(&first.id);
        assert!(session.player(&id).expect("exists").connected);

        session.disconnect(&second.id);
        let player = session.player(&id).expect("player survives disconnect");
        assert!(!player.connected);
    }

    #[test]
    fn disconnect_keeps_task_and_vote_state() {
        let mut session = session(GameMode::Deduction);
        let admin = admin(&mut session);
        let (ann, ann_client) = joined_player(&mut session, "Ann");
        let (bob, _bob_client) = joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));

        session.disconnect(&ann_client.id);
        let player = session.player(&ann).expect("exists");
        assert!(!player.connected);
        assert!(player.task.is_some());
        assert_eq!(session.tally().vote_of(&ann), Some(bob.as_str()));
    }

    #[test]
    fn votes_require_deduction_mode() {
        let mut session = session(GameMode::Paired);
        let (_, ann) = joined_player(&mut session, "Ann");
        let (bob, _) = joined_player(&mut session, "Bob");
        ann.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        assert!(session.tally().is_empty());
    }

    #[test]
    fn reassignment_clears_votes_in_deduction_mode() {
        let mut session = session(GameMode::Deduction);
        let admin = admin(&mut session);
        let (_, ann) = joined_player(&mut session, "Ann");
        let (bob, _) = joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        ann.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        assert_eq!(session.tally().len(), 1);

        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        assert!(session.tally().is_empty());
        let roles: Vec<TaskRole> = session.registry().iter().map(|p| p.task_role).collect();
        assert_eq!(roles.iter().filter(|r| **r == TaskRole::Target).count(), 1);
        assert_eq!(roles.iter().filter(|r| **r == TaskRole::Detective).count(), 1);
        assert_eq!(
            session.registry().iter().filter(|p| p.is_imposter).count(),
            1
        );
    }

    #[test]
    fn public_roster_hides_imposter_from_players() {
        let mut session = session(GameMode::Deduction);
        let mut admin = admin(&mut session);
        let (_, mut ann) = joined_player(&mut session, "Ann");
        joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);

        let public = ann.last_of("playerListUpdate").expect("roster");
        let private = admin.last_of("playerListUpdate").expect("roster");
        let public_list = public["data"].as_array().expect("array");
        let private_list = private["data"].as_array().expect("array");
        assert_eq!(public_list.len(), 3);
        assert!(public_list.iter().all(|p| p.get("isImposter").is_none()));
        assert_eq!(
            private_list
                .iter()
                .filter(|p| p["isImposter"] == true)
                .count(),
            1
        );
    }

    #[test]
    fn deduction_scenario_from_votes_to_elimination() {
        let mut session = session(GameMode::Deduction);
        let mut admin = admin(&mut session);
        let (ann, ann_client) = joined_player(&mut session, "Ann");
        let (bob, mut bob_client) = joined_player(&mut session, "Bob");
        let (cara, mut cara_client) = joined_player(&mut session, "Cara");

        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        cara_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        let confirmed = cara_client.last_of("voteConfirmed").expect("confirmation");
        assert_eq!(confirmed["data"]["target"], "Bob");
        assert_eq!(confirmed["data"]["targetID"], bob.as_str());

        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        bob_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{ann}"}}"#));

        let snapshot = session.tally().suspicion_snapshot(session.registry());
        assert_eq!(snapshot[0].id, bob);
        assert_eq!(snapshot[0].score, 4);
        assert_eq!(snapshot[1].id, ann);
        assert_eq!(snapshot[1].score, 1);
        assert_eq!(snapshot[2].id, cara);
        assert_eq!(snapshot[2].score, 0);

        let results = session.elimination_results();
        assert_eq!(results.max_count, 2);
        assert_eq!(results.tied_top_targets, vec![bob.clone()]);

        let was_imposter = session.player(&bob).expect("exists").is_imposter;
        bob_client.drain();
        admin.drain();
        admin.send(&mut session, &format!(r#"{{"type":"killPlayer","playerId":"{bob}"}}"#));

        let eliminated = session.player(&bob).expect("exists");
        assert!(!eliminated.alive);
        assert_eq!(eliminated.revealed_role, Some(RevealedRole::Imposter));
        assert_eq!(session.tally().vote_of(&bob), None);

        let dead = bob_client.last_of("dead").expect("dead notice");
        assert_eq!(dead["data"]["revealedRole"], "IMPOSTER");
        assert_eq!(dead["data"]["wasActualImposter"], was_imposter);

        let suspicion = admin.last_of("suspicionUpdate").expect("recomputed");
        let ids: Vec<&str> = suspicion["data"]
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|entry| entry["id"].as_str())
            .collect();
        assert_eq!(ids, vec![ann.as_str(), cara.as_str()]);
        assert!(suspicion["data"]
            .as_array()
            .expect("array")
            .iter()
            .all(|entry| entry["score"] == 0));
    }

    #[test]
    fn new_round_after_killing_imposter_has_exactly_one_imposter() {
        let mut session = session(GameMode::Deduction);
        let mut admin = admin(&mut session);
        for name in ["Ann", "Bob", "Cara", "Dora"] {
            joined_player(&mut session, name);
        }
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        let imposter = session
            .registry()
            .iter()
            .find(|p| p.is_imposter)
            .map(|p| p.id.clone())
            .expect("one imposter assigned");
        admin.send(
            &mut session,
            &format!(r#"{{"type":"killPlayer","playerId":"{imposter}"}}"#),
        );
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);

        let roster = admin.last_of("playerListUpdate").expect("roster");
        let entries = roster["data"].as_array().expect("array");
        assert_eq!(entries.iter().filter(|p| p["isImposter"] == true).count(), 1);
        assert_eq!(entries.iter().filter(|p| p["taskType"] == "target").count(), 1);

        let dead = session.player(&imposter).expect("exists");
        assert!(!dead.is_imposter);
        assert!(dead.was_actual_imposter);
        assert_eq!(dead.task_role, TaskRole::None);

        let mut again = Client::connect(&mut session, "conn_again");
        again.send(
            &mut session,
            &format!(r#"{{"type":"register","playerId":"{imposter}"}}"#),
        );
        let notice = again.last_of("dead").expect("dead redelivered");
        assert_eq!(notice["data"]["wasActualImposter"], true);
    }

    #[test]
    fn dead_players_cannot_vote_and_are_told_again_on_reconnect() {
        let mut session = session(GameMode::Deduction);
        let admin = admin(&mut session);
        let (ann, ann_client) = joined_player(&mut session, "Ann");
        let (bob, _) = joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        admin.send(&mut session, &format!(r#"{{"type":"killPlayer","playerId":"{ann}"}}"#));

        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        assert!(session.tally().is_empty());

        let mut again = Client::connect(&mut session, "conn_again");
        again.send(&mut session, &format!(r#"{{"type":"register","playerId":"{ann}"}}"#));
        let dead = again.last_of("dead").expect("dead redelivered");
        assert_eq!(dead["data"]["revealedRole"], "IMPOSTER");
    }

    #[test]
    fn kill_of_unknown_player_is_ignored() {
        let mut session = session(GameMode::Deduction);
        let admin = admin(&mut session);
        joined_player(&mut session, "Ann");
        admin.send(&mut session, r#"{"type":"killPlayer","playerId":"NOBODY1"}"#);
        assert!(session.registry().iter().all(|p| p.alive));
    }

    #[test]
    fn reset_is_total_and_idempotent() {
        let mut session = session(GameMode::Deduction);
        let mut admin = admin(&mut session);
        let (_, ann_client) = joined_player(&mut session, "Ann");
        let (bob, mut bob_client) = joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        bob_client.drain();

        admin.send(&mut session, r#"{"type":"resetGame"}"#);
        assert!(bob_client.drain().iter().any(|m| m["type"] == "gameReset"));
        assert!(session.registry().is_empty());
        assert!(session.tally().is_empty());
        assert!(session.tally().suspicion_snapshot(session.registry()).is_empty());
        assert_eq!(session.phase(), SessionPhase::Lobby);
        let roster = admin.last_of("playerListUpdate").expect("empty roster");
        assert_eq!(roster["data"], serde_json::json!([]));

        admin.send(&mut session, r#"{"type":"resetGame"}"#);
        assert!(session.registry().is_empty());
        assert_eq!(session.phase(), SessionPhase::Lobby);

        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        assert!(session.tally().is_empty());

        let fresh = session.join("Dora").expect("valid name");
        assert_eq!(session.registry().len(), 1);
        assert!(session.player(&fresh).is_some());
    }

    #[test]
    fn send_task_stores_and_delivers_raw_text() {
        let mut session = session(GameMode::Paired);
        let admin = admin(&mut session);
        let (ann, mut ann_client) = joined_player(&mut session, "Ann");
        admin.send(
            &mut session,
            &format!(r#"{{"type":"sendTask","playerId":"{ann}","task":"Hum a tune"}}"#),
        );
        let task = ann_client.last_of("newTask").expect("task delivered");
        assert_eq!(task["data"], "Hum a tune");
        assert_eq!(
            session.player(&ann).expect("exists").task.as_deref(),
            Some("Hum a tune")
        );
    }

    #[test]
    fn admin_receives_vote_results_on_reveal() {
        let mut session = session(GameMode::Deduction);
        let mut admin = admin(&mut session);
        let (ann, ann_client) = joined_player(&mut session, "Ann");
        let (bob, bob_client) = joined_player(&mut session, "Bob");
        joined_player(&mut session, "Cara");
        admin.send(&mut session, r#"{"type":"assignRoles"}"#);
        ann_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{bob}"}}"#));
        bob_client.send(&mut session, &format!(r#"{{"type":"castVote","targetId":"{ann}"}}"#));

        admin.send(&mut session, r#"{"type":"revealResults"}"#);
        let results = admin.last_of("voteResults").expect("results");
        assert_eq!(results["data"]["maxCount"], 1);
        assert_eq!(
            results["data"]["tiedTopTargets"],
            serde_json::json!([ann, bob])
        );
    }
}
