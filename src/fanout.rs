use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::protocol::ServerMessage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ClientRole {
    #[default]
    Unbound,
    Player(String),
    Admin,
}

#[derive(Clone, Debug)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
    role: ClientRole,
}

/// Open connections and their outbound queues.
#[derive(Debug, Default)]
pub struct Fanout {
    clients: HashMap<String, ClientContext>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, connection_id: &str, tx: mpsc::Sender<OutboundMessage>) {
        self.clients.insert(
            connection_id.to_string(),
            ClientContext {
                tx,
                role: ClientRole::Unbound,
            },
        );
    }

    pub fn detach(&mut self, connection_id: &str) -> Option<ClientRole> {
        self.clients
            .remove(connection_id)
            .map(|context| context.role)
    }

    pub fn role_of(&self, connection_id: &str) -> Option<&ClientRole> {
        self.clients.get(connection_id).map(|context| &context.role)
    }

    pub fn is_admin(&self, connection_id: &str) -> bool {
        self.role_of(connection_id) == Some(&ClientRole::Admin)
    }

    pub fn set_role(&mut self, connection_id: &str, role: ClientRole) -> Option<ClientRole> {
        let context = self.clients.get_mut(connection_id)?;
        Some(std::mem::replace(&mut context.role, role))
    }

    pub fn unbind_players(&mut self) {
        for context in self.clients.values_mut() {
            if matches!(context.role, ClientRole::Player(_)) {
                context.role = ClientRole::Unbound;
            }
        }
    }

    pub fn send_to(&self, connection_id: &str, message: &ServerMessage) -> bool {
        let Some(payload) = encode(message) else {
            return false;
        };
        self.push(connection_id, OutboundMessage::Text(payload))
    }

    pub fn close(&self, connection_id: &str, code: u16, reason: &str) -> bool {
        self.push(
            connection_id,
            OutboundMessage::Close {
                code,
                reason: reason.to_string(),
            },
        )
    }

    pub fn broadcast(&self, message: &ServerMessage) {
        let Some(payload) = encode(message) else {
            return;
        };
        for connection_id in self.clients.keys() {
            self.push(connection_id, OutboundMessage::Text(payload.clone()));
        }
    }

    pub fn send_to_admins(&self, message: &ServerMessage) {
        let Some(payload) = encode(message) else {
            return;
        };
        for (connection_id, context) in &self.clients {
            if context.role == ClientRole::Admin {
                self.push(connection_id, OutboundMessage::Text(payload.clone()));
            }
        }
    }

    pub fn broadcast_split(&self, public: &ServerMessage, admin: &ServerMessage) {
        let (Some(public), Some(admin)) = (encode(public), encode(admin)) else {
            return;
        };
        for (connection_id, context) in &self.clients {
            let payload = if context.role == ClientRole::Admin {
                admin.clone()
            } else {
                public.clone()
            };
            self.push(connection_id, OutboundMessage::Text(payload));
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn push(&self, connection_id: &str, outbound: OutboundMessage) -> bool {
        let Some(client) = self.clients.get(connection_id) else {
            return false;
        };
        match client.tx.try_send(outbound) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("dropping outbound message for {connection_id}: {error}");
                false
            }
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(error) => {
            log::error!("failed to serialize outbound message: {error}");
            None
        }
    }
}
