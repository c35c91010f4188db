pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const PLAYER_ID_LEN: usize = 7;
pub const PLAYER_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const UNIFORM_MIN_PLAYERS: usize = 1;
pub const PAIRED_MIN_PLAYERS: usize = 2;
pub const SINGLE_IMPOSTER_MIN_PLAYERS: usize = 3;

pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;
pub const SUPERSEDED_CLOSE_CODE: u16 = 4001;

pub const START_NOTICE: &str = "The game has started! Complete your secret task.";
pub const ASSIGNED_NOTICE: &str = "New tasks have been assigned!";
pub const VOTING_NOTICE: &str = "VOTING PHASE: Discuss and vote who to eliminate!";
pub const DEFAULT_REVEAL_NOTICE: &str = "Voting results revealed!";
pub const ELIMINATED_NOTICE: &str = "A player has been eliminated!";
pub const RESET_NOTICE: &str = "Game has been reset!";

pub const PLAYER_NOT_FOUND_TEXT: &str = "Player not found. Please scan the QR code again.";
