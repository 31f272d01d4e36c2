use std::time::SystemTime;

use indexmap::IndexMap;

use crate::state::errors::SessionError;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// A participant known to the session.
///
/// Players are never removed so their answers keep counting on the leaderboard;
/// leaving only clears `connected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name as first submitted (trimmed).
    pub name: String,
    /// Wall-clock time of the latest successful join.
    pub joined_at: SystemTime,
    /// Whether the player currently counts as live.
    pub connected: bool,
}

/// Case-insensitive key used for name uniqueness.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trim and check a submitted player name.
pub fn validate_name(name: &str) -> Result<&str, SessionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidName("name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(SessionError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(SessionError::InvalidName(
            "name must not contain control characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Joined players of one session, in join order, keyed by normalized name.
#[derive(Debug, Clone)]
pub struct Roster {
    players: IndexMap<String, Player>,
    capacity: usize,
}

impl Roster {
    /// Create an empty roster admitting at most `capacity` live players.
    pub fn new(capacity: usize) -> Self {
        Self {
            players: IndexMap::new(),
            capacity,
        }
    }

    /// Admit a player, or revive a player who previously left under the same name.
    pub fn join(&mut self, name: &str) -> Result<&Player, SessionError> {
        let display = validate_name(name)?;
        let key = normalize_name(display);

        if self.players.get(&key).is_some_and(|player| player.connected) {
            return Err(SessionError::NameTaken(display.to_string()));
        }
        if self.live_count() >= self.capacity {
            return Err(SessionError::SessionFull);
        }

        let player = self.players.entry(key).or_insert_with(|| Player {
            name: display.to_string(),
            joined_at: SystemTime::now(),
            connected: false,
        });
        player.connected = true;
        player.joined_at = SystemTime::now();

        Ok(&*player)
    }

    /// Mark a live player as gone. Their record stays for the leaderboard.
    pub fn leave(&mut self, name: &str) -> Result<&Player, SessionError> {
        let key = normalize_name(name);
        match self.players.get_mut(&key) {
            Some(player) if player.connected => {
                player.connected = false;
                Ok(&*player)
            }
            _ => Err(SessionError::PlayerUnknown(name.trim().to_string())),
        }
    }

    /// Names of live players in join order.
    pub fn list(&self) -> Vec<String> {
        self.players
            .values()
            .filter(|player| player.connected)
            .map(|player| player.name.clone())
            .collect()
    }

    /// Number of live players.
    pub fn live_count(&self) -> usize {
        self.players.values().filter(|player| player.connected).count()
    }

    /// Normalized keys of live players.
    pub fn live_keys(&self) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .filter(|(_, player)| player.connected)
            .map(|(key, _)| key.as_str())
    }

    /// Look up a live player, returning its key and record.
    pub fn live_player(&self, name: &str) -> Result<(&str, &Player), SessionError> {
        let key = normalize_name(name);
        match self.players.get_key_value(&key) {
            Some((key, player)) if player.connected => Ok((key.as_str(), player)),
            _ => Err(SessionError::PlayerUnknown(name.trim().to_string())),
        }
    }

    /// Every player ever admitted, live or not, in join order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &Player)> {
        self.players.iter().map(|(key, player)| (key.as_str(), player))
    }
}
