use serde::{Deserialize, Serialize};

use crate::player::{PlayerState, RemotePlayer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u32,
    pub username: String,
    pub kills: u32,
    pub alive: bool,
    pub is_local: bool,
}

/// Kill standings built from one consistent snapshot of every known player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn from_players(local_id: u32, local: &PlayerState, remotes: &[RemotePlayer]) -> Self {
        let mut entries: Vec<LeaderboardEntry> = remotes
            .iter()
            .filter(|r| r.id != local_id)
            .map(|r| LeaderboardEntry {
                id: r.id,
                username: r.username.clone(),
                kills: r.kills,
                alive: r.alive,
                is_local: false,
            })
            .collect();

        entries.push(LeaderboardEntry {
            id: local_id,
            username: local.username().to_string(),
            kills: local.kills(),
            alive: local.is_alive(),
            is_local: true,
        });

        entries.sort_by(|a, b| {
            b.kills
                .cmp(&a.kills)
                .then_with(|| a.username.cmp(&b.username))
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn local_rank(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.is_local).map(|i| i + 1)
    }

    pub fn winner(&self, kill_limit: u32) -> Option<&LeaderboardEntry> {
        self.leader().filter(|e| kill_limit > 0 && e.kills >= kill_limit)
    }
}
