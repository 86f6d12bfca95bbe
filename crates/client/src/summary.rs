use std::path::Path;

use serde::Serialize;

use skirmish::{Leaderboard, LeaderboardEntry, NetworkStats};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficSummary {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_dropped: u64,
    pub rtt_ms: Option<u64>,
}

impl From<NetworkStats> for TrafficSummary {
    fn from(stats: NetworkStats) -> Self {
        Self {
            packets_sent: stats.packets_sent,
            packets_received: stats.packets_received,
            bytes_sent: stats.bytes_sent,
            bytes_received: stats.bytes_received,
            packets_dropped: stats.packets_dropped,
            rtt_ms: stats.rtt_ms,
        }
    }
}

/// What a finished bot run reports.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub username: String,
    pub local_id: u32,
    pub online: bool,
    pub duration_secs: f32,
    pub ticks: u64,
    pub kills: u32,
    pub deaths: u32,
    pub shots_fired: u64,
    pub leaderboard: Leaderboard,
    pub winner: Option<LeaderboardEntry>,
    pub traffic: Option<TrafficSummary>,
}

impl MatchSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
