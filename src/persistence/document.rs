use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Float3;
use crate::placement::TrackElementInstance;

/// Length of the best-times leaderboard.
pub const MAX_BEST_TIMES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestTime {
    pub player_name: String,
    /// Lap time in seconds
    pub time: f32,
    pub date: DateTime<Utc>,
}

impl BestTime {
    pub fn new(player_name: impl Into<String>, time: f32) -> Self {
        Self {
            player_name: player_name.into(),
            time,
            date: Utc::now(),
        }
    }
}

/// Persisted track: metadata, placed elements and the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub elements: Vec<TrackElementInstance>,
    pub checkpoints: Vec<Float3>,
    pub start_position: Float3,
    pub start_rotation: Float3,
    /// Ascending by time, at most [`MAX_BEST_TIMES`] entries.
    pub best_times: Vec<BestTime>,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            author: author.into(),
            description: None,
            created_at: now,
            modified_at: now,
            elements: Vec::new(),
            checkpoints: Vec::new(),
            start_position: Float3::ZERO,
            start_rotation: Float3::ZERO,
            best_times: Vec::new(),
        }
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Whether `time` would make the leaderboard.
    pub fn qualifies(&self, time: f32) -> bool {
        time.is_finite()
            && (self.best_times.len() < MAX_BEST_TIMES
                || self.best_times.last().is_some_and(|worst| time < worst.time))
    }

    /// Inserts keeping ascending order and the size cap. Returns the 0-based
    /// rank, or None if the time did not qualify. Ties rank after existing entries.
    pub fn add_best_time(&mut self, entry: BestTime) -> Option<usize> {
        if !self.qualifies(entry.time) {
            return None;
        }
        let rank = self.best_times.partition_point(|b| b.time <= entry.time);
        self.best_times.insert(rank, entry);
        self.best_times.truncate(MAX_BEST_TIMES);
        Some(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(track: &Track) -> Vec<f32> {
        track.best_times.iter().map(|b| b.time).collect()
    }

    #[test]
    fn best_times_stay_sorted() {
        let mut track = Track::new("t", "Test", "me");
        for t in [12.3, 9.8, 15.1, 11.0] {
            track.add_best_time(BestTime::new("p", t));
        }
        assert_eq!(times(&track), vec![9.8, 11.0, 12.3, 15.1]);
    }

    #[test]
    fn rank_is_reported() {
        let mut track = Track::new("t", "Test", "me");
        assert_eq!(track.add_best_time(BestTime::new("a", 10.0)), Some(0));
        assert_eq!(track.add_best_time(BestTime::new("b", 12.0)), Some(1));
        assert_eq!(track.add_best_time(BestTime::new("c", 8.0)), Some(0));
        assert_eq!(track.add_best_time(BestTime::new("d", 10.0)), Some(2));
    }

    #[test]
    fn cap_keeps_ten_fastest() {
        let mut track = Track::new("t", "Test", "me");
        for i in 0..10 {
            track.add_best_time(BestTime::new("p", 20.0 + i as f32));
        }
        let before = track.best_times.clone();

        assert!(!track.qualifies(40.0));
        assert_eq!(track.add_best_time(BestTime::new("slow", 40.0)), None);
        assert_eq!(track.best_times, before);

        assert_eq!(track.add_best_time(BestTime::new("fast", 1.0)), Some(0));
        assert_eq!(track.best_times.len(), MAX_BEST_TIMES);
        assert_eq!(track.best_times.last().map(|b| b.time), Some(28.0));
    }

    #[test]
    fn non_finite_times_never_qualify() {
        let mut track = Track::new("t", "Test", "me");
        assert_eq!(track.add_best_time(BestTime::new("p", f32::NAN)), None);
        assert!(track.best_times.is_empty());
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let mut track = Track::new("t1", "Loop", "sam");
        track.add_best_time(BestTime::new("sam", 31.5));
        let json = serde_json::to_value(&track).unwrap();
        assert!(json.get("bestTimes").is_some());
        assert!(json.get("startPosition").is_some());
        assert_eq!(json["bestTimes"][0]["playerName"], "sam");

        let back: Track = serde_json::from_value(json).unwrap();
        assert_eq!(back, track);
    }
}
