use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One column of the scoreboard. Rounds are provisioned at startup and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Stable identifier for the round.
    pub id: Uuid,
    /// Display name shown as the column header.
    pub name: String,
    /// Ordinal position of the round on the board, starting at 0.
    pub position: u32,
}

/// A competing team. Hidden teams stay out of the public snapshot but keep
/// their scores and ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name chosen for the team.
    pub name: String,
    /// Whether the team is excluded from the public board.
    pub hidden: bool,
}

/// The aggregate linking one team to one round. Created lazily when the
/// first point for the pair is recorded; at most one exists per
/// (team, round), and it is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Stable identifier for the score aggregate.
    pub id: Uuid,
    /// Team this score belongs to.
    pub team_id: Uuid,
    /// Round this score belongs to.
    pub round_id: Uuid,
}

/// A single scoring event owned by exactly one score. The score's total is
/// the sum of its points' counts; counts may be negative (penalties) or
/// zero (recorded but awarding nothing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointEntity {
    /// Stable identifier for the point entry.
    pub id: Uuid,
    /// Owning score aggregate.
    pub score_id: Uuid,
    /// Signed number of points awarded by this entry.
    pub count: i32,
    /// Creation timestamp, drives the newest-first ledger ordering.
    pub created_at: SystemTime,
}
