//! Read-side projections of the scoreboard.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{RoundEntity, TeamEntity};

/// Full snapshot served to a freshly connecting viewer. Hidden teams are
/// excluded here; they still appear in [`TeamsAndRoundsResponse`].
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScoresResponse {
    /// Round names in board order.
    pub rounds: Vec<String>,
    /// One row per visible team.
    pub teams: Vec<TeamScoresRow>,
}

/// One scoreboard row: a team name and its totals aligned with the rounds
/// column order.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamScoresRow {
    /// Team display name.
    pub name: String,
    /// Per-round totals; a round the team never scored in shows 0.
    pub scores: Vec<i64>,
}

/// Round projection for the admin panel selectors.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct RoundSummary {
    /// Round identifier.
    pub id: Uuid,
    /// Round display name.
    pub name: String,
}

impl From<RoundEntity> for RoundSummary {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Team projection for the admin panel, hidden teams included.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamSummary {
    /// Team identifier.
    pub id: Uuid,
    /// Team display name.
    pub name: String,
    /// Whether the team is excluded from the public board.
    pub hidden: bool,
}

impl From<TeamEntity> for TeamSummary {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            hidden: value.hidden,
        }
    }
}

/// Combined rounds/teams listing backing the admin panel.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamsAndRoundsResponse {
    /// All rounds in board order.
    pub rounds: Vec<RoundSummary>,
    /// All teams, hidden ones included.
    pub teams: Vec<TeamSummary>,
}

/// One full-standings row, broadcast so viewers can re-filter hidden teams
/// without re-fetching the snapshot.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamStanding {
    /// Team identifier.
    pub id: Uuid,
    /// Team display name.
    pub name: String,
    /// Whether the team is excluded from the public board.
    pub hidden: bool,
    /// Per-round totals aligned with the rounds column order.
    pub scores: Vec<i64>,
}

/// One audit row of the point ledger.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Point identifier, used by the admin panel to edit or delete it.
    pub id: Uuid,
    /// Signed count awarded by this entry.
    pub count: i32,
    /// Owning team's display name.
    pub team: String,
    /// Owning round's display name.
    pub round: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}
