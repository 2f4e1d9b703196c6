//! Point aggregation: pure read-time computation of score totals and the
//! views derived from them. No I/O happens here; callers fetch entities
//! from the store and hand them in.

use std::collections::HashMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
    dto::{
        format_system_time,
        scoreboard::{LedgerEntry, ScoresResponse, TeamScoresRow, TeamStanding},
    },
};

/// Total of one score: the sum of its points' counts. An empty slice
/// totals 0, and negative sums are legitimate (penalties).
pub fn score_total(points: &[PointEntity]) -> i64 {
    points.iter().map(|point| i64::from(point.count)).sum()
}

/// Totals of every score that owns at least one point, keyed by score id.
pub fn totals_by_score(points: &[PointEntity]) -> HashMap<Uuid, i64> {
    let mut totals = HashMap::new();
    for point in points {
        *totals.entry(point.score_id).or_insert(0i64) += i64::from(point.count);
    }
    totals
}

/// One standings row per team, hidden teams included, each with totals
/// aligned to the round column order. A team with no score for a round
/// shows 0 there; absence means zero, not an error.
pub fn standings(
    rounds: &[RoundEntity],
    teams: &[TeamEntity],
    scores: &[ScoreEntity],
    points: &[PointEntity],
) -> Vec<TeamStanding> {
    let columns = round_columns(rounds);
    let totals = totals_by_score(points);

    let mut ordered_teams: Vec<&TeamEntity> = teams.iter().collect();
    ordered_teams.sort_by(|a, b| a.name.cmp(&b.name));

    ordered_teams
        .into_iter()
        .map(|team| {
            let mut row = vec![0i64; columns.len()];
            for score in scores.iter().filter(|score| score.team_id == team.id) {
                if let Some(&column) = columns.get(&score.round_id) {
                    row[column] = totals.get(&score.id).copied().unwrap_or(0);
                }
            }
            TeamStanding {
                id: team.id,
                name: team.name.clone(),
                hidden: team.hidden,
                scores: row,
            }
        })
        .collect()
}

/// The full snapshot served to a freshly connecting viewer: round names in
/// board order and one row per visible team. Hidden teams are filtered
/// out here and only here.
pub fn snapshot(
    rounds: &[RoundEntity],
    teams: &[TeamEntity],
    scores: &[ScoreEntity],
    points: &[PointEntity],
) -> ScoresResponse {
    let round_names = round_columns(rounds)
        .keys()
        .map(|id| {
            rounds
                .iter()
                .find(|round| round.id == *id)
                .map(|round| round.name.clone())
                .unwrap_or_default()
        })
        .collect();

    let teams = standings(rounds, teams, scores, points)
        .into_iter()
        .filter(|standing| !standing.hidden)
        .map(|standing| TeamScoresRow {
            name: standing.name,
            scores: standing.scores,
        })
        .collect();

    ScoresResponse {
        rounds: round_names,
        teams,
    }
}

/// The audit ledger: every point with its owning round/team names, newest
/// first. Points whose score references a missing team or round are
/// skipped; that only happens on a corrupted store.
pub fn ledger(
    rounds: &[RoundEntity],
    teams: &[TeamEntity],
    scores: &[ScoreEntity],
    points: &[PointEntity],
) -> Vec<LedgerEntry> {
    let owners: HashMap<Uuid, (&TeamEntity, &RoundEntity)> = scores
        .iter()
        .filter_map(|score| {
            let team = teams.iter().find(|team| team.id == score.team_id)?;
            let round = rounds.iter().find(|round| round.id == score.round_id)?;
            Some((score.id, (team, round)))
        })
        .collect();

    let mut ordered_points: Vec<&PointEntity> = points.iter().collect();
    ordered_points.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    ordered_points
        .into_iter()
        .filter_map(|point| {
            let (team, round) = owners.get(&point.score_id)?;
            Some(LedgerEntry {
                id: point.id,
                count: point.count,
                team: team.name.clone(),
                round: round.name.clone(),
                created_at: format_system_time(point.created_at),
            })
        })
        .collect()
}

/// Map each round id to its column index, ordering columns by the round's
/// ordinal position (name breaks ties deterministically).
fn round_columns(rounds: &[RoundEntity]) -> IndexMap<Uuid, usize> {
    let mut ordered: Vec<&RoundEntity> = rounds.iter().collect();
    ordered.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.name.cmp(&b.name))
    });
    ordered
        .into_iter()
        .enumerate()
        .map(|(column, round)| (round.id, column))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn round(name: &str, position: u32) -> RoundEntity {
        RoundEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
        }
    }

    fn team(name: &str, hidden: bool) -> TeamEntity {
        TeamEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            hidden,
        }
    }

    fn score(team: &TeamEntity, round: &RoundEntity) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            team_id: team.id,
            round_id: round.id,
        }
    }

    fn point_at(score: &ScoreEntity, count: i32, offset_secs: u64) -> PointEntity {
        PointEntity {
            id: Uuid::new_v4(),
            score_id: score.id,
            count,
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs),
        }
    }

    #[test]
    fn empty_score_totals_zero() {
        assert_eq!(score_total(&[]), 0);
    }

    #[test]
    fn totals_sum_signed_counts() {
        let owner = ScoreEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
        };
        let points = vec![
            point_at(&owner, 10, 0),
            point_at(&owner, -3, 1),
            point_at(&owner, 0, 2),
        ];
        assert_eq!(score_total(&points), 7);
    }

    #[test]
    fn totals_can_go_negative() {
        let owner = ScoreEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
        };
        let points = vec![point_at(&owner, -5, 0), point_at(&owner, 2, 1)];
        assert_eq!(score_total(&points), -3);
    }

    #[test]
    fn opposite_counts_sum_to_zero() {
        let owner = ScoreEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
        };
        let points = vec![point_at(&owner, 4, 0), point_at(&owner, -4, 1)];
        assert_eq!(score_total(&points), 0);
    }

    #[test]
    fn snapshot_orders_rounds_by_position() {
        let second = round("Finals", 1);
        let first = round("Qualifiers", 0);
        let blue = team("Blue", false);

        let view = snapshot(&[second.clone(), first.clone()], &[blue], &[], &[]);

        assert_eq!(view.rounds, vec!["Qualifiers", "Finals"]);
    }

    #[test]
    fn snapshot_fills_missing_scores_with_zero() {
        let rounds = [round("Round 1", 0), round("Round 2", 1)];
        let blue = team("Blue", false);
        let blue_r2 = score(&blue, &rounds[1]);
        let points = [point_at(&blue_r2, 8, 0)];

        let view = snapshot(&rounds, &[blue], &[blue_r2.clone()], &points);

        assert_eq!(view.teams.len(), 1);
        assert_eq!(view.teams[0].scores, vec![0, 8]);
    }

    #[test]
    fn snapshot_excludes_hidden_teams() {
        let rounds = [round("Round 1", 0)];
        let visible = team("Blue", false);
        let ghost = team("Red", true);

        let view = snapshot(&rounds, &[visible, ghost], &[], &[]);

        assert_eq!(view.teams.len(), 1);
        assert_eq!(view.teams[0].name, "Blue");
    }

    #[test]
    fn standings_keep_hidden_teams_flagged() {
        let rounds = [round("Round 1", 0)];
        let ghost = team("Red", true);

        let rows = standings(&rounds, &[ghost], &[], &[]);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].hidden);
        assert_eq!(rows[0].scores, vec![0]);
    }

    #[test]
    fn ledger_is_ordered_newest_first() {
        let rounds = [round("Round 1", 0)];
        let blue = team("Blue", false);
        let owner = score(&blue, &rounds[0]);
        let older = point_at(&owner, 1, 10);
        let newer = point_at(&owner, 2, 20);

        let view = ledger(
            &rounds,
            &[blue],
            &[owner],
            &[older.clone(), newer.clone()],
        );

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].id, newer.id);
        assert_eq!(view[1].id, older.id);
        assert_eq!(view[0].team, "Blue");
        assert_eq!(view[0].round, "Round 1");
    }

    #[test]
    fn ledger_skips_points_with_unresolvable_owner() {
        let rounds = [round("Round 1", 0)];
        let blue = team("Blue", false);
        let orphan = ScoreEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            round_id: rounds[0].id,
        };
        let points = [point_at(&orphan, 5, 0)];

        let view = ledger(&rounds, &[blue], &[orphan], &points);

        assert!(view.is_empty());
    }
}
