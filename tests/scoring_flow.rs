//! End-to-end tests of the mutation → aggregation → broadcast path,
//! running the service layer over the in-process store backend.

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;
use validator::Validate;

use scoreboard_back::{
    config::AppConfig,
    dao::{
        models::{RoundEntity, TeamEntity},
        score_store::{ScoreStore, memory::MemoryScoreStore},
    },
    dto::{
        admin::{
            AddPointRequest, DeletePointRequest, TeamVisibilityInput, UpdatePointRequest,
            UpdateTeamsRequest,
        },
        sse::ServerEvent,
    },
    error::ServiceError,
    services::{admin_service, scoreboard_service},
    state::{AppState, SharedState},
};

struct Board {
    state: SharedState,
    store: MemoryScoreStore,
    rounds: Vec<RoundEntity>,
    teams: Vec<TeamEntity>,
}

async fn board(round_names: &[&str], team_names: &[&str]) -> Board {
    let state = AppState::new(AppConfig::default());
    let store = MemoryScoreStore::new();

    let rounds: Vec<RoundEntity> = round_names
        .iter()
        .enumerate()
        .map(|(position, name)| RoundEntity {
            id: Uuid::new_v4(),
            name: (*name).into(),
            position: position as u32,
        })
        .collect();
    let teams: Vec<TeamEntity> = team_names
        .iter()
        .map(|name| TeamEntity {
            id: Uuid::new_v4(),
            name: (*name).into(),
            hidden: false,
        })
        .collect();

    store
        .seed_event(rounds.clone(), teams.clone())
        .await
        .unwrap();
    state.install_score_store(Arc::new(store.clone())).await;

    Board {
        state,
        store,
        rounds,
        teams,
    }
}

fn add(team: &TeamEntity, round: &RoundEntity, count: i32) -> AddPointRequest {
    AddPointRequest {
        team_id: team.id,
        round_id: round.id,
        count,
    }
}

async fn next_event(receiver: &mut mpsc::Receiver<ServerEvent>) -> (String, Value) {
    let event = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("timed out waiting for broadcast")
        .expect("event stream closed");
    let payload = serde_json::from_str(&event.data).expect("event data is JSON");
    (event.event.expect("event is named"), payload)
}

async fn total_for(board: &Board, team_index: usize, round_index: usize) -> i64 {
    let snapshot = scoreboard_service::scores_snapshot(&board.state)
        .await
        .unwrap();
    let row = snapshot
        .teams
        .iter()
        .find(|row| row.name == board.teams[team_index].name)
        .expect("team visible in snapshot");
    row.scores[round_index]
}

#[tokio::test]
async fn running_total_tracks_add_update_delete() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let team = &board.teams[0];
    let round = &board.rounds[0];

    let ledger = admin_service::add_point(&board.state, add(team, round, 10))
        .await
        .unwrap();
    let first_point = ledger[0].id;
    assert_eq!(total_for(&board, 0, 0).await, 10);

    admin_service::add_point(&board.state, add(team, round, -3))
        .await
        .unwrap();
    assert_eq!(total_for(&board, 0, 0).await, 7);

    admin_service::update_point(
        &board.state,
        UpdatePointRequest {
            point_id: first_point,
            count: 5,
        },
    )
    .await
    .unwrap();
    assert_eq!(total_for(&board, 0, 0).await, 2);

    let ledger = admin_service::delete_point(
        &board.state,
        DeletePointRequest {
            point_id: first_point,
        },
    )
    .await
    .unwrap();
    assert_eq!(total_for(&board, 0, 0).await, -3);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn score_updates_always_carry_fresh_totals() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let team = &board.teams[0];
    let round = &board.rounds[0];
    let (_, mut receiver) = board.state.viewers().register();

    // Back-to-back mutations of the same score.
    admin_service::add_point(&board.state, add(team, round, 1))
        .await
        .unwrap();
    admin_service::add_point(&board.state, add(team, round, 2))
        .await
        .unwrap();
    admin_service::add_point(&board.state, add(team, round, 3))
        .await
        .unwrap();

    for (expected_total, expected_count) in [(1, 1), (3, 2), (6, 3)] {
        let (name, payload) = next_event(&mut receiver).await;
        assert_eq!(name, "score_update");
        assert_eq!(payload["teamId"], Value::String(team.id.to_string()));
        assert_eq!(payload["roundId"], Value::String(round.id.to_string()));
        assert_eq!(payload["points"], Value::from(expected_total));
        // Adds carry the raw delta for the "+N / -N" annotation.
        assert_eq!(payload["count"], Value::from(expected_count));
    }
}

#[tokio::test]
async fn recompute_only_pushes_omit_the_count_annotation() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let team = &board.teams[0];
    let round = &board.rounds[0];

    let ledger = admin_service::add_point(&board.state, add(team, round, 4))
        .await
        .unwrap();
    let point_id = ledger[0].id;

    let (_, mut receiver) = board.state.viewers().register();
    admin_service::update_point(&board.state, UpdatePointRequest { point_id, count: 9 })
        .await
        .unwrap();

    let (name, payload) = next_event(&mut receiver).await;
    assert_eq!(name, "score_update");
    assert_eq!(payload["points"], Value::from(9));
    assert!(payload.get("count").is_none());

    admin_service::delete_point(&board.state, DeletePointRequest { point_id })
        .await
        .unwrap();
    let (_, payload) = next_event(&mut receiver).await;
    assert_eq!(payload["points"], Value::from(0));
    assert!(payload.get("count").is_none());
}

#[tokio::test]
async fn two_points_for_fresh_pair_create_one_score() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let team = &board.teams[0];
    let round = &board.rounds[0];

    admin_service::add_point(&board.state, add(team, round, 2))
        .await
        .unwrap();
    admin_service::add_point(&board.state, add(team, round, 3))
        .await
        .unwrap();

    assert_eq!(board.store.list_scores().await.unwrap().len(), 1);
    assert_eq!(total_for(&board, 0, 0).await, 5);
}

#[tokio::test]
async fn zero_count_is_recorded_and_deleting_it_restores_the_total() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let team = &board.teams[0];
    let round = &board.rounds[0];

    admin_service::add_point(&board.state, add(team, round, 5))
        .await
        .unwrap();
    let ledger = admin_service::add_point(&board.state, add(team, round, 0))
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(total_for(&board, 0, 0).await, 5);

    let zero_entry = ledger.iter().find(|entry| entry.count == 0).unwrap();
    let ledger = admin_service::delete_point(
        &board.state,
        DeletePointRequest {
            point_id: zero_entry.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(total_for(&board, 0, 0).await, 5);
}

#[tokio::test]
async fn hidden_teams_leave_the_snapshot_but_not_the_admin_listing() {
    let board = board(&["Round 1"], &["Team A", "Team B"]).await;
    let ghost = &board.teams[1];
    let (_, mut receiver) = board.state.viewers().register();

    let teams = admin_service::update_teams(
        &board.state,
        UpdateTeamsRequest {
            teams: vec![TeamVisibilityInput {
                id: ghost.id,
                hidden: true,
            }],
        },
    )
    .await
    .unwrap();

    // Response still lists the hidden team, flagged.
    let flagged = teams.iter().find(|team| team.id == ghost.id).unwrap();
    assert!(flagged.hidden);

    let snapshot = scoreboard_service::scores_snapshot(&board.state)
        .await
        .unwrap();
    assert!(snapshot.teams.iter().all(|row| row.name != ghost.name));

    let listing = scoreboard_service::teams_and_rounds(&board.state)
        .await
        .unwrap();
    let listed = listing.teams.iter().find(|team| team.id == ghost.id).unwrap();
    assert!(listed.hidden);

    // The broadcast carries full standings including the hidden team.
    let (name, payload) = next_event(&mut receiver).await;
    assert_eq!(name, "teams_update");
    let rows = payload["teams"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let ghost_row = rows
        .iter()
        .find(|row| row["id"] == Value::String(ghost.id.to_string()))
        .unwrap();
    assert_eq!(ghost_row["hidden"], Value::Bool(true));
}

#[tokio::test]
async fn ledger_is_ordered_newest_first_across_teams() {
    let board = board(&["Round 1"], &["Team A", "Team B"]).await;
    let round = &board.rounds[0];

    admin_service::add_point(&board.state, add(&board.teams[0], round, 1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let ledger = admin_service::add_point(&board.state, add(&board.teams[1], round, 2))
        .await
        .unwrap();

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].team, "Team B");
    assert_eq!(ledger[1].team, "Team A");
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let board = board(&["Round 1"], &["Team A"]).await;
    let round = &board.rounds[0];

    let stranger = TeamEntity {
        id: Uuid::new_v4(),
        name: "Stranger".into(),
        hidden: false,
    };
    let err = admin_service::add_point(&board.state, add(&stranger, round, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let err = admin_service::update_point(
        &board.state,
        UpdatePointRequest {
            point_id: Uuid::new_v4(),
            count: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = admin_service::delete_point(
        &board.state,
        DeletePointRequest {
            point_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = admin_service::update_teams(
        &board.state,
        UpdateTeamsRequest {
            teams: vec![TeamVisibilityInput {
                id: Uuid::new_v4(),
                hidden: true,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn requests_fail_fast_in_degraded_mode() {
    let state = AppState::new(AppConfig::default());

    let err = scoreboard_service::scores_snapshot(&state)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));

    let err = admin_service::add_point(
        &state,
        AddPointRequest {
            team_id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
            count: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
}

#[test]
fn request_validation_screens_malformed_payloads() {
    let nil_ref = AddPointRequest {
        team_id: Uuid::nil(),
        round_id: Uuid::new_v4(),
        count: 1,
    };
    assert!(nil_ref.validate().is_err());

    let no_teams = UpdateTeamsRequest { teams: Vec::new() };
    assert!(no_teams.validate().is_err());
}
