//! Integration tests for the Player Standing bounded context.

mod common;

use arena_test_support::FixedClock;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Registers a player and plays one confirmed Solo session at the reference
/// time. Returns the player id.
async fn player_with_session(pool: &PgPool, username: &str) -> String {
    let (_template_id, location_id) = common::ready_location(pool, "solo").await;
    let session_id = common::create(
        pool,
        &format!("/api/v1/locations/{location_id}/start-session"),
        &json!({}),
    )
    .await;
    let player_id = common::create(pool, "/api/v1/players", &json!({ "username": username })).await;
    for (uri, body) in [
        (
            format!("/api/v1/sessions/{session_id}/participants"),
            json!({ "player_id": player_id }),
        ),
        (
            format!("/api/v1/sessions/{session_id}/draft-outcome"),
            json!({ "value": "win" }),
        ),
    ] {
        let (status, _) = common::post_json(common::build_test_app(pool.clone()), &uri, &body).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = common::post_empty(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/confirm"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    player_id
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_player_register_and_list(pool: PgPool) {
    let player_id = common::create(&pool, "/api/v1/players", &json!({ "username": "alice" })).await;

    let (status, json) = common::get_json(common::build_test_app(pool), "/api/v1/players").await;

    assert_eq!(status, StatusCode::OK);
    let players = json.as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_id"], player_id);
    assert_eq!(players[0]["global_status"], "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_standing_enters_warning_window_after_48_hours(pool: PgPool) {
    let player_id = player_with_session(&pool, "alice").await;
    let later = FixedClock::reference().hours_later(50);

    let (status, json) = common::get_json(
        common::build_test_app_at(pool, later),
        &format!("/api/v1/players/{player_id}/standing"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hours_since_last_session"], 50);
    assert_eq!(json["approaching_forfeit"], true);
    assert_eq!(json["forfeit_eligible"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_forfeit_then_reinstate(pool: PgPool) {
    let player_id = player_with_session(&pool, "alice").await;
    let later = FixedClock::reference().hours_later(80);

    let (status, _) = common::post_empty(
        common::build_test_app_at(pool.clone(), later),
        &format!("/api/v1/players/{player_id}/forfeit"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, player) = common::get_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/players/{player_id}"),
    )
    .await;
    assert_eq!(player["global_status"], "forfeit");

    let (status, json) = common::post_empty(
        common::build_test_app_at(pool.clone(), later),
        &format!("/api/v1/players/{player_id}/reinstate"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["event_ids"].as_array().unwrap().len(), 1);

    let (_, player) = common::get_json(
        common::build_test_app(pool),
        &format!("/api/v1/players/{player_id}"),
    )
    .await;
    assert_eq!(player["global_status"], "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_forfeit_scan_forfeits_idle_players(pool: PgPool) {
    let idle = player_with_session(&pool, "alice").await;
    let fresh = common::create(&pool, "/api/v1/players", &json!({ "username": "bob" })).await;

    let (status, report) = common::post_empty(
        common::build_test_app_at(pool.clone(), FixedClock::reference().hours_later(73)),
        "/api/v1/players/forfeit-scan",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["forfeited"], json!([idle]));
    assert!(report["warned"].as_array().unwrap().is_empty());

    let (_, player) = common::get_json(
        common::build_test_app(pool),
        &format!("/api/v1/players/{fresh}"),
    )
    .await;
    assert_eq!(player["global_status"], "active");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_player_get_nonexistent_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let (status, json) =
        common::get_json(app, &format!("/api/v1/players/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "aggregate_not_found");
}
