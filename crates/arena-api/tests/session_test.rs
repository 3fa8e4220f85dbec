//! Integration tests for the Game Session bounded context.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn start_session(pool: &PgPool, location_id: &str) -> String {
    common::create(
        pool,
        &format!("/api/v1/locations/{location_id}/start-session"),
        &json!({}),
    )
    .await
}

async fn add_player(pool: &PgPool, session_id: &str, username: &str) -> String {
    let player_id = common::create(pool, "/api/v1/players", &json!({ "username": username })).await;
    let (status, _) = common::post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/participants"),
        &json!({ "player_id": player_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    player_id
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_group_session_confirm_updates_location_and_players(pool: PgPool) {
    // Arrange
    let (_template_id, location_id) = common::ready_location(&pool, "group").await;
    let session_id = start_session(&pool, &location_id).await;
    let alice = add_player(&pool, &session_id, "alice").await;
    let bob = add_player(&pool, &session_id, "bob").await;
    let (status, _) = common::post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/draft-outcome"),
        &json!({ "value": "eliminated" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Act
    let (status, json) = common::post_empty(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/confirm"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["aggregate_id"], session_id);

    let (_, session) = common::get_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}"),
    )
    .await;
    assert_eq!(session["status"], "completed");
    assert_eq!(session["outcome"]["result"], "eliminated");
    assert!(session["ended_at"].is_string());

    let (_, location) = common::get_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/locations/{location_id}"),
    )
    .await;
    assert!(location["active_session_ids"].as_array().unwrap().is_empty());

    for player_id in [alice, bob] {
        let (_, player) = common::get_json(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/players/{player_id}"),
        )
        .await;
        assert_eq!(player["global_status"], "eliminated");
        assert!(player["last_session_at"].is_string());
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_confirmed_session_cannot_be_confirmed_again(pool: PgPool) {
    let (_template_id, location_id) = common::ready_location(&pool, "solo").await;
    let session_id = start_session(&pool, &location_id).await;
    add_player(&pool, &session_id, "alice").await;
    common::post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/draft-outcome"),
        &json!({ "value": "win" }),
    )
    .await;
    let confirm_uri = format!("/api/v1/sessions/{session_id}/confirm");
    let (first, _) = common::post_empty(common::build_test_app(pool.clone()), &confirm_uri).await;

    let (second, json) = common::post_empty(common::build_test_app(pool.clone()), &confirm_uri).await;
    let (cancel, _) = common::post_empty(
        common::build_test_app(pool),
        &format!("/api/v1/sessions/{session_id}/cancel"),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
    assert_eq!(cancel, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_solo_session_rejects_second_participant(pool: PgPool) {
    let (_template_id, location_id) = common::ready_location(&pool, "solo").await;
    let session_id = start_session(&pool, &location_id).await;
    add_player(&pool, &session_id, "alice").await;
    let bob = common::create(&pool, "/api/v1/players", &json!({ "username": "bob" })).await;

    let (status, json) = common::post_json(
        common::build_test_app(pool),
        &format!("/api/v1/sessions/{session_id}/participants"),
        &json!({ "player_id": bob }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_removed_participant_leaves_versus_draft_incomplete(pool: PgPool) {
    // Arrange
    let (_template_id, location_id) = common::ready_location(&pool, "versus").await;
    let session_id = start_session(&pool, &location_id).await;
    let alice = add_player(&pool, &session_id, "alice").await;
    add_player(&pool, &session_id, "bob").await;
    common::post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/participant-outcome"),
        &json!({ "player_id": alice, "value": "win" }),
    )
    .await;
    let (_, session) = common::get_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}"),
    )
    .await;
    let alice_entry = session["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["player_id"] == alice.as_str())
        .unwrap()["participant_id"]
        .as_str()
        .unwrap()
        .to_owned();

    // Act
    let (status, _) = common::post_empty(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/participants/{alice_entry}/remove"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let (_, session) = common::get_json(
        common::build_test_app(pool),
        &format!("/api/v1/sessions/{session_id}"),
    )
    .await;
    assert_eq!(session["participants"].as_array().unwrap().len(), 1);
    assert_eq!(session["can_confirm"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_sessions_filters_by_location(pool: PgPool) {
    let (_north_template, north) = common::ready_location(&pool, "group").await;
    let (_south_template, south) = common::ready_location(&pool, "group").await;
    let north_session = start_session(&pool, &north).await;
    start_session(&pool, &south).await;

    let (status, json) = common::get_json(
        common::build_test_app(pool),
        &format!("/api/v1/sessions?location_id={north}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sessions = json.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], north_session);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_media_can_be_attached_after_cancel(pool: PgPool) {
    let (_template_id, location_id) = common::ready_location(&pool, "solo").await;
    let session_id = start_session(&pool, &location_id).await;
    common::post_empty(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/cancel"),
    )
    .await;

    let (status, _) = common::post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/sessions/{session_id}/media"),
        &json!({ "external_media_ref": "s3://clips/run-1.mp4" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let (_, session) = common::get_json(
        common::build_test_app(pool),
        &format!("/api/v1/sessions/{session_id}"),
    )
    .await;
    assert_eq!(session["status"], "cancelled");
    assert_eq!(session["external_media_ref"], "s3://clips/run-1.mp4");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_session_get_nonexistent_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let (status, json) =
        common::get_json(app, &format!("/api/v1/sessions/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "aggregate_not_found");
}
