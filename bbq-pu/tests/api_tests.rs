//! Integration tests for bbq-pu API endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Admin guard (401 / 403)
//! - CSV upload: insert/update counts, replace vs additive, idempotence,
//!   strict validation, header errors
//! - Feed sync: lenient row handling, upstream failure, active flag
//! - Player store reads, manual create/edit and soft delete
//! - Lease conflict (409)

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use bbq_common::config::FeedConfig;
use bbq_common::db::init_database;
use bbq_pu::db::players::get_player_by_sfbb_id;
use bbq_pu::services::FeedClient;
use bbq_pu::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "bbq-test-boundary";

/// Nothing listens here; only used where the feed is never fetched
const UNUSED_FEED_URL: &str = "http://127.0.0.1:9/PLAYERIDMAPCSV";

/// Test helper: fresh database in a temp folder
async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("bbq.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

fn test_state(db: SqlitePool, feed_url: &str) -> AppState {
    let feed = FeedClient::new(&FeedConfig {
        url: feed_url.to_string(),
        timeout_secs: 5,
        ..FeedConfig::default()
    })
    .expect("Should build feed client");
    AppState::new(db, feed)
}

fn setup_app(db: SqlitePool) -> Router {
    build_router(test_state(db, UNUSED_FEED_URL))
}

/// Test helper: serve `body` with `status` from a local listener, return its URL
async fn spawn_feed(status: StatusCode, body: &'static str) -> String {
    spawn_slow_feed(Duration::ZERO, status, body).await
}

/// Same as [`spawn_feed`], answering only after `delay`
async fn spawn_slow_feed(delay: Duration, status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route(
        "/PLAYERIDMAPCSV",
        get(move || async move {
            tokio::time::sleep(delay).await;
            (status, body)
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/PLAYERIDMAPCSV", addr)
}

fn multipart_body(csv: Option<&str>, mode: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(mode) = mode {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\n{mode}\r\n"
        ));
    }
    if let Some(csv) = csv {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"players.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n{csv}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn as_admin(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("x-bbq-user-id", "admin-1")
        .header("x-bbq-user-role", "admin")
}

fn upload_request(csv: Option<&str>, mode: Option<&str>) -> Request<Body> {
    as_admin(Request::builder().method("POST").uri("/api/players/import"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(csv, mode)))
        .unwrap()
}

fn sync_request(body: &str) -> Request<Body> {
    as_admin(Request::builder().method("POST").uri("/api/admin/sync-players"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_json(method: &str, uri: &str, body: &str) -> Request<Body> {
    as_admin(Request::builder().method(method).uri(uri))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    as_admin(Request::builder().method("GET").uri(uri))
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn live_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await
        .unwrap()
}

const THREE_PLAYERS: &str = "IDPLAYER,PLAYERNAME,MLBID,POS\n\
                             1,Aaron Judge,592450,OF\n\
                             2,Shohei Ohtani,660271,DH/P\n\
                             3,Mookie Betts,605141,2B OF\n";

const TWO_PLAYERS: &str = "IDPLAYER,PLAYERNAME,MLBID,POS\n\
                           1,Aaron Judge,592450,OF\n\
                           2,Shohei Ohtani,660271,DH/P\n";

// =============================================================================
// Health and access
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "bbq-pu");
    assert!(body["version"].is_string());
    assert_eq!(body["database"], "ok");
    assert_eq!(body["players"], 0);
}

#[tokio::test]
async fn test_health_counts_live_players_and_reports_closed_store() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;
    let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["players"], 3);

    db.close().await;
    let (status, body) = send(&app, health()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
    assert!(body.get("players").is_none());
}

#[tokio::test]
async fn test_upload_requires_identity() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/players/import")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(Some(TWO_PLAYERS), None)))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(live_count(&db).await, 0);
}

#[tokio::test]
async fn test_non_admin_forbidden_from_writes_but_can_read() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/sync-players")
        .header("x-bbq-user-id", "member-7")
        .header("x-bbq-user-role", "member")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let request = Request::builder()
        .uri("/api/players")
        .header("x-bbq-user-id", "member-7")
        .header("x-bbq-user-role", "member")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_trust_all_skips_identity_headers() {
    let (_dir, db) = setup_test_db().await;
    let app = build_router(test_state(db, UNUSED_FEED_URL).with_trust_all(true));

    let request = Request::builder().uri("/api/players").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// CSV upload
// =============================================================================

#[tokio::test]
async fn test_upload_inserts_then_updates() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["deleted"], 0);
    assert!(body["importedAt"].as_str().unwrap().ends_with('Z'));

    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 0);
    assert_eq!(body["updated"], 2);

    let judge = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();
    assert_eq!(judge.player_name, "Aaron Judge");
    assert_eq!(judge.mlbam_id, Some(592450));
    assert_eq!(judge.positions, vec!["OF"]);

    let ohtani = get_player_by_sfbb_id(&db, "2").await.unwrap().unwrap();
    assert_eq!(ohtani.positions, vec!["DH", "P"]);
}

#[tokio::test]
async fn test_replace_mode_soft_deletes_absent_players() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;

    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), Some("replace"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let betts = get_player_by_sfbb_id(&db, "3").await.unwrap().unwrap();
    assert!(betts.is_deleted());
    assert_eq!(live_count(&db).await, 2);
}

#[tokio::test]
async fn test_additive_mode_keeps_absent_players() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;

    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), Some("additive"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 0);

    let betts = get_player_by_sfbb_id(&db, "3").await.unwrap().unwrap();
    assert!(!betts.is_deleted());
    assert_eq!(live_count(&db).await, 3);
}

#[tokio::test]
async fn test_replace_rerun_is_idempotent() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;
    let before = get_player_by_sfbb_id(&db, "2").await.unwrap().unwrap();

    let (status, body) = send(&app, upload_request(Some(THREE_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 0);
    assert_eq!(body["updated"], 3);
    assert_eq!(body["deleted"], 0);

    let after = get_player_by_sfbb_id(&db, "2").await.unwrap().unwrap();
    assert_eq!(after.guid, before.guid);
    assert_eq!(after.player_name, before.player_name);
    assert_eq!(after.positions, before.positions);
    assert_eq!(live_count(&db).await, 3);
}

#[tokio::test]
async fn test_soft_deleted_player_revived_by_later_upload() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;
    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert!(get_player_by_sfbb_id(&db, "3").await.unwrap().unwrap().is_deleted());

    let (status, body) = send(&app, upload_request(Some(THREE_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 0);
    assert_eq!(body["updated"], 3);

    assert!(!get_player_by_sfbb_id(&db, "3").await.unwrap().unwrap().is_deleted());
    assert_eq!(live_count(&db).await, 3);
}

#[tokio::test]
async fn test_duplicate_ids_collapse_to_last_occurrence() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let csv = "IDPLAYER,PLAYERNAME\n1,First Name\n2,Other\n1,Second Name\n";
    let (status, body) = send(&app, upload_request(Some(csv), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["inserted"], 2);

    let player = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();
    assert_eq!(player.player_name, "Second Name");
}

#[tokio::test]
async fn test_strict_validation_rejects_whole_upload() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let mut csv = String::from("IDPLAYER,PLAYERNAME,MLBID\n1,Valid Player,123\n");
    for i in 0..12 {
        csv.push_str(&format!("{},Player {},abc\n", i + 100, i));
    }

    let (status, body) = send(&app, upload_request(Some(&csv), None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCount"], 12);

    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 10);
    assert_eq!(errors[0]["row"], 2);
    assert_eq!(errors[0]["field"], "MLBID");
    assert_eq!(errors[0]["message"], "Must be an integer");

    assert_eq!(live_count(&db).await, 0);
}

#[tokio::test]
async fn test_upload_missing_required_header() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let csv = "NAME,POS\nAaron Judge,OF\n";
    let (status, body) = send(&app, upload_request(Some(csv), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        r#"Missing required columns. Expected "IDPLAYER" and "PLAYERNAME". Found: NAME, POS"#
    );
}

#[tokio::test]
async fn test_upload_header_only_has_no_rows() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let (status, body) = send(&app, upload_request(Some("IDPLAYER,PLAYERNAME\n"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CSV has no data rows");
}

#[tokio::test]
async fn test_upload_without_file() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    let (status, body) = send(&app, upload_request(None, Some("additive"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_concurrent_run_conflicts() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(StatusCode::OK, FEED_CSV).await;
    let state = test_state(db.clone(), &url);
    let app = build_router(state.clone());

    let held = state.lease.try_acquire().expect("Lease should be free");

    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A player sync is already running");

    let (status, _) = send(&app, sync_request("{}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(live_count(&db).await, 0);

    drop(held);
    let (status, _) = send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Feed sync
// =============================================================================

const FEED_CSV: &str = "IDPLAYER,PLAYERNAME,POS,TEAM,LG,ACTIVE,MLBID,CBSID,BIRTHDATE\n\
                        1,Aaron Judge,OF,NYY,AL,Y,592450,1234,1992-04-26\n\
                        ,No Id,SS,BOS,AL,Y,1,,\n\
                        3,,C,LAD,NL,Y,2,,\n\
                        4,Old Timer,P,,,N,notanumber,,4/1/1950\n";

#[tokio::test]
async fn test_sync_skips_incomplete_rows() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(StatusCode::OK, FEED_CSV).await;
    let app = build_router(test_state(db.clone(), &url));

    let (status, body) = send(&app, sync_request("")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["deleted"], 0);
    assert!(body["syncedAt"].is_string());

    let judge = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();
    assert_eq!(judge.team.as_deref(), Some("NYY"));
    assert_eq!(judge.mlb_level.as_deref(), Some("AL"));
    assert_eq!(judge.cbs_id, Some(1234));
    assert_eq!(
        judge.birthday,
        chrono::NaiveDate::from_ymd_opt(1992, 4, 26)
    );

    let old = get_player_by_sfbb_id(&db, "4").await.unwrap().unwrap();
    assert!(!old.active);
    assert_eq!(old.mlbam_id, None);
    assert_eq!(old.team, None);
    assert_eq!(old.birthday, chrono::NaiveDate::from_ymd_opt(1950, 4, 1));
}

#[tokio::test]
async fn test_sync_additive_body_flag() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(StatusCode::OK, FEED_CSV).await;
    let app = build_router(test_state(db.clone(), &url));

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;

    let (status, body) = send(&app, sync_request(r#"{"mode":"additive"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 0);
    assert_eq!(live_count(&db).await, 4);

    let (status, body) = send(&app, sync_request(r#"{"mode":"replace"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert_eq!(live_count(&db).await, 2);
}

#[tokio::test]
async fn test_upload_allowed_while_feed_fetch_in_flight() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_slow_feed(Duration::from_millis(1500), StatusCode::OK, FEED_CSV).await;
    let app = build_router(test_state(db.clone(), &url));

    let sync_app = app.clone();
    let sync = tokio::spawn(async move { send(&sync_app, sync_request("")).await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (status, body) = send(&app, upload_request(Some(TWO_PLAYERS), Some("additive"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 2);

    let (status, body) = sync.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_sync_upstream_failure_is_bad_gateway() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(StatusCode::SERVICE_UNAVAILABLE, "down").await;
    let app = build_router(test_state(db.clone(), &url));

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;

    let (status, body) = send(&app, sync_request("")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Upstream fetch failed: 503 Service Unavailable"
    );
    assert_eq!(live_count(&db).await, 2);
}

#[tokio::test]
async fn test_sync_missing_header_is_unprocessable() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(StatusCode::OK, "<html>\n<body>maintenance</body>\n").await;
    let app = build_router(test_state(db, &url));

    let (status, body) = send(&app, sync_request("")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Missing required columns: IDPLAYER, PLAYERNAME."));
}

#[tokio::test]
async fn test_active_flag_only_managed_by_feed() {
    let (_dir, db) = setup_test_db().await;
    let url = spawn_feed(
        StatusCode::OK,
        "IDPLAYER,PLAYERNAME,ACTIVE\n1,Aaron Judge,N\n",
    )
    .await;
    let app = build_router(test_state(db.clone(), &url));

    // Upload has no ACTIVE column: new rows take the store default
    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert!(get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap().active);

    send(&app, sync_request(r#"{"mode":"additive"}"#)).await;
    assert!(!get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap().active);

    // A later upload leaves the feed-managed flag alone
    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    assert!(!get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap().active);
}

// =============================================================================
// Player store
// =============================================================================

#[tokio::test]
async fn test_list_search_and_paging() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db);

    send(&app, upload_request(Some(THREE_PLAYERS), None)).await;

    let (status, body) = send(&app, admin_get("/api/players?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 2);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["playerName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Aaron Judge", "Mookie Betts"]);

    let (_, body) = send(&app, admin_get("/api/players?limit=2&page=2")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["sfbbId"], "2");

    let (_, body) = send(&app, admin_get("/api/players?search=ohtani")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["positions"], serde_json::json!(["DH", "P"]));

    let (_, body) = send(&app, admin_get("/api/players?limit=100000")).await;
    assert_eq!(body["limit"], 500);
}

#[tokio::test]
async fn test_get_and_delete_player() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    let guid = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap().guid;

    let (status, body) = send(&app, admin_get(&format!("/api/players/{guid}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playerName"], "Aaron Judge");
    assert_eq!(body["mlbamId"], 592450);

    let delete = as_admin(
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/players/{guid}")),
    )
    .body(Body::empty())
    .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, admin_get(&format!("/api/players/{guid}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (_, body) = send(&app, admin_get("/api/players")).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_delete_requires_admin() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    let guid = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap().guid;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/players/{guid}"))
        .header("x-bbq-user-id", "member-7")
        .header("x-bbq-user-role", "member")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(live_count(&db).await, 2);
}

#[tokio::test]
async fn test_create_player() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let (status, body) = send(
        &app,
        admin_json(
            "POST",
            "/api/players",
            r#"{"playerId":"15640","playerName":"Aaron Judge","mlbamId":592450,"birthday":"1992-04-26","positions":["OF"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sfbbId"], "15640");
    assert_eq!(body["mlbamId"], 592450);
    assert_eq!(body["birthday"], "1992-04-26");
    assert_eq!(body["active"], true);
    assert!(body["deletedAt"].is_null());

    let (status, fetched) = send(&app, admin_get(&format!("/api/players/{}", body["guid"].as_str().unwrap()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["playerName"], "Aaron Judge");
}

#[tokio::test]
async fn test_create_player_requires_id_and_name() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let (status, body) = send(
        &app,
        admin_json("POST", "/api/players", r#"{"playerName":"No Id"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "playerId and playerName are required");

    let (status, body) = send(
        &app,
        admin_json("POST", "/api/players", r#"{"playerId":"7","playerName":"X","birthday":"someday"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date");

    let (status, _) = send(&app, admin_json("POST", "/api/players", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(live_count(&db).await, 0);
}

#[tokio::test]
async fn test_create_player_conflicts_with_existing_id() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;

    let (status, _) = send(
        &app,
        admin_json("POST", "/api/players", r#"{"playerId":"1","playerName":"Someone Else"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let player = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();
    assert_eq!(player.player_name, "Aaron Judge");
}

#[tokio::test]
async fn test_create_player_requires_admin() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/players")
        .header("x-bbq-user-id", "member-7")
        .header("x-bbq-user-role", "member")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"playerId":"1","playerName":"A"}"#))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(live_count(&db).await, 0);
}

#[tokio::test]
async fn test_update_player_partial() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    let before = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();

    let (status, body) = send(
        &app,
        admin_json(
            "PATCH",
            &format!("/api/players/{}", before.guid),
            r#"{"playerName":"Aaron James Judge","mlbamId":null,"fangraphsId":15640}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playerName"], "Aaron James Judge");
    assert!(body["mlbamId"].is_null());
    assert_eq!(body["fangraphsId"], 15640);

    let after = get_player_by_sfbb_id(&db, "1").await.unwrap().unwrap();
    assert_eq!(after.guid, before.guid);
    assert_eq!(after.positions, before.positions);
    assert_eq!(after.mlbam_id, None);
}

#[tokio::test]
async fn test_update_missing_or_deleted_player_not_found() {
    let (_dir, db) = setup_test_db().await;
    let app = setup_app(db.clone());

    let (status, body) = send(
        &app,
        admin_json("PATCH", "/api/players/no-such-guid", r#"{"playerName":"A"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    send(&app, upload_request(Some(TWO_PLAYERS), None)).await;
    let guid = get_player_by_sfbb_id(&db, "2").await.unwrap().unwrap().guid;
    let delete = as_admin(Request::builder().method("DELETE").uri(format!("/api/players/{guid}")))
        .body(Body::empty())
        .unwrap();
    send(&app, delete).await;

    let (status, _) = send(
        &app,
        admin_json("PATCH", &format!("/api/players/{guid}"), r#"{"playerName":"Revived?"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let player = get_player_by_sfbb_id(&db, "2").await.unwrap().unwrap();
    assert_eq!(player.player_name, "Shohei Ohtani");
}
