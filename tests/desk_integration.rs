mod common;

use std::sync::Arc;

use common::{build_desk, config_from, dynamic_route_names, mock_config, temp_cookie_jar};
use ophthadesk::error::DeskError;
use ophthadesk::metrics::Metrics;
use ophthadesk::models::{Credentials, Session};
use ophthadesk::startup::run_with;
use ophthadesk::state::DeskState;
use ophthadesk::store::CredentialStore;

const PLAIN_CONFIG: &str = r#"
version: "1.0.0"
identity:
  type: plain
  name: "Front desk"
  jwt:
    iss: ophthadesk-test
    exp: 3600
    secret: integration-secret
  users:
    - username: dr.lin
      password: retina
      roles: [doctor]
    - username: nurse.wu
      password: cornea
      roles: [nurse]
"#;

#[tokio::test]
async fn test_no_token_redirects_to_login() {
    let desk = build_desk(&mock_config(&["admin"])).await;

    let nav = desk.navigator.push("/patient").await.unwrap();
    assert_eq!(nav.location, "/login");
    assert_eq!(nav.redirected_from.as_deref(), Some("/patient"));
    assert!(dynamic_route_names(&desk).is_empty());
    assert!(!desk.permission.is_materialized());
}

#[tokio::test]
async fn test_login_path_is_always_allowed() {
    let desk = build_desk(&mock_config(&["admin"])).await;
    assert_eq!(desk.navigator.push("/login").await.unwrap().location, "/login");

    desk.session.set_token("anything").await;
    assert_eq!(desk.navigator.push("/login").await.unwrap().location, "/login");
    assert!(!desk.permission.is_materialized());
}

#[tokio::test]
async fn test_first_authenticated_navigation_fetches_roles_once() {
    let desk = build_desk(&mock_config(&["doctor"])).await;
    desk.session.set_token("mock-token-admin-123456").await;
    assert!(desk.session.roles().is_empty());

    let nav = desk.navigator.push("/workbench").await.unwrap();
    assert_eq!(nav.location, "/workbench");
    assert!(nav.replaced);
    assert_eq!(
        desk.metrics
            .counter_value("route_materializations_total", "success"),
        1.0
    );
    assert!(!dynamic_route_names(&desk).is_empty());

    desk.navigator.push("/diagnosis/index").await.unwrap();
    desk.navigator.push("/history").await.unwrap();
    assert_eq!(
        desk.metrics
            .counter_value("route_materializations_total", "success"),
        1.0
    );
    assert!(!desk.progress.is_active());
    assert_eq!(desk.progress.started(), desk.progress.finished());
}

#[tokio::test]
async fn test_requested_route_is_reachable_after_materialization() {
    let desk = build_desk(&mock_config(&["doctor"])).await;
    desk.session
        .login(&Credentials::new("Admin", "12345678"))
        .await
        .unwrap();

    let nav = desk.navigator.push("/diagnosis/index").await.unwrap();
    assert_eq!(nav.location, "/diagnosis/index");
    assert_eq!(nav.matched.name.as_deref(), Some("AIDiagnosis"));
    assert!(desk.router.has_route("AIDiagnosis"));
    // The replayed navigation left a single history entry behind.
    assert_eq!(desk.navigator.history().len(), 1);
}

#[tokio::test]
async fn test_role_fetch_failure_resets_token_and_redirects() {
    let desk = build_desk(PLAIN_CONFIG).await;
    desk.session.set_token("not-a-token-this-service-issued").await;

    let nav = desk.navigator.push("/diagnosis").await.unwrap();
    assert_eq!(nav.location, "/login");
    assert_eq!(desk.session.token(), "");
    assert_eq!(desk.store.get().await.unwrap(), None);
    assert!(dynamic_route_names(&desk).is_empty());
    // A reset is local: no reload was requested.
    assert!(!desk.reload.is_requested());
}

#[tokio::test]
async fn test_roles_decide_reachable_screens() {
    let desk = build_desk(PLAIN_CONFIG).await;
    desk.session
        .login(&Credentials::new("nurse.wu", "cornea"))
        .await
        .unwrap();

    let nav = desk.navigator.push("/patient").await.unwrap();
    assert_eq!(nav.matched.name.as_deref(), Some("PatientCollect"));

    let nav = desk.navigator.push("/dashboard").await.unwrap();
    assert_eq!(nav.matched.name.as_deref(), Some("NotFound"));
    assert_eq!(nav.location, "/dashboard");
    assert!(!desk.router.has_route("Dashboard"));
}

#[tokio::test]
async fn test_wrong_password_leaves_session_empty() {
    let desk = build_desk(PLAIN_CONFIG).await;
    let err = desk
        .session
        .login(&Credentials::new("dr.lin", "cataract"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::Login(_)));
    assert_eq!(desk.session.snapshot(), Session::default());
    assert_eq!(desk.metrics.counter_value("login_attempts_total", "failure"), 1.0);
}

#[tokio::test]
async fn test_role_fetch_is_idempotent() {
    let desk = build_desk(PLAIN_CONFIG).await;
    desk.session
        .login(&Credentials::new("dr.lin", "retina"))
        .await
        .unwrap();
    desk.navigator.push("/").await.unwrap();
    let routes_before = desk.router.get_routes();
    let roles_before = desk.session.roles();

    desk.session.get_info().await.unwrap();
    desk.navigator.push("/").await.unwrap();

    assert_eq!(desk.session.roles(), roles_before);
    assert_eq!(desk.router.get_routes(), routes_before);
}

#[tokio::test]
async fn test_logout_clears_everything_and_requests_reload() {
    let desk = build_desk(&mock_config(&["admin"])).await;
    desk.session
        .login(&Credentials::new("Admin", "12345678"))
        .await
        .unwrap();
    desk.navigator.push("/dashboard").await.unwrap();
    assert_eq!(dynamic_route_names(&desk).len(), 10);

    desk.session.logout().await;

    assert_eq!(desk.session.token(), "");
    assert!(desk.session.roles().is_empty());
    assert!(dynamic_route_names(&desk).is_empty());
    assert!(desk.permission.added_routes().is_empty());
    assert!(desk.reload.is_requested());
    assert_eq!(desk.store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_navigations_register_routes_once() {
    let desk = build_desk(&mock_config(&["admin"])).await;
    desk.session.set_token("mock-token-admin-123456").await;

    let (a, b, c) = futures::join!(
        desk.navigator.push("/patient"),
        desk.navigator.push("/dashboard"),
        desk.navigator.push("/history/index")
    );
    assert_eq!(a.unwrap().matched.name.as_deref(), Some("PatientCollect"));
    assert_eq!(b.unwrap().matched.name.as_deref(), Some("Dashboard"));
    assert_eq!(c.unwrap().matched.name.as_deref(), Some("History"));
    assert_eq!(
        desk.metrics
            .counter_value("route_materializations_total", "success"),
        1.0
    );
    assert_eq!(dynamic_route_names(&desk).len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_mock_latency_runs_on_paused_clock() {
    let yaml = mock_config(&["nurse"])
        .replace("login_latency_ms: 0", "login_latency_ms: 500")
        .replace("profile_latency_ms: 0", "profile_latency_ms: 200");
    let desk = build_desk(&yaml).await;

    let started = tokio::time::Instant::now();
    desk.session
        .login(&Credentials::new("Admin", "12345678"))
        .await
        .unwrap();
    let nav = desk.navigator.push("/history").await.unwrap();

    assert_eq!(nav.matched.name.as_deref(), Some("History"));
    assert!(started.elapsed() >= std::time::Duration::from_millis(700));
}

#[tokio::test]
async fn test_token_survives_rebuild_with_cookie_store() {
    let yaml = mock_config(&["doctor"]).replace(
        "  type: memory\n",
        &format!("  type: cookie-file\n  path: {}\n", temp_cookie_jar()),
    );
    let config = Arc::new(config_from(&yaml));

    let first = DeskState::build(config.clone(), Metrics::new()).await;
    first
        .session
        .login(&Credentials::new("Admin", "12345678"))
        .await
        .unwrap();

    // A new desk over the same jar starts signed in but with nothing derived yet.
    let second = DeskState::build(config.clone(), Metrics::new()).await;
    assert_eq!(second.session.token(), "mock-token-admin-123456");
    assert!(second.session.roles().is_empty());
    assert!(dynamic_route_names(&second).is_empty());

    let nav = second.navigator.push("/").await.unwrap();
    assert_eq!(nav.location, "/workbench");
    assert!(second.router.has_route("AIDiagnosis"));

    second.session.logout().await;
    let third = DeskState::build(config, Metrics::new()).await;
    assert!(!third.session.is_authenticated());
}

#[tokio::test]
async fn test_shell_rebuilds_after_logout() {
    let desk = build_desk(&mock_config(&["nurse"])).await;
    let script = "login Admin 12345678\nwhoami\ngo /dashboard\nlogout\nwhoami\nbogus\nquit\n";
    let mut output: Vec<u8> = Vec::new();

    let after = run_with(desk, tokio::io::BufReader::new(script.as_bytes()), &mut output)
        .await
        .unwrap();
    let transcript = String::from_utf8(output).unwrap();

    assert!(transcript.contains("at /login"), "{}", transcript);
    assert!(transcript.contains("signed in; at /workbench (Workbench)"));
    assert!(transcript.contains("Admin roles=[nurse]"));
    assert!(transcript.contains("at /dashboard (NotFound)"));
    assert!(transcript.contains("signed out"));
    assert!(transcript.contains("reloaded; at /login"));
    assert!(transcript.contains("not signed in"));
    assert!(transcript.contains("unknown command 'bogus'"));

    assert!(!after.session.is_authenticated());
    assert!(!after.reload.is_requested());
    assert!(after.navigator.history().len() >= 1);
}
