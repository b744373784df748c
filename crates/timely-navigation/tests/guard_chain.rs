//! Navigation through the production guard chain, backed by a real
//! session store talking to a stubbed proxy and provider.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use timely_auth::session::now_ms;
use timely_auth::storage::{OAUTH_STATE_KEY, REDIRECT_KEY, SESSION_KEY};
use timely_auth::{
    AuthConfig, MemoryStorage, Profile, Session, SessionStore, SharedSessionStore, Storage,
};
use timely_navigation::{
    CallbackOutcome, CallbackParams, ChainOptions, DocumentTitle, LoginError, NavigationError,
    RouteTable, RouteTarget, Router, complete_login, standard_chain,
};

const TOKEN_PATH: &str = "/api/auth/token";

struct Harness {
    server: MockServer,
    session: SharedSessionStore,
    ephemeral: Arc<MemoryStorage>,
    title: DocumentTitle,
    router: Router,
}

impl Harness {
    async fn start(seeded: Option<Session>) -> Self {
        let server = MockServer::start().await;
        let config = AuthConfig::new("1234", "http://localhost:5173/auth/callback")
            .with_proxy_url(format!("{}{}", server.uri(), TOKEN_PATH))
            .with_api_base_url(server.uri())
            .with_request_timeout(Duration::from_secs(10));

        let durable = Arc::new(MemoryStorage::new());
        if let Some(session) = seeded {
            durable
                .set(SESSION_KEY, &serde_json::to_string(&session).unwrap())
                .unwrap();
        }
        let ephemeral = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionStore::new(config, durable, ephemeral.clone()).unwrap());

        let title = DocumentTitle::new("Timely");
        let chain = standard_chain(
            session.clone(),
            title.clone(),
            &ChainOptions {
                app_name: "Timely".to_string(),
                development: true,
            },
        );
        let router = Router::new(RouteTable::standard(), chain);

        Self {
            server,
            session,
            ephemeral,
            title,
            router,
        }
    }
}

fn profile() -> Profile {
    Profile {
        gid: "1201".to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
        photo: None,
        workspaces: None,
    }
}

fn valid_session() -> Session {
    Session {
        access_token: Some("tok".to_string()),
        refresh_token: Some("ref".to_string()),
        expires_at: Some(now_ms() + 3_600_000),
        user: Some(profile()),
    }
}

fn expired_session() -> Session {
    Session {
        expires_at: Some(now_ms() - 1_000),
        ..valid_session()
    }
}

fn token_body(access: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": "ref-2",
        "expires_in": 3600,
        "token_type": "bearer"
    })
}

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"gid": "1201", "email": "ada@example.com", "name": "Ada"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_protected_route_redirects_to_login() {
    let h = Harness::start(None).await;

    let location = h.router.navigate("/reports?week=12").await.unwrap();

    assert!(location.is_named("login"));
    assert_eq!(
        h.ephemeral.get(REDIRECT_KEY).unwrap().as_deref(),
        Some("/reports?week=12")
    );
    assert_eq!(h.title.get(), "Timely - Login");
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let h = Harness::start(None).await;

    assert!(h.router.navigate("/login").await.unwrap().is_named("login"));
    assert!(
        h.router
            .navigate("/somewhere/else")
            .await
            .unwrap()
            .is_named("not-found")
    );
    assert_eq!(h.title.get(), "Timely - 404 Page Not Found");
    assert!(h.ephemeral.is_empty());
}

#[tokio::test]
async fn test_authenticated_user_reaches_protected_route() {
    let h = Harness::start(Some(valid_session())).await;

    let location = h.router.navigate("/time-entries").await.unwrap();

    assert!(location.is_named("time-entries"));
    assert_eq!(h.title.get(), "Timely - Time Entries");
}

#[tokio::test]
async fn test_authenticated_user_is_sent_from_login_to_dashboard() {
    let h = Harness::start(Some(valid_session())).await;

    let location = h.router.navigate("/login").await.unwrap();

    assert!(location.is_named("dashboard"));
    assert_eq!(location.path, "/");
    assert_eq!(h.title.get(), "Timely - Dashboard");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_navigation() {
    let h = Harness::start(Some(expired_session())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(json!({"grant_type": "refresh_token", "refresh_token": "ref"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2")))
        .expect(1)
        .mount(&h.server)
        .await;

    let location = h.router.navigate("/projects").await.unwrap();

    assert!(location.is_named("projects"));
    assert_eq!(h.session.access_token().as_deref(), Some("tok-2"));
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn test_failed_refresh_redirects_to_login() {
    let h = Harness::start(Some(expired_session())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&h.server)
        .await;

    let location = h.router.navigate("/projects").await.unwrap();

    assert!(location.is_named("login"));
    assert!(h.session.snapshot().is_empty());
    assert_eq!(
        h.ephemeral.get(REDIRECT_KEY).unwrap().as_deref(),
        Some("/projects")
    );
}

#[tokio::test]
async fn test_expired_without_refresh_token_skips_refresh() {
    let h = Harness::start(Some(Session {
        refresh_token: None,
        ..expired_session()
    }))
    .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2")))
        .expect(0)
        .mount(&h.server)
        .await;

    let location = h.router.navigate("/").await.unwrap();
    assert!(location.is_named("login"));
}

#[tokio::test]
async fn test_cancel_during_refresh_keeps_current_route() {
    let h = Harness::start(Some(expired_session())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("tok-2"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&h.server)
        .await;
    h.router.navigate("/login").await.unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = h
        .router
        .navigate_with(RouteTarget::path("/reports"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, NavigationError::Cancelled);
    assert!(h.router.current().is_named("login"));
}

#[tokio::test]
async fn test_full_login_returns_to_remembered_route() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(json!({"grant_type": "authorization_code", "code": "abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok")))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_user(&h.server).await;

    h.router.navigate("/reports?week=12").await.unwrap();
    let url = h.session.generate_oauth_url();
    let state = CallbackParams::from_url(&url).state.unwrap();

    let callback = format!(
        "http://localhost:5173/auth/callback?code=abc123&state={}",
        state
    );
    let outcome = complete_login(&h.session, &CallbackParams::from_url(&callback)).await;

    assert_eq!(
        outcome,
        CallbackOutcome::LoggedIn {
            redirect: RouteTarget::path("/reports?week=12")
        }
    );
    let location = h
        .router
        .navigate_with(outcome.redirect().clone(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(location.is_named("reports"));
    assert_eq!(h.session.user().map(|u| u.name).as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_login_without_remembered_route_goes_to_dashboard() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok")))
        .mount(&h.server)
        .await;
    mount_user(&h.server).await;

    let url = h.session.generate_oauth_url();
    let state = CallbackParams::from_url(&url).state.unwrap();
    let params = CallbackParams {
        code: Some("abc123".to_string()),
        state: Some(state),
        ..Default::default()
    };

    let outcome = complete_login(&h.session, &params).await;
    assert_eq!(outcome.redirect(), &RouteTarget::named("dashboard"));
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn test_state_mismatch_never_exchanges() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok")))
        .expect(0)
        .mount(&h.server)
        .await;

    h.session.generate_oauth_url();
    let params = CallbackParams::from_query("code=abc123&state=forged");
    let outcome = complete_login(&h.session, &params).await;

    assert_eq!(
        outcome,
        CallbackOutcome::Failed {
            error: LoginError::StateMismatch,
            redirect: RouteTarget::named("login"),
        }
    );
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_callback_without_stored_state_fails() {
    let h = Harness::start(None).await;

    let params = CallbackParams::from_query("code=abc123&state=anything");
    let outcome = complete_login(&h.session, &params).await;

    assert!(matches!(
        outcome,
        CallbackOutcome::Failed {
            error: LoginError::StateMismatch,
            ..
        }
    ));
}

#[tokio::test]
async fn test_provider_denial_and_missing_code() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&h.server)
        .await;

    let url = h.session.generate_oauth_url();
    let state = CallbackParams::from_url(&url).state.unwrap();
    let denied = complete_login(
        &h.session,
        &CallbackParams::from_query(&format!("error=access_denied&state={}", state)),
    )
    .await;
    assert!(matches!(
        denied,
        CallbackOutcome::Failed {
            error: LoginError::ProviderDenied { .. },
            ..
        }
    ));
    assert!(h.ephemeral.get(OAUTH_STATE_KEY).unwrap().is_none());

    // The denied callback used up the state; replaying it is rejected.
    let replayed = complete_login(
        &h.session,
        &CallbackParams::from_query(&format!("code=abc123&state={}", state)),
    )
    .await;
    assert!(matches!(
        replayed,
        CallbackOutcome::Failed {
            error: LoginError::StateMismatch,
            ..
        }
    ));

    let url = h.session.generate_oauth_url();
    let state = CallbackParams::from_url(&url).state.unwrap();
    let missing =
        complete_login(&h.session, &CallbackParams::from_query(&format!("state={}", state))).await;
    assert!(matches!(
        missing,
        CallbackOutcome::Failed {
            error: LoginError::MissingParameter("code"),
            ..
        }
    ));
    assert!(h.ephemeral.get(OAUTH_STATE_KEY).unwrap().is_none());

    h.session.generate_oauth_url();
    let stateless = complete_login(&h.session, &CallbackParams::from_query("code=abc123")).await;
    assert!(matches!(
        stateless,
        CallbackOutcome::Failed {
            error: LoginError::MissingParameter("state"),
            ..
        }
    ));
    assert!(h.ephemeral.get(OAUTH_STATE_KEY).unwrap().is_none());
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_exchange_failure_reports_store_error() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Code expired"
        })))
        .mount(&h.server)
        .await;

    let url = h.session.generate_oauth_url();
    let state = CallbackParams::from_url(&url).state.unwrap();
    let params = CallbackParams {
        code: Some("stale".to_string()),
        state: Some(state),
        ..Default::default()
    };

    match complete_login(&h.session, &params).await {
        CallbackOutcome::Failed {
            error: LoginError::ExchangeFailed(message),
            redirect,
        } => {
            assert!(message.contains("Code expired"), "{}", message);
            assert_eq!(redirect, RouteTarget::named("login"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}
