#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use homeplan::AppState;
use homeplan_planner::{LocalStorage, Planner, PlannerState};
use temp_dir::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn local() -> Self {
        let dir = TempDir::new().unwrap();
        let planner = Planner::local(LocalStorage::new(dir.path()));
        planner.start().await;

        Self::new(planner, dir)
    }

    pub async fn cloud() -> Self {
        let dir = TempDir::new().unwrap();
        let backend = homeplan_store::open("memory://", "test-key", Duration::from_millis(10))
            .await
            .unwrap();
        let planner = Planner::cloud(LocalStorage::new(dir.path()), backend);
        planner.start().await;

        Self::new(planner, dir)
    }

    fn new(planner: Planner, dir: TempDir) -> Self {
        let state = AppState::new(planner);
        let router = homeplan::cli::server::app(state.clone());

        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_raw(&self, uri: &str, body: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Posts an url-encoded form and checks the redirect back to the page.
    pub async fn post(&self, uri: &str, form: &[(&str, &str)]) {
        let response = self
            .post_raw(uri, &serde_urlencoded::to_string(form).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {uri}");
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    pub async fn text(&self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");

        body_string(response).await
    }

    pub async fn state(&self) -> PlannerState {
        self.state.planner.state().await
    }

    pub async fn eventually(&self, check: impl Fn(&PlannerState) -> bool) -> PlannerState {
        let result = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let state = self.state().await;
                if check(&state) {
                    return state;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match result {
            Ok(state) => state,
            Err(_) => panic!("state never matched, last: {:?}", self.state().await),
        }
    }
}

pub async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    String::from_utf8(body.to_vec()).unwrap()
}
