#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pages;
pub mod session;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use crimewatch_engines::predict::PredictionAdapter;
use crimewatch_kernel_contracts::credential::{LoginRequest, Principal, RegisterRequest};
use crimewatch_kernel_contracts::predict::PredictRequest;
use crimewatch_kernel_contracts::report::{AttachmentRef, CrimeReportRecord, CrimeReportRequest};
use crimewatch_storage::{AttachmentSink, RecordStore};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
use session::{AuthenticatedPrincipal, SessionTable, SessionToken};

pub const REGISTERED_NOTICE: &str = "Registration successful! Please log in.";
pub const LOGIN_SUCCESS_NOTICE: &str = "Login successful!";
pub const LOGIN_FAILURE_NOTICE: &str = "Invalid username or password. Please try again.";
pub const LOGGED_OUT_NOTICE: &str = "Logged out successfully.";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_ready: bool,
    pub model_ready: bool,
}

/// Everything a request handler needs. Shared behind an `Arc` as router state.
#[derive(Debug)]
pub struct AppRuntime {
    config: AppConfig,
    store: RecordStore,
    attachments: AttachmentSink,
    predictor: PredictionAdapter,
    sessions: SessionTable,
}

impl AppRuntime {
    /// Prepares the record stores and upload directory. A missing model only disables `/predict`.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let store = RecordStore::open(&config.store_path);
        store.ensure_stores()?;
        let attachments = AttachmentSink::new(&config.upload_dir);
        attachments.ensure_dir()?;
        let predictor = PredictionAdapter::new(&config.model_path);
        if !predictor.is_ready() {
            warn!(
                model_path = %config.model_path.display(),
                "model artifacts not found; predictions will fail until `crimewatch fit` runs"
            );
        }
        let sessions = SessionTable::with_limits(config.session_idle_timeout, config.max_sessions);
        Ok(Self {
            config,
            store,
            attachments,
            predictor,
            sessions,
        })
    }

    pub fn default_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(AppConfig::from_env()?)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn register(&self, request: RegisterRequest) -> Result<(), AppError> {
        let record = request.into_record();
        self.store.append(&record)?;
        info!(username = %record.username, "user registered");
        Ok(())
    }

    /// Signs the session in on an exact credential match. Returns whether it matched.
    pub fn login(&self, token: &SessionToken, request: &LoginRequest) -> Result<bool, AppError> {
        match self
            .store
            .authenticate(&request.username, &request.password)?
        {
            Some(principal) => {
                self.sessions.sign_in(token, principal)?;
                info!(username = %request.username, "login succeeded");
                Ok(true)
            }
            None => {
                warn!(username = %request.username, "login failed");
                Ok(false)
            }
        }
    }

    pub fn logout(&self, token: &SessionToken) -> Result<(), AppError> {
        self.sessions.sign_out(token)
    }

    /// Looks the session's user up again in the credential store on every call.
    pub fn resolve_principal(&self, token: &SessionToken) -> Result<Option<Principal>, AppError> {
        let identity = self.sessions.identity(token)?;
        let Some(principal) = identity.principal() else {
            return Ok(None);
        };
        match self.store.find_credential(principal.username())? {
            Some(record) => Ok(Some(Principal::from_credential(&record))),
            None => {
                warn!(username = %principal.username(), "session user no longer registered");
                self.sessions.sign_out(token)?;
                Ok(None)
            }
        }
    }

    pub fn submit_report(
        &self,
        request: CrimeReportRequest,
        attachment: Option<(&str, &[u8])>,
    ) -> Result<CrimeReportRecord, AppError> {
        let stored = match attachment {
            Some((filename, bytes)) => self.attachments.store(filename, bytes)?,
            None => None,
        };
        let record = request.into_record(stored.unwrap_or(AttachmentRef::Absent));
        self.store.append(&record)?;
        info!(
            crime_type = %record.crime_type,
            location = %record.location,
            attachment = %record.attachment.as_field(),
            "crime report submitted"
        );
        Ok(record)
    }

    pub fn predict(&self, request: &PredictRequest) -> Result<f64, AppError> {
        Ok(self.predictor.predict_fresh(request)?)
    }

    pub fn health(&self) -> HealthResponse {
        let store_ready = self.store.is_ready();
        HealthResponse {
            status: if store_ready { "ok" } else { "degraded" }.to_string(),
            store_ready,
            model_ready: self.predictor.is_ready(),
        }
    }
}

pub fn router(runtime: Arc<AppRuntime>) -> Router {
    let max_upload_bytes = runtime.config().max_upload_bytes;
    Router::new()
        .route("/", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/home", get(home))
        .route("/about", get(about))
        .route("/dashboard", get(dashboard))
        .route("/report", get(report_form))
        .route("/report_crime", post(report_crime))
        .route("/predict", post(predict))
        .layer(middleware::from_fn_with_state(
            runtime.clone(),
            session::session_layer,
        ))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(runtime)
}

#[derive(Debug, Default, serde::Deserialize)]
struct RegisterForm {
    username: Option<String>,
    password: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct LoginForm {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct PredictForm {
    state: Option<String>,
    year: Option<String>,
    crime_type: Option<String>,
}

/// Keeps the body-limit status visible; every other body failure is a 400.
fn rejected(status: StatusCode, err: impl std::fmt::Display) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.to_string())
    } else {
        AppError::MalformedRequest(err.to_string())
    }
}

async fn register_form(
    State(runtime): State<Arc<AppRuntime>>,
    token: SessionToken,
) -> Result<Html<String>, AppError> {
    Ok(pages::register_page(&runtime.sessions().take_flashes(&token)?))
}

async fn register(
    State(runtime): State<Arc<AppRuntime>>,
    token: SessionToken,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|e| rejected(e.status(), e))?;
    let request = RegisterRequest::from_fields(form.username, form.password, form.email)?;
    runtime.register(request)?;
    runtime.sessions().flash(&token, REGISTERED_NOTICE)?;
    Ok(Redirect::to("/login"))
}

async fn login_form(
    State(runtime): State<Arc<AppRuntime>>,
    token: SessionToken,
) -> Result<Html<String>, AppError> {
    Ok(pages::login_page(&runtime.sessions().take_flashes(&token)?))
}

async fn login(
    State(runtime): State<Arc<AppRuntime>>,
    token: SessionToken,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|e| rejected(e.status(), e))?;
    let request = LoginRequest::from_fields(form.username, form.password)?;
    if runtime.login(&token, &request)? {
        runtime.sessions().flash(&token, LOGIN_SUCCESS_NOTICE)?;
        Ok(Redirect::to("/home"))
    } else {
        runtime.sessions().flash(&token, LOGIN_FAILURE_NOTICE)?;
        Ok(Redirect::to("/login"))
    }
}

async fn logout(
    State(runtime): State<Arc<AppRuntime>>,
    auth: AuthenticatedPrincipal,
) -> Result<Redirect, AppError> {
    runtime.logout(&auth.token)?;
    runtime.sessions().flash(&auth.token, LOGGED_OUT_NOTICE)?;
    info!(username = %auth.principal.username(), "logged out");
    Ok(Redirect::to("/login"))
}

async fn home(
    State(runtime): State<Arc<AppRuntime>>,
    auth: AuthenticatedPrincipal,
) -> Result<Html<String>, AppError> {
    let flashes = runtime.sessions().take_flashes(&auth.token)?;
    Ok(pages::home_page(auth.principal.username(), &flashes))
}

async fn about(
    State(runtime): State<Arc<AppRuntime>>,
    auth: AuthenticatedPrincipal,
) -> Result<Html<String>, AppError> {
    Ok(pages::about_page(&runtime.sessions().take_flashes(&auth.token)?))
}

async fn dashboard(
    State(runtime): State<Arc<AppRuntime>>,
    auth: AuthenticatedPrincipal,
) -> Result<Html<String>, AppError> {
    Ok(pages::dashboard_page(
        &runtime.sessions().take_flashes(&auth.token)?,
    ))
}

async fn report_form(
    State(runtime): State<Arc<AppRuntime>>,
    auth: AuthenticatedPrincipal,
) -> Result<Html<String>, AppError> {
    Ok(pages::report_page(&runtime.sessions().take_flashes(&auth.token)?))
}

async fn report_crime(
    State(runtime): State<Arc<AppRuntime>>,
    _auth: AuthenticatedPrincipal,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, AppError> {
    let mut multipart = multipart.map_err(|e| rejected(e.status(), e))?;
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut attachment: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| rejected(e.status(), e))? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "attachment" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| rejected(e.status(), e))?;
            attachment = Some((filename, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(|e| rejected(e.status(), e))?;
            fields.insert(name, value);
        }
    }

    let request = CrimeReportRequest::from_fields(
        fields.remove("name"),
        fields.remove("phone_number"),
        fields.remove("location"),
        fields.remove("crime_type"),
        fields.remove("description"),
    )?;
    runtime.submit_report(
        request,
        attachment
            .as_ref()
            .map(|(filename, bytes)| (filename.as_str(), bytes.as_slice())),
    )?;
    Ok(Redirect::to("/home"))
}

async fn predict(
    State(runtime): State<Arc<AppRuntime>>,
    _auth: AuthenticatedPrincipal,
    form: Result<Form<PredictForm>, FormRejection>,
) -> Result<Html<String>, AppError> {
    let Form(form) = form.map_err(|e| rejected(e.status(), e))?;
    let request = PredictRequest::from_fields(form.state, form.year, form.crime_type)?;
    let value = runtime.predict(&request)?;
    Ok(pages::prediction_page(
        &request.state,
        request.year,
        &request.crime_type,
        value,
    ))
}

async fn healthz(State(runtime): State<Arc<AppRuntime>>) -> (StatusCode, Json<HealthResponse>) {
    let health = runtime.health();
    let status = if health.store_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::Request;
    use axum::response::Response;
    use crimewatch_engines::artifacts::ArtifactPaths;
    use crimewatch_engines::fit::{fit, FitConfig, HistoricalDataset};
    use crimewatch_storage::RecordKind;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "crimewatch-test-boundary";

    struct Harness {
        _dir: TempDir,
        runtime: Arc<AppRuntime>,
        app: Router,
        cookie: Option<String>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(|_| {})
        }

        fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = AppConfig::rooted_at(dir.path());
            adjust(&mut config);
            let runtime = Arc::new(AppRuntime::new(config).unwrap());
            let app = router(runtime.clone());
            Self {
                _dir: dir,
                runtime,
                app,
                cookie: None,
            }
        }

        fn with_model() -> Self {
            let harness = Self::new();
            let csv = "State,Year,Rape,TypeX\nStateA,2020,5,9\nStateA,2021,6,11\nStateB,2020,2,3\n";
            let dataset = HistoricalDataset::from_reader(csv.as_bytes()).unwrap();
            let model = fit(&dataset, FitConfig::default()).unwrap();
            ArtifactPaths::new(&harness.runtime.config().model_path)
                .persist(&model.estimator, &model.encoder)
                .unwrap();
            harness
        }

        async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response {
            let builder = match &self.cookie {
                Some(cookie) => builder.header(COOKIE, cookie),
                None => builder,
            };
            let resp = self
                .app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            if let Some(set) = resp.headers().get(SET_COOKIE) {
                let pair = set.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }
            resp
        }

        async fn get(&mut self, uri: &str) -> Response {
            self.send(Request::builder().uri(uri), Body::empty()).await
        }

        async fn post_form(&mut self, uri: &str, body: &str) -> Response {
            let builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            self.send(builder, Body::from(body.to_string())).await
        }

        async fn post_multipart(&mut self, uri: &str, body: Vec<u8>) -> Response {
            let builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                );
            self.send(builder, Body::from(body)).await
        }

        async fn sign_up_and_in(&mut self) {
            self.post_form("/", "username=alice&password=pw1&email=a%40example.com")
                .await;
            let resp = self.post_form("/login", "username=alice&password=pw1").await;
            assert_eq!(location(&resp), Some("/home"));
        }
    }

    fn location(resp: &Response) -> Option<&str> {
        resp.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    const REPORT_FIELDS: [(&str, &str); 5] = [
        ("name", "Jo"),
        ("phone_number", "555-0100"),
        ("location", "Main St, Springfield"),
        ("crime_type", "Theft"),
        ("description", "Bike taken"),
    ];

    #[tokio::test]
    async fn at_http_01_register_then_login_reaches_home() {
        let mut h = Harness::new();
        let resp = h
            .post_form("/", "username=alice&password=pw1&email=a%40example.com")
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), Some("/login"));

        let page = body_text(h.get("/login").await).await;
        assert!(page.contains(REGISTERED_NOTICE));

        let resp = h.post_form("/login", "username=alice&password=pw1").await;
        assert_eq!(location(&resp), Some("/home"));

        let resp = h.get("/home").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body_text(resp).await;
        assert!(page.contains("Welcome, alice."));
        assert!(page.contains(LOGIN_SUCCESS_NOTICE));
    }

    #[tokio::test]
    async fn at_http_02_protected_routes_redirect_anonymous_sessions() {
        let mut h = Harness::new();
        for uri in ["/home", "/about", "/dashboard", "/report", "/logout"] {
            let resp = h.get(uri).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&resp), Some("/login"), "{uri}");
        }
        let resp = h
            .post_form("/predict", "state=StateA&year=2020&crime_type=Rape")
            .await;
        assert_eq!(location(&resp), Some("/login"));
    }

    #[tokio::test]
    async fn at_http_03_wrong_password_flashes_and_returns_to_login() {
        let mut h = Harness::new();
        h.post_form("/", "username=alice&password=pw1&email=a%40example.com")
            .await;
        let resp = h.post_form("/login", "username=alice&password=PW1").await;
        assert_eq!(location(&resp), Some("/login"));
        let page = body_text(h.get("/login").await).await;
        assert!(page.contains(LOGIN_FAILURE_NOTICE));
        assert_eq!(h.get("/home").await.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn at_http_04_logout_clears_the_principal() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        let resp = h.get("/logout").await;
        assert_eq!(location(&resp), Some("/login"));
        let page = body_text(h.get("/login").await).await;
        assert!(page.contains(LOGGED_OUT_NOTICE));
        assert_eq!(location(&h.get("/home").await), Some("/login"));
    }

    #[tokio::test]
    async fn at_http_05_missing_registration_field_is_rejected() {
        let mut h = Harness::new();
        let resp = h.post_form("/", "username=alice&password=pw1").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(resp).await.contains("email"));
        assert!(h.runtime.store().credentials().unwrap().is_empty());
    }

    #[tokio::test]
    async fn at_http_06_report_without_attachment_records_sentinel() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        let resp = h
            .post_multipart("/report_crime", multipart_body(&REPORT_FIELDS, None))
            .await;
        assert_eq!(location(&resp), Some("/home"));
        let reports = h.runtime.store().crime_reports().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].attachment, AttachmentRef::Absent);
        assert_eq!(reports[0].location, "Main St, Springfield");
        let raw = std::fs::read_to_string(h.runtime.store().path_for(RecordKind::CrimeReports))
            .unwrap();
        assert!(raw.ends_with(",No Attachment\r\n"));
    }

    #[tokio::test]
    async fn at_http_07_report_with_attachment_stores_identical_bytes() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        let bytes: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff, b'\r', b'\n'];
        let resp = h
            .post_multipart(
                "/report_crime",
                multipart_body(&REPORT_FIELDS, Some(("photo.png", bytes))),
            )
            .await;
        assert_eq!(location(&resp), Some("/home"));
        let reports = h.runtime.store().crime_reports().unwrap();
        let path = reports[0].attachment.path().expect("attachment stored");
        assert_eq!(std::fs::read(path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn at_http_08_empty_file_part_counts_as_no_attachment() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        h.post_multipart("/report_crime", multipart_body(&REPORT_FIELDS, Some(("", &[][..]))))
            .await;
        let reports = h.runtime.store().crime_reports().unwrap();
        assert_eq!(reports[0].attachment.as_field(), "No Attachment");
    }

    #[tokio::test]
    async fn at_http_09_predict_renders_estimate_and_rejects_unknown_labels() {
        let mut h = Harness::with_model();
        h.sign_up_and_in().await;
        let resp = h
            .post_form("/predict", "state=StateA&year=2020&crime_type=TypeX")
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("class=\"prediction\""));

        let resp = h
            .post_form("/predict", "state=Atlantis&year=2020&crime_type=TypeX")
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(resp).await.contains("Atlantis"));

        let resp = h
            .post_form("/predict", "state=StateA&year=soon&crime_type=TypeX")
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn at_http_10_predict_without_artifacts_is_a_server_error() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        let resp = h
            .post_form("/predict", "state=StateA&year=2020&crime_type=Rape")
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn at_http_11_principal_is_reresolved_against_the_store() {
        let mut h = Harness::new();
        h.sign_up_and_in().await;
        assert_eq!(h.get("/dashboard").await.status(), StatusCode::OK);
        std::fs::write(
            h.runtime.store().path_for(RecordKind::Credentials),
            "Username,Password,Email\r\n",
        )
        .unwrap();
        assert_eq!(location(&h.get("/dashboard").await), Some("/login"));
    }

    #[tokio::test]
    async fn at_http_12_healthz_reports_readiness_without_a_session() {
        let mut h = Harness::new();
        let resp = h.get("/healthz").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(SET_COOKIE).is_none());
        let health: HealthResponse = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(
            health,
            HealthResponse {
                status: "ok".to_string(),
                store_ready: true,
                model_ready: false,
            }
        );
    }

    #[tokio::test]
    async fn at_http_13_storage_failure_on_login_is_a_server_error() {
        let mut h = Harness::new();
        h.post_form("/", "username=alice&password=pw1&email=a%40example.com")
            .await;
        let path = h.runtime.store().path_for(RecordKind::Credentials);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let resp = h.post_form("/login", "username=alice&password=pw1").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let page = body_text(resp).await;
        assert!(!page.contains("user_data.csv"));
        assert_eq!(location(&h.get("/home").await), Some("/login"));
    }

    #[tokio::test]
    async fn at_http_14_oversized_upload_is_payload_too_large() {
        let mut h = Harness::with_config(|cfg| cfg.max_upload_bytes = 1024);
        h.sign_up_and_in().await;
        let bytes = vec![0xa5_u8; 4096];
        let resp = h
            .post_multipart(
                "/report_crime",
                multipart_body(&REPORT_FIELDS, Some(("big.bin", bytes.as_slice()))),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(h.runtime.store().crime_reports().unwrap().is_empty());
    }

    #[tokio::test]
    async fn at_http_15_cookieless_requests_keep_session_table_bounded() {
        let mut h = Harness::with_config(|cfg| cfg.max_sessions = 50);
        for _ in 0..500 {
            let resp = h
                .app
                .clone()
                .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().get(SET_COOKIE).is_some());
        }
        assert_eq!(h.runtime.sessions().len().unwrap(), 50);

        h.sign_up_and_in().await;
        assert_eq!(h.get("/home").await.status(), StatusCode::OK);
        assert!(h.runtime.sessions().len().unwrap() <= 50);
    }
}
