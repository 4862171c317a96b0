#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use crimewatch_kernel_contracts::credential::{Principal, SessionIdentity};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, error};

use crate::error::AppError;
use crate::AppRuntime;

pub const SESSION_COOKIE_NAME: &str = "crimewatch_session";
pub const LOGIN_REQUIRED_NOTICE: &str = "Please log in to access this page.";
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
const TOKEN_BYTES: usize = 32;

/// Opaque cookie value naming one entry of the [`SessionTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

#[derive(Debug, Clone)]
struct SessionEntry {
    identity: SessionIdentity,
    flashes: Vec<String>,
    last_seen: Instant,
    seen_tick: u64,
}

impl SessionEntry {
    fn new(now: Instant, tick: u64) -> Self {
        Self {
            identity: SessionIdentity::Anonymous,
            flashes: Vec::new(),
            last_seen: now,
            seen_tick: tick,
        }
    }
}

/// In-memory sessions keyed by token. Lost on restart.
///
/// Entries idle longer than `idle_timeout` are dropped, and the table never holds more
/// than `max_sessions`: creating one past the cap evicts the least recently seen entry.
#[derive(Debug, Clone)]
pub struct SessionTable {
    inner: Arc<Mutex<BTreeMap<String, SessionEntry>>>,
    ticks: Arc<AtomicU64>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
            ticks: Arc::new(AtomicU64::new(0)),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn len(&self) -> Result<usize, AppError> {
        self.with_sessions(|sessions| sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len()? == 0)
    }

    pub fn create(&self) -> Result<SessionToken, AppError> {
        let mut raw = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut raw);
        let token = URL_SAFE_NO_PAD.encode(raw);
        let now = Instant::now();
        let tick = self.next_tick();
        let (idle_timeout, max_sessions) = (self.idle_timeout, self.max_sessions);
        let evicted = self.with_sessions(|sessions| {
            let before = sessions.len();
            sessions.retain(|_, entry| now.duration_since(entry.last_seen) < idle_timeout);
            while sessions.len() >= max_sessions {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, entry)| (entry.last_seen, entry.seen_tick))
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        sessions.remove(&key);
                    }
                    None => break,
                }
            }
            let evicted = before - sessions.len();
            sessions.insert(token.clone(), SessionEntry::new(now, tick));
            evicted
        })?;
        if evicted > 0 {
            debug!(evicted, "evicted idle or overflow sessions");
        }
        Ok(SessionToken(token))
    }

    /// Marks a live session as seen. Unknown and idle-expired tokens return `false`.
    pub fn touch(&self, token: &SessionToken) -> Result<bool, AppError> {
        let now = Instant::now();
        let tick = self.next_tick();
        let idle_timeout = self.idle_timeout;
        self.with_sessions(|sessions| {
            let expired = match sessions.get_mut(&token.0) {
                None => return false,
                Some(entry) => {
                    if now.duration_since(entry.last_seen) < idle_timeout {
                        entry.last_seen = now;
                        entry.seen_tick = tick;
                        false
                    } else {
                        true
                    }
                }
            };
            if expired {
                sessions.remove(&token.0);
            }
            !expired
        })
    }

    pub fn identity(&self, token: &SessionToken) -> Result<SessionIdentity, AppError> {
        self.with_sessions(|sessions| {
            sessions
                .get(&token.0)
                .map(|entry| entry.identity.clone())
                .unwrap_or_default()
        })
    }

    pub fn sign_in(&self, token: &SessionToken, principal: Principal) -> Result<(), AppError> {
        self.with_entry(token, |entry| {
            entry.identity = SessionIdentity::Authenticated(principal)
        })
    }

    pub fn sign_out(&self, token: &SessionToken) -> Result<(), AppError> {
        self.with_entry(token, |entry| entry.identity = SessionIdentity::Anonymous)
    }

    pub fn flash(&self, token: &SessionToken, message: impl Into<String>) -> Result<(), AppError> {
        let message = message.into();
        self.with_entry(token, |entry| entry.flashes.push(message))
    }

    /// Drains pending notices; each is shown once.
    pub fn take_flashes(&self, token: &SessionToken) -> Result<Vec<String>, AppError> {
        self.with_sessions(|sessions| {
            sessions
                .get_mut(&token.0)
                .map(|entry| std::mem::take(&mut entry.flashes))
                .unwrap_or_default()
        })
    }

    /// Evicted tokens are left alone; only [`SessionTable::create`] adds entries.
    fn with_entry(
        &self,
        token: &SessionToken,
        f: impl FnOnce(&mut SessionEntry),
    ) -> Result<(), AppError> {
        self.with_sessions(|sessions| {
            if let Some(entry) = sessions.get_mut(&token.0) {
                f(entry);
            }
        })
    }

    fn next_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }

    fn with_sessions<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, SessionEntry>) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.lock().map_err(|_| AppError::SessionPoisoned)?;
        Ok(f(&mut sessions))
    }
}

/// Attaches a [`SessionToken`] to every request, issuing a cookie for unknown or missing ones.
pub async fn session_layer(
    State(runtime): State<Arc<AppRuntime>>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = cookie_token(request.headers().get_all(COOKIE).iter());
    let known = match presented {
        Some(token) => match runtime.sessions().touch(&token) {
            Ok(true) => Some(token),
            Ok(false) => None,
            Err(err) => return err.into_response(),
        },
        None => None,
    };
    let (token, issued) = match known {
        Some(token) => (token, false),
        None => match runtime.sessions().create() {
            Ok(token) => (token, true),
            Err(err) => return err.into_response(),
        },
    };

    request.extensions_mut().insert(token.clone());
    let mut response = next.run(request).await;
    if issued {
        let cookie = format!(
            "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
            token.0
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => error!(error = %err, "session cookie is not a valid header value"),
        }
    }
    response
}

fn cookie_token<'a>(headers: impl Iterator<Item = &'a HeaderValue>) -> Option<SessionToken> {
    headers
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| SessionToken(value.to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .ok_or(AppError::SessionMissing)
    }
}

/// Guard for protected routes. Anonymous sessions are redirected to `/login`.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub token: SessionToken,
    pub principal: Principal,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppRuntime>> for AuthenticatedPrincipal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        runtime: &Arc<AppRuntime>,
    ) -> Result<Self, Self::Rejection> {
        let token = SessionToken::from_request_parts(parts, runtime)
            .await
            .map_err(IntoResponse::into_response)?;
        match runtime.resolve_principal(&token) {
            Ok(Some(principal)) => Ok(Self { token, principal }),
            Ok(None) => {
                if let Err(err) = runtime.sessions().flash(&token, LOGIN_REQUIRED_NOTICE) {
                    return Err(err.into_response());
                }
                Err(Redirect::to("/login").into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}
