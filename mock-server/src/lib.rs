//! In-memory mock of the portal's auth REST backend.
//!
//! Seeded with one account per role (plus one whose role the portal does not
//! know) so clients can exercise every login redirect. Failures deliberately
//! come back in the shapes real backends use: JSON `{message}` / `{error}`
//! bodies, plain-text bodies, and axum's own text rejections for malformed
//! JSON.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const SEED_PASSWORD: &str = "password123";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ForgotInput {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Serialize)]
struct LoginBody {
    token: String,
    user: SessionUser,
}

#[derive(Serialize)]
struct SessionUser {
    email: String,
    role: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

/// Error responses, in the shapes the portal has to cope with.
#[derive(Debug)]
pub enum Failure {
    /// `{"message": ...}`
    Message(StatusCode, &'static str),
    /// `{"error": ...}`
    Error(StatusCode, &'static str),
    /// `text/plain` body.
    Text(StatusCode, &'static str),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::Message(status, message) => {
                (status, Json(serde_json::json!({ "message": message }))).into_response()
            }
            Failure::Error(status, error) => {
                (status, Json(serde_json::json!({ "error": error }))).into_response()
            }
            Failure::Text(status, text) => {
                (status, [(header::CONTENT_TYPE, "text/plain")], text).into_response()
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    invitations: Vec<Invitation>,
}

impl Store {
    /// One account per portal role plus `nurse@portal.test`, whose role the
    /// portal does not recognize. All use `SEED_PASSWORD`.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for (role, first, last) in [
            ("admin", "Ada", "Admin"),
            ("doctor", "Gregory", "House"),
            ("patient", "Pat", "Jones"),
            ("nurse", "Nora", "Nightingale"),
        ] {
            store.insert_user(User {
                email: format!("{role}@portal.test"),
                password: SEED_PASSWORD.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                role: role.to_string(),
            });
        }
        store
    }

    fn insert_user(&mut self, user: User) {
        self.users.insert(user.email.clone(), user);
    }

    fn user_for_token(&self, token: &str) -> Option<&User> {
        self.sessions.get(token).and_then(|email| self.users.get(email))
    }

    pub fn invitations(&self) -> &[Invitation] {
        &self.invitations
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_db(Arc::new(RwLock::new(Store::seeded())))
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/forgot", post(forgot_password))
        .route("/auth/send-invitation", post(send_invitation))
        .route("/auth/me", get(get_profile).put(replace_profile).patch(update_profile))
        .route("/auth/session", delete(end_session))
        .route("/status/{code}", get(simulate_status))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticated<'a>(store: &'a Store, headers: &HeaderMap) -> Result<&'a User, Failure> {
    bearer_token(headers)
        .and_then(|token| store.user_for_token(token))
        .ok_or(Failure::Text(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid bearer token",
        ))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginBody>, Failure> {
    let mut store = db.write().await;
    let user = store
        .users
        .get(&input.email)
        .filter(|user| user.password == input.password)
        .cloned()
        .ok_or(Failure::Message(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), user.email.clone());
    info!(role = %user.role, "session issued");
    Ok(Json(LoginBody {
        token,
        user: SessionUser {
            email: user.email,
            role: user.role,
        },
    }))
}

async fn signup(
    State(db): State<Db>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<MessageBody>), Failure> {
    if input.password != input.confirm_password {
        return Err(Failure::Error(StatusCode::BAD_REQUEST, "Passwords don't match"));
    }
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(Failure::Error(StatusCode::CONFLICT, "Email already registered"));
    }
    store.insert_user(User {
        email: input.email,
        password: input.password,
        first_name: String::new(),
        last_name: String::new(),
        role: "patient".to_string(),
    });
    Ok((
        StatusCode::CREATED,
        Json(MessageBody {
            message: "Account created successfully",
        }),
    ))
}

async fn forgot_password(
    State(db): State<Db>,
    Json(input): Json<ForgotInput>,
) -> Result<Json<MessageBody>, Failure> {
    let store = db.read().await;
    if !store.users.contains_key(&input.email) {
        return Err(Failure::Message(StatusCode::NOT_FOUND, "No account for that email"));
    }
    Ok(Json(MessageBody { message: "OTP sent" }))
}

async fn send_invitation(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<InvitationInput>,
) -> Result<(StatusCode, Json<Invitation>), Failure> {
    let mut store = db.write().await;
    let inviter = authenticated(&store, &headers)?;
    if inviter.role != "admin" {
        return Err(Failure::Error(StatusCode::FORBIDDEN, "Forbidden"));
    }
    let invitation = Invitation {
        id: Uuid::new_v4(),
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        role: input.role,
    };
    store.invitations.push(invitation.clone());
    info!(role = %invitation.role, "invitation sent");
    Ok((StatusCode::CREATED, Json(invitation)))
}

async fn get_profile(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    let store = db.read().await;
    authenticated(&store, &headers).cloned().map(Json)
}

async fn replace_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProfileInput>,
) -> Result<Json<User>, Failure> {
    let mut store = db.write().await;
    let email = authenticated(&store, &headers)?.email.clone();
    let user = store
        .users
        .get_mut(&email)
        .ok_or(Failure::Message(StatusCode::NOT_FOUND, "User not found"))?;
    user.first_name = input.first_name;
    user.last_name = input.last_name;
    Ok(Json(user.clone()))
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProfilePatch>,
) -> Result<Json<User>, Failure> {
    let mut store = db.write().await;
    let email = authenticated(&store, &headers)?.email.clone();
    let user = store
        .users
        .get_mut(&email)
        .ok_or(Failure::Message(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(first_name) = input.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        user.last_name = last_name;
    }
    Ok(Json(user.clone()))
}

async fn end_session(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let token = bearer_token(&headers)
        .filter(|token| store.sessions.contains_key(*token))
        .map(str::to_string)
        .ok_or(Failure::Text(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid bearer token",
        ))?;
    store.sessions.remove(&token);
    Ok(StatusCode::NO_CONTENT)
}

/// Answer with `code` and its canonical reason phrase as plain text.
async fn simulate_status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    (status, [(header::CONTENT_TYPE, "text/plain")], reason).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serialization_hides_password() {
        let store = Store::seeded();
        let user = store.users.get("doctor@portal.test").unwrap();
        let json = serde_json::to_value(user).unwrap();
        assert_eq!(json["email"], "doctor@portal.test");
        assert_eq!(json["firstName"], "Gregory");
        assert_eq!(json["role"], "doctor");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn seeded_store_has_one_account_per_role() {
        let store = Store::seeded();
        for role in ["admin", "doctor", "patient", "nurse"] {
            let user = store.users.get(&format!("{role}@portal.test")).unwrap();
            assert_eq!(user.role, role);
            assert_eq!(user.password, SEED_PASSWORD);
        }
    }

    #[test]
    fn signup_input_reads_camel_case() {
        let input: SignupInput = serde_json::from_str(
            r#"{"email":"a@b.co","password":"secret1","confirmPassword":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(input.confirm_password, "secret1");
    }

    #[test]
    fn signup_input_rejects_missing_confirmation() {
        let result: Result<SignupInput, _> =
            serde_json::from_str(r#"{"email":"a@b.co","password":"secret1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn profile_patch_fields_optional() {
        let input: ProfilePatch = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.first_name.is_none());
        assert!(input.last_name.is_none());
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
