//! Auth flows the portal drives through `ApiClient`.
//!
//! `AuthApi` pairs a client with a `SessionManager`. Login saves the session
//! and picks the redirect destination from the returned role; logout clears
//! it. Calls that need authentication attach the session's bearer token.

use serde::de::IgnoredAny;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::role::{redirect_path, Role};
use crate::session::{MemorySessionStore, Session, SessionManager, SessionStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    ForgotPasswordRequest, Invitation, InvitationRequest, LoginRequest, LoginResponse,
    MessageResponse, Profile, ProfileDetails, ProfileUpdate, SignupRequest,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const OTP_PATH: &str = "/auth/otp";

const LOGIN_ENDPOINT: &str = "/auth/login";
const SIGNUP_ENDPOINT: &str = "/auth/signup";
const FORGOT_ENDPOINT: &str = "/auth/forgot";
const INVITATION_ENDPOINT: &str = "/auth/send-invitation";
const PROFILE_ENDPOINT: &str = "/auth/me";
const SESSION_ENDPOINT: &str = "/auth/session";

/// Result of a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    pub role: Option<Role>,
    pub destination: &'static str,
}

/// Route of the one-time-password page for `email`.
pub fn otp_path(email: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(email.as_bytes()).collect();
    format!("{OTP_PATH}?email={encoded}")
}

#[derive(Debug)]
pub struct AuthApi<T = ReqwestTransport, S = MemorySessionStore> {
    client: ApiClient<T>,
    session: SessionManager<S>,
}

impl<T: Transport> AuthApi<T, MemorySessionStore> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self::with_session(client, SessionManager::default())
    }
}

impl<T: Transport, S: SessionStore> AuthApi<T, S> {
    pub fn with_session(client: ApiClient<T>, session: SessionManager<S>) -> Self {
        Self { client, session }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    /// Authenticate, store the session, and pick the dashboard to open.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        let response: LoginResponse = self
            .client
            .post(LOGIN_ENDPOINT, Some(request), &[])
            .await?;
        let role = response.user.role;
        self.session.save(Session::new(response.token, role));
        let destination = redirect_path(role);
        info!(?role, destination, "login succeeded");
        Ok(LoginOutcome { role, destination })
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        self.client.post(SIGNUP_ENDPOINT, Some(request), &[]).await
    }

    /// Request a password reset code. Returns the OTP route to open next.
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<String, ApiError> {
        let _: IgnoredAny = self.client.post(FORGOT_ENDPOINT, Some(request), &[]).await?;
        Ok(otp_path(&request.email))
    }

    pub async fn send_invitation(&self, request: &InvitationRequest) -> Result<Invitation, ApiError> {
        let headers = self.auth_headers();
        self.client
            .post(INVITATION_ENDPOINT, Some(request), &headers)
            .await
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.client.get(PROFILE_ENDPOINT, &self.auth_headers()).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let headers = self.auth_headers();
        self.client.patch(PROFILE_ENDPOINT, Some(update), &headers).await
    }

    pub async fn replace_profile(&self, details: &ProfileDetails) -> Result<Profile, ApiError> {
        let headers = self.auth_headers();
        self.client.put(PROFILE_ENDPOINT, Some(details), &headers).await
    }

    /// End the session on the server and locally. The local session is
    /// cleared even when the server call fails.
    pub async fn logout(&self) -> Result<&'static str, ApiError> {
        let headers = self.auth_headers();
        self.session.clear();
        match self
            .client
            .delete::<IgnoredAny>(SESSION_ENDPOINT, &headers)
            .await
        {
            Ok(_) => Ok(LOGIN_PATH),
            Err(err) => {
                warn!(status = err.status(), "server-side logout failed");
                Err(err)
            }
        }
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        self.session.bearer_header().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Replays queued responses in order and keeps the requests it saw.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<HttpResponse>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies.lock().unwrap().push_back(HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.to_string(),
            });
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::new("no scripted reply left"))
        }
    }

    fn api(transport: ScriptedTransport) -> AuthApi<ScriptedTransport> {
        AuthApi::new(ApiClient::with_transport(
            ClientConfig::new("http://portal.test"),
            transport,
        ))
    }

    fn login_request() -> LoginRequest {
        LoginRequest {
            email: "admin@portal.test".to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn login_saves_session_and_redirects_by_role() {
        let api = api(ScriptedTransport::default().reply(200, r#"{"token":"t-1","user":{"role":"admin"}}"#));

        let outcome = api.login(&login_request()).await.unwrap();
        assert_eq!(outcome.role, Some(Role::Admin));
        assert_eq!(outcome.destination, "/admin/dashboard");
        assert_eq!(api.session().load(), Some(Session::new("t-1", Some(Role::Admin))));
    }

    #[tokio::test]
    async fn login_with_unknown_role_goes_to_root() {
        let api = api(ScriptedTransport::default().reply(200, r#"{"token":"t-2","user":{"role":"nurse"}}"#));
        let outcome = api.login(&login_request()).await.unwrap();
        assert_eq!(outcome.destination, "/");
        assert!(api.session().is_authenticated());
    }

    #[tokio::test]
    async fn failed_login_leaves_no_session() {
        let api = api(ScriptedTransport::default().reply(401, r#"{"message":"Invalid credentials"}"#));
        let err = api.login(&login_request()).await.unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(err.message(), "Invalid credentials");
        assert!(api.session().load().is_none());
    }

    #[tokio::test]
    async fn invitation_carries_bearer_token() {
        let api = api(
            ScriptedTransport::default()
                .reply(200, r#"{"token":"admin-token","user":{"role":"admin"}}"#)
                .reply(
                    201,
                    r#"{"id":"inv-1","email":"house@portal.test","firstName":"Gregory","lastName":"House","role":"doctor"}"#,
                ),
        );
        api.login(&login_request()).await.unwrap();

        let invitation = api
            .send_invitation(&InvitationRequest {
                email: "house@portal.test".to_string(),
                first_name: "Gregory".to_string(),
                last_name: "House".to_string(),
                role: Role::Doctor,
            })
            .await
            .unwrap();
        assert_eq!(invitation.role, Some(Role::Doctor));

        let sent = api.client().transport().sent.lock().unwrap();
        let request = sent.last().unwrap();
        assert_eq!(request.url, "http://portal.test/auth/send-invitation");
        assert_eq!(request.header("authorization"), Some("Bearer admin-token"));
    }

    #[tokio::test]
    async fn forgot_password_returns_encoded_otp_route() {
        let api = api(ScriptedTransport::default().reply(200, r#"{"message":"OTP sent"}"#));
        let next = api
            .forgot_password(&ForgotPasswordRequest {
                email: "pat+1@portal.test".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(next, "/auth/otp?email=pat%2B1%40portal.test");
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_server_fails() {
        let api = api(
            ScriptedTransport::default()
                .reply(200, r#"{"token":"t-3","user":{"role":"patient"}}"#)
                .reply(500, r#"{"error":"Session store unavailable"}"#),
        );
        api.login(&login_request()).await.unwrap();

        let err = api.logout().await.unwrap_err();
        assert_eq!(err.message(), "Session store unavailable");
        assert!(api.session().load().is_none());

        let sent = api.client().transport().sent.lock().unwrap();
        let request = sent.last().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.header("Authorization"), Some("Bearer t-3"));
    }

    #[test]
    fn otp_path_encodes_email() {
        assert_eq!(otp_path("doc@portal.test"), "/auth/otp?email=doc%40portal.test");
    }
}
