//! Typed API client core for the healthcare portal.
//!
//! # Overview
//! `ApiClient` issues GET/POST/PUT/PATCH/DELETE requests against a configured
//! base URL and returns either a typed success value or a single `ApiError`.
//! Failed responses go through the normalizer, which extracts the most useful
//! message it can from whatever the backend sent. On top of the client sit
//! the role redirection policy, an explicit session manager, and the auth
//! flows (`AuthApi`) that tie them together.
//!
//! # Design
//! - `ApiClient` is stateless apart from its immutable `ClientConfig`, and is
//!   cheap to clone and share between tasks.
//! - Network I/O sits behind the `Transport` trait; `ReqwestTransport` is the
//!   default. The request-building and response-parsing halves are public so
//!   a host can do its own I/O.
//! - Status `0` on an `ApiError` always means no response was received.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod role;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::{AuthApi, LoginOutcome};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::{ErrorBody, ErrorResponse};
pub use role::{redirect_for, redirect_path, Role};
pub use session::{MemorySessionStore, Session, SessionManager, SessionStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AuthUser, ForgotPasswordRequest, Invitation, InvitationRequest, LoginRequest, LoginResponse,
    MessageResponse, Profile, ProfileDetails, ProfileUpdate, SignupRequest,
};
