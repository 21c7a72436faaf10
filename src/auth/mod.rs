pub mod admin_session;
pub mod header_utils;
pub mod route_guard;
pub mod session;
pub mod session_store;

pub use admin_session::{AdminCredentials, AdminSessionStore, AdminVerification};
pub use route_guard::{AdminGuardState, AdminRouteGuard, GuardDecision, RouteAccess, RouteGuard, route_access};
pub use session::{
    AuthFailure, FailureKind, ProfileFetchOutcome, SessionSnapshot, SessionStatus, SignupOutcome,
};
pub use session_store::SessionStore;
