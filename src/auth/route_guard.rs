use log::debug;
use tokio::sync::watch;

use super::admin_session::AdminSessionStore;
use super::session::SessionSnapshot;
use crate::constants::{
    ADMIN_ENTRY_ROUTE, BUSINESS_ROUTE, CITIZEN_ROUTE, GOVERNMENT_ROUTE, HOME_ROUTE, LOGIN_ROUTE,
};
use crate::models::Role;

/// What a protected view should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet: neutral loading state, no content.
    Pending,
    Authorized,
    /// Render nothing and navigate to the route.
    Redirect(String),
}

/// Role gate for the primary session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    allowed_roles: Vec<Role>,
    redirect_to: String,
}

impl RouteGuard {
    /// Guard admitting the given roles. An empty set admits any signed-in
    /// user.
    pub fn new(allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed_roles: allowed_roles.into_iter().collect(),
            redirect_to: LOGIN_ROUTE.to_string(),
        }
    }

    pub fn any_authenticated() -> Self {
        Self::new(Vec::new())
    }

    /// Route for visitors who are not signed in.
    #[must_use]
    pub fn with_redirect(mut self, route: impl Into<String>) -> Self {
        self.redirect_to = route.into();
        self
    }

    pub fn allowed_roles(&self) -> &[Role] {
        &self.allowed_roles
    }

    pub fn evaluate(&self, session: &SessionSnapshot) -> GuardDecision {
        if session.loading {
            return GuardDecision::Pending;
        }

        let user = match (&session.user, session.is_authenticated()) {
            (Some(user), true) => user,
            _ => return GuardDecision::Redirect(self.redirect_to.clone()),
        };

        if user.is_superuser()
            || self.allowed_roles.is_empty()
            || user.role.is_some_and(|role| self.allowed_roles.contains(&role))
        {
            return GuardDecision::Authorized;
        }

        let landing = user.role.map_or(HOME_ROUTE, Role::landing_route);
        debug!("{} lacks the role for this route, sending to {}", user.email, landing);
        GuardDecision::Redirect(landing.to_string())
    }

    /// Waits until the session resolves, then decides. A closed channel
    /// counts as signed out.
    pub async fn resolve(&self, session: &mut watch::Receiver<SessionSnapshot>) -> GuardDecision {
        match session.wait_for(SessionSnapshot::is_resolved).await {
            Ok(snapshot) => self.evaluate(&snapshot),
            Err(_) => GuardDecision::Redirect(self.redirect_to.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGuardState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Gate for the admin area, decided once per mount from stored admin
/// credentials. Never calls the server.
#[derive(Debug, Clone)]
pub struct AdminRouteGuard {
    state: AdminGuardState,
    redirect_to: String,
}

impl Default for AdminRouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminRouteGuard {
    pub fn new() -> Self {
        Self {
            state: AdminGuardState::Unknown,
            redirect_to: ADMIN_ENTRY_ROUTE.to_string(),
        }
    }

    pub const fn state(&self) -> AdminGuardState {
        self.state
    }

    /// Reads storage on the first call only; later calls on the same
    /// instance return the settled decision.
    pub async fn mount(&mut self, admin: &AdminSessionStore) -> GuardDecision {
        if self.state == AdminGuardState::Unknown {
            self.state = if admin.has_credentials().await {
                AdminGuardState::Authenticated
            } else {
                AdminGuardState::Unauthenticated
            };
        }
        self.decision()
    }

    pub fn decision(&self) -> GuardDecision {
        match self.state {
            AdminGuardState::Unknown => GuardDecision::Pending,
            AdminGuardState::Authenticated => GuardDecision::Authorized,
            AdminGuardState::Unauthenticated => GuardDecision::Redirect(self.redirect_to.clone()),
        }
    }
}

/// Which gate protects a portal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Session(RouteGuard),
    Admin,
}

fn within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Route table of the portal.
pub fn route_access(path: &str) -> RouteAccess {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };

    if within(path, ADMIN_ENTRY_ROUTE) {
        return match path {
            "/admin" | "/admin/login" => RouteAccess::Public,
            _ => RouteAccess::Admin,
        };
    }
    if within(path, CITIZEN_ROUTE) {
        return RouteAccess::Session(RouteGuard::new([Role::Citizen]));
    }
    if within(path, BUSINESS_ROUTE) {
        return RouteAccess::Session(RouteGuard::new([Role::Business]));
    }
    if within(path, GOVERNMENT_ROUTE) {
        return RouteAccess::Session(RouteGuard::new([Role::Government]));
    }
    if within(path, "/profile") || within(path, "/settings") {
        return RouteAccess::Session(RouteGuard::any_authenticated());
    }
    RouteAccess::Public
}
