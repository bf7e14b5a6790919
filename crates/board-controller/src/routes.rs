//! Client route table and the session guard

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Home,
    Login,
    Signup,
    Board,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Board => "/board",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Home),
            "/login" => Some(Self::Login),
            "/signup" => Some(Self::Signup),
            "/board" => Some(Self::Board),
            _ => None,
        }
    }

    /// Requires a signed-in session
    pub fn is_private(self) -> bool {
        matches!(self, Self::Board)
    }
}

/// Where navigation to `route` actually lands.
///
/// Anonymous visitors are sent to the login page for private routes; signed-in
/// users skip the login and signup pages.
pub fn guard(route: Route, authenticated: bool) -> Route {
    match (route, authenticated) {
        (route, false) if route.is_private() => Route::Login,
        (Route::Login | Route::Signup, true) => Route::Board,
        (route, _) => route,
    }
}
