//! Route gate: the per-route policy check that runs before any view logic.

use crate::flow::session::Session;

pub const HOME_PATH: &str = "/";
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";

/// Declared access policy for a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Reachable only with a session; anonymous callers go to the sign-in
    /// surface.
    RequiresAuth,
    /// Reachable only without a session; authenticated callers go to
    /// `authenticated_target` (home for the sign-in surface, sign-in for the
    /// sign-up surface).
    RequiresAnon { authenticated_target: &'static str },
}

/// Outcome of a gate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    Redirect(&'static str),
}

/// Decide whether a route renders or redirects.
///
/// Pure function of the policy and session presence; the caller performs the
/// session lookup so the decision itself cannot depend on request order.
#[must_use]
pub fn guard(policy: RoutePolicy, session: Option<&Session>) -> GateDecision {
    match (policy, session) {
        (RoutePolicy::RequiresAuth, None) => GateDecision::Redirect(SIGN_IN_PATH),
        (RoutePolicy::RequiresAuth, Some(_)) => GateDecision::Render,
        (
            RoutePolicy::RequiresAnon {
                authenticated_target,
            },
            Some(_),
        ) => GateDecision::Redirect(authenticated_target),
        (RoutePolicy::RequiresAnon { .. }, None) => GateDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::session::UserProfile;
    use uuid::Uuid;

    fn session() -> Session {
        Session::new(
            "tok".to_string(),
            UserProfile {
                id: Uuid::new_v4(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
    }

    #[test]
    fn anonymous_protected_route_redirects_to_sign_in() {
        assert_eq!(
            guard(RoutePolicy::RequiresAuth, None),
            GateDecision::Redirect(SIGN_IN_PATH)
        );
    }

    #[test]
    fn authenticated_protected_route_renders() {
        let session = session();
        assert_eq!(
            guard(RoutePolicy::RequiresAuth, Some(&session)),
            GateDecision::Render
        );
    }

    #[test]
    fn authenticated_sign_in_surface_redirects_home() {
        let session = session();
        assert_eq!(
            guard(
                RoutePolicy::RequiresAnon {
                    authenticated_target: HOME_PATH
                },
                Some(&session)
            ),
            GateDecision::Redirect(HOME_PATH)
        );
    }

    #[test]
    fn authenticated_sign_up_surface_redirects_to_sign_in() {
        let session = session();
        assert_eq!(
            guard(
                RoutePolicy::RequiresAnon {
                    authenticated_target: SIGN_IN_PATH
                },
                Some(&session)
            ),
            GateDecision::Redirect(SIGN_IN_PATH)
        );
    }

    #[test]
    fn anonymous_anon_surface_renders() {
        assert_eq!(
            guard(
                RoutePolicy::RequiresAnon {
                    authenticated_target: HOME_PATH
                },
                None
            ),
            GateDecision::Render
        );
    }

    #[test]
    fn decision_is_a_function_of_policy_and_presence() {
        // Same inputs, any order, same outputs.
        let session = session();
        let checks = [
            (RoutePolicy::RequiresAuth, true),
            (
                RoutePolicy::RequiresAnon {
                    authenticated_target: HOME_PATH,
                },
                false,
            ),
            (RoutePolicy::RequiresAuth, false),
            (RoutePolicy::RequiresAuth, true),
        ];
        let run = |(policy, present): (RoutePolicy, bool)| {
            guard(policy, present.then_some(&session))
        };
        let first: Vec<_> = checks.iter().copied().map(run).collect();
        let second: Vec<_> = checks.iter().rev().copied().map(run).collect();
        assert_eq!(first[0], second[3]);
        assert_eq!(first[3], second[0]);
    }
}
