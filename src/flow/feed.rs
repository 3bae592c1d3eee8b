//! Live session state for session-aware views.
//!
//! The one-shot verifier answers "is this request authenticated"; the feed
//! answers "what should this view show right now" and keeps answering as
//! sign-in and sign-out happen in the same browsing context. Consumers own
//! an explicit subscription handle (subscribe on mount, drop on unmount);
//! the feed is not a global.

use axum::http::HeaderMap;
use tokio::sync::watch;
use tracing::error;

use crate::flow::bridge::{AuthError, IdentityBridge};
use crate::flow::gate::SIGN_IN_PATH;
use crate::flow::session::{Session, SessionStore, StoreError};

/// What a session-aware view should currently present.
#[derive(Clone, Debug)]
pub enum SessionState {
    /// No determination yet. Views render a placeholder and must not assume
    /// unauthenticated.
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Loading | SessionState::Unauthenticated => None,
        }
    }
}

/// Publisher side of the live session state. Starts in
/// [`SessionState::Loading`] until the first determination arrives.
pub struct SessionFeed {
    tx: watch::Sender<SessionState>,
}

impl SessionFeed {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::Loading);
        Self { tx }
    }

    /// Subscription handle for one consuming view.
    #[must_use]
    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish a fresh determination.
    pub fn publish(&self, session: Option<Session>) {
        let state = session.map_or(SessionState::Unauthenticated, SessionState::Authenticated);
        self.tx.send_replace(state);
    }

    /// Re-read the store and publish the result.
    ///
    /// # Errors
    ///
    /// A store outage leaves the last known state in place and returns the
    /// error; it is never published as "unauthenticated".
    pub async fn refresh<S>(&self, store: &S, headers: &HeaderMap) -> Result<(), StoreError>
    where
        S: SessionStore + ?Sized,
    {
        match store.get_session(headers).await {
            Ok(session) => {
                self.publish(session);
                Ok(())
            }
            Err(err) => {
                error!("Session refresh failed: {err}");
                Err(err)
            }
        }
    }

    /// Ask the bridge to invalidate the current session. On success the feed
    /// flips to unauthenticated and the caller navigates to the returned
    /// sign-in surface.
    ///
    /// # Errors
    ///
    /// Bridge failures leave the current state untouched.
    pub async fn sign_out<B>(&self, bridge: &B) -> Result<&'static str, AuthError>
    where
        B: IdentityBridge + ?Sized,
    {
        let token = self
            .tx
            .borrow()
            .session()
            .map(|session| session.token().to_string())
            .unwrap_or_default();

        bridge.sign_out(&token).await?;
        self.tx.send_replace(SessionState::Unauthenticated);
        Ok(SIGN_IN_PATH)
    }
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription handle owned by one consuming view.
pub struct SessionWatch {
    rx: watch::Receiver<SessionState>,
}

impl SessionWatch {
    /// The state the view should render right now.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change. `None` when the feed is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::bridge::{AuthResult, Provider, SocialRedirect};
    use crate::flow::session::UserProfile;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::Mutex;
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

    struct FixedStore {
        result: Result<Option<Session>, StoreError>,
    }

    #[async_trait]
    impl SessionStore for FixedStore {
        async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, StoreError> {
            self.result.clone()
        }
    }

    struct RecordingBridge {
        signed_out: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingBridge {
        fn new(fail: bool) -> Self {
            Self {
                signed_out: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl IdentityBridge for RecordingBridge {
        async fn sign_up(&self, _email: &str, _password: &SecretString, _name: &str) -> AuthResult {
            Err(AuthError::Unavailable("not under test".to_string()))
        }

        async fn sign_in(&self, _email: &str, _password: &SecretString) -> AuthResult {
            Err(AuthError::Unavailable("not under test".to_string()))
        }

        async fn sign_in_social(
            &self,
            _provider: &Provider,
            _callback: &str,
        ) -> Result<SocialRedirect, AuthError> {
            Err(AuthError::Unavailable("not under test".to_string()))
        }

        async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
            if self.fail {
                return Err(AuthError::Unavailable("sign-out failed".to_string()));
            }
            self.signed_out.lock().unwrap().push(token.to_string());
            Ok(())
        }
    }

    #[test]
    fn feed_starts_loading() {
        let feed = SessionFeed::new();
        let watch = feed.subscribe();
        assert!(matches!(watch.current(), SessionState::Loading));
        assert!(watch.current().session().is_none());
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let feed = SessionFeed::new();
        let mut watch = feed.subscribe();

        feed.publish(Some(session()));
        let state = watch.changed().await.expect("feed alive");
        assert!(matches!(state, SessionState::Authenticated(_)));

        feed.publish(None);
        let state = watch.changed().await.expect("feed alive");
        assert!(matches!(state, SessionState::Unauthenticated));
    }

    #[tokio::test]
    async fn refresh_hydrates_from_the_store() {
        let feed = SessionFeed::new();
        let store = FixedStore {
            result: Ok(Some(session())),
        };
        feed.refresh(&store, &HeaderMap::new()).await.unwrap();
        assert!(matches!(
            feed.subscribe().current(),
            SessionState::Authenticated(_)
        ));

        let store = FixedStore { result: Ok(None) };
        feed.refresh(&store, &HeaderMap::new()).await.unwrap();
        assert!(matches!(
            feed.subscribe().current(),
            SessionState::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn store_outage_never_reads_as_unauthenticated() {
        let feed = SessionFeed::new();
        feed.publish(Some(session()));

        let store = FixedStore {
            result: Err(StoreError::Unavailable("down".to_string())),
        };
        let result = feed.refresh(&store, &HeaderMap::new()).await;
        assert!(result.is_err());
        // Last known state survives the outage.
        assert!(matches!(
            feed.subscribe().current(),
            SessionState::Authenticated(_)
        ));
    }

    #[tokio::test]
    async fn sign_out_flips_state_and_redirects_to_sign_in() {
        let feed = SessionFeed::new();
        feed.publish(Some(session()));
        let mut watch = feed.subscribe();

        let bridge = RecordingBridge::new(false);
        let target = feed.sign_out(&bridge).await.unwrap();
        assert_eq!(target, "/sign-in");
        assert_eq!(*bridge.signed_out.lock().unwrap(), vec!["tok".to_string()]);

        let state = watch.changed().await.expect("feed alive");
        assert!(matches!(state, SessionState::Unauthenticated));
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_current_state() {
        let feed = SessionFeed::new();
        feed.publish(Some(session()));

        let bridge = RecordingBridge::new(true);
        assert!(feed.sign_out(&bridge).await.is_err());
        assert!(matches!(
            feed.subscribe().current(),
            SessionState::Authenticated(_)
        ));
    }

    #[tokio::test]
    async fn sign_in_and_out_are_observed_without_renavigation() {
        let feed = SessionFeed::new();
        let mut watch = feed.subscribe();
        assert!(matches!(watch.current(), SessionState::Loading));

        feed.publish(Some(session()));
        assert!(matches!(
            watch.changed().await,
            Some(SessionState::Authenticated(_))
        ));

        let bridge = RecordingBridge::new(false);
        feed.sign_out(&bridge).await.unwrap();
        assert!(matches!(
            watch.changed().await,
            Some(SessionState::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn dropped_feed_ends_the_subscription() {
        let feed = SessionFeed::new();
        let mut watch = feed.subscribe();
        drop(feed);
        assert!(watch.changed().await.is_none());
    }
}
