//! Session context: the single writer of the authentication token.
//!
//! Every other component reads the token through a cloned handle. Token
//! changes only happen on explicit session events (login, logout, expiry).

use crate::api::FeedApi;
use crate::error::{FeedError, Result};
use crate::storage::{KeyValueStore, SESSION_TOKEN_KEY};
use common_lib::{Token, User, UserId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
struct SessionState {
    token: Option<Token>,
    current_user: Option<User>,
    /// Bumped on every token change so late profile resolutions are dropped.
    version: u64,
}

#[derive(Clone)]
pub struct SessionContext {
    api: Rc<dyn FeedApi>,
    store: Rc<dyn KeyValueStore>,
    state: Rc<RefCell<SessionState>>,
}

impl SessionContext {
    pub fn new(api: Rc<dyn FeedApi>, store: Rc<dyn KeyValueStore>) -> Self {
        SessionContext {
            api,
            store,
            state: Rc::new(RefCell::new(SessionState::default())),
        }
    }

    pub fn token(&self) -> Option<Token> {
        self.state.borrow().token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().current_user.clone()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state
            .borrow()
            .current_user
            .as_ref()
            .map(|u| u.id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().token.is_some()
    }

    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    /// Token for an authored action, or `AuthRequired` without touching the network.
    pub fn require_token(&self) -> Result<Token> {
        self.token().ok_or(FeedError::AuthRequired)
    }

    /// Token plus resolved identity, for actions that compare against the current user.
    pub fn require_identity(&self) -> Result<(Token, UserId)> {
        let state = self.state.borrow();
        match (&state.token, &state.current_user) {
            (Some(token), Some(user)) => Ok((token.clone(), user.id.clone())),
            _ => Err(FeedError::AuthRequired),
        }
    }

    /// Reloads the persisted token, if any, and resolves its user.
    pub async fn restore(&self) -> bool {
        let token = match self.store.get(SESSION_TOKEN_KEY) {
            Ok(token) => token,
            Err(err) => {
                log::warn!("session restore - cannot read token: {err}");
                None
            }
        };

        match token {
            Some(token) if !token.is_empty() => self.set_token(Some(Token::new(token))).await,
            _ => false,
        }
    }

    /// Replaces the token and resolves the user it belongs to.
    ///
    /// Returns whether the session ends up authenticated. A rejected token
    /// degrades to the unauthenticated state instead of erroring. Other
    /// failures keep the token with no resolved user.
    pub async fn set_token(&self, token: Option<Token>) -> bool {
        let version = {
            let mut state = self.state.borrow_mut();
            state.version += 1;
            state.token = token.clone();
            state.current_user = None;
            state.version
        };

        let Some(token) = token else {
            self.forget_persisted_token();
            log::info!("session cleared");
            return false;
        };

        self.persist_token(&token);

        let resolved = self.api.current_user(&token).await;

        let mut state = self.state.borrow_mut();
        if state.version != version {
            log::warn!("session - discarding profile for superseded token");
            return state.token.is_some();
        }

        match resolved {
            Ok(user) => {
                log::info!(user_id = user.id.as_str(); "session resolved");
                state.current_user = Some(user);
                true
            }
            Err(err) if err.invalidates_session() || matches!(err, FeedError::NotFound(_)) => {
                log::warn!("session - token rejected, signing out: {err}");
                state.token = None;
                state.current_user = None;
                state.version += 1;
                drop(state);
                self.forget_persisted_token();
                false
            }
            Err(err) => {
                // Token stays; `refresh_profile` or the next restore resolves the user.
                log::warn!("session - profile unresolved, keeping token: {err}");
                true
            }
        }
    }

    /// Re-fetches the current user's profile, e.g. after a follow changed it.
    pub async fn refresh_profile(&self) -> Result<()> {
        let version = self.version();
        let token = self.require_token()?;

        let user = self.api.current_user(&token).await;
        let user = self.screen(&token, user)?;

        let mut state = self.state.borrow_mut();
        if state.version == version {
            state.current_user = Some(user);
        }
        Ok(())
    }

    pub async fn logout(&self) {
        self.set_token(None).await;
    }

    /// Drops the session after the server reported the token as expired.
    pub fn invalidate(&self) {
        if let Some(token) = self.token() {
            self.invalidate_token(&token);
        }
    }

    /// Like `invalidate`, but only while `token` is still the session token.
    fn invalidate_token(&self, token: &Token) {
        {
            let mut state = self.state.borrow_mut();
            if state.token.as_ref() != Some(token) {
                log::debug!("session - ignoring expiry of a replaced token");
                return;
            }
            state.token = None;
            state.current_user = None;
            state.version += 1;
        }
        self.forget_persisted_token();
        log::info!("session invalidated");
    }

    /// Passes a remote result through, cascading expired-token failures into
    /// `invalidate`. `sent_with` is the token the request carried; an expiry
    /// reported for a token the session no longer holds leaves it alone.
    pub fn screen<T>(&self, sent_with: &Token, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.invalidates_session() {
                self.invalidate_token(sent_with);
            }
        }
        result
    }

    fn persist_token(&self, token: &Token) {
        if let Err(err) = self.store.set(SESSION_TOKEN_KEY, token.as_str()) {
            log::warn!("session - cannot persist token: {err}");
        }
    }

    fn forget_persisted_token(&self) {
        if let Err(err) = self.store.remove(SESSION_TOKEN_KEY) {
            log::warn!("session - cannot remove persisted token: {err}");
        }
    }
}
