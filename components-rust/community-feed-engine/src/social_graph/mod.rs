use crate::api::FeedApi;
use crate::common::query;
use crate::error::{FeedError, Result};
use crate::session::SessionContext;
use common_lib::{User, UserId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SocialSnapshot {
    pub query: String,
    pub results: Vec<User>,
    pub suggestions: Vec<User>,
}

impl SocialSnapshot {
    fn replace_user(&mut self, user: &User) {
        for existing in self
            .results
            .iter_mut()
            .chain(self.suggestions.iter_mut())
            .filter(|u| u.id == user.id)
        {
            *existing = user.clone();
        }
    }
}

#[derive(Default)]
struct SocialState {
    snapshot: SocialSnapshot,
    epoch: u64,
    search_requested: u64,
    suggestions_requested: u64,
}

/// Search results, follow suggestions and follow mutations.
#[derive(Clone)]
pub struct SocialGraph {
    api: Rc<dyn FeedApi>,
    session: SessionContext,
    suggestion_count: usize,
    state: Rc<RefCell<SocialState>>,
}

impl SocialGraph {
    pub fn new(api: Rc<dyn FeedApi>, session: SessionContext, suggestion_count: usize) -> Self {
        SocialGraph {
            api,
            session,
            suggestion_count,
            state: Rc::new(RefCell::new(SocialState::default())),
        }
    }

    pub fn snapshot(&self) -> SocialSnapshot {
        self.state.borrow().snapshot.clone()
    }

    pub fn suggestions(&self) -> Vec<User> {
        self.state.borrow().snapshot.suggestions.clone()
    }

    pub fn results(&self) -> Vec<User> {
        self.state.borrow().snapshot.results.clone()
    }

    pub fn teardown(&self) {
        self.state.borrow_mut().epoch += 1;
    }

    /// Fetches a random sample of users, minus the session user. Users
    /// already followed stay in the list.
    pub async fn load_suggestions(&self) -> Result<()> {
        let (epoch, request) = {
            let mut state = self.state.borrow_mut();
            state.suggestions_requested += 1;
            (state.epoch, state.suggestions_requested)
        };

        let users = self.api.random_users(self.suggestion_count).await?;
        let me = self.session.current_user_id();

        let mut state = self.state.borrow_mut();
        if state.epoch != epoch || state.suggestions_requested != request {
            log::debug!("suggestions - discarding superseded response");
            return Ok(());
        }
        state.snapshot.suggestions = users
            .into_iter()
            .filter(|u| Some(&u.id) != me.as_ref())
            .take(self.suggestion_count)
            .collect();
        Ok(())
    }

    /// Searches users by the trimmed query. An empty query clears the results
    /// without a network call. `query` and `results` change together, so a
    /// failed search leaves the previous pair in place.
    pub async fn search(&self, query: &str) -> Result<()> {
        let normalized = query::normalize(query);

        let (epoch, request) = {
            let mut state = self.state.borrow_mut();
            state.search_requested += 1;
            if normalized.is_none() {
                state.snapshot.query = query.to_string();
                state.snapshot.results.clear();
            }
            (state.epoch, state.search_requested)
        };

        let Some(normalized) = normalized else {
            return Ok(());
        };

        let users = match self.api.search_users(&normalized).await {
            Ok(users) => users,
            Err(err) => {
                log::warn!(query = normalized.as_str(); "search failed: {err}");
                return Err(err);
            }
        };

        let mut state = self.state.borrow_mut();
        if state.epoch != epoch || state.search_requested != request {
            log::debug!(query = normalized.as_str(); "search - discarding superseded response");
            return Ok(());
        }
        state.snapshot.query = query.to_string();
        state.snapshot.results = users;
        Ok(())
    }

    pub fn is_following(&self, user: &User) -> bool {
        self.session
            .current_user_id()
            .map(|me| user.is_followed_by(&me))
            .unwrap_or(false)
    }

    /// Follow-button state: signed in, not self, not already following.
    pub fn can_follow(&self, user: &User) -> bool {
        match self.session.current_user_id() {
            Some(me) => me != user.id && !user.is_followed_by(&me),
            None => false,
        }
    }

    pub async fn view_profile(&self, user_id: &UserId) -> Result<User> {
        let user = self.api.get_user(user_id).await?;
        self.state.borrow_mut().snapshot.replace_user(&user);
        Ok(user)
    }

    /// Follows `user_id`, then re-fetches that user and the session profile
    /// so follow-button state reflects the server.
    pub async fn follow(&self, user_id: &UserId) -> Result<()> {
        let (token, me) = self.session.require_identity()?;
        if &me == user_id {
            return Err(FeedError::validation("You cannot follow yourself"));
        }

        self.session
            .screen(&token, self.api.follow_user(&token, user_id).await)?;
        log::info!(user_id = user_id.as_str(); "user followed");

        let epoch = self.state.borrow().epoch;
        match self.api.get_user(user_id).await {
            Ok(user) => {
                let mut state = self.state.borrow_mut();
                if state.epoch == epoch {
                    state.snapshot.replace_user(&user);
                }
            }
            Err(err) => {
                log::warn!(user_id = user_id.as_str(); "user reload after follow failed: {err}");
            }
        }

        if let Err(err) = self.session.refresh_profile().await {
            log::warn!("profile refresh after follow failed: {err}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_user_in_both_lists() {
        let mut snapshot = SocialSnapshot {
            query: "a".to_string(),
            results: vec![User::new(UserId::from("u2"), "Two", "two")],
            suggestions: vec![
                User::new(UserId::from("u3"), "Three", "three"),
                User::new(UserId::from("u2"), "Two", "two"),
            ],
        };

        let mut updated = User::new(UserId::from("u2"), "Two", "two");
        updated.followers.insert(UserId::from("u1"));
        snapshot.replace_user(&updated);

        assert!(snapshot.results[0].is_followed_by(&UserId::from("u1")));
        assert!(snapshot.suggestions[1].is_followed_by(&UserId::from("u1")));
        assert!(!snapshot.suggestions[0].is_followed_by(&UserId::from("u1")));
    }
}
