//! Turns UI intents into authorized store operations.
//!
//! Every state-changing intent checks the session first and short-circuits to
//! a "log in required" notice without a network call. Otherwise it delegates
//! to the owning store, which re-fetches on success; the coordinator itself
//! never writes store state.

use crate::api::LikeToggled;
use crate::composer::Composer;
use crate::error::{FeedError, Result};
use crate::feed::FeedStore;
use crate::session::SessionContext;
use crate::social_graph::SocialGraph;
use common_lib::{CommentId, Post, PostId, UserId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    SessionExpired,
    Message(String),
}

impl From<&FeedError> for Notice {
    fn from(err: &FeedError) -> Self {
        match err {
            FeedError::AuthRequired => Notice::LoginRequired,
            err if err.invalidates_session() => Notice::SessionExpired,
            err => Notice::Message(err.user_notice()),
        }
    }
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::LoginRequired => FeedError::AuthRequired.user_notice(),
            Notice::SessionExpired => FeedError::session_expired("").user_notice(),
            Notice::Message(msg) => msg.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InteractionCoordinator {
    session: SessionContext,
    feed: FeedStore,
    social: SocialGraph,
    notice: Rc<RefCell<Option<Notice>>>,
}

impl InteractionCoordinator {
    pub fn new(session: SessionContext, feed: FeedStore, social: SocialGraph) -> Self {
        InteractionCoordinator {
            session,
            feed,
            social,
            notice: Rc::new(RefCell::new(None)),
        }
    }

    /// The last failure worth telling the user about.
    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    pub fn dismiss_notice(&self) {
        self.notice.borrow_mut().take();
    }

    fn authorize(&self, intent: &str) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            log::info!("{intent} - log in required");
            Err(FeedError::AuthRequired)
        }
    }

    fn report<T>(&self, intent: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.dismiss_notice();
            }
            Err(err) if err.invalidates_session() && self.session.is_authenticated() => {
                log::info!("{intent} failed with a replaced token: {err}");
            }
            Err(err) => {
                log::warn!("{intent} failed: {err}");
                *self.notice.borrow_mut() = Some(Notice::from(err));
            }
        }
        result
    }

    pub async fn toggle_like(&self, post_id: &PostId) -> Result<LikeToggled> {
        let result = match self.authorize("like") {
            Ok(()) => self.feed.like_toggle(post_id).await,
            Err(err) => Err(err),
        };
        self.report("like", result)
    }

    pub async fn add_comment(&self, post_id: &PostId, text: &str) -> Result<()> {
        let result = match self.authorize("comment") {
            Ok(()) => self.feed.add_comment(post_id, text).await,
            Err(err) => Err(err),
        };
        self.report("comment", result)
    }

    pub async fn delete_comment(&self, post_id: &PostId, comment_id: &CommentId) -> Result<()> {
        let result = match self.authorize("delete comment") {
            Ok(()) => self.feed.delete_comment(post_id, comment_id).await,
            Err(err) => Err(err),
        };
        self.report("delete comment", result)
    }

    pub async fn follow(&self, user_id: &UserId) -> Result<()> {
        let result = match self.authorize("follow") {
            Ok(()) => self.social.follow(user_id).await,
            Err(err) => Err(err),
        };
        self.report("follow", result)
    }

    pub async fn submit_post(&self, composer: &mut Composer) -> Result<Post> {
        let result = match self.authorize("post") {
            Ok(()) => composer.submit().await,
            Err(err) => Err(err),
        };
        self.report("post", result)
    }
}
