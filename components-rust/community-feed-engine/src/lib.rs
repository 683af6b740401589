//! Feed synchronization and interaction state engine for a community feed
//! client: posts, comment threads, likes, user search and follows, kept in
//! sync with a remote API by re-fetching after every confirmed mutation.

pub mod api;
mod common;
pub mod composer;
pub mod config;
pub mod coordinator;
pub mod disclaimer;
pub mod engine;
pub mod error;
pub mod feed;
pub mod session;
pub mod social_graph;
pub mod storage;

pub use common_lib::{
    Comment, CommentId, Poll, PollDuration, PollOption, Post, PostId, Token, User, UserId,
};
pub use engine::FeedEngine;
pub use error::{FeedError, Result};
