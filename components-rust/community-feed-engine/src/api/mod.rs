//! Remote API consumed by the engine. The transport is a collaborator; the
//! engine only sees this trait.

mod http;

pub use http::HttpFeedApi;

use crate::error::Result;
use async_trait::async_trait;
use common_lib::{Comment, CommentId, PollDuration, Post, PostId, Token, User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    pub options: Vec<String>,
    pub duration_hours: u32,
}

impl PollSpec {
    pub fn new(options: Vec<String>, duration: PollDuration) -> Self {
        PollSpec {
            options,
            duration_hours: duration.hours(),
        }
    }
}

/// A create-post request, sent as one multipart payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub content: String,
    pub media: Option<MediaAttachment>,
    pub poll: Option<PollSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateComment {
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggled {
    pub liked: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OkResult<T> {
    pub ok: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrResult {
    pub err: ErrDetail,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrDetail {
    pub message: String,
}

#[async_trait(?Send)]
pub trait FeedApi {
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn get_post(&self, post_id: &PostId) -> Result<Post>;

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>>;

    async fn create_post(&self, token: &Token, post: NewPost) -> Result<Post>;

    async fn add_comment(&self, token: &Token, post_id: &PostId, content: &str)
        -> Result<Comment>;

    async fn delete_comment(
        &self,
        token: &Token,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<()>;

    async fn toggle_like(&self, token: &Token, post_id: &PostId) -> Result<LikeToggled>;

    async fn current_user(&self, token: &Token) -> Result<User>;

    async fn random_users(&self, count: usize) -> Result<Vec<User>>;

    async fn search_users(&self, query: &str) -> Result<Vec<User>>;

    async fn get_user(&self, user_id: &UserId) -> Result<User>;

    async fn follow_user(&self, token: &Token, user_id: &UserId) -> Result<()>;
}
