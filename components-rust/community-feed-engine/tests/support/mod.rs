#![allow(dead_code)]

use async_trait::async_trait;
use community_feed_engine::api::{FeedApi, LikeToggled, NewPost};
use community_feed_engine::config::ClientConfig;
use community_feed_engine::storage::{KeyValueStore, MemoryStore};
use community_feed_engine::{
    Comment, CommentId, FeedEngine, FeedError, Poll, PollDuration, PollOption, Post, PostId,
    Result, Token, User, UserId,
};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub fn create_test_user(id: &str) -> User {
    User::new(UserId::from(id), format!("User {id}"), id)
}

pub fn create_test_post(id: &str, author: &str) -> Post {
    Post {
        id: PostId::from(id),
        author: create_test_user(author),
        content: format!("content of {id}"),
        media: None,
        poll: None,
        likes: HashSet::new(),
        created_at: chrono::Utc::now(),
    }
}

pub fn create_test_comment(id: &str, post_id: &str, author: &str) -> Comment {
    Comment {
        id: CommentId::from(id),
        post_id: PostId::from(post_id),
        author: create_test_user(author),
        content: format!("comment {id}"),
    }
}

#[derive(Default)]
struct ServerState {
    posts: Vec<Post>,
    comments: HashMap<PostId, Vec<Comment>>,
    users: Vec<User>,
    tokens: HashMap<String, UserId>,
    failing: HashSet<String>,
    calls: Vec<String>,
    next_id: u64,
}

/// In-memory remote API that records every call.
///
/// Calls named in `fail` return `Transient`; calls with a pending gate wait
/// until the gate's sender fires.
#[derive(Default)]
pub struct FakeApi {
    state: RefCell<ServerState>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_user(&self, user: User, token: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(token) = token {
            state.tokens.insert(token.to_string(), user.id.clone());
        }
        state.users.push(user);
    }

    pub fn with_post(&self, post: Post) {
        let mut state = self.state.borrow_mut();
        state.comments.entry(post.id.clone()).or_default();
        state.posts.push(post);
    }

    pub fn with_comment(&self, comment: Comment) {
        self.state
            .borrow_mut()
            .comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
    }

    pub fn remove_post(&self, post_id: &str) {
        let mut state = self.state.borrow_mut();
        state.posts.retain(|p| p.id.as_str() != post_id);
        state.comments.remove(&PostId::from(post_id));
    }

    pub fn revoke_token(&self, token: &str) {
        self.state.borrow_mut().tokens.remove(token);
    }

    pub fn fail(&self, call: &str) {
        self.state.borrow_mut().failing.insert(call.to_string());
    }

    pub fn recover(&self, call: &str) {
        self.state.borrow_mut().failing.remove(call);
    }

    pub fn gate(&self, call: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(call.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn server_post(&self, post_id: &str) -> Option<Post> {
        self.state
            .borrow()
            .posts
            .iter()
            .find(|p| p.id.as_str() == post_id)
            .cloned()
    }

    async fn enter(&self, call: String) -> Result<()> {
        self.state.borrow_mut().calls.push(call.clone());
        let gate = self.gates.borrow_mut().remove(&call);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.state.borrow().failing.contains(&call) {
            Err(FeedError::transient(format!("{call} failed")))
        } else {
            Ok(())
        }
    }

    fn user_for(&self, token: &Token) -> Result<User> {
        let state = self.state.borrow();
        let user_id = state
            .tokens
            .get(token.as_str())
            .ok_or_else(|| FeedError::session_expired("token expired"))?;
        state
            .users
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or_else(|| FeedError::not_found("user"))
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        format!("{prefix}{}", state.next_id)
    }
}

#[async_trait(?Send)]
impl FeedApi for FakeApi {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.enter("list_posts".to_string()).await?;
        Ok(self.state.borrow().posts.clone())
    }

    async fn get_post(&self, post_id: &PostId) -> Result<Post> {
        self.enter(format!("get_post:{post_id}")).await?;
        self.server_post(post_id.as_str())
            .ok_or_else(|| FeedError::not_found(format!("post {post_id}")))
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        self.enter(format!("list_comments:{post_id}")).await?;
        self.state
            .borrow()
            .comments
            .get(post_id)
            .cloned()
            .ok_or_else(|| FeedError::not_found(format!("post {post_id}")))
    }

    async fn create_post(&self, token: &Token, post: NewPost) -> Result<Post> {
        self.enter("create_post".to_string()).await?;
        let author = self.user_for(token)?;
        let now = chrono::Utc::now();
        let poll = match post.poll {
            Some(spec) => {
                let duration = PollDuration::try_from(spec.duration_hours)
                    .map_err(FeedError::validation)?;
                let options = spec
                    .options
                    .into_iter()
                    .map(|label| PollOption { label, votes: 0 })
                    .collect();
                Some(Poll::new(options, now + duration.as_chrono(), duration))
            }
            None => None,
        };
        let created = Post {
            id: PostId::new(self.next_id("p")),
            author,
            content: post.content,
            media: post.media.map(|m| format!("/media/{}", m.file_name)),
            poll,
            likes: HashSet::new(),
            created_at: now,
        };
        let mut state = self.state.borrow_mut();
        state.comments.insert(created.id.clone(), vec![]);
        state.posts.insert(0, created.clone());
        Ok(created)
    }

    async fn add_comment(
        &self,
        token: &Token,
        post_id: &PostId,
        content: &str,
    ) -> Result<Comment> {
        self.enter(format!("add_comment:{post_id}")).await?;
        let author = self.user_for(token)?;
        let comment = Comment {
            id: CommentId::new(self.next_id("c")),
            post_id: post_id.clone(),
            author,
            content: content.to_string(),
        };
        let mut state = self.state.borrow_mut();
        let thread = state
            .comments
            .get_mut(post_id)
            .ok_or_else(|| FeedError::not_found(format!("post {post_id}")))?;
        thread.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(
        &self,
        token: &Token,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<()> {
        self.enter(format!("delete_comment:{comment_id}")).await?;
        self.user_for(token)?;
        let mut state = self.state.borrow_mut();
        let thread = state
            .comments
            .get_mut(post_id)
            .ok_or_else(|| FeedError::not_found(format!("post {post_id}")))?;
        thread.retain(|c| &c.id != comment_id);
        Ok(())
    }

    async fn toggle_like(&self, token: &Token, post_id: &PostId) -> Result<LikeToggled> {
        self.enter(format!("toggle_like:{post_id}")).await?;
        let user = self.user_for(token)?;
        let mut state = self.state.borrow_mut();
        let post = state
            .posts
            .iter_mut()
            .find(|p| &p.id == post_id)
            .ok_or_else(|| FeedError::not_found(format!("post {post_id}")))?;
        let liked = if post.likes.remove(&user.id) {
            false
        } else {
            post.likes.insert(user.id.clone());
            true
        };
        Ok(LikeToggled { liked })
    }

    async fn current_user(&self, token: &Token) -> Result<User> {
        self.enter("current_user".to_string()).await?;
        self.user_for(token)
    }

    async fn random_users(&self, count: usize) -> Result<Vec<User>> {
        self.enter("random_users".to_string()).await?;
        Ok(self.state.borrow().users.iter().take(count).cloned().collect())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        self.enter(format!("search_users:{query}")).await?;
        let query = query.to_lowercase();
        Ok(self
            .state
            .borrow()
            .users
            .iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&query) || u.name.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User> {
        self.enter(format!("get_user:{user_id}")).await?;
        self.state
            .borrow()
            .users
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or_else(|| FeedError::not_found(format!("user {user_id}")))
    }

    async fn follow_user(&self, token: &Token, user_id: &UserId) -> Result<()> {
        self.enter(format!("follow_user:{user_id}")).await?;
        let me = self.user_for(token)?;
        let mut state = self.state.borrow_mut();
        if !state.users.iter().any(|u| &u.id == user_id) {
            return Err(FeedError::not_found(format!("user {user_id}")));
        }
        for user in state.users.iter_mut() {
            if &user.id == user_id {
                user.followers.insert(me.id.clone());
            } else if user.id == me.id {
                user.following.insert(user_id.clone());
            }
        }
        Ok(())
    }
}

pub fn create_engine(api: Rc<FakeApi>) -> (FeedEngine, Rc<MemoryStore>) {
    let store = Rc::new(MemoryStore::new());
    let engine = FeedEngine::new(
        api,
        store.clone() as Rc<dyn KeyValueStore>,
        &ClientConfig::default(),
    );
    (engine, store)
}

/// Two posts by `author`, a signed-in `me` with token `t-me`, and `author` with token `t-author`.
pub fn create_populated_api() -> Rc<FakeApi> {
    let api = FakeApi::new();
    api.with_user(create_test_user("me"), Some("t-me"));
    api.with_user(create_test_user("author"), Some("t-author"));
    api.with_user(create_test_user("other"), None);
    api.with_post(create_test_post("p1", "author"));
    api.with_post(create_test_post("p2", "author"));
    api.with_comment(create_test_comment("c1", "p1", "other"));
    api
}
