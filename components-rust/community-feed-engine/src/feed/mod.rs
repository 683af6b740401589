//! The feed store: ordered posts, per-post comment threads and the single
//! expanded thread.
//!
//! State only changes through confirmed fetches. Mutations go to the server
//! first and are followed by a targeted re-fetch; nothing is patched
//! optimistically, so interleaved operations at worst produce a stale read
//! that the next fetch overwrites.

use crate::api::{FeedApi, LikeToggled};
use crate::error::{FeedError, Result};
use crate::session::SessionContext;
use common_lib::{Comment, CommentId, Post, PostId, UserId};
use futures::future::join_all;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Read-only view handed to the presentation layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedSnapshot {
    pub posts: Vec<Post>,
    pub comments: HashMap<PostId, Vec<Comment>>,
    pub expanded: Option<PostId>,
}

impl FeedSnapshot {
    pub fn post(&self, post_id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == post_id)
    }

    pub fn contains_post(&self, post_id: &PostId) -> bool {
        self.post(post_id).is_some()
    }

    fn replace_posts(&mut self, posts: Vec<Post>) {
        let mut seen = HashSet::new();
        self.posts = posts
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .map(sanitize_post)
            .collect();

        let known: HashSet<&PostId> = self.posts.iter().map(|p| &p.id).collect();
        self.comments.retain(|post_id, _| known.contains(post_id));
        if let Some(expanded) = &self.expanded {
            if !known.contains(expanded) {
                self.expanded = None;
            }
        }
    }

    fn replace_post(&mut self, post: Post) {
        if let Some(existing) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *existing = sanitize_post(post);
        }
    }

    fn remove_post(&mut self, post_id: &PostId) {
        self.posts.retain(|p| &p.id != post_id);
        self.comments.remove(post_id);
        if self.expanded.as_ref() == Some(post_id) {
            self.expanded = None;
        }
    }

    fn replace_thread(&mut self, post_id: &PostId, comments: Vec<Comment>) -> bool {
        if !self.contains_post(post_id) {
            return false;
        }
        let comments = comments
            .into_iter()
            .filter(|c| &c.post_id == post_id)
            .collect();
        self.comments.insert(post_id.clone(), comments);
        true
    }

    fn comment_deletable_by(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
        user_id: &UserId,
    ) -> Option<bool> {
        let post = self.post(post_id)?;
        let comment = self
            .comments
            .get(post_id)?
            .iter()
            .find(|c| &c.id == comment_id)?;
        Some(&comment.author.id == user_id || &post.author.id == user_id)
    }
}

/// Malformed polls are dropped rather than shown with broken counts.
fn sanitize_post(mut post: Post) -> Post {
    if let Some(poll) = &post.poll {
        if !poll.is_well_formed() {
            log::warn!(post_id = post.id.as_str(); "dropping malformed poll");
            post.poll = None;
        }
    }
    post
}

#[derive(Debug, Default, PartialEq)]
pub struct RefreshReport {
    pub posts: usize,
    pub threads_loaded: usize,
    pub failed_threads: Vec<(PostId, FeedError)>,
    /// Set when a newer refresh or a teardown superseded this one.
    pub discarded: bool,
}

impl RefreshReport {
    fn discarded() -> Self {
        RefreshReport {
            discarded: true,
            ..RefreshReport::default()
        }
    }
}

#[derive(Default)]
struct FeedState {
    snapshot: FeedSnapshot,
    /// Bumped on teardown; completions from an older epoch are ignored.
    epoch: u64,
    list_requested: u64,
    list_applied: u64,
}

#[derive(Clone)]
pub struct FeedStore {
    api: Rc<dyn FeedApi>,
    session: SessionContext,
    state: Rc<RefCell<FeedState>>,
}

impl FeedStore {
    pub fn new(api: Rc<dyn FeedApi>, session: SessionContext) -> Self {
        FeedStore {
            api,
            session,
            state: Rc::new(RefCell::new(FeedState::default())),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().snapshot.clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.borrow().snapshot.posts.clone()
    }

    pub fn post(&self, post_id: &PostId) -> Option<Post> {
        self.state.borrow().snapshot.post(post_id).cloned()
    }

    pub fn thread(&self, post_id: &PostId) -> Option<Vec<Comment>> {
        self.state.borrow().snapshot.comments.get(post_id).cloned()
    }

    pub fn expanded(&self) -> Option<PostId> {
        self.state.borrow().snapshot.expanded.clone()
    }

    /// Collapses `post_id` if it is the open thread, otherwise makes it the only open one.
    pub fn toggle_expanded(&self, post_id: &PostId) {
        let mut state = self.state.borrow_mut();
        let expanded = &mut state.snapshot.expanded;
        if expanded.as_ref() == Some(post_id) {
            *expanded = None;
        } else {
            *expanded = Some(post_id.clone());
        }
    }

    /// Ignore every completion still in flight.
    pub fn teardown(&self) {
        self.state.borrow_mut().epoch += 1;
    }

    fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Replaces the post list, then fetches every thread independently.
    ///
    /// A failing list fetch leaves the previous snapshot untouched. A failing
    /// thread fetch is reported and keeps that post's previous thread, if any,
    /// without affecting the other threads.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let (epoch, request) = {
            let mut state = self.state.borrow_mut();
            state.list_requested += 1;
            (state.epoch, state.list_requested)
        };

        let posts = match self.api.list_posts().await {
            Ok(posts) => posts,
            Err(err) => {
                log::warn!("refresh - post list fetch failed: {err}");
                return Err(err);
            }
        };

        let post_ids: Vec<PostId> = {
            let mut state = self.state.borrow_mut();
            if state.epoch != epoch {
                log::warn!("refresh - discarding post list after teardown");
                return Ok(RefreshReport::discarded());
            }
            if request < state.list_applied {
                log::debug!("refresh - discarding superseded post list");
                return Ok(RefreshReport::discarded());
            }
            state.list_applied = request;
            state.snapshot.replace_posts(posts);
            state.snapshot.posts.iter().map(|p| p.id.clone()).collect()
        };

        log::debug!(posts = post_ids.len(); "refresh - fetching comment threads");

        let fetches = post_ids.iter().map(|post_id| self.fetch_thread(epoch, post_id));
        let results = join_all(fetches).await;

        let mut report = RefreshReport {
            posts: post_ids.len(),
            ..RefreshReport::default()
        };
        for (post_id, result) in post_ids.into_iter().zip(results) {
            match result {
                Ok(()) => report.threads_loaded += 1,
                Err(err) => report.failed_threads.push((post_id, err)),
            }
        }
        Ok(report)
    }

    async fn fetch_thread(&self, epoch: u64, post_id: &PostId) -> Result<()> {
        match self.api.list_comments(post_id).await {
            Ok(comments) => {
                self.apply_thread(epoch, post_id, comments);
                Ok(())
            }
            Err(err) => {
                log::warn!(post_id = post_id.as_str(); "comment thread fetch failed: {err}");
                Err(err)
            }
        }
    }

    fn apply_thread(&self, epoch: u64, post_id: &PostId, comments: Vec<Comment>) {
        let mut state = self.state.borrow_mut();
        if state.epoch != epoch {
            log::warn!(post_id = post_id.as_str(); "discarding comment thread after teardown");
        } else if !state.snapshot.replace_thread(post_id, comments) {
            log::debug!(post_id = post_id.as_str(); "discarding comment thread for unknown post");
        }
    }

    /// Re-fetches one thread; the previous thread stays on failure.
    pub async fn reload_thread(&self, post_id: &PostId) -> Result<()> {
        let epoch = self.epoch();
        self.fetch_thread(epoch, post_id).await
    }

    /// Re-fetches one post and replaces it wholesale. A post gone server-side
    /// is removed together with its thread.
    pub async fn reload_post(&self, post_id: &PostId) -> Result<()> {
        let epoch = self.epoch();
        let result = self.api.get_post(post_id).await;

        let mut state = self.state.borrow_mut();
        if state.epoch != epoch {
            log::warn!(post_id = post_id.as_str(); "discarding post reload after teardown");
            return Ok(());
        }
        match result {
            Ok(post) => {
                state.snapshot.replace_post(post);
                Ok(())
            }
            Err(FeedError::NotFound(what)) => {
                state.snapshot.remove_post(post_id);
                Err(FeedError::NotFound(what))
            }
            Err(err) => Err(err),
        }
    }

    /// Toggles the current user's like, then re-fetches the post so the
    /// shown membership is the server's.
    pub async fn like_toggle(&self, post_id: &PostId) -> Result<LikeToggled> {
        let token = self.session.require_token()?;

        let toggled = self
            .session
            .screen(&token, self.api.toggle_like(&token, post_id).await)?;
        log::info!(post_id = post_id.as_str(), liked = toggled.liked; "like toggled");

        if let Err(err) = self.reload_post(post_id).await {
            log::warn!(post_id = post_id.as_str(); "post reload after like failed: {err}");
        }
        Ok(toggled)
    }

    pub async fn add_comment(&self, post_id: &PostId, text: &str) -> Result<()> {
        let token = self.session.require_token()?;

        let content = text.trim();
        if content.is_empty() {
            return Err(FeedError::validation("Comment cannot be empty"));
        }
        if !self.state.borrow().snapshot.contains_post(post_id) {
            return Err(FeedError::not_found(format!("post {post_id}")));
        }

        let comment = self
            .session
            .screen(&token, self.api.add_comment(&token, post_id, content).await)?;
        log::info!(
            post_id = post_id.as_str(), comment_id = comment.id.as_str();
            "comment added"
        );

        if let Err(err) = self.reload_thread(post_id).await {
            log::warn!(post_id = post_id.as_str(); "thread reload after comment failed: {err}");
        }
        Ok(())
    }

    /// Whether the current user may delete the comment: its author or the post's author.
    pub fn can_delete_comment(&self, post_id: &PostId, comment_id: &CommentId) -> bool {
        match self.session.current_user_id() {
            Some(user_id) => self
                .state
                .borrow()
                .snapshot
                .comment_deletable_by(post_id, comment_id, &user_id)
                .unwrap_or(false),
            None => false,
        }
    }

    pub async fn delete_comment(&self, post_id: &PostId, comment_id: &CommentId) -> Result<()> {
        let (token, user_id) = self.session.require_identity()?;

        let allowed = self
            .state
            .borrow()
            .snapshot
            .comment_deletable_by(post_id, comment_id, &user_id);
        match allowed {
            None => return Err(FeedError::not_found(format!("comment {comment_id}"))),
            Some(false) => {
                return Err(FeedError::unauthorized(
                    "Only the comment or post author can delete this comment",
                ))
            }
            Some(true) => {}
        }

        self.session.screen(
            &token,
            self.api.delete_comment(&token, post_id, comment_id).await,
        )?;
        log::info!(
            post_id = post_id.as_str(), comment_id = comment_id.as_str();
            "comment deleted"
        );

        if let Err(err) = self.reload_thread(post_id).await {
            log::warn!(post_id = post_id.as_str(); "thread reload after delete failed: {err}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_lib::{Poll, PollDuration, PollOption, User};

    fn create_test_user(id: &str) -> User {
        User::new(UserId::from(id), format!("User {id}"), id)
    }

    fn create_test_post(id: &str, author: &str) -> Post {
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

    fn create_test_comment(id: &str, post_id: &str, author: &str) -> Comment {
        Comment {
            id: CommentId::from(id),
            post_id: PostId::from(post_id),
            author: create_test_user(author),
            content: "nice".to_string(),
        }
    }

    #[test]
    fn test_replace_posts_prunes_threads_and_expanded() {
        let mut snapshot = FeedSnapshot::default();
        snapshot.replace_posts(vec![create_test_post("p1", "u1"), create_test_post("p2", "u1")]);
        assert!(snapshot.replace_thread(&PostId::from("p1"), vec![]));
        assert!(snapshot.replace_thread(&PostId::from("p2"), vec![]));
        snapshot.expanded = Some(PostId::from("p2"));

        snapshot.replace_posts(vec![create_test_post("p1", "u1")]);

        assert_eq!(snapshot.posts.len(), 1);
        assert!(snapshot.comments.contains_key(&PostId::from("p1")));
        assert!(!snapshot.comments.contains_key(&PostId::from("p2")));
        assert_eq!(snapshot.expanded, None);
    }

    #[test]
    fn test_replace_posts_keeps_server_order_and_drops_duplicates() {
        let mut snapshot = FeedSnapshot::default();
        snapshot.replace_posts(vec![
            create_test_post("p3", "u1"),
            create_test_post("p1", "u1"),
            create_test_post("p3", "u2"),
        ]);

        let ids: Vec<&str> = snapshot.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p1"]);
    }

    #[test]
    fn test_replace_thread_discards_foreign_comments() {
        let mut snapshot = FeedSnapshot::default();
        snapshot.replace_posts(vec![create_test_post("p1", "u1")]);

        assert!(snapshot.replace_thread(
            &PostId::from("p1"),
            vec![
                create_test_comment("c1", "p1", "u2"),
                create_test_comment("c2", "p9", "u2"),
            ],
        ));
        assert_eq!(snapshot.comments[&PostId::from("p1")].len(), 1);

        assert!(!snapshot.replace_thread(&PostId::from("p9"), vec![]));
        assert!(!snapshot.comments.contains_key(&PostId::from("p9")));
    }

    #[test]
    fn test_malformed_poll_dropped() {
        let mut post = create_test_post("p1", "u1");
        post.poll = Some(Poll::new(
            vec![PollOption {
                label: "only".to_string(),
                votes: 1,
            }],
            chrono::Utc::now(),
            PollDuration::OneHour,
        ));

        assert!(sanitize_post(post).poll.is_none());
    }

    #[test]
    fn test_overflowing_poll_dropped() {
        let mut post = create_test_post("p1", "u1");
        post.poll = Some(Poll::new(
            vec![
                PollOption {
                    label: "a".to_string(),
                    votes: u64::MAX,
                },
                PollOption {
                    label: "b".to_string(),
                    votes: 1,
                },
            ],
            chrono::Utc::now(),
            PollDuration::OneDay,
        ));

        assert!(sanitize_post(post).poll.is_none());
    }

    #[test]
    fn test_comment_deletable_by() {
        let mut snapshot = FeedSnapshot::default();
        snapshot.replace_posts(vec![create_test_post("p1", "owner")]);
        snapshot.replace_thread(
            &PostId::from("p1"),
            vec![create_test_comment("c1", "p1", "commenter")],
        );
        let post_id = PostId::from("p1");
        let comment_id = CommentId::from("c1");

        assert_eq!(
            snapshot.comment_deletable_by(&post_id, &comment_id, &UserId::from("owner")),
            Some(true)
        );
        assert_eq!(
            snapshot.comment_deletable_by(&post_id, &comment_id, &UserId::from("commenter")),
            Some(true)
        );
        assert_eq!(
            snapshot.comment_deletable_by(&post_id, &comment_id, &UserId::from("stranger")),
            Some(false)
        );
        assert_eq!(
            snapshot.comment_deletable_by(&post_id, &CommentId::from("c9"), &UserId::from("owner")),
            None
        );
    }

    #[test]
    fn test_remove_post_collapses_thread() {
        let mut snapshot = FeedSnapshot::default();
        snapshot.replace_posts(vec![create_test_post("p1", "u1")]);
        snapshot.replace_thread(&PostId::from("p1"), vec![]);
        snapshot.expanded = Some(PostId::from("p1"));

        snapshot.remove_post(&PostId::from("p1"));

        assert!(snapshot.posts.is_empty());
        assert!(snapshot.comments.is_empty());
        assert_eq!(snapshot.expanded, None);
    }
}
