use crate::api::{FeedApi, MediaAttachment, NewPost, PollSpec};
use crate::error::{FeedError, Result};
use crate::feed::FeedStore;
use crate::session::SessionContext;
use common_lib::{PollDuration, Post, MAX_POLL_OPTIONS, MIN_POLL_OPTIONS};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    pub media: Option<MediaAttachment>,
    pub poll_options: Vec<String>,
    pub poll_duration: PollDuration,
}

impl Default for Draft {
    fn default() -> Self {
        Draft {
            content: String::new(),
            media: None,
            poll_options: vec![String::new(); MIN_POLL_OPTIONS],
            poll_duration: PollDuration::default(),
        }
    }
}

impl Draft {
    fn filled_poll_options(&self) -> Vec<String> {
        self.poll_options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|o| o.to_string())
            .collect()
    }

    /// Packages the draft into a create-post request, or explains why it cannot be sent.
    pub fn to_request(&self) -> Result<NewPost> {
        let content = self.content.trim();
        let options = self.filled_poll_options();

        if content.is_empty() && self.media.is_none() && options.is_empty() {
            return Err(FeedError::validation(
                "Write something, attach media or add a poll",
            ));
        }
        if options.len() == 1 {
            return Err(FeedError::validation("A poll needs at least two options"));
        }

        let poll = if options.is_empty() {
            None
        } else {
            Some(PollSpec::new(options, self.poll_duration))
        };

        Ok(NewPost {
            content: content.to_string(),
            media: self.media.clone(),
            poll,
        })
    }
}

/// Draft state for a new post.
pub struct Composer {
    draft: Draft,
    api: Rc<dyn FeedApi>,
    session: SessionContext,
    feed: FeedStore,
}

impl Composer {
    pub fn new(api: Rc<dyn FeedApi>, session: SessionContext, feed: FeedStore) -> Self {
        Composer {
            draft: Draft::default(),
            api,
            session,
            feed,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.draft.content = content.into();
    }

    pub fn set_media(&mut self, media: Option<MediaAttachment>) {
        self.draft.media = media;
    }

    pub fn set_poll_option(&mut self, index: usize, text: impl Into<String>) {
        if let Some(option) = self.draft.poll_options.get_mut(index) {
            *option = text.into();
        }
    }

    pub fn add_poll_option(&mut self) {
        if self.draft.poll_options.len() < MAX_POLL_OPTIONS {
            self.draft.poll_options.push(String::new());
        }
    }

    /// The first two options are fixed; only extra ones can be removed.
    pub fn remove_poll_option(&mut self, index: usize) {
        let count = self.draft.poll_options.len();
        if count > MIN_POLL_OPTIONS && index >= MIN_POLL_OPTIONS && index < count {
            self.draft.poll_options.remove(index);
        }
    }

    pub fn set_poll_duration(&mut self, duration: PollDuration) {
        self.draft.poll_duration = duration;
    }

    pub fn reset(&mut self) {
        self.draft = Draft::default();
    }

    /// Sends the draft as one create-post request.
    ///
    /// On success the draft is cleared and the feed refreshed; on any failure
    /// the draft is left exactly as it was.
    pub async fn submit(&mut self) -> Result<Post> {
        let token = self.session.require_token()?;
        let request = self.draft.to_request()?;

        let post = self
            .session
            .screen(&token, self.api.create_post(&token, request).await)?;
        log::info!(post_id = post.id.as_str(); "post created");

        self.reset();

        if let Err(err) = self.feed.refresh().await {
            log::warn!("refresh after post creation failed: {err}");
        }
        Ok(post)
    }
}
