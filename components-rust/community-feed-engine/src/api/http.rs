use super::{CreateComment, ErrResult, FeedApi, LikeToggled, NewPost, OkResult};
use crate::config::ClientConfig;
use crate::error::{FeedError, Result};
use async_trait::async_trait;
use common_lib::{Comment, CommentId, Post, PostId, Token, User, UserId};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, HOST};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// `FeedApi` over HTTP. Timeouts come from the client builder and surface as `Transient`.
#[derive(Clone, Debug)]
pub struct HttpFeedApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFeedApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FeedError::transient(format!("Cannot build HTTP client: {e}")))?;

        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            FeedError::validation(format!("Invalid API URL {}: {e}", config.api_base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::validation(format!(
                "Invalid API URL: {}",
                config.api_base_url
            )));
        }

        Ok(HttpFeedApi { client, base_url })
    }

    /// `/v1` plus `segments` under the base URL. Each segment is percent-encoded,
    /// so ids never change the route.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            let body: OkResult<T> = response
                .json()
                .await
                .map_err(|e| FeedError::transient(format!("Invalid response body: {e}")))?;
            Ok(body.ok)
        } else {
            Err(error_response(status, response).await)
        }
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(error_response(status, response).await)
        }
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(host) = &config.api_host {
        let value = HeaderValue::from_str(host)
            .map_err(|_| FeedError::validation(format!("Invalid API host: {host}")))?;
        headers.insert(HOST, value);
    }
    Ok(headers)
}

fn transport_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::transient("Request timed out")
    } else {
        FeedError::transient(err)
    }
}

async fn error_response(status: reqwest::StatusCode, response: reqwest::Response) -> FeedError {
    let message = match response.json::<ErrResult>().await {
        Ok(body) => body.err.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    FeedError::from_status(status.as_u16(), message)
}

fn post_form(post: NewPost) -> Result<Form> {
    let mut form = Form::new().text("content", post.content);

    if let Some(media) = post.media {
        let part = Part::bytes(media.bytes)
            .file_name(media.file_name)
            .mime_str(&media.mime_type)
            .map_err(|_| {
                FeedError::validation(format!("Unsupported media type: {}", media.mime_type))
            })?;
        form = form.part("media", part);
    }

    if let Some(poll) = post.poll {
        let json = serde_json::to_string(&poll)
            .map_err(|e| FeedError::validation(format!("Invalid poll: {e}")))?;
        let part = Part::text(json)
            .mime_str("application/json")
            .map_err(|e| FeedError::validation(format!("Invalid poll: {e}")))?;
        form = form.part("poll", part);
    }

    Ok(form)
}

#[async_trait(?Send)]
impl FeedApi for HttpFeedApi {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        log::debug!("GET /posts");
        self.send(self.client.get(self.url(&["posts"]))).await
    }

    async fn get_post(&self, post_id: &PostId) -> Result<Post> {
        log::debug!(post_id = post_id.as_str(); "GET /posts/{post_id}");
        self.send(self.client.get(self.url(&["posts", post_id.as_str()])))
            .await
    }

    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>> {
        log::debug!(post_id = post_id.as_str(); "GET /posts/{post_id}/comments");
        self.send(
            self.client
                .get(self.url(&["posts", post_id.as_str(), "comments"])),
        )
        .await
    }

    async fn create_post(&self, token: &Token, post: NewPost) -> Result<Post> {
        log::debug!("POST /posts");
        let form = post_form(post)?;
        self.send(
            self.client
                .post(self.url(&["posts"]))
                .bearer_auth(token.as_str())
                .multipart(form),
        )
        .await
    }

    async fn add_comment(
        &self,
        token: &Token,
        post_id: &PostId,
        content: &str,
    ) -> Result<Comment> {
        log::debug!(post_id = post_id.as_str(); "POST /posts/{post_id}/comments");
        self.send(
            self.client
                .post(self.url(&["posts", post_id.as_str(), "comments"]))
                .bearer_auth(token.as_str())
                .json(&CreateComment {
                    content: content.to_string(),
                }),
        )
        .await
    }

    async fn delete_comment(
        &self,
        token: &Token,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<()> {
        log::debug!(
            post_id = post_id.as_str(), comment_id = comment_id.as_str();
            "DELETE /posts/{post_id}/comments/{comment_id}"
        );
        self.send_empty(
            self.client
                .delete(self.url(&[
                    "posts",
                    post_id.as_str(),
                    "comments",
                    comment_id.as_str(),
                ]))
                .bearer_auth(token.as_str()),
        )
        .await
    }

    async fn toggle_like(&self, token: &Token, post_id: &PostId) -> Result<LikeToggled> {
        log::debug!(post_id = post_id.as_str(); "POST /posts/{post_id}/likes/toggle");
        self.send(
            self.client
                .post(self.url(&["posts", post_id.as_str(), "likes", "toggle"]))
                .bearer_auth(token.as_str()),
        )
        .await
    }

    async fn current_user(&self, token: &Token) -> Result<User> {
        log::debug!("GET /users/me");
        self.send(
            self.client
                .get(self.url(&["users", "me"]))
                .bearer_auth(token.as_str()),
        )
        .await
    }

    async fn random_users(&self, count: usize) -> Result<Vec<User>> {
        log::debug!(count = count; "GET /users/random");
        self.send(
            self.client
                .get(self.url(&["users", "random"]))
                .query(&[("count", count.to_string())]),
        )
        .await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        log::debug!(query = query; "GET /users/search");
        self.send(
            self.client
                .get(self.url(&["users", "search"]))
                .query(&[("query", query)]),
        )
        .await
    }

    async fn get_user(&self, user_id: &UserId) -> Result<User> {
        log::debug!(user_id = user_id.as_str(); "GET /users/{user_id}");
        self.send(self.client.get(self.url(&["users", user_id.as_str()])))
            .await
    }

    async fn follow_user(&self, token: &Token, user_id: &UserId) -> Result<()> {
        log::debug!(user_id = user_id.as_str(); "POST /users/{user_id}/followers");
        self.send_empty(
            self.client
                .post(self.url(&["users", user_id.as_str(), "followers"]))
                .bearer_auth(token.as_str()),
        )
        .await
    }
}
