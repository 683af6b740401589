mod data;
mod domain;
mod goose_ext;

use crate::goose_ext::GooseRequestExt;
use goose::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let custom_host = match std::env::var("HOST") {
        Ok(host) => host,
        Err(_) => "".to_string(),
    };

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("Load Feed")
                .set_wait_time(Duration::from_secs(1), Duration::from_secs(5))?
                .register_transaction(transaction!(load_feed)),
        )
        .register_scenario(
            scenario!("Search Users")
                .set_wait_time(Duration::from_secs(2), Duration::from_secs(10))?
                .register_transaction(transaction!(search_users)),
        )
        .register_scenario(
            scenario!("Load Suggestions")
                .set_wait_time(Duration::from_secs(2), Duration::from_secs(10))?
                .register_transaction(transaction!(load_suggestions)),
        )
        .register_scenario(
            scenario!("Create Post, Comment and Likes")
                .set_wait_time(Duration::from_secs(5), Duration::from_secs(15))?
                .register_transaction(transaction!(create_post_comment_and_likes)),
        )
        .register_scenario(
            scenario!("Follow User")
                .set_wait_time(Duration::from_secs(5), Duration::from_secs(15))?
                .register_transaction(transaction!(follow_user)),
        )
        .set_default(GooseDefault::Host, custom_host.as_str())?
        .execute()
        .await?;

    Ok(())
}

/// Post list first, then one thread request per post, like a client refresh.
async fn load_feed(user: &mut GooseUser) -> TransactionResult {
    use crate::goose_ext::GooseResponseExt;

    let response = user.get_request("posts-list", "/v1/posts").await?;
    let posts: domain::common::OkResult<Vec<domain::community_feed::Post>> =
        response.json().await?;

    for post in posts.ok.iter() {
        let _response = user
            .get_request(
                "post-comments-list",
                format!("/v1/posts/{}/comments", post.id).as_str(),
            )
            .await?;
    }

    Ok(())
}

async fn search_users(user: &mut GooseUser) -> TransactionResult {
    let query = data::rand_search_query();

    let _response = user
        .get_request(
            "user-search",
            format!("/v1/users/search?query={}", query.trim()).as_str(),
        )
        .await?;

    Ok(())
}

async fn load_suggestions(user: &mut GooseUser) -> TransactionResult {
    let count = data::rand_suggestion_count();

    let _response = user
        .get_request(
            "user-random",
            format!("/v1/users/random?count={count}").as_str(),
        )
        .await?;

    Ok(())
}

async fn create_post_comment_and_likes(user: &mut GooseUser) -> TransactionResult {
    use crate::goose_ext::GooseResponseExt;

    let token = data::token_for(&data::rand_user_id());

    // 1. Create Post with a poll
    let poll = domain::common::PollSpec {
        options: data::rand_poll_options(),
        duration_hours: data::rand_poll_duration_hours(),
    };
    let form = reqwest::multipart::Form::new()
        .text("content", data::rand_post_content())
        .text("poll", serde_json::to_string(&poll).unwrap());
    let response = user
        .post_multipart_request("post-create", "/v1/posts", Some(token.as_str()), form)
        .await?;

    let post_created: domain::common::OkResult<domain::community_feed::Post> =
        response.json().await?;
    let post_id = post_created.ok.id;

    // 2. Toggle like twice, which leaves the like set as it was
    let liker_token = data::token_for(&data::rand_user_id());
    for _ in 0..2 {
        let _response = user
            .post_request(
                "post-like-toggle",
                format!("/v1/posts/{post_id}/likes/toggle").as_str(),
                Some(liker_token.as_str()),
                &serde_json::json!({}),
            )
            .await?;
        let _response = user
            .get_request("post-get", format!("/v1/posts/{post_id}").as_str())
            .await?;
    }

    // 3. Add a comment and reload the thread
    let create_comment = domain::common::CreateComment {
        content: data::rand_comment_content(),
    };
    let response = user
        .post_request(
            "comment-add",
            format!("/v1/posts/{post_id}/comments").as_str(),
            Some(token.as_str()),
            &create_comment,
        )
        .await?;
    let comment: domain::common::OkResult<domain::community_feed::Comment> =
        response.json().await?;
    let comment_id = comment.ok.id;

    let _response = user
        .get_request(
            "post-comments-list",
            format!("/v1/posts/{post_id}/comments").as_str(),
        )
        .await?;

    // 4. Delete the comment as its author
    let _response = user
        .delete_request(
            "comment-delete",
            format!("/v1/posts/{post_id}/comments/{comment_id}").as_str(),
            Some(token.as_str()),
        )
        .await?;

    Ok(())
}

async fn follow_user(user: &mut GooseUser) -> TransactionResult {
    let follower_id = data::rand_user_id();
    let mut followee_id = data::rand_user_id();
    while followee_id == follower_id {
        followee_id = data::rand_user_id();
    }
    let token = data::token_for(&follower_id);

    let _response = user
        .post_request(
            "user-follow",
            format!("/v1/users/{followee_id}/followers").as_str(),
            Some(token.as_str()),
            &serde_json::json!({}),
        )
        .await?;

    let _response = user
        .get_request("user-get", format!("/v1/users/{followee_id}").as_str())
        .await?;

    Ok(())
}
