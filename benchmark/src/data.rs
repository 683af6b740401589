use rand::prelude::SliceRandom;
use rand::Rng;

/// Tokens are provisioned as `token-u001` .. `token-u100` by the test fixture.
pub fn get_user_ids() -> Vec<String> {
    (1..=100).map(|v| format!("u{:03}", v)).collect()
}

pub fn rand_user_id() -> String {
    let user_ids = get_user_ids();
    user_ids
        .choose(&mut rand::thread_rng())
        .unwrap()
        .to_string()
}

pub fn token_for(user_id: &str) -> String {
    format!("token-{user_id}")
}

pub fn rand_search_query() -> String {
    let queries = vec!["User", "u00", "u01", "  u02  "];
    queries.choose(&mut rand::thread_rng()).unwrap().to_string()
}

pub fn rand_post_content() -> String {
    let contents = vec![
        "Hello community!",
        "Check out my new post.",
        "Anyone up for a run this weekend?",
        "Rust is the best language.",
    ];
    contents
        .choose(&mut rand::thread_rng())
        .unwrap()
        .to_string()
}

pub fn rand_comment_content() -> String {
    let contents = vec![
        "Nice post!",
        "I agree.",
        "Interesting point.",
        "Keep it up!",
    ];
    contents
        .choose(&mut rand::thread_rng())
        .unwrap()
        .to_string()
}

/// Between two and four poll options, like the client composer allows.
pub fn rand_poll_options() -> Vec<String> {
    let options = vec!["Yes", "No", "Maybe", "Later"];
    let count = rand::thread_rng().gen_range(2..=4);
    options
        .choose_multiple(&mut rand::thread_rng(), count)
        .map(|o| o.to_string())
        .collect()
}

pub fn rand_poll_duration_hours() -> u32 {
    *[1u32, 24, 168].choose(&mut rand::thread_rng()).unwrap()
}

pub fn rand_suggestion_count() -> usize {
    rand::thread_rng().gen_range(3..=10)
}
