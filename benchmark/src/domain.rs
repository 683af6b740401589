pub mod common {
    use serde::{Deserialize, Serialize};

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

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CreateComment {
        pub content: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PollSpec {
        pub options: Vec<String>,
        pub duration_hours: u32,
    }
}

pub mod community_feed {
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct User {
        pub id: String,
        pub name: String,
        pub username: String,
        #[serde(default)]
        pub followers: HashSet<String>,
        #[serde(default)]
        pub following: HashSet<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Post {
        pub id: String,
        pub author: User,
        pub content: String,
        #[serde(default)]
        pub likes: HashSet<String>,
        pub created_at: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Comment {
        pub id: String,
        pub post_id: String,
        pub author: User,
        pub content: String,
    }
}
