//! Shared data model for the community feed: users, posts, comments and polls.
//!
//! Every entity here is a value snapshot of server state. Ids are assigned
//! server-side and the client never originates one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 4;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(UserId);
string_id!(PostId);
string_id!(CommentId);

/// Authentication token. Never printed in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(***)")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub followers: HashSet<UserId>,
    pub following: HashSet<UserId>,
}

#[derive(Deserialize)]
struct UserRecord {
    id: UserId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    followers: HashSet<UserId>,
    #[serde(default)]
    following: HashSet<UserId>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let mut user = User {
            id: record.id,
            name: record.name,
            username: record.username,
            bio: record.bio,
            avatar: record.avatar,
            followers: record.followers,
            following: record.following,
        };
        user.strip_self_references();
        user
    }
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, username: impl Into<String>) -> Self {
        User {
            id,
            name: name.into(),
            username: username.into(),
            bio: None,
            avatar: None,
            followers: HashSet::new(),
            following: HashSet::new(),
        }
    }

    /// A user never follows itself.
    fn strip_self_references(&mut self) {
        self.followers.remove(&self.id);
        self.following.remove(&self.id);
    }

    pub fn is_followed_by(&self, user_id: &UserId) -> bool {
        self.followers.contains(user_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PollDuration {
    OneHour,
    #[default]
    OneDay,
    OneWeek,
}

impl PollDuration {
    pub fn hours(&self) -> u32 {
        match self {
            PollDuration::OneHour => 1,
            PollDuration::OneDay => 24,
            PollDuration::OneWeek => 168,
        }
    }

    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::hours(self.hours() as i64)
    }
}

impl TryFrom<u32> for PollDuration {
    type Error = String;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        match hours {
            1 => Ok(PollDuration::OneHour),
            24 => Ok(PollDuration::OneDay),
            168 => Ok(PollDuration::OneWeek),
            other => Err(format!("Unsupported poll duration: {other}h")),
        }
    }
}

impl From<PollDuration> for u32 {
    fn from(value: PollDuration) -> Self {
        value.hours()
    }
}

impl Display for PollDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h", self.hours())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub label: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "PollRecord")]
pub struct Poll {
    pub options: Vec<PollOption>,
    pub total_votes: u64,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub duration: PollDuration,
}

#[derive(Deserialize)]
struct PollRecord {
    options: Vec<PollOption>,
    ends_at: chrono::DateTime<chrono::Utc>,
    duration: PollDuration,
}

// The server's total is ignored: per-option counts are the source of truth.
impl From<PollRecord> for Poll {
    fn from(record: PollRecord) -> Self {
        Poll::new(record.options, record.ends_at, record.duration)
    }
}

impl Poll {
    pub fn new(
        options: Vec<PollOption>,
        ends_at: chrono::DateTime<chrono::Utc>,
        duration: PollDuration,
    ) -> Self {
        // Saturates on overflow; `is_well_formed` then rejects the poll.
        let total_votes = checked_total(&options).unwrap_or(u64::MAX);
        Poll {
            options,
            total_votes,
            ends_at,
            duration,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        (MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&self.options.len())
            && checked_total(&self.options) == Some(self.total_votes)
    }

    pub fn is_closed(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.ends_at
    }

    /// Vote share per option in percent, all zero when nobody voted.
    pub fn percentages(&self) -> Vec<f64> {
        self.options
            .iter()
            .map(|o| {
                if self.total_votes == 0 {
                    0.0
                } else {
                    o.votes as f64 * 100.0 / self.total_votes as f64
                }
            })
            .collect()
    }
}

fn checked_total(options: &[PollOption]) -> Option<u64> {
    options
        .iter()
        .try_fold(0u64, |total, option| total.checked_add(option.votes))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: User,
    pub content: String,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub poll: Option<Poll>,
    #[serde(default)]
    pub likes: HashSet<UserId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        self.likes.contains(user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: User,
    pub content: String,
}
