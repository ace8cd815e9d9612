//! Response models of the lookup API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Account profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Numeric account id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Handle without the leading `@`
    pub screen_name: String,
    /// Bio
    #[serde(default)]
    pub description: Option<String>,
    /// Follower count
    #[serde(default)]
    pub followers_count: u64,
    /// Following count
    #[serde(default)]
    pub friends_count: u64,
    /// Number of posts
    #[serde(default)]
    pub statuses_count: u64,
    /// Account creation time in the API's text format
    #[serde(default)]
    pub created_at: String,
}

impl Profile {
    /// Multi-line summary for chat replies
    pub fn summary(&self) -> String {
        let mut text = format!("{} (@{})\n", self.name, self.screen_name);
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            text.push_str(description);
            text.push('\n');
        }
        text.push_str(&format!(
            "Followers: {} | Following: {} | Posts: {}",
            self.followers_count, self.friends_count, self.statuses_count
        ));
        text
    }
}

/// Attached media entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Media kind ("photo", "video", ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Direct media URL
    #[serde(default)]
    pub media_url_https: String,
}

/// Entities block of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// Attached media
    #[serde(default)]
    pub media: Vec<Media>,
}

/// A single post from an account timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id
    pub id: u64,
    /// Untruncated text (requested with `tweet_mode=extended`)
    pub full_text: String,
    /// Creation time in the API's text format
    #[serde(default)]
    pub created_at: String,
    /// Author, when embedded
    #[serde(default)]
    pub user: Option<Profile>,
    /// Repost count
    #[serde(default)]
    pub retweet_count: u64,
    /// Like count
    #[serde(default)]
    pub favorite_count: u64,
    /// Attached media
    #[serde(default)]
    pub entities: Entities,
}

impl Post {
    /// Parsed creation time
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }

    /// URLs of attached photos
    pub fn photo_urls(&self) -> impl Iterator<Item = &str> {
        self.entities
            .media
            .iter()
            .filter(|media| media.kind == "photo" && !media.media_url_https.is_empty())
            .map(|media| media.media_url_https.as_str())
    }
}

/// Structured error body returned instead of the expected payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Reported errors, most relevant first
    pub errors: Vec<ApiErrorEntry>,
}

/// One entry of an [`ApiErrorBody`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    /// API error code
    pub code: i64,
    /// Human readable reason
    pub message: String,
}

impl ApiErrorBody {
    /// The first entry, which carries the code surfaced to callers
    pub fn primary(&self) -> Option<&ApiErrorEntry> {
        self.errors.first()
    }

    /// All reasons joined for logging
    pub fn reason(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Body of a successful client-credentials exchange
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// Token kind, "bearer"
    pub token_type: String,
    /// The bearer token
    pub access_token: String,
}
