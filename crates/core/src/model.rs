// Backend-owned entities read (and, for blog posts, created) through the tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tables of the relational backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    BlogPosts,
    SentMails,
    Subscribe,
    BroadcastGroups,
    GroupSubscribers,
    Profiles,
    Images,
    ImageTags,
    Tags,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlogPosts => "blog_posts",
            Self::SentMails => "sent_mails",
            Self::Subscribe => "subscribe",
            Self::BroadcastGroups => "broadcast_groups",
            Self::GroupSubscribers => "group_subscribers",
            Self::Profiles => "profiles",
            Self::Images => "images",
            Self::ImageTags => "image_tags",
            Self::Tags => "tags",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blog post row (`blog_posts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by the blog-post creation endpoint of the app API.
/// Unset optionals are left out of the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub published: bool,
}

/// Delivery status of a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl BroadcastStatus {
    pub const ALL: [BroadcastStatus; 5] = [
        Self::Draft,
        Self::Scheduled,
        Self::Sending,
        Self::Sent,
        Self::Failed,
    ];

    /// Wire names, in the same order as [`Self::ALL`]
    pub const NAMES: [&'static str; 5] = ["draft", "scheduled", "sending", "sent", "failed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for BroadcastStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown broadcast status: {}", s))
    }
}

/// Sent or pending broadcast mail (`sent_mails`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: Uuid,
    pub subject: String,
    pub content: serde_json::Value,
    pub content_html: Option<String>,
    pub recipients: Vec<String>,
    pub status: BroadcastStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
    pub broadcast_id: Option<Uuid>,
    pub total_recipients: i64,
    pub opened_count: Option<i64>,
    pub clicked_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newsletter subscriber (`subscribe`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Broadcast audience group (`broadcast_groups`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_id: Option<Uuid>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership link between a group and a subscriber (`group_subscribers`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSubscriber {
    pub group_id: Uuid,
    pub subscriber_id: Uuid,
}

/// User profile (`profiles`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Uploaded image (`images`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub public_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag attached to images through `image_tags`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTag {
    pub image_id: Uuid,
    pub tag_id: Uuid,
}

/// Row counts across the application tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStats {
    pub blog_posts: u64,
    pub subscribers: u64,
    pub broadcasts: u64,
    pub images: u64,
    pub users: u64,
    pub broadcast_groups: u64,
    /// RFC 3339 with millisecond precision
    pub timestamp: String,
}
