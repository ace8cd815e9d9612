//! Account and latest-post lookup against the external API

use super::bot_reply;
use crate::{
    context::CommandContext,
    permissions::UserRecord,
    registry::{ChatCommand, CommandDescriptor},
};
use async_trait::async_trait;
use comet_api::Post;
use comet_common::{utils::truncate_string, CometError, MessageEvent, OutgoingMessage, Result};
use tracing::{debug, warn};

const MAX_HANDLE_LEN: usize = 15;
const MAX_POST_CHARS: usize = 500;

fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle.chars().count() <= MAX_HANDLE_LEN
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn format_post(handle: &str, post: &Post) -> OutgoingMessage {
    let mut text = format!("@{handle}:\n{}", truncate_string(&post.full_text, MAX_POST_CHARS));
    if let Some(sent_at) = post.sent_at() {
        text.push_str(&format!("\n\nPosted at {}", sent_at.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    let mut message = bot_reply(text);
    for url in post.photo_urls() {
        message.push_rich("image", url);
    }
    message
}

/// User-facing text for lookup failures the user can act on; `None` for everything else
fn describe_failure(handle: &str, err: &CometError) -> Option<String> {
    match err {
        CometError::RateLimitExceeded { .. } => {
            Some("The API call limit has been reached, please try again later.".to_string())
        }
        CometError::EmptyResult { .. } => Some(format!("@{handle} has not posted anything yet.")),
        CometError::ApiProtocol { code, reason } => {
            Some(format!("Lookup failed: {reason} ({code})"))
        }
        CometError::ParseFailure { .. } => Some(
            "The API returned something unexpected, the response was saved for review.".to_string(),
        ),
        _ => None,
    }
}

/// `/lookup <account>` and `/lookup profile <account>`, alias `/tw`
pub struct LookupCommand {
    descriptor: CommandDescriptor,
}

impl Default for LookupCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("lookup")
                .with_aliases(["tw"])
                .with_permission("comet.commands.lookup")
                .with_description("Look up an account's latest post")
                .with_help(concat!(
                    "/tw [account]  latest post of an account\n",
                    "/tw profile [account]  account summary",
                )),
        }
    }
}

impl LookupCommand {
    async fn latest_post(&self, ctx: &CommandContext, handle: &str) -> Result<OutgoingMessage> {
        match ctx.twitter.fetch_latest_post_cached(handle).await {
            Ok(post) => Ok(format_post(handle, &post)),
            Err(e) => self.recover(handle, e),
        }
    }

    async fn profile(&self, ctx: &CommandContext, handle: &str) -> Result<OutgoingMessage> {
        match ctx.twitter.fetch_profile(handle).await {
            Ok(profile) => Ok(bot_reply(profile.summary())),
            Err(e) => self.recover(handle, e),
        }
    }

    fn recover(&self, handle: &str, err: CometError) -> Result<OutgoingMessage> {
        match describe_failure(handle, &err) {
            Some(text) => {
                warn!(account = handle, error = %err, "Lookup failed");
                Ok(bot_reply(text))
            }
            None => Err(err),
        }
    }
}

#[async_trait]
impl ChatCommand for LookupCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        _event: &MessageEvent,
        args: &[String],
        user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        let (handle, profile) = match args {
            [handle] => (handle.trim_start_matches('@'), false),
            [mode, handle] if mode == "profile" => (handle.trim_start_matches('@'), true),
            _ => return Ok(OutgoingMessage::text(self.descriptor.help.clone())),
        };

        if !ctx.cooldowns.is_allowed_default(user.id) {
            return Ok(OutgoingMessage::empty());
        }
        if !is_valid_handle(handle) {
            return Ok(bot_reply("That doesn't look like a valid account name."));
        }

        debug!(account = handle, profile, "Looking up account");
        if profile {
            self.profile(ctx, handle).await
        } else {
            self.latest_post(ctx, handle).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_api::models::{Entities, Media};
    use comet_common::MessageSegment;

    #[test]
    fn test_handle_validation() {
        assert!(is_valid_handle("jack"));
        assert!(is_valid_handle("Some_User_01"));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("a/b"));
        assert!(!is_valid_handle("name&count=200"));
        assert!(!is_valid_handle("abcdefghijklmnop"));
    }

    #[test]
    fn test_format_post_with_photos() {
        let post = Post {
            id: 1,
            full_text: "hello".to_string(),
            created_at: "Wed Oct 10 20:19:24 +0000 2018".to_string(),
            entities: Entities {
                media: vec![
                    Media {
                        kind: "photo".to_string(),
                        media_url_https: "https://img/1.jpg".to_string(),
                    },
                    Media {
                        kind: "video".to_string(),
                        media_url_https: "https://img/2.mp4".to_string(),
                    },
                ],
            },
            ..Post::default()
        };

        let message = format_post("jack", &post);
        assert!(message.plain_text().starts_with("Bot > @jack:\nhello"));
        assert!(message.plain_text().contains("2018-10-10 20:19:24 UTC"));
        assert_eq!(message.segments().len(), 2);
        match &message.segments()[1] {
            MessageSegment::Rich { kind, payload } => {
                assert_eq!(kind, "image");
                assert_eq!(payload, "https://img/1.jpg");
            }
            other => panic!("unexpected segment: {other:?}"),
        }
    }

    #[test]
    fn test_failure_descriptions() {
        let limited = CometError::RateLimitExceeded { used: 1500, limit: 1500 };
        assert!(describe_failure("jack", &limited).unwrap().contains("limit"));

        let protocol = CometError::api_protocol(50, "User not found.");
        assert_eq!(
            describe_failure("jack", &protocol).as_deref(),
            Some("Lookup failed: User not found. (50)")
        );

        assert!(describe_failure("jack", &CometError::empty_result("none")).is_some());
        assert!(describe_failure("jack", &CometError::timeout("slow")).is_none());
    }
}
