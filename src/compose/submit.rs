//! Submission building: validation, mention extraction, destination
//! dedupe and per-mode transport dispatch.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::api::{PostOptions, Transport};
use crate::error::ValidationError;
use crate::models::{ComposerMode, SubmissionPayload, TargetRef};

use super::attachments::MediaAttachmentList;

static MENTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\S+)").expect("valid mention token pattern"));

/// Check a draft against the mode's requirements
pub fn validate(
    mode: ComposerMode,
    body: &str,
    attachments: &MediaAttachmentList,
    target: Option<&TargetRef>,
) -> Result<(), ValidationError> {
    if mode.requires_target() && target.is_none() {
        return Err(ValidationError::MissingTarget);
    }
    if mode == ComposerMode::Media && attachments.is_empty() {
        return Err(ValidationError::NoAttachments);
    }
    if !mode.allows_empty_body() && body.trim().is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    Ok(())
}

/// Every `@token` in the body, literally, in order of appearance.
///
/// Tokens are never resolved against a directory. Confirmed mentions were
/// already substituted with contact IDs, so those come out as IDs.
pub fn extract_mentions(body: &str) -> Vec<String> {
    MENTION_TOKEN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Selected timelines plus the home timeline when the toggle is on
pub fn compute_destinations(
    selected: &BTreeSet<String>,
    home: Option<&str>,
    post_home: bool,
) -> BTreeSet<String> {
    let mut destinations = selected.clone();
    if post_home && let Some(home) = home {
        destinations.insert(home.to_string());
    }
    destinations
}

/// Send a payload through the transport operation for `mode`
pub async fn dispatch(
    transport: &impl Transport,
    mode: ComposerMode,
    payload: &SubmissionPayload,
) -> Result<()> {
    let destinations = payload.destination_list();
    let options = PostOptions {
        emojis: &payload.emojis,
        mentions: &payload.mentions,
        whisper: &payload.whisper,
        profile_override_id: payload.profile_override_id.as_deref(),
        media: &payload.media,
        target: payload.target.as_ref(),
    };
    let body = payload.body.as_str();

    tracing::debug!("Dispatching {} post to {:?}", mode, destinations);

    match mode {
        ComposerMode::Plaintext => transport.plaintext(body, &destinations, options).await,
        ComposerMode::Markdown => transport.markdown(body, &destinations, options).await,
        ComposerMode::Media => transport.media(body, &destinations, options).await,
        ComposerMode::Reply => transport.reply(body, &destinations, options).await,
        ComposerMode::Reroute => transport.reroute(body, &destinations, options).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaAttachment;

    #[test]
    fn test_blank_body_rejected_outside_media_and_reroute() {
        let none = MediaAttachmentList::new();
        assert_eq!(
            validate(ComposerMode::Markdown, "  \n\t", &none, None),
            Err(ValidationError::EmptyBody)
        );
        assert_eq!(
            validate(ComposerMode::Plaintext, "", &none, None),
            Err(ValidationError::EmptyBody)
        );

        let target = TargetRef::new("m1", "author");
        assert_eq!(validate(ComposerMode::Reroute, "", &none, Some(&target)), Ok(()));
        assert_eq!(
            validate(ComposerMode::Reply, " ", &none, Some(&target)),
            Err(ValidationError::EmptyBody)
        );
    }

    #[test]
    fn test_media_needs_attachments() {
        let mut list = MediaAttachmentList::new();
        assert_eq!(
            validate(ComposerMode::Media, "caption", &list, None),
            Err(ValidationError::NoAttachments)
        );
        list.append(MediaAttachment::new("A", "image/png"));
        assert_eq!(validate(ComposerMode::Media, "", &list, None), Ok(()));
    }

    #[test]
    fn test_reply_and_reroute_need_target() {
        let none = MediaAttachmentList::new();
        assert_eq!(
            validate(ComposerMode::Reply, "hi", &none, None),
            Err(ValidationError::MissingTarget)
        );
        assert_eq!(
            validate(ComposerMode::Reroute, "", &none, None),
            Err(ValidationError::MissingTarget)
        );
    }

    #[test]
    fn test_mentions_are_literal_tokens() {
        assert_eq!(
            extract_mentions("hi @CC123 and @bob, also @ alone"),
            ["CC123", "bob,"]
        );
        assert!(extract_mentions("no mentions here").is_empty());
    }

    #[test]
    fn test_mentions_end_at_unicode_whitespace() {
        assert_eq!(extract_mentions("@CC1\u{3000}こんにちは"), ["CC1"]);
        assert_eq!(extract_mentions("@CC1\u{a0}and @CC2"), ["CC1", "CC2"]);
    }

    #[test]
    fn test_home_destination_is_deduplicated() {
        let selected: BTreeSet<String> = ["T1", "T2"].iter().map(|s| s.to_string()).collect();

        let with_home = compute_destinations(&selected, Some("T1"), true);
        assert_eq!(with_home, selected);

        let other_home = compute_destinations(&selected, Some("H"), true);
        assert_eq!(other_home.len(), 3);

        let toggled_off = compute_destinations(&selected, Some("H"), false);
        assert_eq!(toggled_off, selected);
    }

    /// Records which operation ran
    #[derive(Default)]
    struct OpLog(std::sync::Mutex<Vec<&'static str>>);

    impl OpLog {
        fn push(&self, op: &'static str, options: PostOptions<'_>) -> Result<()> {
            if op == "reply" && options.target.is_none() {
                anyhow::bail!("reply without target");
            }
            self.0.lock().unwrap().push(op);
            Ok(())
        }
    }

    impl Transport for OpLog {
        async fn plaintext(&self, _: &str, _: &[String], o: PostOptions<'_>) -> Result<()> {
            self.push("plaintext", o)
        }
        async fn markdown(&self, _: &str, _: &[String], o: PostOptions<'_>) -> Result<()> {
            self.push("markdown", o)
        }
        async fn media(&self, _: &str, _: &[String], o: PostOptions<'_>) -> Result<()> {
            self.push("media", o)
        }
        async fn reply(&self, _: &str, _: &[String], o: PostOptions<'_>) -> Result<()> {
            self.push("reply", o)
        }
        async fn reroute(&self, _: &str, _: &[String], o: PostOptions<'_>) -> Result<()> {
            self.push("reroute", o)
        }
    }

    #[test]
    fn test_dispatch_calls_exactly_one_operation() {
        let log = OpLog::default();
        let payload = SubmissionPayload {
            body: "hi".to_string(),
            target: Some(TargetRef::new("m1", "author")),
            ..SubmissionPayload::default()
        };

        for mode in ComposerMode::all() {
            tokio_test::block_on(dispatch(&log, *mode, &payload)).unwrap();
        }
        assert_eq!(
            *log.0.lock().unwrap(),
            ["plaintext", "markdown", "media", "reply", "reroute"]
        );

        let untargeted = SubmissionPayload::default();
        assert!(tokio_test::block_on(dispatch(&log, ComposerMode::Reply, &untargeted)).is_err());
    }
}
