//! Known external profile URL shapes, rendered as branded chips.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// External platform a profile link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// twitter.com and x.com
    Twitter,
    /// github.com
    GitHub,
    /// bsky.app
    Bluesky,
    /// youtube.com channels
    YouTube,
    /// instagram.com
    Instagram,
    /// twitch.tv
    Twitch,
    /// reddit.com users
    Reddit,
    /// Any `https://host/@user` fediverse profile
    Fediverse,
}

impl Service {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Twitter => "X",
            Self::GitHub => "GitHub",
            Self::Bluesky => "Bluesky",
            Self::YouTube => "YouTube",
            Self::Instagram => "Instagram",
            Self::Twitch => "Twitch",
            Self::Reddit => "Reddit",
            Self::Fediverse => "Fediverse",
        }
    }

    /// Parse the `service` attribute of a `social` element
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "twitter" | "x" => Some(Self::Twitter),
            "github" => Some(Self::GitHub),
            "bluesky" | "bsky" => Some(Self::Bluesky),
            "youtube" => Some(Self::YouTube),
            "instagram" => Some(Self::Instagram),
            "twitch" => Some(Self::Twitch),
            "reddit" => Some(Self::Reddit),
            "mastodon" | "misskey" | "fediverse" => Some(Self::Fediverse),
            _ => None,
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A recognized profile link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    /// Platform
    pub service: Service,
    /// Handle as shown on the chip
    pub handle: String,
    /// Original URL
    pub href: String,
}

// Order matters: specific hosts first, the generic fediverse shape last
static PATTERNS: LazyLock<Vec<(Service, Regex)>> = LazyLock::new(|| {
    [
        (
            Service::Twitter,
            r"^https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/([A-Za-z0-9_]{1,15})/?$",
        ),
        (
            Service::GitHub,
            r"^https?://(?:www\.)?github\.com/([A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)/?$",
        ),
        (
            Service::Bluesky,
            r"^https?://bsky\.app/profile/([A-Za-z0-9.:\-]+)/?$",
        ),
        (
            Service::YouTube,
            r"^https?://(?:www\.|m\.)?youtube\.com/@([A-Za-z0-9_.\-]+)/?$",
        ),
        (
            Service::Instagram,
            r"^https?://(?:www\.)?instagram\.com/([A-Za-z0-9_.]+)/?$",
        ),
        (
            Service::Twitch,
            r"^https?://(?:www\.)?twitch\.tv/([A-Za-z0-9_]+)/?$",
        ),
        (
            Service::Reddit,
            r"^https?://(?:www\.|old\.)?reddit\.com/u(?:ser)?/([A-Za-z0-9_\-]+)/?$",
        ),
        (
            Service::Fediverse,
            r"^https?://([A-Za-z0-9.\-]+\.[A-Za-z]{2,})/@([A-Za-z0-9_.]+)/?$",
        ),
    ]
    .into_iter()
    .map(|(service, pattern)| {
        (
            service,
            Regex::new(pattern).expect("valid social profile pattern"),
        )
    })
    .collect()
});

/// Match a URL against the known profile shapes
pub fn match_profile(url: &str) -> Option<SocialLink> {
    let url = url.trim();
    PATTERNS.iter().find_map(|(service, pattern)| {
        let caps = pattern.captures(url)?;
        let handle = match service {
            Service::Fediverse => {
                let host = caps.get(1)?.as_str();
                let user = caps.get(2)?.as_str();
                format!("@{user}@{host}")
            }
            Service::YouTube => format!("@{}", caps.get(1)?.as_str()),
            Service::Reddit => format!("u/{}", caps.get(1)?.as_str()),
            _ => caps.get(1)?.as_str().to_string(),
        };
        Some(SocialLink {
            service: *service,
            handle,
            href: url.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_of(url: &str) -> Option<Service> {
        match_profile(url).map(|l| l.service)
    }

    #[test]
    fn test_known_profiles() {
        assert_eq!(service_of("https://x.com/jack"), Some(Service::Twitter));
        assert_eq!(service_of("https://twitter.com/jack/"), Some(Service::Twitter));
        assert_eq!(service_of("https://github.com/rust-lang"), Some(Service::GitHub));
        assert_eq!(
            service_of("https://bsky.app/profile/alice.bsky.social"),
            Some(Service::Bluesky)
        );
        assert_eq!(service_of("https://www.youtube.com/@chan"), Some(Service::YouTube));
        assert_eq!(service_of("https://reddit.com/u/spez"), Some(Service::Reddit));
    }

    #[test]
    fn test_fediverse_handle() {
        let link = match_profile("https://mastodon.social/@Gargron").unwrap();
        assert_eq!(link.service, Service::Fediverse);
        assert_eq!(link.handle, "@Gargron@mastodon.social");
    }

    #[test]
    fn test_non_profile_urls() {
        // A repository page is not a profile
        assert_eq!(service_of("https://github.com/rust-lang/rust"), None);
        assert_eq!(service_of("https://x.com/jack/status/20"), None);
        assert_eq!(service_of("https://example.com/about"), None);
    }

    #[test]
    fn test_service_names() {
        assert_eq!(Service::from_name("Mastodon"), Some(Service::Fediverse));
        assert_eq!(Service::from_name("bsky"), Some(Service::Bluesky));
        assert_eq!(Service::from_name("myspace"), None);
    }
}
