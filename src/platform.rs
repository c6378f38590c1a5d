//! Registry of supported social platforms and their profile URL layout

use serde::Serialize;

/// Name of the sentinel entry that takes a full URL instead of a username
pub const CUSTOM_LINK: &str = "Custom Link";

/// A social platform and the URL pieces wrapped around a username
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformEntry {
    /// Display name, unique across the registry
    pub name: &'static str,
    /// Prefix placed before the username; empty for the custom-link sentinel
    pub url_prefix: &'static str,
    /// Suffix placed after the username
    pub url_suffix: &'static str,
}

impl PlatformEntry {
    const fn new(name: &'static str, url_prefix: &'static str) -> Self {
        Self {
            name,
            url_prefix,
            url_suffix: "",
        }
    }

    /// Whether this entry is the custom-link sentinel
    pub fn is_custom(&self) -> bool {
        self.url_prefix.is_empty()
    }

    /// Build the profile URL for `username`
    pub fn profile_url(&self, username: &str) -> String {
        format!("{}{}{}", self.url_prefix, username, self.url_suffix)
    }
}

static PLATFORMS: [PlatformEntry; 7] = [
    PlatformEntry {
        url_suffix: "/",
        ..PlatformEntry::new("Instagram", "https://www.instagram.com/")
    },
    PlatformEntry::new("TikTok", "https://www.tiktok.com/@"),
    PlatformEntry::new("Twitter", "https://twitter.com/"),
    PlatformEntry::new("Facebook", "https://www.facebook.com/"),
    PlatformEntry::new("LinkedIn", "https://www.linkedin.com/in/"),
    PlatformEntry::new("YouTube", "https://www.youtube.com/c/"),
    PlatformEntry::new(CUSTOM_LINK, ""),
];

/// All registry entries in display order
pub fn all() -> &'static [PlatformEntry] {
    &PLATFORMS
}

/// Look up a platform by exact name
pub fn lookup(name: &str) -> Option<&'static PlatformEntry> {
    PLATFORMS.iter().find(|p| p.name == name)
}

/// Look up a platform by name, ignoring ASCII case (used for CLI input)
pub fn lookup_ignore_case(name: &str) -> Option<&'static PlatformEntry> {
    let name = name.trim();
    PLATFORMS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Find the platform a link points at. The longest matching prefix wins and
/// the custom-link sentinel never matches.
pub fn identify(link: &str) -> Option<&'static PlatformEntry> {
    PLATFORMS
        .iter()
        .filter(|p| !p.is_custom() && link.starts_with(p.url_prefix))
        .max_by_key(|p| p.url_prefix.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = all().iter().map(|p| p.name).collect();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_display_order() {
        let names: Vec<_> = all().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "Instagram",
                "TikTok",
                "Twitter",
                "Facebook",
                "LinkedIn",
                "YouTube",
                "Custom Link"
            ]
        );
    }

    #[test]
    fn test_only_sentinel_is_custom() {
        let custom: Vec<_> = all().iter().filter(|p| p.is_custom()).collect();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].name, CUSTOM_LINK);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            lookup("TikTok").map(|p| p.url_prefix),
            Some("https://www.tiktok.com/@")
        );
        assert!(lookup("tiktok").is_none());
        assert_eq!(lookup_ignore_case(" tiktok ").map(|p| p.name), Some("TikTok"));
        assert!(lookup("Myspace").is_none());
    }

    #[test]
    fn test_identify() {
        assert_eq!(
            identify("https://www.instagram.com/alice/").map(|p| p.name),
            Some("Instagram")
        );
        assert_eq!(
            identify("https://www.linkedin.com/in/bob").map(|p| p.name),
            Some("LinkedIn")
        );
        assert!(identify("https://example.com/x").is_none());
        assert!(identify("").is_none());
    }
}
