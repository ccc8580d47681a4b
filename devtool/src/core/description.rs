//! Parsing of `git describe` output.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Distance from the described tag to `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offset {
    /// Number of commits on top of the tag.
    pub count: u32,
    /// Abbreviated commit hash of `HEAD` (without git's `g` marker).
    pub commit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitDescription {
    pub description: String,
    pub tag: String,
    pub offset: Option<Offset>,
}

impl GitDescription {
    /// Parse `git describe` output. Returns `None` for empty input.
    ///
    /// `<tag>` means `HEAD` is exactly at the tag; `<tag>-<n>-g<sha>` carries
    /// an offset. Only the suffix is matched, so tags may contain hyphens.
    pub fn parse(s: &str) -> Option<Self> {
        static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(?P<tag>.+)-(?P<count>\d+)-g(?P<commit>[0-9a-f]+)$").unwrap()
        });

        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(caps) = SUFFIX_RE.captures(s)
            && let Ok(count) = caps["count"].parse::<u32>()
        {
            return Some(Self {
                description: s.to_string(),
                tag: caps["tag"].to_string(),
                offset: Some(Offset {
                    count,
                    commit: caps["commit"].to_string(),
                }),
            });
        }

        Some(Self {
            description: s.to_string(),
            tag: s.to_string(),
            offset: None,
        })
    }

    /// True when `HEAD` is exactly at the described tag.
    pub fn is_at_tag(&self) -> bool {
        self.offset.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_none() {
        assert_eq!(GitDescription::parse(""), None);
        assert_eq!(GitDescription::parse("  \n"), None);
    }

    #[test]
    fn bare_tag_has_no_offset() {
        let d = GitDescription::parse("v0.0.21\n").expect("parse");
        assert_eq!(
            d,
            GitDescription {
                description: "v0.0.21".to_string(),
                tag: "v0.0.21".to_string(),
                offset: None,
            }
        );
        assert!(d.is_at_tag());
    }

    #[test]
    fn tag_with_offset() {
        let d = GitDescription::parse("v0.0.21-1-gdf3eff3").expect("parse");
        assert_eq!(d.tag, "v0.0.21");
        assert_eq!(
            d.offset,
            Some(Offset {
                count: 1,
                commit: "df3eff3".to_string(),
            })
        );
        assert!(!d.is_at_tag());
    }

    #[test]
    fn hyphenated_tag_keeps_its_hyphens() {
        let d = GitDescription::parse("release-2024-01-12-gabc1234").expect("parse");
        assert_eq!(d.tag, "release-2024-01");
        assert_eq!(d.offset.expect("offset").count, 12);

        let d = GitDescription::parse("release-candidate").expect("parse");
        assert_eq!(d.tag, "release-candidate");
        assert!(d.is_at_tag());
    }
}
