//! Version numbers as they appear in tags and package manifests.
//!
//! A version is an optional `v` prefix followed by one, two or three
//! dot-separated numbers. The textual form is preserved: `v1.2` stays a
//! two-component, prefixed version through parse, increment and display.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Error, Result, bail};
use serde::{Deserialize, Serialize};

/// Numeric components of a version; the last one is bumped on increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Components {
    Major(u64),
    MajorMinor(u64, u64),
    Full(u64, u64, u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    prefixed: bool,
    components: Components,
}

impl Version {
    pub fn new(prefixed: bool, components: Components) -> Self {
        Self {
            prefixed,
            components,
        }
    }

    pub fn components(&self) -> Components {
        self.components
    }

    /// Same version with the `v` prefix set or cleared.
    #[must_use]
    pub fn with_prefix(&self, prefixed: bool) -> Self {
        Self {
            prefixed,
            ..self.clone()
        }
    }

    /// Add one to the last component. Earlier components are untouched.
    ///
    /// Fails when the last component is already `u64::MAX`.
    pub fn increment(&mut self) -> Result<()> {
        let bump = |n: u64| {
            n.checked_add(1)
                .with_context(|| format!("cannot increment version '{self}': component overflows"))
        };
        let next = match self.components {
            Components::Major(major) => Components::Major(bump(major)?),
            Components::MajorMinor(major, minor) => Components::MajorMinor(major, bump(minor)?),
            Components::Full(major, minor, patch) => {
                Components::Full(major, minor, bump(patch)?)
            }
        };
        self.components = next;
        Ok(())
    }

    pub fn incremented(&self) -> Result<Self> {
        let mut next = self.clone();
        next.increment()?;
        Ok(next)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefixed {
            f.write_str("v")?;
        }
        match self.components {
            Components::Major(major) => write!(f, "{major}"),
            Components::MajorMinor(major, minor) => write!(f, "{major}.{minor}"),
            Components::Full(major, minor, patch) => write!(f, "{major}.{minor}.{patch}"),
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (prefixed, rest) = match s.strip_prefix('v') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let numbers = rest
            .split('.')
            .map(|part| parse_component(part, s))
            .collect::<Result<Vec<_>>>()?;
        let components = match numbers.as_slice() {
            [major] => Components::Major(*major),
            [major, minor] => Components::MajorMinor(*major, *minor),
            [major, minor, patch] => Components::Full(*major, *minor, *patch),
            _ => bail!("could not parse '{s}' as version: expected 1 to 3 components"),
        };
        Ok(Self {
            prefixed,
            components,
        })
    }
}

fn parse_component(part: &str, whole: &str) -> Result<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        bail!("could not parse '{whole}' as version: invalid component '{part}'");
    }
    part.parse::<u64>()
        .with_context(|| format!("could not parse '{whole}' as version"))
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Version {
        s.parse().expect("valid version")
    }

    #[test]
    fn display_round_trips_input() {
        for input in ["1", "v1", "1.2", "v1.2", "1.2.3", "v1.2.3", "v0.0.0"] {
            assert_eq!(parse(input).to_string(), input);
        }
    }

    #[test]
    fn prefix_toggles() {
        let version = parse("1.2.3");
        assert_eq!(version.with_prefix(true).to_string(), "v1.2.3");
        assert_eq!(parse("v7").with_prefix(false).to_string(), "7");
        assert_eq!(version.with_prefix(false), version);
    }

    #[test]
    fn increment_bumps_last_component_only() {
        for (input, expected) in [
            ("1", "2"),
            ("v1.2", "v1.3"),
            ("1.9.9", "1.9.10"),
            ("v0.0.21", "v0.0.22"),
        ] {
            let next = parse(input).incremented().expect("increment");
            assert_eq!(next.to_string(), expected);
        }
    }

    #[test]
    fn increment_overflow_is_an_error() {
        let max = u64::MAX;
        for input in [format!("v{max}"), format!("1.{max}"), format!("0.0.{max}")] {
            let mut version = parse(&input);
            let err = version.increment().unwrap_err();
            assert!(err.to_string().contains("overflows"), "{err:#}");
            assert_eq!(version.to_string(), input, "left unchanged on overflow");
        }
        assert_eq!(
            parse(&format!("{max}.0")).incremented().expect("minor").to_string(),
            format!("{max}.1")
        );
    }

    #[test]
    fn rejects_malformed_versions() {
        for input in ["", "v", "1.2.3.4", "1..2", "a.b", "1.2-rc1", "-1", "v1.+2"] {
            assert!(input.parse::<Version>().is_err(), "accepted '{input}'");
        }
    }

    #[test]
    fn serializes_as_string() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            version: Version,
        }
        let holder: Holder = toml::from_str("version = \"v2.1\"").expect("parse");
        assert_eq!(holder.version, parse("v2.1"));
        let out = toml::to_string(&holder).expect("serialize");
        assert_eq!(out.trim(), "version = \"v2.1\"");

        assert!(toml::from_str::<Holder>("version = \"x\"").is_err());
    }
}
