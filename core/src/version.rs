use std::cmp::Ordering;
use thiserror::Error;

pub use semver::Version;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),
    #[error("Version {pinned} does not appear in specifier {specifier:?}")]
    Substitution { pinned: String, specifier: String },
}

/// Parse a registry version string under strict semver rules
pub fn parse_version(s: &str) -> Result<Version, VersionError> {
    Version::parse(s.trim()).map_err(|_| VersionError::InvalidVersion(s.to_string()))
}

/// Semver precedence: build metadata is ignored, a pre-release sorts
/// below its release.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// The highest version in `versions` under semver precedence.
///
/// Sorts descending and takes the head; versions of equal precedence fall
/// back to the full ordering (build metadata) so the winner is stable.
pub fn greatest<'a, I>(versions: I) -> Option<Version>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parsed: Vec<Version> = versions
        .into_iter()
        .filter_map(|v| Version::parse(v).ok())
        .collect();
    parsed.sort_by(|a, b| precedence(b, a).then_with(|| b.cmp(a)));
    parsed.into_iter().next()
}

/// Range operator in front of a pinned version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// ^1.2.3
    Caret,
    /// ~1.2.3
    Tilde,
    /// 1.2.3
    Exact,
}

/// A dependency specifier reduced to the one shape that can be bumped:
/// an optional `^`/`~` followed by a full semantic version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    Pinned {
        operator: Operator,
        /// The version text exactly as it appears in the specifier
        raw: String,
        version: Version,
    },
    /// Ranges, tags, URLs, workspace/file links, partial versions
    Unparseable,
}

impl Specifier {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let (operator, rest) = if let Some(rest) = s.strip_prefix('^') {
            (Operator::Caret, rest)
        } else if let Some(rest) = s.strip_prefix('~') {
            (Operator::Tilde, rest)
        } else {
            (Operator::Exact, s)
        };

        // semver accepts none of: spaces, `||`, comparators, `x` wildcards
        match Version::parse(rest) {
            Ok(version) => Specifier::Pinned {
                operator,
                raw: rest.to_string(),
                version,
            },
            Err(_) => Specifier::Unparseable,
        }
    }

    pub fn pinned(&self) -> Option<&Version> {
        match self {
            Specifier::Pinned { version, .. } => Some(version),
            Specifier::Unparseable => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Specifier::Pinned { raw, .. } => Some(raw),
            Specifier::Unparseable => None,
        }
    }
}

/// Replace the literal `pinned` text inside `specifier` with `resolved`.
///
/// Only the first occurrence is touched; everything around it (operator,
/// surrounding whitespace) is carried over verbatim.
pub fn substitute(specifier: &str, pinned: &str, resolved: &str) -> Result<String, VersionError> {
    let Some(start) = specifier.find(pinned) else {
        return Err(VersionError::Substitution {
            pinned: pinned.to_string(),
            specifier: specifier.to_string(),
        });
    };
    let end = start + pinned.len();
    Ok(format!("{}{resolved}{}", &specifier[..start], &specifier[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_pinned_forms() {
        assert_eq!(
            Specifier::parse("^1.2.3"),
            Specifier::Pinned {
                operator: Operator::Caret,
                raw: "1.2.3".to_string(),
                version: v("1.2.3"),
            }
        );
        assert_eq!(Specifier::parse("~0.4.0").pinned(), Some(&v("0.4.0")));
        assert_eq!(Specifier::parse("2.0.0-beta.1").pinned(), Some(&v("2.0.0-beta.1")));
        assert_eq!(Specifier::parse(" ^3.0.0 ").raw(), Some("3.0.0"));
    }

    #[test]
    fn test_parse_unparseable_forms() {
        for spec in [
            "git+https://example/repo.git",
            ">=1.0.0 <2.0.0",
            "^1.0.0 || ^2.0.0",
            "latest",
            "*",
            "",
            "1.2",
            "1.x",
            "file:../local",
            "workspace:^1.0.0",
            "npm:other@^1.0.0",
            ">=1.0.0",
        ] {
            assert_eq!(Specifier::parse(spec), Specifier::Unparseable, "{spec}");
        }
    }

    #[test]
    fn test_semver_ordering_not_lexicographic() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("2.0.0-rc.1"));
        assert!(v("2.0.0-rc.10") > v("2.0.0-rc.2"));
        assert!(v("2.0.0-beta") > v("2.0.0-alpha.9"));
    }

    #[test]
    fn test_precedence_ignores_build_metadata() {
        assert_eq!(precedence(&v("1.0.0+a"), &v("1.0.0+b")), Ordering::Equal);
        assert_eq!(precedence(&v("1.0.0-rc.1"), &v("1.0.0")), Ordering::Less);
    }

    #[test]
    fn test_greatest_picks_highest_precedence() {
        let versions = ["1.9.0", "1.10.0", "not-a-version", "1.10.0-rc.1", "0.1.0"];
        assert_eq!(greatest(versions), Some(v("1.10.0")));
        assert_eq!(greatest(["3.0.0-alpha", "2.9.9"]), Some(v("3.0.0-alpha")));
        assert_eq!(greatest(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_substitute_keeps_surroundings() {
        assert_eq!(substitute("^1.2.0", "1.2.0", "1.3.0").unwrap(), "^1.3.0");
        assert_eq!(substitute(" ~1.2.0 ", "1.2.0", "1.2.5").unwrap(), " ~1.2.5 ");
        assert!(matches!(
            substitute("^1.2.0", "1.2.1", "1.3.0"),
            Err(VersionError::Substitution { .. })
        ));
    }
}
