//! Version directives and resolution

use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};

use crate::error::{BumpError, Result};

/// Literal directive meaning "leave this package alone"
pub const NO_CHANGE: &str = "none";

/// Which component of a version to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    /// x.y.Z
    Patch,
    /// x.Y.0
    Minor,
    /// X.0.0
    Major,
}

impl BumpKind {
    /// Apply the bump. Lower components reset to zero and pre-release and
    /// build metadata are dropped.
    pub fn apply(&self, version: &Version) -> Version {
        let mut next = version.clone();
        match self {
            Self::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            Self::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            Self::Patch => {
                next.patch += 1;
            }
        }
        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        next
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

impl FromStr for BumpKind {
    type Err = BumpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(BumpError::InvalidDirective(other.to_string())),
        }
    }
}

/// The requested version change for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Keep the current version
    NoChange,
    /// Increment a component
    Bump(BumpKind),
    /// Set an exact version
    Explicit(Version),
}

impl Directive {
    /// Whether this directive changes the version
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

impl FromStr for Directive {
    type Err = BumpError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == NO_CHANGE {
            return Ok(Self::NoChange);
        }
        if let Ok(kind) = s.parse::<BumpKind>() {
            return Ok(Self::Bump(kind));
        }

        let candidate = s.strip_prefix('v').unwrap_or(s);
        Version::parse(candidate)
            .map(Self::Explicit)
            .map_err(|_| BumpError::InvalidDirective(s.to_string()))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => write!(f, "{}", NO_CHANGE),
            Self::Bump(kind) => write!(f, "{}", kind),
            Self::Explicit(version) => write!(f, "{}", version),
        }
    }
}

/// Parse a package's current version
pub fn parse_version(package: &str, version: &str) -> Result<Version> {
    Version::parse(version).map_err(|e| {
        BumpError::discovery(format!(
            "package '{}' has invalid version '{}': {}",
            package, version, e
        ))
    })
}

/// Compute the version `package` moves to under `directive`.
///
/// An explicit version must be strictly greater than `current` by semver
/// precedence. `NoChange` yields the current version.
pub fn resolve(package: &str, current: &str, directive: &Directive) -> Result<Version> {
    let current_version = parse_version(package, current)?;

    match directive {
        Directive::NoChange => Ok(current_version),
        Directive::Bump(kind) => Ok(kind.apply(&current_version)),
        Directive::Explicit(requested) => {
            if requested.cmp_precedence(&current_version) != std::cmp::Ordering::Greater {
                return Err(BumpError::VersionNotAdvancing {
                    package: package.to_string(),
                    current: current.to_string(),
                    requested: requested.to_string(),
                });
            }
            Ok(requested.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(s: &str) -> Directive {
        s.parse().unwrap()
    }

    #[test]
    fn test_bump_kinds() {
        assert_eq!(resolve("a", "1.2.3", &directive("patch")).unwrap().to_string(), "1.2.4");
        assert_eq!(resolve("a", "1.2.3", &directive("minor")).unwrap().to_string(), "1.3.0");
        assert_eq!(resolve("a", "1.2.3", &directive("major")).unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_bump_drops_prerelease_and_build() {
        let next = resolve("a", "1.2.3-beta.1+build.5", &directive("patch")).unwrap();
        assert_eq!(next.to_string(), "1.2.4");

        let next = resolve("a", "0.9.0-rc.1", &directive("minor")).unwrap();
        assert_eq!(next.to_string(), "0.10.0");
    }

    #[test]
    fn test_explicit_must_advance() {
        let err = resolve("a", "1.0.0", &directive("0.9.0")).unwrap_err();
        assert!(matches!(err, BumpError::VersionNotAdvancing { .. }));

        let err = resolve("a", "1.0.0", &directive("1.0.0")).unwrap_err();
        assert!(matches!(err, BumpError::VersionNotAdvancing { .. }));

        assert_eq!(resolve("a", "1.0.0", &directive("2.0.0")).unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_explicit_prerelease_ordering() {
        // 1.0.0-rc.1 < 1.0.0
        let err = resolve("a", "1.0.0", &directive("1.0.0-rc.1")).unwrap_err();
        assert!(matches!(err, BumpError::VersionNotAdvancing { .. }));

        let next = resolve("a", "1.0.0-rc.1", &directive("1.0.0")).unwrap();
        assert_eq!(next.to_string(), "1.0.0");
    }

    #[test]
    fn test_no_change_keeps_version() {
        assert_eq!(resolve("a", "0.3.1", &Directive::NoChange).unwrap().to_string(), "0.3.1");
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(directive("none"), Directive::NoChange);
        assert_eq!(directive("minor"), Directive::Bump(BumpKind::Minor));
        assert_eq!(
            directive("v1.5.0"),
            Directive::Explicit(Version::new(1, 5, 0))
        );
        assert!(matches!(
            "prerelease".parse::<Directive>(),
            Err(BumpError::InvalidDirective(_))
        ));
        assert!(matches!("1.5".parse::<Directive>(), Err(BumpError::InvalidDirective(_))));
    }

    #[test]
    fn test_invalid_current_version() {
        let err = resolve("a", "not-a-version", &directive("patch")).unwrap_err();
        assert!(matches!(err, BumpError::Discovery(_)));
    }
}
