use crate::domain::prerelease::PreRelease;
use crate::error::{Result, VersionManagerError};
use std::cmp::Ordering;
use std::fmt;

/// Semantic version with the optional pre-release, build and metadata parts
/// that can appear in a version name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreRelease>,
    pub build: Option<u64>,
    pub metadata: Option<String>,
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl SemanticVersion {
    /// Create a plain `major.minor.patch` version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            ..SemanticVersion::default()
        }
    }

    /// Parse a bare semantic version string such as `1.2.3`, `v1.2.3-alpha.2`
    /// or `1.2.3-rc.1+b7`.
    ///
    /// Build metadata of the form `b<N>` becomes the build number, anything
    /// else is kept as free-form metadata.
    pub fn parse(text: &str) -> Result<Self> {
        let clean = text.trim().trim_start_matches('v').trim_start_matches('V');
        let parsed = semver::Version::parse(clean).map_err(|e| {
            VersionManagerError::version_spec(format!("Invalid version '{}': {}", text, e))
        })?;

        let pre_release = if parsed.pre.is_empty() {
            None
        } else {
            Some(PreRelease::parse(parsed.pre.as_str())?)
        };

        let (build, metadata) = if parsed.build.is_empty() {
            (None, None)
        } else {
            let raw = parsed.build.as_str();
            match raw.strip_prefix('b').and_then(|n| n.parse::<u64>().ok()) {
                Some(number) => (Some(number), None),
                None => (None, Some(raw.to_string())),
            }
        };

        Ok(SemanticVersion {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre_release,
            build,
            metadata,
        })
    }

    /// Bump version according to bump type.
    ///
    /// Lower components reset to 0; pre-release, build and metadata are
    /// always cleared.
    ///
    /// # Returns
    /// * `Err(InvalidVersionSpec)` - The bumped component would overflow
    pub fn increment(&self, bump: VersionBump) -> Result<Self> {
        let overflow = || {
            VersionManagerError::version_spec(format!(
                "cannot bump {} of {}: component out of range",
                bump_flag(bump),
                self
            ))
        };
        Ok(match bump {
            VersionBump::Major => {
                SemanticVersion::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            VersionBump::Minor => SemanticVersion::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            VersionBump::Patch => SemanticVersion::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    fn same_number(&self, other: &SemanticVersion) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }

    /// Layer the next pre-release of `label` onto this version.
    ///
    /// The counter continues when the current pre-release has the same label
    /// and restarts at 1 otherwise. Major/minor/patch stay as they are.
    pub fn next_pre_release(&self, label: &str) -> Result<Self> {
        let pre_release = match &self.pre_release {
            Some(current) => current.next_for(label)?,
            None => PreRelease::first(label)?,
        };
        Ok(SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre_release: Some(pre_release),
            build: None,
            metadata: None,
        })
    }

    pub fn with_pre_release(mut self, pre_release: PreRelease) -> Self {
        self.pre_release = Some(pre_release);
        self
    }

    pub fn with_build(mut self, build: u64) -> Self {
        self.build = Some(build);
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                // A release outranks any pre-release of the same number
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.build.cmp(&other.build))
            .then_with(|| self.metadata.cmp(&other.metadata))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = self.build {
            write!(f, "+b{}", build)?;
        }
        if let Some(metadata) = &self.metadata {
            write!(f, " ({})", metadata)?;
        }
        Ok(())
    }
}

/// Semantic-version flags of one `create` invocation.
///
/// Exactly one increment strategy may be chosen: a `bump` or explicit
/// components, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSpec {
    pub bump: Option<VersionBump>,
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre_release: Option<String>,
    pub new_pre_release: Option<String>,
    pub build: Option<u64>,
    pub metadata: Option<String>,
}

impl VersionSpec {
    /// True when no semantic flag was given at all.
    pub fn is_empty(&self) -> bool {
        *self == VersionSpec::default()
    }

    fn has_explicit_components(&self) -> bool {
        self.major.is_some() || self.minor.is_some() || self.patch.is_some()
    }

    /// Whether resolving this spec needs the project's existing versions,
    /// either as the base or to continue a pre-release counter.
    pub fn needs_latest(&self) -> bool {
        !self.is_empty() && (!self.has_explicit_components() || self.new_pre_release.is_some())
    }

    /// Reject conflicting flag combinations.
    pub fn validate(&self) -> Result<()> {
        if let Some(bump) = self.bump {
            if self.has_explicit_components() {
                return Err(VersionManagerError::version_spec(format!(
                    "--new-{} cannot be combined with explicit --major/--minor/--patch",
                    bump_flag(bump)
                )));
            }
        }
        if self.pre_release.is_some() && self.new_pre_release.is_some() {
            return Err(VersionManagerError::version_spec(
                "--pre-release and --new-pre-release are mutually exclusive",
            ));
        }
        Ok(())
    }

    /// Compute the semantic version to render, given the project's existing
    /// versions.
    ///
    /// The base is the highest existing version (or 0.0.0) unless explicit
    /// components are given. `new_pre_release` continues the counter of the
    /// highest existing pre-release with that label on the same base number,
    /// whatever other labels or releases rank above it.
    ///
    /// # Returns
    /// * `Ok(None)` - No semantic flags were given
    /// * `Ok(Some(version))` - The version to create
    /// * `Err` - Conflicting flags, an invalid pre-release label or overflow
    pub fn resolve(&self, existing: &[SemanticVersion]) -> Result<Option<SemanticVersion>> {
        self.validate()?;
        if self.is_empty() {
            return Ok(None);
        }

        let current = existing.iter().max().cloned().unwrap_or_default();
        let mut version = if let Some(bump) = self.bump {
            current.increment(bump)?
        } else if self.has_explicit_components() {
            SemanticVersion::new(
                self.major.unwrap_or(0),
                self.minor.unwrap_or(0),
                self.patch.unwrap_or(0),
            )
        } else {
            current
        };

        if let Some(label) = &self.new_pre_release {
            let prior = existing
                .iter()
                .filter(|v| v.same_number(&version))
                .filter(|v| v.pre_release.as_ref().is_some_and(|p| p.label == *label))
                .max_by_key(|v| v.pre_release.as_ref().map(|p| p.counter));
            version = match prior {
                Some(prior) => prior.next_pre_release(label)?,
                None => SemanticVersion::new(version.major, version.minor, version.patch)
                    .next_pre_release(label)?,
            };
        } else if let Some(label) = &self.pre_release {
            version = version.with_pre_release(PreRelease::first(label.as_str())?);
        }
        if let Some(build) = self.build {
            version = version.with_build(build);
        }
        if let Some(metadata) = &self.metadata {
            version = version.with_metadata(metadata.as_str());
        }

        Ok(Some(version))
    }
}

fn bump_flag(bump: VersionBump) -> &'static str {
    match bump {
        VersionBump::Major => "major",
        VersionBump::Minor => "minor",
        VersionBump::Patch => "patch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre(s: &str) -> PreRelease {
        PreRelease::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let v = SemanticVersion::parse("v1.2.3").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_pre_release_and_build() {
        let v = SemanticVersion::parse("1.2.3-alpha.2+b7").unwrap();
        assert_eq!(v.pre_release, Some(pre("alpha.2")));
        assert_eq!(v.build, Some(7));
        assert_eq!(v.metadata, None);
    }

    #[test]
    fn test_version_parse_free_form_build_metadata() {
        let v = SemanticVersion::parse("1.0.0+exp.sha.5114f85").unwrap();
        assert_eq!(v.build, None);
        assert_eq!(v.metadata.as_deref(), Some("exp.sha.5114f85"));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(SemanticVersion::parse("1.2").is_err());
        assert!(SemanticVersion::parse("PROJECT1.W01.2024.01.02").is_err());
    }

    #[test]
    fn test_increment_patch_clears_pre_release() {
        let v = SemanticVersion::new(1, 2, 3).with_pre_release(pre("beta.1"));
        assert_eq!(v.increment(VersionBump::Patch).unwrap(), SemanticVersion::new(1, 2, 4));
    }

    #[test]
    fn test_increment_minor_and_major() {
        let v = SemanticVersion::new(1, 2, 3).with_build(9).with_metadata("x");
        assert_eq!(v.increment(VersionBump::Minor).unwrap(), SemanticVersion::new(1, 3, 0));
        assert_eq!(v.increment(VersionBump::Major).unwrap(), SemanticVersion::new(2, 0, 0));
    }

    #[test]
    fn test_increment_overflow_is_error() {
        let v = SemanticVersion::new(u64::MAX, u64::MAX, u64::MAX);
        for bump in [VersionBump::Major, VersionBump::Minor, VersionBump::Patch] {
            let err = v.increment(bump).unwrap_err();
            assert!(matches!(err, VersionManagerError::InvalidVersionSpec(_)));
        }
    }

    #[test]
    fn test_next_pre_release_continues_counter() {
        let latest = SemanticVersion::parse("1.2.3-alpha.2").unwrap();
        let next = latest.next_pre_release("alpha").unwrap();
        assert_eq!(next, SemanticVersion::new(1, 2, 3).with_pre_release(pre("alpha.3")));
    }

    #[test]
    fn test_next_pre_release_new_label_starts_at_one() {
        let latest = SemanticVersion::parse("1.2.3-alpha.2").unwrap();
        let next = latest.next_pre_release("beta").unwrap();
        assert_eq!(next.pre_release, Some(pre("beta.1")));
        assert_eq!((next.major, next.minor, next.patch), (1, 2, 3));
    }

    #[test]
    fn test_next_pre_release_does_not_bump_patch() {
        let next = SemanticVersion::new(1, 2, 3).next_pre_release("rc").unwrap();
        assert_eq!(next.to_string(), "1.2.3-rc.1");
    }

    #[test]
    fn test_setters_combine() {
        let v = SemanticVersion::new(2, 0, 0)
            .with_pre_release(pre("rc.1"))
            .with_build(42)
            .with_metadata("hotfix");
        assert_eq!(v.to_string(), "2.0.0-rc.1+b42 (hotfix)");
    }

    #[test]
    fn test_release_outranks_pre_release() {
        let release = SemanticVersion::new(1, 2, 3);
        let beta = SemanticVersion::new(1, 2, 3).with_pre_release(pre("beta.4"));
        let older = SemanticVersion::new(1, 2, 2);
        assert!(release > beta);
        assert!(beta > older);
    }

    #[test]
    fn test_max_picks_latest() {
        let versions = vec![
            SemanticVersion::parse("1.2.3-alpha.1").unwrap(),
            SemanticVersion::parse("1.2.3-alpha.2").unwrap(),
            SemanticVersion::parse("1.1.9").unwrap(),
        ];
        let latest = versions.into_iter().max().unwrap();
        assert_eq!(latest.to_string(), "1.2.3-alpha.2");
    }

    #[test]
    fn test_spec_bump_with_explicit_patch_is_rejected() {
        let spec = VersionSpec {
            bump: Some(VersionBump::Major),
            patch: Some(5),
            ..VersionSpec::default()
        };
        let err = spec.resolve(&[]).unwrap_err();
        assert!(matches!(err, VersionManagerError::InvalidVersionSpec(_)));
    }

    #[test]
    fn test_spec_both_pre_release_flags_rejected() {
        let spec = VersionSpec {
            pre_release: Some("alpha".to_string()),
            new_pre_release: Some("alpha".to_string()),
            ..VersionSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_spec_empty_resolves_to_none() {
        assert_eq!(VersionSpec::default().resolve(&[]).unwrap(), None);
        assert!(!VersionSpec::default().needs_latest());
    }

    #[test]
    fn test_spec_bump_from_latest() {
        let latest = SemanticVersion::parse("1.2.3-beta.1").unwrap();
        let spec = VersionSpec {
            bump: Some(VersionBump::Patch),
            ..VersionSpec::default()
        };
        assert!(spec.needs_latest());
        assert_eq!(
            spec.resolve(&[latest]).unwrap(),
            Some(SemanticVersion::new(1, 2, 4))
        );
    }

    #[test]
    fn test_spec_bump_without_latest_starts_from_zero() {
        let spec = VersionSpec {
            bump: Some(VersionBump::Minor),
            ..VersionSpec::default()
        };
        assert_eq!(spec.resolve(&[]).unwrap(), Some(SemanticVersion::new(0, 1, 0)));
    }

    #[test]
    fn test_spec_explicit_components_default_to_zero() {
        let spec = VersionSpec {
            major: Some(3),
            patch: Some(1),
            ..VersionSpec::default()
        };
        assert!(!spec.needs_latest());
        assert_eq!(spec.resolve(&[]).unwrap(), Some(SemanticVersion::new(3, 0, 1)));
    }

    #[test]
    fn test_spec_new_pre_release_on_latest() {
        let latest = SemanticVersion::parse("1.2.3-alpha.2").unwrap();
        let spec = VersionSpec {
            new_pre_release: Some("alpha".to_string()),
            ..VersionSpec::default()
        };
        let resolved = spec.resolve(&[latest]).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "1.2.3-alpha.3");
    }

    #[test]
    fn test_spec_new_pre_release_ignores_higher_label() {
        let existing: Vec<SemanticVersion> = ["1.2.3-alpha.1", "1.2.3-alpha.2", "1.2.3-beta.1"]
            .iter()
            .map(|v| SemanticVersion::parse(v).unwrap())
            .collect();
        let spec = VersionSpec {
            new_pre_release: Some("alpha".to_string()),
            ..VersionSpec::default()
        };
        let resolved = spec.resolve(&existing).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "1.2.3-alpha.3");
    }

    #[test]
    fn test_spec_new_pre_release_after_release_of_same_number() {
        let existing: Vec<SemanticVersion> = ["1.2.3-rc.4", "1.2.3"]
            .iter()
            .map(|v| SemanticVersion::parse(v).unwrap())
            .collect();
        let spec = VersionSpec {
            new_pre_release: Some("rc".to_string()),
            ..VersionSpec::default()
        };
        let resolved = spec.resolve(&existing).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "1.2.3-rc.5");
    }

    #[test]
    fn test_spec_explicit_components_continue_pre_release_counter() {
        let existing = vec![SemanticVersion::parse("2.0.0-beta.3").unwrap()];
        let spec = VersionSpec {
            major: Some(2),
            new_pre_release: Some("beta".to_string()),
            ..VersionSpec::default()
        };
        assert!(spec.needs_latest());
        let resolved = spec.resolve(&existing).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "2.0.0-beta.4");
    }

    #[test]
    fn test_spec_bump_then_new_pre_release_restarts_counter() {
        let latest = SemanticVersion::parse("1.2.3-alpha.2").unwrap();
        let spec = VersionSpec {
            bump: Some(VersionBump::Minor),
            new_pre_release: Some("alpha".to_string()),
            ..VersionSpec::default()
        };
        let resolved = spec.resolve(&[latest]).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "1.3.0-alpha.1");
    }

    #[test]
    fn test_spec_combines_pre_release_build_metadata() {
        let spec = VersionSpec {
            major: Some(1),
            pre_release: Some("rc".to_string()),
            build: Some(12),
            metadata: Some("nightly".to_string()),
            ..VersionSpec::default()
        };
        let resolved = spec.resolve(&[]).unwrap().unwrap();
        assert_eq!(resolved.pre_release, Some(pre("rc.1")));
        assert_eq!(resolved.build, Some(12));
        assert_eq!(resolved.metadata.as_deref(), Some("nightly"));
    }
}
