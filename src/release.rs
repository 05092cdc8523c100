//! Detecting which OpenStack release the unit is running

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, digit1};
use nom::combinator::{map_res, opt, rest};
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;
use serde_derive::{Deserialize, Serialize};
use serde_yaml::from_slice;

use crate::cmd::{args, Runner};
use crate::error::CharmError;
use crate::unitdata::KeyValueStore;

/// Key the detected release is cached under in the unit's key-value store
pub const OPENSTACK_RELEASE_KEY: &str = "barbican-charm.openstack-release-version";

/// Package whose installed version determines the release
pub const RELEASE_PACKAGE: &str = "barbican-common";

/// Oldest release this charm can deploy
pub const FIRST_RELEASE: Release = Release::Rocky;

/// OpenStack release, ordered oldest first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Release {
    Liberty,
    Mitaka,
    Newton,
    Ocata,
    Pike,
    Queens,
    Rocky,
    Stein,
    Train,
    Ussuri,
    Victoria,
}

/// Major version of `barbican-common` for each release
const PACKAGE_CODENAMES: &[(u32, Release)] = &[
    (1, Release::Liberty),
    (2, Release::Mitaka),
    (3, Release::Newton),
    (4, Release::Ocata),
    (5, Release::Pike),
    (6, Release::Queens),
    (7, Release::Rocky),
    (8, Release::Stein),
    (9, Release::Train),
    (10, Release::Ussuri),
    (11, Release::Victoria),
];

/// Release shipped by the Ubuntu archive of each series
const DISTRO_RELEASES: &[(&str, Release)] = &[
    ("xenial", Release::Mitaka),
    ("bionic", Release::Queens),
    ("focal", Release::Ussuri),
    ("groovy", Release::Victoria),
];

impl Release {
    pub fn all() -> impl Iterator<Item = Release> {
        PACKAGE_CODENAMES.iter().map(|(_, r)| *r)
    }

    /// Map a Debian package version such as `1:11.0.0-0ubuntu1` to a release
    pub fn from_package_version(version: &str) -> Result<Self, CharmError> {
        let (_, (_, major)) = parse_package_version(version).map_err(|err| {
            CharmError::ReleaseResolution(format!(
                "couldn't parse {} version `{}`: {:?}",
                RELEASE_PACKAGE, version, err
            ))
        })?;

        PACKAGE_CODENAMES
            .iter()
            .find(|(m, _)| *m == major)
            .map(|(_, r)| *r)
            .ok_or_else(|| {
                CharmError::ReleaseResolution(format!(
                    "{} version `{}` doesn't match any known release",
                    RELEASE_PACKAGE, version
                ))
            })
    }

    /// Release shipped by default on an Ubuntu series
    pub fn from_series(series: &str) -> Result<Self, CharmError> {
        DISTRO_RELEASES
            .iter()
            .find(|(s, _)| *s == series)
            .map(|(_, r)| *r)
            .ok_or_else(|| {
                CharmError::ReleaseResolution(format!(
                    "no OpenStack release known for series `{}`",
                    series
                ))
            })
    }

    /// Fails for releases older than [`FIRST_RELEASE`]
    pub fn ensure_supported(self) -> Result<Self, CharmError> {
        if self < FIRST_RELEASE {
            return Err(CharmError::ReleaseResolution(format!(
                "release {} is older than the oldest supported release {}",
                self, FIRST_RELEASE
            )));
        }
        Ok(self)
    }
}

impl From<Release> for &str {
    fn from(r: Release) -> &'static str {
        match r {
            Release::Liberty => "liberty",
            Release::Mitaka => "mitaka",
            Release::Newton => "newton",
            Release::Ocata => "ocata",
            Release::Pike => "pike",
            Release::Queens => "queens",
            Release::Rocky => "rocky",
            Release::Stein => "stein",
            Release::Train => "train",
            Release::Ussuri => "ussuri",
            Release::Victoria => "victoria",
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str((*self).into())
    }
}

impl FromStr for Release {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_slice(s.as_bytes())
            .map_err(|_| CharmError::ReleaseResolution(format!("unknown release `{}`", s)))
    }
}

/// Parses the optional `epoch:` prefix of a package version
fn parse_epoch(input: &str) -> IResult<&str, Option<&str>> {
    opt(terminated(digit1, tag(":")))(input)
}

/// Parses the leading major number of the upstream version
fn parse_major(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |d: &str| d.parse::<u32>())(input)
}

fn parse_package_version(input: &str) -> IResult<&str, (Option<&str>, u32)> {
    tuple((parse_epoch, parse_major))(input)
}

/// Parses a cloud archive origin, e.g. `cloud:focal-victoria/proposed`
///
/// Returns the series and the release name.
fn parse_cloud_origin(input: &str) -> IResult<&str, (&str, &str)> {
    let (remainder, (series, _, release, _)) = preceded(
        tag("cloud:"),
        tuple((alpha1, tag("-"), alpha1, opt(preceded(tag("/"), rest)))),
    )(input)?;

    Ok((remainder, (series, release)))
}

/// What the release registry needs to know about the machine
pub trait Host {
    /// Installed version of a package, or `None` if it isn't installed
    fn installed_version(&self, package: &str) -> Result<Option<String>, CharmError>;

    /// Codename of the running Ubuntu series
    fn series(&self) -> Result<String, CharmError>;
}

/// Asks dpkg and lsb_release
pub struct SystemHost<'a> {
    runner: &'a dyn Runner,
}

impl<'a> SystemHost<'a> {
    pub fn new(runner: &'a dyn Runner) -> Self {
        Self { runner }
    }
}

impl<'a> Host for SystemHost<'a> {
    fn installed_version(&self, package: &str) -> Result<Option<String>, CharmError> {
        let output = match self.runner.get_output(
            "dpkg-query",
            &args(&[
                "--show",
                "--showformat=${db:Status-Status} ${Version}",
                package,
            ]),
        ) {
            Ok(output) => output,
            Err(err) => {
                debug!("Couldn't query {}: {}", package, err);
                return Ok(None);
            }
        };

        let output = String::from_utf8_lossy(&output);
        let mut split = output.trim().splitn(2, ' ');

        match (split.next(), split.next()) {
            (Some("installed"), Some(version)) => Ok(Some(version.to_string())),
            _ => Ok(None),
        }
    }

    fn series(&self) -> Result<String, CharmError> {
        let output = self.runner.get_output("lsb_release", &args(&["-cs"]))?;
        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }
}

/// Work out the release from `openstack-origin` for a unit with nothing installed yet
fn release_from_origin(host: &dyn Host, origin: &str) -> Result<Release, CharmError> {
    match origin.trim() {
        "" | "distro" | "distro-proposed" => Release::from_series(&host.series()?),
        o => {
            let (_, (_, release)) = parse_cloud_origin(o).map_err(|_| {
                CharmError::ReleaseResolution(format!("unsupported openstack-origin `{}`", o))
            })?;
            release.parse()
        }
    }
}

/// Determine the release the unit runs, caching the answer in `store`
///
/// Once cached, the package database is never consulted again until the cache is reset. A
/// version that can't be mapped to a release is an error rather than a guess, and so is a
/// release older than [`FIRST_RELEASE`]. Only supported releases are cached.
pub fn select_release(
    store: &mut dyn KeyValueStore,
    host: &dyn Host,
    origin: &str,
) -> Result<Release, CharmError> {
    if let Some(cached) = store.get(OPENSTACK_RELEASE_KEY) {
        let release: Release = cached.parse()?;
        if release >= FIRST_RELEASE {
            return Ok(release);
        }

        warn!("Dropping cached release {}, it isn't supported", release);
        store.unset(OPENSTACK_RELEASE_KEY)?;
    }

    let release = match host.installed_version(RELEASE_PACKAGE)? {
        Some(version) => Release::from_package_version(&version)?,
        None => release_from_origin(host, origin)?,
    }
    .ensure_supported()?;

    info!("Selected OpenStack release {}", release);
    store.set(OPENSTACK_RELEASE_KEY, release.into())?;

    Ok(release)
}

/// Forget the cached release, so that the next hook detects it again
pub fn reset_release(store: &mut dyn KeyValueStore) -> Result<(), CharmError> {
    store.unset(OPENSTACK_RELEASE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_versions() {
        assert_eq!(
            parse_package_version("1:11.0.0-0ubuntu1"),
            Ok((".0.0-0ubuntu1", (Some("1"), 11)))
        );
        assert_eq!(
            parse_package_version("7.0.0~b3-0ubuntu2"),
            Ok((".0.0~b3-0ubuntu2", (None, 7)))
        );
        assert!(parse_package_version("ubuntu").is_err());
    }

    #[test]
    fn parses_cloud_origins() {
        assert_eq!(
            parse_cloud_origin("cloud:focal-victoria"),
            Ok(("", ("focal", "victoria")))
        );
        assert_eq!(
            parse_cloud_origin("cloud:bionic-train/proposed"),
            Ok(("", ("bionic", "train")))
        );
        assert!(parse_cloud_origin("ppa:foo/bar").is_err());
    }
}
