//! Static publish target catalog.
//!
//! Targets are compiled in and ordered. Debian-family packages go to every
//! Ubuntu codename followed by every Debian codename; rpm packages go to a
//! single Enterprise Linux target.

use serde::{Deserialize, Serialize};

use crate::artifact::PackageFormat;

/// Ubuntu releases, in push order.
pub const UBUNTU_CODENAMES: [&str; 9] = [
    "trusty", "utopic", "vivid", "wily", "xenial", "yakkety", "zesty", "artful", "bionic",
];

/// Debian releases, in push order.
pub const DEBIAN_CODENAMES: [&str; 4] = ["wheezy", "jessie", "stretch", "buster"];

/// Distribution path used for rpm pushes.
pub const RPM_DISTRIBUTION: &str = "el/7";

/// Operating-system family a target belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Debian,
    Rpm,
}

impl OsFamily {
    pub fn for_format(format: PackageFormat) -> Self {
        match format {
            PackageFormat::Deb => OsFamily::Debian,
            PackageFormat::Rpm => OsFamily::Rpm,
        }
    }
}

/// One destination for a package push.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct PublishTarget {
    pub channel_repo: String,
    pub os_family: OsFamily,
    pub distribution: &'static str,
    pub codename: Option<&'static str>,
}

impl PublishTarget {
    /// Repository path handed to the publish client, e.g. `dokku/dokku/ubuntu/xenial`.
    pub fn repository_path(&self) -> String {
        match self.codename {
            Some(codename) => format!("{}/{}/{}", self.channel_repo, self.distribution, codename),
            None => format!("{}/{}", self.channel_repo, self.distribution),
        }
    }
}

impl std::fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repository_path())
    }
}

/// Expand the catalog for `format` under a single channel repository.
pub fn targets_for(format: PackageFormat, channel_repo: &str) -> Vec<PublishTarget> {
    match OsFamily::for_format(format) {
        OsFamily::Debian => {
            let ubuntu = UBUNTU_CODENAMES.iter().map(|c| ("ubuntu", *c));
            let debian = DEBIAN_CODENAMES.iter().map(|c| ("debian", *c));
            ubuntu
                .chain(debian)
                .map(|(distribution, codename)| PublishTarget {
                    channel_repo: channel_repo.to_string(),
                    os_family: OsFamily::Debian,
                    distribution,
                    codename: Some(codename),
                })
                .collect()
        }
        OsFamily::Rpm => vec![PublishTarget {
            channel_repo: channel_repo.to_string(),
            os_family: OsFamily::Rpm,
            distribution: RPM_DISTRIBUTION,
            codename: None,
        }],
    }
}
