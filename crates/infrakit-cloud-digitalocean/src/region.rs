//! DigitalOcean region slugs

use crate::error::{DigitalOceanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalOceanRegion {
    Nyc1,
    Nyc3,
    Sfo2,
    Sfo3,
    Tor1,
    Lon1,
    Ams3,
    Fra1,
    Blr1,
    Sgp1,
    Syd1,
}

impl DigitalOceanRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            DigitalOceanRegion::Nyc1 => "nyc1",
            DigitalOceanRegion::Nyc3 => "nyc3",
            DigitalOceanRegion::Sfo2 => "sfo2",
            DigitalOceanRegion::Sfo3 => "sfo3",
            DigitalOceanRegion::Tor1 => "tor1",
            DigitalOceanRegion::Lon1 => "lon1",
            DigitalOceanRegion::Ams3 => "ams3",
            DigitalOceanRegion::Fra1 => "fra1",
            DigitalOceanRegion::Blr1 => "blr1",
            DigitalOceanRegion::Sgp1 => "sgp1",
            DigitalOceanRegion::Syd1 => "syd1",
        }
    }

    /// App Platform takes the datacenter prefix (`lon`), not the slug
    pub fn app_platform_region(self) -> &'static str {
        &self.as_str()[..3]
    }
}

/// Regions App Platform accepts in its own short form
const APP_PLATFORM_REGIONS: [&str; 9] =
    ["nyc", "sfo", "tor", "lon", "ams", "fra", "blr", "sgp", "syd"];

/// App Platform region for a context region given as a slug (`lon1`) or
/// already in App Platform form (`lon`)
pub fn app_platform_region(region: &str) -> Result<&'static str> {
    if let Ok(slug) = region.parse::<DigitalOceanRegion>() {
        return Ok(slug.app_platform_region());
    }
    APP_PLATFORM_REGIONS
        .iter()
        .find(|short| **short == region)
        .copied()
        .ok_or_else(|| DigitalOceanError::UnsupportedRegion(region.to_string()))
}

impl fmt::Display for DigitalOceanRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigitalOceanRegion {
    type Err = DigitalOceanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nyc1" => Ok(DigitalOceanRegion::Nyc1),
            "nyc3" => Ok(DigitalOceanRegion::Nyc3),
            "sfo2" => Ok(DigitalOceanRegion::Sfo2),
            "sfo3" => Ok(DigitalOceanRegion::Sfo3),
            "tor1" => Ok(DigitalOceanRegion::Tor1),
            "lon1" => Ok(DigitalOceanRegion::Lon1),
            "ams3" => Ok(DigitalOceanRegion::Ams3),
            "fra1" => Ok(DigitalOceanRegion::Fra1),
            "blr1" => Ok(DigitalOceanRegion::Blr1),
            "sgp1" => Ok(DigitalOceanRegion::Sgp1),
            "syd1" => Ok(DigitalOceanRegion::Syd1),
            other => Err(DigitalOceanError::UnsupportedRegion(other.to_string())),
        }
    }
}
