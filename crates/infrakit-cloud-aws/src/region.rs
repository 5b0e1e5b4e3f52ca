//! AWS regions and per-region constants

use crate::error::{AwsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Secrets Manager extension layer version attached to every function
pub const SECRETS_EXTENSION_LAYER_VERSION: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwsRegion {
    UsEast1,
    UsEast2,
    UsWest1,
    UsWest2,
    CaCentral1,
    EuWest1,
    EuWest2,
    EuWest3,
    EuCentral1,
    EuNorth1,
    ApSoutheast1,
    ApSoutheast2,
    ApNortheast1,
}

impl AwsRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            AwsRegion::UsEast1 => "us-east-1",
            AwsRegion::UsEast2 => "us-east-2",
            AwsRegion::UsWest1 => "us-west-1",
            AwsRegion::UsWest2 => "us-west-2",
            AwsRegion::CaCentral1 => "ca-central-1",
            AwsRegion::EuWest1 => "eu-west-1",
            AwsRegion::EuWest2 => "eu-west-2",
            AwsRegion::EuWest3 => "eu-west-3",
            AwsRegion::EuCentral1 => "eu-central-1",
            AwsRegion::EuNorth1 => "eu-north-1",
            AwsRegion::ApSoutheast1 => "ap-southeast-1",
            AwsRegion::ApSoutheast2 => "ap-southeast-2",
            AwsRegion::ApNortheast1 => "ap-northeast-1",
        }
    }

    /// Hosted zone of application load balancers in this region, the alias
    /// target zone for A records pointing at an ALB
    pub fn elb_hosted_zone_id(self) -> &'static str {
        match self {
            AwsRegion::UsEast1 => "Z35SXDOTRQ7X7K",
            AwsRegion::UsEast2 => "Z3AADJGX6KTTL2",
            AwsRegion::UsWest1 => "Z368ELLRRE2KJ0",
            AwsRegion::UsWest2 => "Z1H1FL5HABSF5",
            AwsRegion::CaCentral1 => "ZQSVJUPU6J1EY",
            AwsRegion::EuWest1 => "Z32O12XQLNTSW2",
            AwsRegion::EuWest2 => "ZHURV8PSTC4K8",
            AwsRegion::EuWest3 => "Z3Q77PNBQS71R4",
            AwsRegion::EuCentral1 => "Z215JYRZR1TBD5",
            AwsRegion::EuNorth1 => "Z23TAZ7KUM3P5H",
            AwsRegion::ApSoutheast1 => "Z1LMS91P8CMLE5",
            AwsRegion::ApSoutheast2 => "Z1GM3OXH4ZPM65",
            AwsRegion::ApNortheast1 => "Z14GRHDCWA56QT",
        }
    }

    /// Account publishing the secrets extension layer
    ///
    /// Only regions the catalog deploys functions to are listed.
    pub fn lambda_layer_account_id(self) -> Option<&'static str> {
        match self {
            AwsRegion::EuWest2 => Some("133256977650"),
            _ => None,
        }
    }

    /// ARN of the secrets extension layer for this region
    pub fn secrets_extension_layer_arn(self) -> Result<String> {
        let account = self
            .lambda_layer_account_id()
            .ok_or_else(|| AwsError::UnsupportedRegion(self.to_string()))?;
        Ok(format!(
            "arn:aws:lambda:{}:{}:layer:AWS-Parameters-and-Secrets-Lambda-Extension:{}",
            self, account, SECRETS_EXTENSION_LAYER_VERSION
        ))
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AwsRegion {
    type Err = AwsError;

    fn from_str(s: &str) -> Result<Self> {
        let region = match s {
            "us-east-1" => AwsRegion::UsEast1,
            "us-east-2" => AwsRegion::UsEast2,
            "us-west-1" => AwsRegion::UsWest1,
            "us-west-2" => AwsRegion::UsWest2,
            "ca-central-1" => AwsRegion::CaCentral1,
            "eu-west-1" => AwsRegion::EuWest1,
            "eu-west-2" => AwsRegion::EuWest2,
            "eu-west-3" => AwsRegion::EuWest3,
            "eu-central-1" => AwsRegion::EuCentral1,
            "eu-north-1" => AwsRegion::EuNorth1,
            "ap-southeast-1" => AwsRegion::ApSoutheast1,
            "ap-southeast-2" => AwsRegion::ApSoutheast2,
            "ap-northeast-1" => AwsRegion::ApNortheast1,
            other => return Err(AwsError::UnsupportedRegion(other.to_string())),
        };
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        let region: AwsRegion = "eu-west-2".parse().unwrap();
        assert_eq!(region, AwsRegion::EuWest2);
        assert_eq!(region.to_string(), "eu-west-2");
        assert!(matches!(
            "mars-north-1".parse::<AwsRegion>(),
            Err(AwsError::UnsupportedRegion(_))
        ));
    }

    #[test]
    fn test_elb_zone_and_layer() {
        assert_eq!(AwsRegion::EuWest2.elb_hosted_zone_id(), "ZHURV8PSTC4K8");
        assert_eq!(
            AwsRegion::EuWest2.secrets_extension_layer_arn().unwrap(),
            "arn:aws:lambda:eu-west-2:133256977650:layer:AWS-Parameters-and-Secrets-Lambda-Extension:11"
        );
        assert!(AwsRegion::UsEast1.secrets_extension_layer_arn().is_err());
    }
}
