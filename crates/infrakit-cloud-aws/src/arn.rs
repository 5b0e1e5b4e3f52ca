//! ARN helpers

use crate::error::{AwsError, Result};

/// Account id of `arn:partition:service:region:account-id:resource`
pub fn account_id_from_arn(arn: &str) -> Result<&str> {
    let mut fields = arn.splitn(6, ':');
    if fields.next() != Some("arn") {
        return Err(AwsError::InvalidArn(arn.to_string()));
    }

    match fields.nth(3) {
        Some(account) if !account.is_empty() && fields.next().is_some() => Ok(account),
        _ => Err(AwsError::InvalidArn(arn.to_string())),
    }
}

/// `arn:aws:iam::{account}:root`, the principal trusting a whole account
pub fn account_root_principal(account_id: &str) -> String {
    format!("arn:aws:iam::{}:root", account_id)
}

/// AWS managed policy ARN (`arn:aws:iam::aws:policy/{name}`)
pub fn managed_policy(name: &str) -> String {
    format!("arn:aws:iam::aws:policy/{}", name)
}
