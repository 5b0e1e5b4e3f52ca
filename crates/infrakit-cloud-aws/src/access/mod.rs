//! Security groups, IAM and secrets

pub mod iam;
pub mod secret;
pub mod security_group;
pub mod user;

pub use iam::{
    CiCdUserGroup, CrossAccountAccessRole, CrossAccountAccessRoleArgs, LocalAdminUserGroup,
    vpn_management_policy,
};
pub use secret::{Secret, SecretArgs};
pub use security_group::{
    SecurityGroupArgs, SecurityGroupInboundNoneOutboundAll, SecurityGroupInboundPrivateOutboundAll,
    SecurityGroupInboundPublicTlsOutboundAll,
};
pub use user::{AccessKey, ServiceUser, User, UserArgs};
