//! FusionAuth naming kinds and type tokens

use std::fmt;

/// Name segment of a FusionAuth declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FusionAuthResourceType {
    Instance,
    Provider,
    Application,
    Role,
    User,
    UserRegistration,
}

impl FusionAuthResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            FusionAuthResourceType::Instance => "fusionauth-instance",
            FusionAuthResourceType::Provider => "fusionauth-provider",
            FusionAuthResourceType::Application => "fusionauth-application",
            FusionAuthResourceType::Role => "fusionauth-role",
            FusionAuthResourceType::User => "fusionauth-user",
            FusionAuthResourceType::UserRegistration => "fusionauth-user-reg",
        }
    }
}

impl fmt::Display for FusionAuthResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `fusionauth:{kind}`, the component type token
pub fn fusionauth_resource_type(kind: FusionAuthResourceType) -> String {
    infrakit_cloud::naming::build_resource_type_name("fusionauth", kind.as_str())
}

pub mod tokens {
    pub const PROVIDER: &str = "pulumi:providers:fusionauth";
    pub const APPLICATION: &str = "fusionauth:index/fusionAuthApplication:FusionAuthApplication";
    pub const APPLICATION_ROLE: &str =
        "fusionauth:index/fusionAuthApplicationRole:FusionAuthApplicationRole";
    pub const USER: &str = "fusionauth:index/fusionAuthUser:FusionAuthUser";
    pub const REGISTRATION: &str = "fusionauth:index/fusionAuthRegistration:FusionAuthRegistration";
}
