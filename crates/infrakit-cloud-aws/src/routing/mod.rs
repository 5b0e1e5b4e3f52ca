//! DNS zones, certificates and load balancing

pub mod certificate;
pub mod load_balancer;
pub mod zones;

pub use certificate::{HttpsCertificate, HttpsCertificateArgs};
pub use load_balancer::{ApplicationLoadBalancer, ApplicationLoadBalancerArgs};
pub use zones::{
    EnvironmentHostedZone, EnvironmentHostedZoneArgs, MasterHostedZone, MasterHostedZoneArgs,
    MasterNameServerRecord, MasterNameServerRecordArgs,
};
