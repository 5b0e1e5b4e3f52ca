//! VPC and client VPN

pub mod vpc;
pub mod vpn;

pub use vpc::{AVAILABILITY_ZONES, SubnetType, VPC_CIDR_BLOCK, Vpc, VpcArgs};
pub use vpn::{CLIENT_CIDR_BLOCK, Vpn, VpnArgs, VpnEndpoint};
