//! Route53 hosted zones
//!
//! The master zone holds the apex domain and is shared by every environment
//! of a region. Each environment gets its own `{environment}.{domain}` zone,
//! delegated from the master zone with an NS record.

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::naming::build_cross_environment_resource_name;
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};

pub const NAME_SERVER_TTL: u32 = 3600;

#[derive(Debug, Clone, Default)]
pub struct MasterHostedZoneArgs {
    pub name: String,
    /// Zone properties taking precedence over the derived ones
    pub overrides: Properties,
}

/// Zone of the apex domain, one per region
#[derive(Debug, Clone)]
pub struct MasterHostedZone {
    handle: ResourceHandle,
    pub zone: ResourceHandle,
}

impl MasterHostedZone {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: MasterHostedZoneArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Route53Zone;
        let zone_name = build_cross_environment_resource_name(&ctx.region, kind.as_str(), &args.name);
        let mut scope = Scope::open_named(
            graph,
            ctx,
            &aws_resource_type(kind),
            ctx.names(args.name.as_str()),
            zone_name.clone(),
            options,
        )?;

        let defaults = Properties::new().with("name", ctx.domain.as_str());
        let zone = scope.resource(tokens::HOSTED_ZONE, zone_name, resolve(defaults, &args.overrides))?;

        Ok(Self {
            handle: scope.finish(),
            zone,
        })
    }

    pub fn zone_id(&self) -> OutputRef {
        self.zone.output("zoneId")
    }
}

impl Component for MasterHostedZone {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[derive(Debug, Clone)]
pub struct MasterNameServerRecordArgs {
    pub name: String,
    /// Environment whose zone is delegated
    pub subdomain_environment: String,
    pub name_servers: Input,
    /// Master zone the record lives in
    pub hosted_zone_id: Input,
    pub overrides: Properties,
}

/// NS record delegating `{environment}.{domain}` from the master zone
#[derive(Debug, Clone)]
pub struct MasterNameServerRecord {
    handle: ResourceHandle,
    pub record: ResourceHandle,
}

impl MasterNameServerRecord {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: MasterNameServerRecordArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::DnsRecord;
        let record_name = build_cross_environment_resource_name(&ctx.region, kind.as_str(), &args.name);
        let mut scope = Scope::open_named(
            graph,
            ctx,
            &aws_resource_type(kind),
            ctx.names(args.name.as_str()),
            record_name.clone(),
            options,
        )?;

        let defaults = Properties::new()
            .with("name", format!("{}.{}", args.subdomain_environment, ctx.domain))
            .with("type", "NS")
            .with("ttl", NAME_SERVER_TTL)
            .with("records", args.name_servers)
            .with("zoneId", args.hosted_zone_id);
        let record = scope.resource(tokens::DNS_RECORD, record_name, resolve(defaults, &args.overrides))?;

        Ok(Self {
            handle: scope.finish(),
            record,
        })
    }
}

impl Component for MasterNameServerRecord {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentHostedZoneArgs {
    pub name: String,
    pub master_zone_id: Input,
    pub overrides: Properties,
}

/// Zone of `{environment}.{domain}` plus its delegation record
#[derive(Debug, Clone)]
pub struct EnvironmentHostedZone {
    handle: ResourceHandle,
    pub zone: ResourceHandle,
    pub delegation: MasterNameServerRecord,
}

impl EnvironmentHostedZone {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: EnvironmentHostedZoneArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Route53Zone;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let zone_name = scope.name(kind.as_str());
        let defaults = Properties::new().with("name", ctx.environment_domain());
        let zone = scope.resource(tokens::HOSTED_ZONE, zone_name, resolve(defaults, &args.overrides))?;

        let child_options = scope.child_options();
        let delegation = MasterNameServerRecord::new(
            scope.graph(),
            ctx,
            MasterNameServerRecordArgs {
                name: args.name.clone(),
                subdomain_environment: ctx.environment.to_string(),
                name_servers: zone.output("nameServers").into(),
                hosted_zone_id: args.master_zone_id,
                overrides: Properties::new(),
            },
            child_options,
        )?;

        Ok(Self {
            handle: scope.finish(),
            zone,
            delegation,
        })
    }

    pub fn zone_id(&self) -> OutputRef {
        self.zone.output("zoneId")
    }
}

impl Component for EnvironmentHostedZone {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
