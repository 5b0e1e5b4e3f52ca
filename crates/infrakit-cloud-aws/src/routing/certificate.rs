//! Wildcard TLS certificate validated through DNS

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};

pub const VALIDATION_RECORD_TTL: u32 = 60;

#[derive(Debug, Clone)]
pub struct HttpsCertificateArgs {
    pub name: String,
    /// Zone the validation record is written to
    pub route53_zone_id: Input,
    pub overrides: Properties,
}

/// `*.{environment}.{domain}` certificate
#[derive(Debug, Clone)]
pub struct HttpsCertificate {
    handle: ResourceHandle,
    pub certificate: ResourceHandle,
    pub validation_record: ResourceHandle,
    pub validation: ResourceHandle,
}

impl HttpsCertificate {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: HttpsCertificateArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::HttpsCertificate;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let defaults = Properties::new()
            .with("domainName", format!("*.{}", ctx.environment_domain()))
            .with("validationMethod", "DNS");
        let certificate = scope.resource(
            tokens::CERTIFICATE,
            scope.name(kind.as_str()),
            resolve(defaults, &args.overrides),
        )?;

        let option = certificate.output("domainValidationOptions").index(0);
        let validation_record = scope.resource(
            tokens::DNS_RECORD,
            scope.name_for(AwsResourceType::DnsRecord.as_str(), "cert-validation"),
            Properties::new()
                .with("name", option.field("resourceRecordName"))
                .with("records", vec![option.field("resourceRecordValue")])
                .with("ttl", VALIDATION_RECORD_TTL)
                .with("type", option.field("resourceRecordType"))
                .with("zoneId", args.route53_zone_id),
        )?;

        let validation = scope.resource(
            tokens::CERTIFICATE_VALIDATION,
            "cert-validation-check",
            Properties::new()
                .with("certificateArn", certificate.output("arn"))
                .with("validationRecordFqdns", vec![validation_record.output("fqdn")]),
        )?;

        Ok(Self {
            handle: scope.finish(),
            certificate,
            validation_record,
            validation,
        })
    }

    /// ARN of the certificate once validated
    pub fn certificate_arn(&self) -> OutputRef {
        self.validation.output("certificateArn")
    }
}

impl Component for HttpsCertificate {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
