//! DigitalOcean naming kinds and type tokens

use infrakit_cloud::ProviderContext;
use infrakit_cloud::naming::{build_resource_name, build_resource_type_name};
use std::fmt;

/// Name segment of a DigitalOcean declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalOceanResourceType {
    App,
    Vpc,
    ImageRepository,
}

impl DigitalOceanResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DigitalOceanResourceType::App => "app",
            DigitalOceanResourceType::Vpc => "vpc",
            DigitalOceanResourceType::ImageRepository => "image-repository",
        }
    }
}

impl fmt::Display for DigitalOceanResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `digital-ocean:{kind}`, the component type token
pub fn digital_ocean_resource_type(kind: DigitalOceanResourceType) -> String {
    build_resource_type_name("digital-ocean", kind.as_str())
}

/// Registry repository of an image, `{env}-{region}-image-repository-{image}`
pub fn build_repository_name(ctx: &ProviderContext, image_name: &str) -> String {
    build_resource_name(
        &ctx.names(image_name),
        DigitalOceanResourceType::ImageRepository.as_str(),
    )
}

pub mod tokens {
    pub const APP: &str = "digitalocean:index/app:App";
    pub const VPC: &str = "digitalocean:index/vpc:Vpc";
}
