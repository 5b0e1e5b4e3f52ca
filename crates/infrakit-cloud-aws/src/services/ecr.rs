//! Container repository with the service image built into it

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope,
};

/// Untagged images older than this are expired
pub const UNTAGGED_IMAGE_AGE_LIMIT_DAYS: u32 = 3;
pub const IMAGE_PLATFORM: &str = "linux/amd64";

#[derive(Debug, Clone)]
pub struct EcrRepoImageArgs {
    pub name: String,
    pub docker_context: String,
    pub dockerfile: String,
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EcrRepoImage {
    handle: ResourceHandle,
    pub repository: ResourceHandle,
    pub image: ResourceHandle,
}

impl EcrRepoImage {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: EcrRepoImageArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::ImageRepository;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let repository_name = scope.name(kind.as_str());
        let rule = Properties::new()
            .with(
                "description",
                format!("Remove untagged images after {}", UNTAGGED_IMAGE_AGE_LIMIT_DAYS),
            )
            .with("tagStatus", "untagged")
            .with("maximumAgeLimit", UNTAGGED_IMAGE_AGE_LIMIT_DAYS);
        let repository = scope.resource(
            tokens::ECR_REPOSITORY,
            repository_name.as_str(),
            Properties::new()
                .with("name", repository_name.as_str())
                .with("forceDelete", true)
                .with(
                    "lifecyclePolicy",
                    Properties::new().with("rules", vec![Input::from(rule)]),
                ),
        )?;

        let image = scope.resource(
            tokens::ECR_IMAGE,
            scope.name(AwsResourceType::Image.as_str()),
            Properties::new()
                .with("repositoryUrl", repository.output("url"))
                .with("context", args.docker_context)
                .with("dockerfile", args.dockerfile)
                .with_opt("target", args.target)
                .with("imageTag", format!("{}:latest", args.name))
                .with("platform", IMAGE_PLATFORM)
                .with("args", Properties::new().with("ENV", ctx.environment.as_str())),
        )?;

        Ok(Self {
            handle: scope.finish(),
            repository,
            image,
        })
    }

    pub fn image_uri(&self) -> OutputRef {
        self.image.output("imageUri")
    }
}

impl Component for EcrRepoImage {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
