//! App Platform application

use crate::error::Result;
use crate::region::app_platform_region;
use crate::resource_types::{DigitalOceanResourceType, digital_ocean_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AppArgs {
    pub name: String,
    /// App spec fields; these win over the derived `region` and `name`
    pub spec: Properties,
}

#[derive(Debug, Clone)]
pub struct App {
    handle: ResourceHandle,
    pub app: ResourceHandle,
}

impl App {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: AppArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let region = app_platform_region(&ctx.region)?;

        let kind = DigitalOceanResourceType::App;
        let mut scope = Scope::open(
            graph,
            ctx,
            &digital_ocean_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let app_name = scope.component().name().to_string();
        debug!(app = %app_name, region, "Declaring App Platform app");
        let derived = Properties::new()
            .with("region", region)
            .with("name", app_name.as_str());
        let app = scope.resource(
            tokens::APP,
            app_name.as_str(),
            Properties::new().with("spec", resolve(derived, &args.spec)),
        )?;

        Ok(Self {
            handle: scope.finish(),
            app,
        })
    }

    pub fn live_url(&self) -> OutputRef {
        self.app.output("liveUrl")
    }
}

impl Component for App {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
