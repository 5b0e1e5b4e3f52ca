//! Logical database component

use crate::error::Result;
use crate::resource_types::{PostgresResourceType, postgres_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, ProviderContext, Properties, ResourceGraph, ResourceHandle, Scope,
    resolve,
};

#[derive(Debug, Clone, Default)]
pub struct PostgresDatabaseArgs {
    pub name: String,
    /// Raw database properties; the derived `name` always wins
    pub extra: Properties,
}

/// A database inside an existing server
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    handle: ResourceHandle,
    pub db: ResourceHandle,
}

impl PostgresDatabase {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: PostgresDatabaseArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = PostgresResourceType::Database;
        let mut scope = Scope::open(
            graph,
            ctx,
            &postgres_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let db_name = scope.name(kind.as_str());
        let properties = resolve(args.extra, &Properties::new().with("name", db_name.as_str()));
        let db = scope.resource(tokens::DATABASE, db_name, properties)?;

        Ok(Self {
            handle: scope.finish(),
            db,
        })
    }
}

impl Component for PostgresDatabase {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrakit_cloud::Input;

    #[test]
    fn test_database_name_overrides_extra() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let database = PostgresDatabase::new(
            &mut graph,
            &ctx,
            PostgresDatabaseArgs {
                name: "shop".into(),
                extra: Properties::new()
                    .with("name", "ignored")
                    .with("owner", "postgres"),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(database.handle().name(), "staging-eu-west-2-database-shop");
        let decl = graph.get(database.db.id()).unwrap();
        assert_eq!(
            decl.properties.get("name").and_then(Input::as_str),
            Some("staging-eu-west-2-database-shop")
        );
        assert_eq!(decl.properties.get("owner").and_then(Input::as_str), Some("postgres"));
        assert_eq!(database.component_type(), "postgresql:database");
    }
}
