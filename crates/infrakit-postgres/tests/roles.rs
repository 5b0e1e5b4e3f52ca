use infrakit_cloud::{
    DeclareOptions, DryRunEngine, Engine, ProviderContext, ResourceGraph, Scope, SecretRef,
};
use infrakit_postgres::resource_types::tokens;
use infrakit_postgres::*;

#[tokio::test]
async fn test_roles_and_grants_go_through_provider() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let mut scope =
        Scope::open(&mut graph, &ctx, "test:pg", "db", "core", DeclareOptions::new()).unwrap();

    let provider = PostgresProvider::declare(
        &mut scope,
        "pg-provider",
        PostgresProviderArgs::new(
            "db.internal",
            "postgres",
            SecretRef::named("db-admin").field("password"),
            "shop",
        ),
    )
    .unwrap();
    scope.use_provider(&provider.handle);

    let role_name = scope.name_for("role", "reader");
    let role = declare_role(
        &mut scope,
        &role_name,
        RoleArgs::login(&role_name),
        DeclareOptions::new(),
    )
    .unwrap();
    let grant = GrantArgs::new(GrantObjectType::Table, ["SELECT"]).in_schema("public");
    let grant_decl = declare_grant(
        &mut scope,
        &format!("{}-table-0", role_name),
        "shop",
        &role_name,
        &grant,
        DeclareOptions::new().depends_on(&role),
    )
    .unwrap();
    scope.finish();

    assert_eq!(
        graph.get(grant_decl.id()).unwrap().options.provider,
        Some(provider.handle.id())
    );
    assert_eq!(graph.by_type(tokens::PROVIDER).len(), 1);

    let plan = graph.plan().unwrap();
    let provider_step = plan.step(provider.handle.id()).unwrap();
    let grant_step = plan.step(grant_decl.id()).unwrap();
    assert!(provider_step.wave < grant_step.wave);

    let result = DryRunEngine::new().apply(&plan).await.unwrap();
    assert!(result.is_success());
}
