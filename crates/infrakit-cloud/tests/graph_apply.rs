//! End-to-end tests: declare through scopes, plan, apply with the dry-run engine.

use infrakit_cloud::{
    DeclarationKind, DeclareOptions, DryRunEngine, Engine, Input, ProviderContext, Properties,
    ResourceGraph, Scope, SecretRef,
};

struct Declared {
    db: String,
    migration: String,
    role: String,
}

/// Database, then a migration that must finish before the application role
fn declare_database(graph: &mut ResourceGraph, ctx: &ProviderContext) -> Declared {
    let mut scope = Scope::open(graph, ctx, "test:db", "db", "core", DeclareOptions::new()).unwrap();

    let db_name = scope.name("database-instance");
    let db = scope
        .resource(
            "aws:rds/instance:Instance",
            db_name,
            Properties::new()
                .with("engine", "postgres")
                .with("manageMasterUserPassword", true),
        )
        .unwrap();

    let password = SecretRef::managed(db.output("masterUserSecrets[0].secretArn")).field("password");
    let migration_name = scope.name("migration");
    let migration = scope
        .resource_with(
            "command:local:Command",
            migration_name,
            Properties::new().with(
                "environment",
                Properties::new().with(
                    "DATABASE_URL",
                    Input::concat([Input::from("postgres://postgres:"), Input::from(password)]),
                ),
            ),
            DeclareOptions::new().depends_on(&db),
        )
        .unwrap();

    let role_name = scope.name_for("role", "app");
    let role = scope
        .resource_with(
            "postgresql:index:Role",
            role_name,
            Properties::new().with("login", true),
            DeclareOptions::new().depends_on(&migration),
        )
        .unwrap();
    scope.finish();

    Declared {
        db: format!("aws:rds/instance:Instance:{}", db.name()),
        migration: format!("command:local:Command:{}", migration.name()),
        role: format!("postgresql:index:Role:{}", role.name()),
    }
}

#[tokio::test]
async fn test_role_waits_for_migration() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let declared = declare_database(&mut graph, &ctx);

    let plan = graph.plan().unwrap();
    let position = |key: &str| plan.steps.iter().position(|s| s.key() == key).unwrap();
    assert!(position(&declared.db) < position(&declared.migration));
    assert!(position(&declared.migration) < position(&declared.role));

    let result = DryRunEngine::new().apply(&plan).await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.succeeded.len(), plan.len());
}

#[tokio::test]
async fn test_failed_migration_skips_roles() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let declared = declare_database(&mut graph, &ctx);

    let engine = DryRunEngine::new().fail_on(declared.migration.clone(), "exit status 1");
    let result = engine.apply(&graph.plan().unwrap()).await.unwrap();

    assert!(!result.is_success());
    assert!(result.was_applied(&declared.db));
    assert!(result.was_skipped(&declared.role));
}

#[tokio::test]
async fn test_same_component_twice_collides_only_at_apply() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    declare_database(&mut graph, &ctx);
    declare_database(&mut graph, &ctx);

    let plan = graph.plan().unwrap();
    assert_eq!(graph.find("test:db", "staging-eu-west-2-db-core").len(), 2);

    let result = DryRunEngine::new().apply(&plan).await.unwrap();
    assert_eq!(result.failed.len(), 1);
    assert!(result.failed[0].error.as_deref().unwrap().contains("already exists"));
}

#[test]
fn test_plan_keeps_secrets_as_references() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    declare_database(&mut graph, &ctx);

    let json = graph.plan().unwrap().to_json().unwrap();
    assert!(json.contains("\"managed\""));
    assert!(json.contains("\"password\""));
    assert_eq!(
        graph
            .iter()
            .filter(|d| d.kind == DeclarationKind::Component)
            .count(),
        1
    );
}
