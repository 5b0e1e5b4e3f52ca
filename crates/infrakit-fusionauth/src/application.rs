//! FusionAuth application with its roles and registered users
//!
//! Everything is declared through a provider configured from the API key, so
//! the application and users live on an existing FusionAuth instance.

use crate::error::Result;
use crate::resource_types::{FusionAuthResourceType, fusionauth_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Layered, OutputRef, Properties, ProviderContext,
    ResourceGraph, ResourceHandle, Scope, SecretRef, resolve,
};
use std::collections::HashMap;
use tracing::debug;

/// Token lifetimes of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwtSettings {
    pub ttl_seconds: u32,
    pub refresh_token_ttl_minutes: u32,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            refresh_token_ttl_minutes: 60 * 24 * 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JwtSettingsOverrides {
    pub ttl_seconds: Option<u32>,
    pub refresh_token_ttl_minutes: Option<u32>,
}

impl Layered for JwtSettings {
    type Overrides = JwtSettingsOverrides;

    fn overlay(self, overrides: &JwtSettingsOverrides) -> Self {
        Self {
            ttl_seconds: overrides.ttl_seconds.unwrap_or(self.ttl_seconds),
            refresh_token_ttl_minutes: overrides
                .refresh_token_ttl_minutes
                .unwrap_or(self.refresh_token_ttl_minutes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserArgs {
    pub email: String,
    pub password: SecretRef,
    /// Application roles granted by the registration
    pub roles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FusionAuthComponentArgs {
    pub name: String,
    pub application_name: String,
    pub tenant_id: Input,
    /// Admin API key of the instance
    pub api_key: SecretRef,
    /// Base URL of the instance
    pub host: Input,
    pub roles: Vec<String>,
    pub users: Vec<UserArgs>,
    pub jwt: JwtSettingsOverrides,
}

/// A user and its registration with the application
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: ResourceHandle,
    pub registration: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct FusionAuthComponent {
    handle: ResourceHandle,
    pub jwt: JwtSettings,
    pub provider: ResourceHandle,
    pub application: ResourceHandle,
    pub roles: Vec<ResourceHandle>,
    pub users: Vec<RegisteredUser>,
}

impl FusionAuthComponent {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: FusionAuthComponentArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = FusionAuthResourceType::Instance;
        let mut scope = Scope::open(
            graph,
            ctx,
            &fusionauth_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;
        let name = args.name.as_str();

        let provider = scope.provider(
            tokens::PROVIDER,
            scope.name_for(
                FusionAuthResourceType::Provider.as_str(),
                &format!("{}-provider", name),
            ),
            Properties::new()
                .with("apiKey", args.api_key)
                .with("host", args.host),
        )?;
        scope.use_provider(&provider);

        debug!(
            application = %args.application_name,
            roles = args.roles.len(),
            users = args.users.len(),
            "Declaring FusionAuth application"
        );
        let jwt = resolve(JwtSettings::default(), &args.jwt);
        let application = scope.resource(
            tokens::APPLICATION,
            scope.name_for(
                FusionAuthResourceType::Application.as_str(),
                &args.application_name,
            ),
            Properties::new()
                .with("name", args.application_name.as_str())
                .with(
                    "jwtConfiguration",
                    Properties::new()
                        .with("enabled", true)
                        .with("ttlSeconds", jwt.ttl_seconds)
                        .with("refreshTokenTtlMinutes", jwt.refresh_token_ttl_minutes),
                )
                .with(
                    "loginConfiguration",
                    Properties::new()
                        .with("requireAuthentication", false)
                        .with("allowTokenRefresh", true),
                )
                .with("tenantId", args.tenant_id),
        )?;
        let application_id = application.output("id");

        let mut roles = Vec::with_capacity(args.roles.len());
        let mut role_ids = HashMap::new();
        for (index, role_name) in args.roles.iter().enumerate() {
            let role = scope.resource(
                tokens::APPLICATION_ROLE,
                scope.name_for(
                    FusionAuthResourceType::Role.as_str(),
                    &format!("{}-role-{}", name, index),
                ),
                Properties::new()
                    .with("name", role_name.as_str())
                    .with("applicationId", application_id.clone())
                    .with("isDefault", false),
            )?;
            role_ids.insert(role_name.as_str(), role.id());
            roles.push(role);
        }

        let mut users = Vec::with_capacity(args.users.len());
        for (index, user_args) in args.users.into_iter().enumerate() {
            let user = scope.resource(
                tokens::USER,
                scope.name_for(
                    FusionAuthResourceType::User.as_str(),
                    &format!("{}-user-{}", name, index),
                ),
                Properties::new()
                    .with("email", user_args.email.as_str())
                    .with("password", user_args.password),
            )?;

            // Roles declared here must exist before a registration names them
            let granted = user_args
                .roles
                .iter()
                .filter_map(|role| role_ids.get(role.as_str()).copied())
                .collect::<Vec<_>>();
            let registration = scope.resource_with(
                tokens::REGISTRATION,
                scope.name_for(
                    FusionAuthResourceType::UserRegistration.as_str(),
                    &format!("{}-user-registration-{}", name, index),
                ),
                Properties::new()
                    .with("userId", user.output("id"))
                    .with("applicationId", application_id.clone())
                    .with("roles", Input::list(user_args.roles)),
                DeclareOptions::new().depends_on(&user).depends_on_all(granted),
            )?;

            users.push(RegisteredUser { user, registration });
        }

        Ok(Self {
            handle: scope.finish(),
            jwt,
            provider,
            application,
            roles,
            users,
        })
    }

    pub fn application_id(&self) -> OutputRef {
        self.application.output("id")
    }
}

impl Component for FusionAuthComponent {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrakit_cloud::EdgeKind;

    fn args() -> FusionAuthComponentArgs {
        FusionAuthComponentArgs {
            name: "auth".into(),
            application_name: "shop".into(),
            tenant_id: "tenant-1".into(),
            api_key: SecretRef::named("fusionauth-staging/doppler").field("apiKey"),
            host: "https://auth.staging.simonnorman.online".into(),
            roles: vec!["admin".into(), "viewer".into()],
            users: vec![
                UserArgs {
                    email: "ops@simonnorman.online".into(),
                    password: SecretRef::generated("ops-password", 32),
                    roles: vec!["admin".into()],
                },
                UserArgs {
                    email: "guest@simonnorman.online".into(),
                    password: SecretRef::generated("guest-password", 32),
                    roles: Vec::new(),
                },
            ],
            jwt: JwtSettingsOverrides::default(),
        }
    }

    #[test]
    fn test_names() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let auth = FusionAuthComponent::new(&mut graph, &ctx, args(), DeclareOptions::new()).unwrap();

        assert_eq!(auth.handle().name(), "staging-eu-west-2-fusionauth-instance-auth");
        assert_eq!(auth.component_type(), "fusionauth:fusionauth-instance");
        assert_eq!(
            auth.provider.name(),
            "staging-eu-west-2-fusionauth-provider-auth-provider"
        );
        assert_eq!(
            auth.application.name(),
            "staging-eu-west-2-fusionauth-application-shop"
        );
        assert_eq!(auth.roles[1].name(), "staging-eu-west-2-fusionauth-role-auth-role-1");
        assert_eq!(auth.users[0].user.name(), "staging-eu-west-2-fusionauth-user-auth-user-0");
        assert_eq!(
            auth.users[0].registration.name(),
            "staging-eu-west-2-fusionauth-user-reg-auth-user-registration-0"
        );
    }

    #[test]
    fn test_application_settings() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let auth = FusionAuthComponent::new(&mut graph, &ctx, args(), DeclareOptions::new()).unwrap();

        assert_eq!(auth.jwt, JwtSettings { ttl_seconds: 3600, refresh_token_ttl_minutes: 10080 });
        let application = graph.get(auth.application.id()).unwrap();
        let jwt = Properties::new()
            .with("enabled", true)
            .with("ttlSeconds", 3600u32)
            .with("refreshTokenTtlMinutes", 10080u32);
        assert_eq!(application.properties.get("jwtConfiguration"), Some(&Input::from(jwt)));
        assert_eq!(application.options.provider, Some(auth.provider.id()));

        let provider = graph.get(auth.provider.id()).unwrap();
        assert!(provider.properties.get("apiKey").unwrap().is_secret());
    }

    #[test]
    fn test_registration_ordering() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let auth = FusionAuthComponent::new(&mut graph, &ctx, args(), DeclareOptions::new()).unwrap();

        let ops = &auth.users[0];
        let registration = graph.get(ops.registration.id()).unwrap();
        assert!(registration.options.depends_on.contains(&ops.user.id()));
        assert_eq!(
            graph.edge(auth.roles[0].id(), ops.registration.id()),
            Some(EdgeKind::Explicit)
        );
        assert!(graph.edge(auth.roles[1].id(), ops.registration.id()).is_none());
        assert_eq!(
            registration.properties.get("roles"),
            Some(&Input::list(["admin"]))
        );

        let guest = graph.get(auth.users[1].registration.id()).unwrap();
        assert_eq!(guest.options.depends_on, vec![auth.users[1].user.id()]);
    }

    #[test]
    fn test_jwt_overrides() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let mut args = args();
        args.jwt.ttl_seconds = Some(900);
        let auth = FusionAuthComponent::new(&mut graph, &ctx, args, DeclareOptions::new()).unwrap();
        assert_eq!(auth.jwt.ttl_seconds, 900);
        assert_eq!(auth.jwt.refresh_token_ttl_minutes, 10080);
    }

    #[test]
    fn test_repeated_role_is_left_to_the_server() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();

        let mut repeated = args();
        repeated.roles.push("admin".into());
        repeated.users[1].email = "guest".into();
        let auth =
            FusionAuthComponent::new(&mut graph, &ctx, repeated, DeclareOptions::new()).unwrap();

        assert_eq!(auth.roles.len(), 3);
        assert_eq!(auth.roles[2].name(), "staging-eu-west-2-fusionauth-role-auth-role-2");
        let names = |id| graph.get(id).and_then(|d| d.properties.get("name")).cloned();
        assert_eq!(names(auth.roles[0].id()), names(auth.roles[2].id()));
        graph.validate().unwrap();
    }
}
