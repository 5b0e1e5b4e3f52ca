//! IAM users with access keys
//!
//! Access keys are encrypted with the caller's PGP key. The key id is only
//! ever exposed as a secret reference and the secret as its encrypted form.

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::naming::build_project_wide_resource_name;
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, SecretRef,
};

#[derive(Debug, Clone)]
pub struct UserArgs {
    pub first_name: String,
    pub surname: String,
    pub user_group_names: Vec<Input>,
    pub pgp_key: String,
}

impl UserArgs {
    /// `{first_name}.{surname}`
    pub fn user_name(&self) -> String {
        format!("{}.{}", self.first_name, self.surname)
    }
}

/// Access key of a user, never in plain text
#[derive(Debug, Clone)]
pub struct AccessKey {
    pub handle: ResourceHandle,
}

impl AccessKey {
    pub fn id(&self) -> SecretRef {
        SecretRef::output(self.handle.output("id"))
    }

    /// Secret access key encrypted with the user's PGP key
    pub fn encrypted_secret(&self) -> OutputRef {
        self.handle.output("encryptedSecret")
    }
}

fn open_user<'g>(
    graph: &'g mut ResourceGraph,
    ctx: &'g ProviderContext,
    args: &UserArgs,
    options: DeclareOptions,
) -> Result<(Scope<'g>, ResourceHandle)> {
    let user_name = args.user_name();
    let resource_name = build_project_wide_resource_name(AwsResourceType::User.as_str(), &user_name);
    let mut scope = Scope::open_named(
        graph,
        ctx,
        &aws_resource_type(AwsResourceType::User),
        ctx.names(user_name.as_str()),
        resource_name.clone(),
        options,
    )?;

    let user = scope.resource(
        tokens::IAM_USER,
        resource_name,
        Properties::new().with("name", user_name),
    )?;
    Ok((scope, user))
}

fn declare_access_key(
    scope: &mut Scope<'_>,
    name: String,
    user: &ResourceHandle,
    pgp_key: &str,
) -> Result<AccessKey> {
    let handle = scope.resource(
        tokens::IAM_ACCESS_KEY,
        name,
        Properties::new()
            .with("user", user.output("name"))
            .with("pgpKey", pgp_key),
    )?;
    Ok(AccessKey { handle })
}

/// A person with console access, group memberships and an access key
#[derive(Debug, Clone)]
pub struct User {
    handle: ResourceHandle,
    pub user: ResourceHandle,
    pub login_profile: ResourceHandle,
    pub access_key: AccessKey,
}

impl User {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: UserArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, user) = open_user(graph, ctx, &args, options)?;
        let user_name = args.user_name();

        let login_profile = scope.resource(
            tokens::IAM_USER_LOGIN_PROFILE,
            build_project_wide_resource_name(AwsResourceType::UserLoginProfile.as_str(), &user_name),
            Properties::new()
                .with("user", user.output("name"))
                .with("pgpKey", args.pgp_key.as_str())
                .with("passwordResetRequired", true),
        )?;

        scope.resource(
            tokens::IAM_USER_GROUP_MEMBERSHIP,
            format!("{}-membership", user.name()),
            Properties::new()
                .with("user", user.output("name"))
                .with("groups", args.user_group_names),
        )?;

        let access_key =
            declare_access_key(&mut scope, format!("{}-accesskey", user.name()), &user, &args.pgp_key)?;

        Ok(Self {
            handle: scope.finish(),
            user,
            login_profile,
            access_key,
        })
    }
}

impl Component for User {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// A programmatic user: no console login
#[derive(Debug, Clone)]
pub struct ServiceUser {
    handle: ResourceHandle,
    pub user: ResourceHandle,
    pub access_key: AccessKey,
}

impl ServiceUser {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: UserArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, user) = open_user(graph, ctx, &args, options)?;
        let user_name = args.user_name();

        scope.resource(
            tokens::IAM_USER_GROUP_MEMBERSHIP,
            build_project_wide_resource_name(
                AwsResourceType::UserGroupMembership.as_str(),
                &user_name,
            ),
            Properties::new()
                .with("user", user.output("name"))
                .with("groups", args.user_group_names),
        )?;

        let access_key = declare_access_key(
            &mut scope,
            build_project_wide_resource_name(AwsResourceType::AccessKey.as_str(), &user_name),
            &user,
            &args.pgp_key,
        )?;

        Ok(Self {
            handle: scope.finish(),
            user,
            access_key,
        })
    }
}

impl Component for ServiceUser {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CiCdUserGroup;

    fn args(group: Input) -> UserArgs {
        UserArgs {
            first_name: "ada".into(),
            surname: "lovelace".into(),
            user_group_names: vec![group],
            pgp_key: "keybase:ada".into(),
        }
    }

    #[test]
    fn test_user_resources() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let group = CiCdUserGroup::new(&mut graph, &ctx, DeclareOptions::new()).unwrap();
        let user = User::new(
            &mut graph,
            &ctx,
            args(group.group.output("name").into()),
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(user.user.name(), "user-ada.lovelace");
        assert_eq!(user.login_profile.name(), "user-login-profile-ada.lovelace");
        assert_eq!(user.access_key.handle.name(), "user-ada.lovelace-accesskey");

        let membership = graph.find(tokens::IAM_USER_GROUP_MEMBERSHIP, "user-ada.lovelace-membership");
        assert!(graph.dependencies_of(membership[0].id).contains(&group.group.id()));
        assert_eq!(user.access_key.encrypted_secret().attribute, "encryptedSecret");
    }

    #[test]
    fn test_service_user_has_no_login() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let user = ServiceUser::new(&mut graph, &ctx, args("ci".into()), DeclareOptions::new()).unwrap();

        assert!(graph.by_type(tokens::IAM_USER_LOGIN_PROFILE).is_empty());
        assert_eq!(user.access_key.handle.name(), "access-key-ada.lovelace");
        assert_eq!(
            graph.find(tokens::IAM_USER_GROUP_MEMBERSHIP, "user-group-membership-ada.lovelace").len(),
            1
        );
        assert!(Input::from(user.access_key.id()).is_secret());
    }
}
