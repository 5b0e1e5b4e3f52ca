//! AWS naming kinds and type tokens
//!
//! [`AwsResourceType`] is the `type` segment of a generated name
//! (`staging-eu-west-2-vpc-core`). The [`tokens`] are the provider type
//! tokens the engine dispatches declarations on.

use std::fmt;

/// Name segment of an AWS declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwsResourceType {
    Vpc,
    Vpn,
    VpnEndpoint,
    VpnAuthRule,
    NetworkAssociation,
    SecurityGroup,
    Ec2,
    DatabaseInstance,
    SubnetGroup,
    Migration,
    Role,
    RolePolicy,
    PermissionsPolicy,
    PolicyAttachment,
    InstanceProfile,
    UserGroup,
    User,
    UserLoginProfile,
    UserGroupMembership,
    AccessKey,
    Secret,
    Route53Zone,
    DnsRecord,
    DnsARecord,
    HttpsCertificate,
    LoadBalancer,
    LbListener,
    LbListenerRule,
    TargetGroup,
    Cluster,
    FargateService,
    TaskDefinition,
    ServiceContainer,
    ImageRepository,
    Image,
    Lambda,
    LambdaPermission,
    ApiGatewayLambda,
    ApiGateway,
    ApiGatewayIntegration,
    ApiGatewayRoute,
    ApiGatewayStage,
    ApiGatewayDomainName,
    ApiGatewayMapping,
    ApiGatewayDeployment,
    ScheduledLambda,
    EventRule,
    EventTarget,
    QueuedLambda,
    Sqs,
    EventSourceMapping,
    FusionAuthServer,
}

impl AwsResourceType {
    pub fn as_str(self) -> &'static str {
        use AwsResourceType::*;
        match self {
            Vpc => "vpc",
            Vpn => "vpn",
            VpnEndpoint => "vpn-endpoint",
            VpnAuthRule => "vpn-auth-rule",
            NetworkAssociation => "network-association",
            SecurityGroup => "security-group",
            Ec2 => "ec2",
            DatabaseInstance => "database-instance",
            SubnetGroup => "subnet-group",
            Migration => "migration",
            Role => "role",
            RolePolicy => "role-policy",
            PermissionsPolicy => "permissions-policy",
            PolicyAttachment => "policy-attachment",
            InstanceProfile => "instance-profile",
            UserGroup => "user-group",
            User => "user",
            UserLoginProfile => "user-login-profile",
            UserGroupMembership => "user-group-membership",
            AccessKey => "access-key",
            Secret => "secret",
            Route53Zone => "route53-zone",
            DnsRecord => "dns-record",
            DnsARecord => "dns-a-record",
            HttpsCertificate => "https-certificate",
            LoadBalancer => "load-balancer",
            LbListener => "lb-listener",
            LbListenerRule => "lb-listener-rule",
            TargetGroup => "target-group",
            Cluster => "cluster",
            FargateService => "fargate-service",
            TaskDefinition => "task-definition",
            ServiceContainer => "service-container",
            ImageRepository => "image-repository",
            Image => "image",
            Lambda => "lambda",
            LambdaPermission => "lambda-permission",
            ApiGatewayLambda => "api-gateway-lambda",
            ApiGateway => "api-gateway",
            ApiGatewayIntegration => "api-gateway-integration",
            ApiGatewayRoute => "api-gateway-route",
            ApiGatewayStage => "api-gateway-stage",
            ApiGatewayDomainName => "api-gateway-domain-name",
            ApiGatewayMapping => "api-gateway-mapping",
            ApiGatewayDeployment => "api-gateway-deployment",
            ScheduledLambda => "scheduled-lambda",
            EventRule => "event-rule",
            EventTarget => "event-target",
            QueuedLambda => "queued-lambda",
            Sqs => "sqs",
            EventSourceMapping => "event-source-mapping",
            FusionAuthServer => "fusion-auth-server",
        }
    }
}

impl fmt::Display for AwsResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `aws:{kind}`, the component type token
pub fn aws_resource_type(kind: AwsResourceType) -> String {
    infrakit_cloud::naming::build_resource_type_name("aws", kind.as_str())
}

/// Provider type tokens of the declared resources
pub mod tokens {
    pub const VPC: &str = "awsx:ec2:Vpc";
    pub const SECURITY_GROUP: &str = "aws:ec2/securityGroup:SecurityGroup";
    pub const INGRESS_RULE: &str = "aws:vpc/securityGroupIngressRule:SecurityGroupIngressRule";
    pub const EGRESS_RULE: &str = "aws:vpc/securityGroupEgressRule:SecurityGroupEgressRule";
    pub const VPN_ENDPOINT: &str = "aws:ec2clientvpn/endpoint:Endpoint";
    pub const VPN_AUTH_RULE: &str = "aws:ec2clientvpn/authorizationRule:AuthorizationRule";
    pub const VPN_NETWORK_ASSOCIATION: &str =
        "aws:ec2clientvpn/networkAssociation:NetworkAssociation";
    pub const AMI: &str = "aws:ec2/getAmi:getAmi";
    pub const INSTANCE: &str = "aws:ec2/instance:Instance";

    pub const IAM_ROLE: &str = "aws:iam/role:Role";
    pub const IAM_POLICY: &str = "aws:iam/policy:Policy";
    pub const IAM_ROLE_POLICY: &str = "aws:iam/rolePolicy:RolePolicy";
    pub const IAM_ROLE_POLICY_ATTACHMENT: &str = "aws:iam/rolePolicyAttachment:RolePolicyAttachment";
    pub const IAM_GROUP: &str = "aws:iam/group:Group";
    pub const IAM_GROUP_POLICY_ATTACHMENT: &str =
        "aws:iam/groupPolicyAttachment:GroupPolicyAttachment";
    pub const IAM_USER: &str = "aws:iam/user:User";
    pub const IAM_USER_LOGIN_PROFILE: &str = "aws:iam/userLoginProfile:UserLoginProfile";
    pub const IAM_USER_GROUP_MEMBERSHIP: &str = "aws:iam/userGroupMembership:UserGroupMembership";
    pub const IAM_ACCESS_KEY: &str = "aws:iam/accessKey:AccessKey";
    pub const IAM_INSTANCE_PROFILE: &str = "aws:iam/instanceProfile:InstanceProfile";

    pub const SECRET: &str = "aws:secretsmanager/secret:Secret";
    pub const GET_SECRET: &str = "aws:secretsmanager/getSecret:getSecret";
    pub const GET_SECRET_VERSION: &str = "aws:secretsmanager/getSecretVersion:getSecretVersion";

    pub const HOSTED_ZONE: &str = "aws:route53/zone:Zone";
    pub const DNS_RECORD: &str = "aws:route53/record:Record";
    pub const CERTIFICATE: &str = "aws:acm/certificate:Certificate";
    pub const CERTIFICATE_VALIDATION: &str = "aws:acm/certificateValidation:CertificateValidation";

    pub const LOAD_BALANCER: &str = "awsx:lb:ApplicationLoadBalancer";
    pub const LISTENER: &str = "aws:lb/listener:Listener";
    pub const LISTENER_RULE: &str = "aws:lb/listenerRule:ListenerRule";
    pub const TARGET_GROUP: &str = "aws:lb/targetGroup:TargetGroup";

    pub const RDS_INSTANCE: &str = "aws:rds/instance:Instance";
    pub const RDS_SUBNET_GROUP: &str = "aws:rds/subnetGroup:SubnetGroup";

    pub const ECR_REPOSITORY: &str = "awsx:ecr:Repository";
    pub const ECR_IMAGE: &str = "awsx:ecr:Image";
    pub const ECS_CLUSTER: &str = "aws:ecs/cluster:Cluster";
    pub const FARGATE_SERVICE: &str = "awsx:ecs:FargateService";

    pub const LAMBDA_FUNCTION: &str = "aws:lambda/function:Function";
    pub const LAMBDA_PERMISSION: &str = "aws:lambda/permission:Permission";
    pub const LAMBDA_EVENT_SOURCE_MAPPING: &str = "aws:lambda/eventSourceMapping:EventSourceMapping";
    pub const API: &str = "aws:apigatewayv2/api:Api";
    pub const API_INTEGRATION: &str = "aws:apigatewayv2/integration:Integration";
    pub const API_ROUTE: &str = "aws:apigatewayv2/route:Route";
    pub const API_STAGE: &str = "aws:apigatewayv2/stage:Stage";
    pub const API_DOMAIN_NAME: &str = "aws:apigatewayv2/domainName:DomainName";
    pub const API_MAPPING: &str = "aws:apigatewayv2/apiMapping:ApiMapping";
    pub const API_DEPLOYMENT: &str = "aws:apigateway/deployment:Deployment";
    pub const EVENT_RULE: &str = "aws:cloudwatch/eventRule:EventRule";
    pub const EVENT_TARGET: &str = "aws:cloudwatch/eventTarget:EventTarget";
    pub const SQS_QUEUE: &str = "aws:sqs/queue:Queue";

    /// Local command run by the engine (database migrations)
    pub const COMMAND: &str = "command:local:Command";
}
