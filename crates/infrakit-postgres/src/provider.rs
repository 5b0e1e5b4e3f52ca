//! PostgreSQL provider declaration

use crate::error::Result;
use crate::resource_types::tokens;
use infrakit_cloud::{Input, Properties, ResourceHandle, Scope};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5432;

/// libpq `sslmode`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

/// Connection settings of an administrative provider
#[derive(Debug, Clone)]
pub struct PostgresProviderArgs {
    pub host: Input,
    pub port: u16,
    pub username: Input,
    /// Secret reference; never a literal in practice
    pub password: Input,
    pub database: Input,
    pub sslmode: SslMode,
}

impl PostgresProviderArgs {
    pub fn new(
        host: impl Into<Input>,
        username: impl Into<Input>,
        password: impl Into<Input>,
        database: impl Into<Input>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            sslmode: SslMode::default(),
        }
    }
}

/// A provider instance every role and grant can be declared through
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    pub handle: ResourceHandle,
}

impl PostgresProvider {
    pub fn declare(scope: &mut Scope<'_>, name: &str, args: PostgresProviderArgs) -> Result<Self> {
        let properties = Properties::new()
            .with("host", args.host)
            .with("port", args.port)
            .with("username", args.username)
            .with("password", args.password)
            .with("database", args.database)
            .with("sslmode", args.sslmode.as_str());

        let handle = scope.provider(tokens::PROVIDER, name, properties)?;
        Ok(Self { handle })
    }
}
