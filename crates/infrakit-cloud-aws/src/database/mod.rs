//! Managed databases

pub mod rds;

pub use rds::{
    CREDENTIAL_TTL_MINUTES, MigrationCommand, RDS_IAM_ROLE, RdsInstanceOverrides,
    RdsInstanceSettings, RdsPrismaPostgresDb, RdsPrismaPostgresDbArgs, RdsRole, RdsRoleHandles,
};
