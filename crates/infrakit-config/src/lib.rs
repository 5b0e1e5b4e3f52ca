pub mod error;

pub use error::*;

use infrakit_cloud::{Environment, Layered, ProviderContext};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// コンテキストファイルのパスを直接指定する環境変数
pub const CONTEXT_PATH_ENV: &str = "INFRAKIT_CONTEXT_PATH";
pub const REGION_ENV: &str = "INFRAKIT_REGION";
pub const ENVIRONMENT_ENV: &str = "INFRAKIT_ENVIRONMENT";
pub const DOMAIN_ENV: &str = "INFRAKIT_DOMAIN";

const CANDIDATES: [&str; 4] = [
    "infrakit.local.yaml",
    ".infrakit.local.yaml",
    "infrakit.yaml",
    ".infrakit.yaml",
];

/// コンテキストファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 INFRAKIT_CONTEXT_PATH (直接パス指定)
/// 2. カレントディレクトリ: infrakit.local.yaml, .infrakit.local.yaml, infrakit.yaml, .infrakit.yaml
/// 3. ./.infrakit/ ディレクトリ内: 同様の順序
/// 4. ~/.config/infrakit/infrakit.yaml (グローバル設定)
pub fn find_context_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(context_path) = std::env::var(CONTEXT_PATH_ENV) {
        let path = PathBuf::from(context_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. ./.infrakit/ ディレクトリで検索
    let infrakit_dir = current_dir.join(".infrakit");
    if infrakit_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = infrakit_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("infrakit").join("infrakit.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ContextFileNotFound)
}

/// コンテキストファイルの内容 (全項目省略可)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContextFile {
    pub region: Option<String>,
    pub environment: Option<String>,
    pub domain: Option<String>,
    pub organization: Option<String>,
    #[serde(alias = "accountId")]
    pub account_id: Option<String>,
}

/// 環境変数による上書き
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOverrides {
    pub region: Option<String>,
    pub environment: Option<String>,
    pub domain: Option<String>,
}

impl ContextOverrides {
    /// INFRAKIT_REGION / INFRAKIT_ENVIRONMENT / INFRAKIT_DOMAIN を読む
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            region: read(REGION_ENV),
            environment: read(ENVIRONMENT_ENV),
            domain: read(DOMAIN_ENV),
        }
    }
}

impl Layered for ContextFile {
    type Overrides = ContextOverrides;

    fn overlay(self, overrides: &ContextOverrides) -> Self {
        Self {
            region: overrides.region.clone().or(self.region),
            environment: overrides.environment.clone().or(self.environment),
            domain: overrides.domain.clone().or(self.domain),
            ..self
        }
    }
}

impl ContextFile {
    /// region と environment は必須
    pub fn into_context(self) -> Result<ProviderContext> {
        let region = self.region.ok_or(ConfigError::MissingField("region"))?;
        let environment = self
            .environment
            .ok_or(ConfigError::MissingField("environment"))?;

        let mut ctx = ProviderContext::new(region, Environment::new(environment));
        if let Some(domain) = self.domain {
            ctx = ctx.with_domain(domain);
        }
        if let Some(organization) = self.organization {
            ctx = ctx.with_organization(organization);
        }
        if let Some(account_id) = self.account_id {
            ctx = ctx.with_account_id(account_id);
        }
        Ok(ctx)
    }
}

/// YAML 文字列をパース (空文字列は空のコンテキスト)
pub fn parse_context(content: &str) -> Result<ContextFile> {
    if content.trim().is_empty() {
        return Ok(ContextFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// 指定パスのファイルを読み、環境変数で上書きしてコンテキストを作る
pub fn load_context_from(path: &Path) -> Result<ProviderContext> {
    debug!(path = %path.display(), "Loading context file");
    let content = std::fs::read_to_string(path)?;
    let file = parse_context(&content)?;
    file.overlay(&ContextOverrides::from_env()).into_context()
}

/// コンテキストファイルを探して読み込む
///
/// ファイルが無い場合は環境変数だけで組み立てる。それでも region と
/// environment が揃わなければ ContextFileNotFound を返す。
pub fn load_context() -> Result<ProviderContext> {
    let ctx = match find_context_file() {
        Ok(path) => load_context_from(&path)?,
        Err(ConfigError::ContextFileNotFound) => ContextFile::default()
            .overlay(&ContextOverrides::from_env())
            .into_context()
            .map_err(|_| ConfigError::ContextFileNotFound)?,
        Err(e) => return Err(e),
    };

    info!(
        region = %ctx.region,
        environment = %ctx.environment,
        domain = %ctx.domain,
        "Provider context loaded"
    );
    Ok(ctx)
}
