use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "コンテキストファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: infrakit.local.yaml, .infrakit.local.yaml, infrakit.yaml, .infrakit.yaml\n\
        - ./.infrakit/ ディレクトリ\n\
        - ~/.config/infrakit/infrakit.yaml\n\
        または INFRAKIT_CONTEXT_PATH 環境変数で直接指定できます"
    )]
    ContextFileNotFound,

    #[error("必須項目 '{0}' が設定されていません")]
    MissingField(&'static str),

    #[error("YAML パースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
