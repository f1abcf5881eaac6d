use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Base name probed when no explicit file is given (`casefile.toml`, `casefile.json`, ...).
pub const DEFAULT_CONFIG_NAME: &str = "casefile";

/// Prefix for environment overrides, e.g. `CASEFILE__STORAGE__DATA_DIR`.
pub const ENV_PREFIX: &str = "CASEFILE";

#[casefile_derive::casefile_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: a base file overlaid with environment overrides.
///
/// 1. **Base file**: an explicit `path` must exist. Without one, `casefile.*` in the working
///    directory is used when present and silently skipped otherwise.
/// 2. **Environment**: variables prefixed with `CASEFILE__`, nested with double underscores
///    (`CASEFILE__ARCHIVE__LENIENT_INDEX=false` maps to `archive.lenient_index`).
///
/// # Errors
/// Returns [`ConfigError`] if an explicit file is missing or the merged sources do not
/// deserialize into `T`.
///
/// # Example
/// ```rust
/// use casefile_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     level: String,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// # let _ = cfg.level;
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(path) => {
            info!(path = %path.as_ref().display(), "Loading config");
            File::from(path.as_ref()).required(true)
        }
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let config = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("inflate.strategies"),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
