use std::path::Path;
use std::time::Duration;

use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// `<%uname> <%post_id>_p<%img_num>` renders as `oh8 3krmccyl4722w_p0`.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "<%uname> <%post_id>_p<%img_num>";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;
/// Levels between a feed thumbnail and the closest element holding every
/// image of its post, as rendered by the app today.
pub const DEFAULT_ORDINAL_DEPTH: usize = 7;
pub const DEFAULT_MAX_LINK_HOPS: usize = 32;
pub const DEFAULT_BLOB_ENDPOINT: &str = "https://bsky.social/xrpc/com.atproto.sync.getBlob";
pub const DEFAULT_THUMBNAIL_PREFIX: &str = "https://cdn.bsky.app/img/feed_thumbnail";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to serialize settings")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    /// Template for download filenames. Recognized tokens: `<%username>`,
    /// `<%uname>`, `<%post_id>`, `<%timestamp>`, `<%img_num>`.
    pub filename_template: String,
    pub poll_interval_ms: u64,
    /// How far above a thumbnail to look for the element that holds all
    /// of the post's images.
    pub ordinal_depth: usize,
    /// Upper bound on ancestors visited while looking for the post link.
    pub max_link_hops: usize,
    pub blob_endpoint: String,
    pub thumbnail_prefix: String,
    pub output_dir: Utf8PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            ordinal_depth: DEFAULT_ORDINAL_DEPTH,
            max_link_hops: DEFAULT_MAX_LINK_HOPS,
            blob_endpoint: DEFAULT_BLOB_ENDPOINT.to_string(),
            thumbnail_prefix: DEFAULT_THUMBNAIL_PREFIX.to_string(),
            output_dir: Utf8PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("social", "bskydl", "bskydl")
            .map(|proj_dirs| proj_dirs.config_dir().join("bskydl.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join(".bskydl.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("bskydl.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.ordinal_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "ordinal_depth",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_link_hops == 0 {
            return Err(ConfigError::Invalid {
                key: "max_link_hops",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Err(err) = url::Url::parse(&self.blob_endpoint) {
            return Err(ConfigError::Invalid {
                key: "blob_endpoint",
                reason: err.to_string(),
            });
        }
        if self.thumbnail_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                key: "thumbnail_prefix",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Effective settings rendered back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
