//! Saving retrieved images to disk.
//!
//! Every save goes through one [`DownloadLink`], created the first time it
//! is needed and reused for the life of the process. Using it is always
//! the same three steps: stage the bytes (the link's `href`), name the
//! file (its `download`), then click, which moves the staged bytes into
//! place.

use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::PoisonError;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use tempfile::TempPath;

use crate::error::DeliveryError;

const FALLBACK_NAME: &str = "image";
// Matches how browsers name repeated downloads: `name (1).jpg`.
const MAX_DUPLICATES: usize = 1000;

static DOWNLOAD_LINK: OnceLock<DownloadLink> = OnceLock::new();

/// The process-wide download link.
pub fn download_link() -> &'static DownloadLink {
    DOWNLOAD_LINK.get_or_init(|| {
        tracing::debug!("creating download link");
        DownloadLink::default()
    })
}

/// An image ready to be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    /// Name without extension, as rendered from the filename template.
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Download {
    /// The on-disk name: path separators neutralized and an extension
    /// picked from the content type.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem: String = self
            .filename
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
            .collect();
        let stem = if stem.is_empty() || stem == "." || stem == ".." {
            FALLBACK_NAME.to_string()
        } else {
            stem
        };

        match self.content_type.as_deref().and_then(extension_for) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        }
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim();
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Where downloads end up.
pub trait Deliver: Send + Sync {
    fn deliver(&self, download: Download) -> Result<Utf8PathBuf, DeliveryError>;
}

#[derive(Debug, Default)]
struct LinkState {
    href: Option<TempPath>,
    download: Option<String>,
    clicks: u64,
}

#[derive(Debug, Default)]
pub struct DownloadLink {
    state: Mutex<LinkState>,
}

impl DownloadLink {
    /// Stage `download` in `dir`, point the link at it and click.
    ///
    /// The link is held for the whole sequence, so concurrent saves each
    /// see their own `href`/`download` pair.
    pub fn send(&self, dir: &Utf8Path, download: &Download) -> Result<Utf8PathBuf, DeliveryError> {
        let staged = stage(dir, &download.bytes)?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.href = Some(staged);
        state.download = Some(download.file_name());
        Self::click(&mut state, dir)
    }

    /// Number of saves completed through this link.
    pub fn clicks(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clicks
    }

    fn click(state: &mut LinkState, dir: &Utf8Path) -> Result<Utf8PathBuf, DeliveryError> {
        let mut href = state.href.take().ok_or(DeliveryError::NothingToSave)?;
        let name = state
            .download
            .take()
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        for attempt in 0..MAX_DUPLICATES {
            let target = dir.join(numbered(&name, attempt));
            if target.as_std_path().exists() {
                continue;
            }
            match href.persist_noclobber(target.as_std_path()) {
                Ok(()) => {
                    state.clicks += 1;
                    return Ok(target);
                }
                Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    href = err.path;
                }
                Err(err) => {
                    return Err(DeliveryError::Save {
                        path: target,
                        source: err.error,
                    });
                }
            }
        }

        Err(DeliveryError::Save {
            path: dir.join(&name),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "too many files with this name",
            ),
        })
    }
}

/// Write `bytes` to a temporary file inside `dir`, so the final move is a
/// rename on the same filesystem.
fn stage(dir: &Utf8Path, bytes: &[u8]) -> Result<TempPath, DeliveryError> {
    let to_stage_error = |source| DeliveryError::Stage {
        dir: dir.to_owned(),
        source,
    };

    std::fs::create_dir_all(dir.as_std_path()).map_err(to_stage_error)?;
    let mut file = tempfile::Builder::new()
        .prefix(".bskydl-")
        .suffix(".part")
        .tempfile_in(dir.as_std_path())
        .map_err(to_stage_error)?;
    std::io::Write::write_all(&mut file, bytes).map_err(to_stage_error)?;
    Ok(file.into_temp_path())
}

/// `name`, `name (1)`, `name (2)`, ... with the extension kept last.
fn numbered(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{name} ({attempt})"),
    }
}

/// Saves into a directory through the shared [`download_link`].
#[derive(Clone, Debug)]
pub struct FileDelivery {
    output_dir: Utf8PathBuf,
}

impl FileDelivery {
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }
}

impl Deliver for FileDelivery {
    fn deliver(&self, download: Download) -> Result<Utf8PathBuf, DeliveryError> {
        download_link().send(&self.output_dir, &download)
    }
}
