use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model {name} not found (looked at {tried:?}) and no download URL given")]
    NotFound { name: String, tried: Vec<PathBuf> },
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where to find one model file.
#[derive(Debug, Clone)]
pub struct ModelSource<'a> {
    /// File name inside the cache directory.
    pub name: &'a str,
    /// Path given by the operator; wins when it exists.
    pub explicit_path: Option<&'a Path>,
    /// Fetched into the cache when nothing local is found.
    pub url: Option<&'a str>,
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit path
/// 2. `cache_dir/name`
/// 3. Download from URL into `cache_dir`
pub fn resolve_in(
    source: &ModelSource<'_>,
    cache_dir: &Path,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let mut tried = Vec::new();
    if let Some(path) = source.explicit_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tried.push(path.to_path_buf());
    }

    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }
    tried.push(cached_path.clone());

    let Some(url) = source.url else {
        return Err(ModelResolveError::NotFound {
            name: source.name.to_string(),
            tried,
        });
    };
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// [`resolve_in`] against the platform cache directory.
pub fn resolve(
    source: &ModelSource<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(source, &model_cache_dir()?, progress)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Footfall/models/`
/// - Linux: `$XDG_CACHE_HOME/Footfall/models/` or `~/.cache/Footfall/models/`
/// - Windows: `%LOCALAPPDATA%/Footfall/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Footfall").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Footfall").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |path: &Path, e: std::io::Error| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(|e| write_err(temp_path, e))?;

    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| write_err(temp_path, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| write_err(temp_path, e))?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| write_err(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| write_err(dest, e))
}
