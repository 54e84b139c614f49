use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    foundation::core::Size,
    foundation::error::{ReelError, ReelResult},
};

/// Decoded straight-alpha RGBA8 image, cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pixels: Arc<image::RgbaImage>,
}

impl DecodedImage {
    /// Wrap already decoded pixels.
    pub fn new(pixels: image::RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Intrinsic size, used for aspect-fit.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    /// Pixel buffer.
    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }
}

/// Why one asset failed to load.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    /// The bytes could not be obtained (missing file, bad locator).
    #[error("fetch failed for '{locator}': {reason}")]
    Fetch {
        /// Requested locator.
        locator: String,
        /// Underlying cause.
        reason: String,
    },
    /// The bytes were obtained but are not a decodable image.
    #[error("decode failed for '{locator}': {reason}")]
    Decode {
        /// Requested locator.
        locator: String,
        /// Underlying cause.
        reason: String,
    },
}

impl LoadFailure {
    /// Locator that failed.
    pub fn locator(&self) -> &str {
        match self {
            Self::Fetch { locator, .. } | Self::Decode { locator, .. } => locator,
        }
    }

    /// `true` for decode failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Source of decoded images. Called concurrently from the load fan-out.
pub trait AssetLoader: Send + Sync {
    /// Fetch and decode one image.
    fn fetch_image(&self, locator: &str) -> Result<DecodedImage, LoadFailure>;
}

/// Decode encoded image bytes (PNG, JPEG, ...).
pub fn decode_image(bytes: &[u8]) -> ReelResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(DecodedImage::new(dyn_img.to_rgba8()))
}

/// Loads images from files below a root directory.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    /// Loader resolving locators relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for FsImageLoader {
    fn fetch_image(&self, locator: &str) -> Result<DecodedImage, LoadFailure> {
        let fetch = |reason: String| LoadFailure::Fetch {
            locator: locator.to_owned(),
            reason,
        };
        let rel = normalize_rel_path(locator).map_err(|e| fetch(e.to_string()))?;
        let path = self.root.join(rel);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read {}", path.display()))
            .map_err(|e| fetch(format!("{e:#}")))?;
        decode_image(&bytes).map_err(|e| LoadFailure::Decode {
            locator: locator.to_owned(),
            reason: format!("{e:#}"),
        })
    }
}

/// Normalize a relative locator: forward slashes, no empty or `.` segments, no `..`.
pub(crate) fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("asset locators must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("asset locator must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation("asset locators must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation(
            "asset locator must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Expand a numbered pattern into `count` locators starting at `first`.
///
/// The pattern holds one `{n}` placeholder, optionally zero-padded as `{n:04}`:
/// `images/{n:04}.jpg` yields `images/0001.jpg`, `images/0002.jpg`, ...
pub fn numbered_locators(pattern: &str, first: u32, count: u32) -> ReelResult<Vec<String>> {
    let open = pattern
        .find("{n")
        .ok_or_else(|| ReelError::validation(format!("pattern '{pattern}' has no {{n}} placeholder")))?;
    let close = pattern[open..]
        .find('}')
        .map(|i| open + i)
        .ok_or_else(|| ReelError::validation(format!("unterminated placeholder in '{pattern}'")))?;
    let fmt = &pattern[open + 2..close];
    let width = match fmt {
        "" => 0,
        _ => fmt
            .strip_prefix(":0")
            .and_then(|w| w.parse::<usize>().ok())
            .ok_or_else(|| {
                ReelError::validation(format!(
                    "placeholder in '{pattern}' must be {{n}} or {{n:0W}}"
                ))
            })?,
    };
    if pattern[close + 1..].contains("{n") {
        return Err(ReelError::validation(format!(
            "pattern '{pattern}' has more than one placeholder"
        )));
    }

    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    let last = first
        .checked_add(count)
        .ok_or_else(|| ReelError::validation("frame numbering overflows u32"))?;
    Ok((first..last)
        .map(|n| format!("{head}{n:0width$}{tail}"))
        .collect())
}

/// Outcome of a bulk load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Locators requested.
    pub requested: usize,
    /// Images decoded successfully.
    pub loaded: usize,
    /// Failures in request order.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// `true` when at least one image loaded.
    pub fn any_loaded(&self) -> bool {
        self.loaded > 0
    }
}

/// Fetch every locator concurrently and wait for all of them.
///
/// Successful images are returned in request order with failures removed, so the result has
/// no gaps. `threads` overrides the worker count; `None` uses rayon defaults.
#[tracing::instrument(skip(loader, locators), fields(requested = locators.len()))]
pub fn load_all(
    loader: &dyn AssetLoader,
    locators: &[String],
    threads: Option<usize>,
) -> ReelResult<(Vec<DecodedImage>, LoadReport)> {
    let pool = build_thread_pool(threads)?;
    let results: Vec<Result<DecodedImage, LoadFailure>> =
        pool.install(|| locators.par_iter().map(|l| loader.fetch_image(l)).collect());

    let mut images = Vec::with_capacity(results.len());
    let mut report = LoadReport {
        requested: locators.len(),
        ..LoadReport::default()
    };
    for r in results {
        match r {
            Ok(img) => images.push(img),
            Err(failure) => {
                tracing::warn!(%failure, "frame asset excluded");
                report.failures.push(failure);
            }
        }
    }
    report.loaded = images.len();
    tracing::info!(
        loaded = report.loaded,
        failed = report.failures.len(),
        "frame assets loaded"
    );
    Ok((images, report))
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "load 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to build load thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/player/loader.rs"]
mod tests;
