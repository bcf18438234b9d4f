//! Screenshot bookkeeping plus comparison and annotation utilities.
//!
//! Nothing here is allowed to abort the caller: every public operation logs
//! its failure and returns `None`/`false`.

pub mod font;

use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::{DebuggerConfig, ScreenshotFormat};
use crate::error::{DebuggerError, DebuggerResult};
use crate::storage::{glob_files, remove_older_than, retention_cutoff};

/// Known image viewers and the command line each one is launched with.
pub const VIEWERS: &[(&str, &[&str])] = &[
    ("eog", &["eog"]),
    ("feh", &["feh", "--scale-down", "--auto-zoom"]),
    ("gpicview", &["gpicview"]),
    ("nomacs", &["nomacs"]),
    ("gthumb", &["gthumb"]),
];

const DEFAULT_VIEWER: &str = "eog";

const LABEL_X: u32 = 10;
const LABEL_Y: u32 = 10;
const LABEL_SPACING: u32 = 30;
const LABEL_PADDING: u32 = 5;
const LABEL_SCALE: u32 = 2;
/// Opacity of the box drawn behind a label, out of 255.
const LABEL_BOX_ALPHA: u32 = 180;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenshotMetadata {
    pub filepath: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    pub session_id: String,
    pub width: u32,
    pub height: u32,
    pub size_kb: u64,
    pub sha256: String,
    pub annotations: Vec<String>,
}

/// One line of [`ScreenshotManager::summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotRow {
    pub filename: String,
    pub size: String,
    pub dimensions: String,
}

pub struct ScreenshotManager {
    session_id: String,
    app_name: String,
    screenshots_dir: PathBuf,
    format: ScreenshotFormat,
    auto_open: bool,
    retention_days: u64,
    viewer: Option<String>,
    screenshots: Vec<ScreenshotMetadata>,
}

impl ScreenshotManager {
    pub fn new(
        session_id: impl Into<String>,
        app_name: impl Into<String>,
        config: &DebuggerConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            app_name: app_name.into(),
            screenshots_dir: config.screenshots_dir.clone(),
            format: config.screenshot_format,
            auto_open: config.auto_open_screenshots,
            retention_days: config.session_retention_days,
            viewer: resolve_viewer(&config.screenshot_viewer, on_path),
            screenshots: Vec::new(),
        }
    }

    /// The viewer `open` will launch, if any is installed.
    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    /// `<dir>/<name>` or `<dir>/<app>_<timestamp><suffix>.<ext>`.
    pub fn screenshot_path(&self, name: Option<&str>, suffix: &str) -> PathBuf {
        let ext = self.format.extension();
        let file = match name {
            Some(n) if Path::new(n).extension().is_some() => n.to_string(),
            Some(n) => format!("{}{}.{}", n, suffix, ext),
            None => format!(
                "{}_{}{}.{}",
                self.app_name,
                Utc::now().format("%Y%m%d_%H%M%S"),
                suffix,
                ext
            ),
        };
        self.screenshots_dir.join(file)
    }

    /// Read dimensions, size and digest of `path` and track it.
    pub fn record(&mut self, path: &Path) -> Option<ScreenshotMetadata> {
        match self.read_metadata(path) {
            Ok(meta) => {
                self.screenshots.push(meta.clone());
                Some(meta)
            }
            Err(e) => {
                error!("Failed to read screenshot metadata for {:?}: {}", path, e);
                None
            }
        }
    }

    /// Open `path` in the image viewer. Does nothing unless auto-open is on.
    ///
    /// With `background` the viewer is detached; otherwise this waits until
    /// the viewer exits.
    pub async fn open(&self, path: &Path, background: bool) -> bool {
        if !self.auto_open {
            return false;
        }
        if !path.exists() {
            error!("Screenshot not found: {:?}", path);
            return false;
        }
        let Some(ref viewer) = self.viewer else {
            error!("No image viewer available");
            return false;
        };
        let argv = viewer_command(viewer);
        let mut cmd = Command::new(argv[0]);
        cmd.args(&argv[1..]).arg(path);

        let outcome = if background {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map(|_| ())
        } else {
            match cmd.status().await {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(std::io::Error::other(format!(
                    "viewer exited with {}",
                    status
                ))),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                info!("Opened screenshot with {}: {:?}", viewer, path.file_name());
                true
            }
            Err(e) => {
                error!("Failed to open screenshot with {}: {}", viewer, e);
                false
            }
        }
    }

    /// Draw each label in a dark box down the top-left corner.
    pub fn annotate(
        &mut self,
        path: &Path,
        labels: &[String],
        output: Option<&Path>,
    ) -> Option<PathBuf> {
        if !path.exists() {
            error!("Screenshot not found: {:?}", path);
            return None;
        }
        let output = match output {
            Some(p) => p.to_path_buf(),
            None => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.app_name.clone());
                self.screenshot_path(Some(&stem), "_annotated")
            }
        };

        match annotate_image(path, labels, &output) {
            Ok(()) => {
                info!("Annotated screenshot saved: {:?}", output);
                if self.record(&output).is_some() {
                    if let Some(last) = self.screenshots.last_mut() {
                        last.annotations = labels.to_vec();
                    }
                }
                Some(output)
            }
            Err(e) => {
                error!("Failed to annotate {:?}: {}", path, e);
                None
            }
        }
    }

    /// Side-by-side image of `first` and `second` at a common height.
    pub fn compare(&self, first: &Path, second: &Path, output: Option<&Path>) -> Option<PathBuf> {
        if !first.exists() || !second.exists() {
            error!("Cannot compare: {:?} or {:?} not found", first, second);
            return None;
        }
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.screenshot_path(None, "_comparison"));

        match compare_images(first, second, &output) {
            Ok(()) => {
                info!("Comparison saved: {:?}", output);
                Some(output)
            }
            Err(e) => {
                error!("Failed to compare screenshots: {}", e);
                None
            }
        }
    }

    pub fn all(&self) -> &[ScreenshotMetadata] {
        &self.screenshots
    }

    pub fn latest(&self) -> Option<&ScreenshotMetadata> {
        self.screenshots.last()
    }

    /// Delete image files older than `days` (default: the retention period).
    pub fn cleanup_old(&self, days: Option<u64>) -> usize {
        let days = days.unwrap_or(self.retention_days);
        let cutoff = retention_cutoff(days);

        let mut removed = 0;
        for pattern in ["*.png", "*.jpg", "*.jpeg"] {
            match glob_files(&self.screenshots_dir, pattern) {
                Ok(paths) => removed += remove_older_than(paths, cutoff),
                Err(e) => warn!("Skipping {} during cleanup: {}", pattern, e),
            }
        }
        if removed > 0 {
            info!("Removed {} old screenshots", removed);
        }
        removed
    }

    pub fn summary(&self) -> Vec<ScreenshotRow> {
        self.screenshots
            .iter()
            .map(|s| ScreenshotRow {
                filename: s
                    .filepath
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                size: format!("{} KB", s.size_kb),
                dimensions: format!("{}x{}", s.width, s.height),
            })
            .collect()
    }

    pub fn log_summary(&self) {
        if self.screenshots.is_empty() {
            info!("No screenshots captured");
            return;
        }
        let short_id: String = self.session_id.chars().take(8).collect();
        info!("Screenshots for session {}:", short_id);
        for row in self.summary() {
            info!("  {}  {}  {}", row.filename, row.size, row.dimensions);
        }
    }

    fn read_metadata(&self, path: &Path) -> DebuggerResult<ScreenshotMetadata> {
        let (width, height) = image::image_dimensions(path)?;
        let bytes = std::fs::read(path)?;
        Ok(ScreenshotMetadata {
            filepath: path.to_path_buf(),
            timestamp: Utc::now(),
            app_name: self.app_name.clone(),
            session_id: self.session_id.clone(),
            width,
            height,
            size_kb: bytes.len() as u64 / 1024,
            sha256: hash_bytes(&bytes),
            annotations: Vec::new(),
        })
    }
}

/// Pick the configured viewer, or the first installed alternative.
///
/// Unknown names fall back to `eog` without checking the PATH.
pub fn resolve_viewer<F>(configured: &str, installed: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let Some((name, argv)) = VIEWERS.iter().find(|(name, _)| *name == configured) else {
        warn!("Unrecognized viewer '{}', using '{}'", configured, DEFAULT_VIEWER);
        return Some(DEFAULT_VIEWER.to_string());
    };
    if installed(argv[0]) {
        return Some(name.to_string());
    }

    warn!("Viewer '{}' is not installed, looking for an alternative", configured);
    match VIEWERS.iter().find(|(_, argv)| installed(argv[0])) {
        Some((alt, _)) => {
            info!("Using alternative viewer: {}", alt);
            Some(alt.to_string())
        }
        None => {
            error!("No image viewer found");
            None
        }
    }
}

fn viewer_command(viewer: &str) -> &'static [&'static str] {
    VIEWERS
        .iter()
        .find(|(name, _)| *name == viewer)
        .map(|(_, argv)| *argv)
        .unwrap_or(&["eog"])
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn annotate_image(path: &Path, labels: &[String], output: &Path) -> DebuggerResult<()> {
    let mut img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();

    for (i, label) in labels.iter().enumerate() {
        let y = LABEL_Y + LABEL_SPACING * i as u32;
        let (text_w, text_h) = font::text_size(label, LABEL_SCALE);

        let x0 = LABEL_X.saturating_sub(LABEL_PADDING);
        let y0 = y.saturating_sub(LABEL_PADDING);
        let x1 = (LABEL_X + text_w + LABEL_PADDING).min(width);
        let y1 = (y + text_h + LABEL_PADDING).min(height);
        for py in y0..y1 {
            for px in x0..x1 {
                let Rgb([r, g, b]) = *img.get_pixel(px, py);
                img.put_pixel(px, py, Rgb([darken(r), darken(g), darken(b)]));
            }
        }

        font::draw_text(&mut img, LABEL_X, y, label, LABEL_SCALE, Rgb([255, 255, 255]));
    }

    save_image(&img, output)
}

fn darken(channel: u8) -> u8 {
    (channel as u32 * (255 - LABEL_BOX_ALPHA) / 255) as u8
}

fn compare_images(first: &Path, second: &Path, output: &Path) -> DebuggerResult<()> {
    let mut left = image::open(first)?.to_rgb8();
    let mut right = image::open(second)?.to_rgb8();

    if left.height() != right.height() {
        let target = left.height().max(right.height());
        left = resize_to_height(&left, target);
        right = resize_to_height(&right, target);
    }

    let mut combined = RgbImage::new(left.width() + right.width(), left.height());
    imageops::replace(&mut combined, &left, 0, 0);
    imageops::replace(&mut combined, &right, left.width() as i64, 0);
    save_image(&combined, output)
}

fn resize_to_height(img: &RgbImage, height: u32) -> RgbImage {
    if img.height() == 0 {
        return RgbImage::new(0, height);
    }
    let width = (img.width() as u64 * height as u64 / img.height() as u64) as u32;
    imageops::resize(img, width.max(1), height, FilterType::Triangle)
}

fn save_image(img: &RgbImage, output: &Path) -> DebuggerResult<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if img.width() == 0 || img.height() == 0 {
        return Err(DebuggerError::InvalidConfig(format!(
            "refusing to write empty image {:?}",
            output
        )));
    }
    img.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_viewer_prefers_configured() {
        assert_eq!(resolve_viewer("feh", |_| true).as_deref(), Some("feh"));
    }

    #[test]
    fn test_resolve_viewer_falls_back_to_installed() {
        let viewer = resolve_viewer("eog", |cmd| cmd == "gthumb");
        assert_eq!(viewer.as_deref(), Some("gthumb"));
    }

    #[test]
    fn test_resolve_viewer_unknown_and_none() {
        assert_eq!(resolve_viewer("paint", |_| false).as_deref(), Some("eog"));
        assert_eq!(resolve_viewer("eog", |_| false), None);
    }

    #[test]
    fn test_viewer_command() {
        assert_eq!(viewer_command("feh"), &["feh", "--scale-down", "--auto-zoom"]);
        assert_eq!(viewer_command("unknown"), &["eog"]);
    }

    #[test]
    fn test_darken() {
        assert_eq!(darken(0), 0);
        assert_eq!(darken(255), 75);
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let img = RgbImage::new(40, 20);
        let resized = resize_to_height(&img, 40);
        assert_eq!(resized.dimensions(), (80, 40));
    }
}
