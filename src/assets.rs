//! Asynchronous asset loading
//!
//! Fonts are read and parsed on a background thread. The result comes back
//! through a oneshot channel wrapped in [`FontLoad`], which is a `Future` and
//! can also be polled without blocking from the render loop. When the
//! requested font cannot be loaded, common system font locations are tried
//! before giving up.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use log::{debug, warn};
use thiserror::Error;

use crate::gfx::geometry::text::build_text_geometry;
use crate::gfx::scene::{TextMesh, TextSpec};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a usable font: {reason}")]
    InvalidFont { path: PathBuf, reason: String },
    #[error("asset load was cancelled before completing")]
    Cancelled,
}

/// Fonts tried when the requested one cannot be loaded
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

/// [`SYSTEM_FONT_PATHS`] as owned paths
pub fn system_fonts() -> Vec<PathBuf> {
    SYSTEM_FONT_PATHS.iter().map(PathBuf::from).collect()
}

/// Reads and parses a font file
pub fn read_font(path: &Path) -> Result<fontdue::Font, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(|reason| {
        AssetError::InvalidFont {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    })
}

/// Reads `path`, or the first of `fallbacks` that loads
///
/// The error of the requested font is returned when nothing loads.
pub fn read_first_font(path: &Path, fallbacks: &[PathBuf]) -> Result<fontdue::Font, AssetError> {
    let requested = match read_font(path) {
        Ok(font) => return Ok(font),
        Err(e) => e,
    };

    for candidate in fallbacks {
        match read_font(candidate) {
            Ok(font) => {
                warn!("{}; using {} instead", requested, candidate.display());
                return Ok(font);
            }
            Err(e) => debug!("Fallback font skipped: {}", e),
        }
    }

    Err(requested)
}

/// Starts loading a font on a background thread
pub fn load_font(path: PathBuf, fallbacks: Vec<PathBuf>) -> FontLoad {
    let (sender, receiver) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("font-loader".to_owned())
        .spawn(move || {
            let result = read_first_font(&path, &fallbacks);
            // The receiver may already be gone if the viewer shut down
            let _ = sender.send(result);
        });

    if let Err(e) = spawned {
        // Dropping the sender resolves the load as cancelled
        warn!("Could not spawn font loader thread: {}", e);
    }

    FontLoad {
        receiver,
        finished: false,
    }
}

/// In-flight font load
pub struct FontLoad {
    receiver: oneshot::Receiver<Result<fontdue::Font, AssetError>>,
    finished: bool,
}

impl FontLoad {
    /// Returns the result once the load has finished, without blocking
    ///
    /// Yields `Some` at most once.
    pub fn try_take(&mut self) -> Option<Result<fontdue::Font, AssetError>> {
        if self.finished {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(None) => return None,
            Ok(Some(result)) => result,
            Err(oneshot::Canceled) => Err(AssetError::Cancelled),
        };
        self.finished = true;
        Some(outcome)
    }
}

impl fmt::Debug for FontLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLoad")
            .field("finished", &self.finished)
            .finish()
    }
}

impl Future for FontLoad {
    type Output = Result<fontdue::Font, AssetError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                self.finished = true;
                Poll::Ready(result.unwrap_or(Err(AssetError::Cancelled)))
            }
        }
    }
}

/// Text waiting for its font
#[derive(Debug)]
pub struct PendingText {
    spec: TextSpec,
    load: FontLoad,
}

impl PendingText {
    pub fn new(spec: TextSpec, load: FontLoad) -> Self {
        Self { spec, load }
    }

    /// Builds the text mesh once the font is available
    pub fn poll(&mut self) -> Option<Result<TextMesh, AssetError>> {
        let font = match self.load.try_take()? {
            Ok(font) => font,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(self.build(&font)))
    }

    /// Waits for the font and builds the text mesh
    pub async fn resolve(self) -> Result<TextMesh, AssetError> {
        let PendingText { spec, load } = self;
        let font = load.await?;
        Ok(PendingText::build_with(&spec, &font))
    }

    fn build(&self, font: &fontdue::Font) -> TextMesh {
        PendingText::build_with(&self.spec, font)
    }

    fn build_with(spec: &TextSpec, font: &fontdue::Font) -> TextMesh {
        let geometry = build_text_geometry(font, &spec.value, &spec.params);
        debug!(
            "Built text mesh for {:?}: {} vertices, {} triangles",
            spec.value,
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        TextMesh {
            value: spec.value.clone(),
            geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::TextParams;
    use futures::executor::block_on;

    fn missing() -> PathBuf {
        PathBuf::from("assets/fonts/definitely-missing.ttf")
    }

    fn system_font() -> Option<PathBuf> {
        system_fonts().into_iter().find(|path| path.exists())
    }

    fn wait(load: &mut FontLoad) -> Result<fontdue::Font, AssetError> {
        loop {
            if let Some(result) = load.try_take() {
                return result;
            }
            std::thread::yield_now();
        }
    }

    #[test]
    fn test_missing_font_is_io_error() {
        let result = block_on(load_font(missing(), Vec::new()));
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }

    #[test]
    fn test_try_take_yields_once() {
        let mut load = load_font(missing(), Vec::new());
        assert!(wait(&mut load).is_err());
        assert!(load.try_take().is_none());
    }

    #[test]
    fn test_garbage_bytes_are_invalid_font() {
        let path = std::env::temp_dir().join(format!("orbitscape-bad-font-{}.ttf", std::process::id()));
        std::fs::write(&path, b"not a font").unwrap();

        let result = read_font(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(AssetError::InvalidFont { .. })));
    }

    #[test]
    fn test_pending_text_reports_failure() {
        let spec = TextSpec {
            value: "Hello world".to_owned(),
            font_path: missing(),
            fallback_fonts: Vec::new(),
            params: TextParams::default(),
        };
        let pending = PendingText::new(spec.clone(), load_font(spec.font_path.clone(), Vec::new()));

        assert!(block_on(pending.resolve()).is_err());
    }

    #[test]
    fn test_unusable_fallbacks_keep_requested_error() {
        let fallbacks = vec![PathBuf::from("assets/fonts/also-missing.otf")];
        let result = read_first_font(&missing(), &fallbacks);
        match result {
            Err(AssetError::Io { path, .. }) => assert_eq!(path, missing()),
            other => panic!("expected the requested font's error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_font_falls_back_to_system_font() {
        let Some(font) = system_font() else {
            eprintln!("no system font found, skipping");
            return;
        };
        let fallbacks = vec![PathBuf::from("assets/fonts/also-missing.otf"), font];

        let result = block_on(load_font(missing(), fallbacks));

        assert!(result.is_ok());
    }

    #[test]
    fn test_pending_text_builds_mesh_from_fallback() {
        let Some(font) = system_font() else {
            eprintln!("no system font found, skipping");
            return;
        };
        let spec = TextSpec {
            value: "Hi".to_owned(),
            font_path: missing(),
            fallback_fonts: vec![font],
            params: TextParams::default(),
        };
        let load = load_font(spec.font_path.clone(), spec.fallback_fonts.clone());

        let mesh = block_on(PendingText::new(spec, load).resolve()).unwrap();

        assert_eq!(mesh.value, "Hi");
        assert!(mesh.geometry.triangle_count() > 0);
    }
}
