//! Runtime font registration for plot labels
//!
//! plotters' `ab_glyph` backend has no system font lookup, so a TrueType
//! file is registered under the `sans-serif` family once per process.
//! Without a usable font the diagram is drawn without text.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ab_glyph::FontRef;
use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

pub const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register a font on first use. Returns whether labels can be drawn.
///
/// The configured path is tried before the system candidates; whichever
/// registers first is kept for the life of the process.
pub fn ensure_registered(configured: Option<&Path>) -> bool {
    REGISTERED
        .get_or_init(|| {
            let candidates = configured
                .map(Path::to_path_buf)
                .into_iter()
                .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
            for path in candidates {
                if try_register(&path) {
                    debug!(font = %path.display(), "Registered plot font");
                    return Some(path);
                }
            }
            warn!("No usable TrueType font found, plots are rendered without labels");
            None
        })
        .is_some()
}

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    if FontRef::try_from_slice(&bytes).is_err() {
        warn!(font = %path.display(), "Not a usable TrueType font");
        return false;
    }
    // plotters keeps registered fonts for the whole process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FAMILY, FontStyle::Normal, bytes).is_ok()
}
