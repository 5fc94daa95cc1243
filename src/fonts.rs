//! TrueType font discovery for plotters' `ab_glyph` text renderer.
//!
//! plotters draws no text until a face is registered for the family it is
//! asked for, so fonts are looked up on disk and registered as `sans-serif`
//! once per process.

use anyhow::{Context, Result, anyhow, bail};
use plotters::style::{FontStyle, register_font};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Regular face registered so far. Held locked while registering.
static REGISTERED: Mutex<Option<PathBuf>> = Mutex::new(None);

/// First existing regular face: `explicit` if given, else a system default.
pub fn find_font(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }
    first_existing(REGULAR_CANDIDATES)
}

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(PathBuf::from).find(|p| p.is_file())
}

/// Registers a regular and a bold `sans-serif` face, returning the regular
/// face's path. Later calls return the first registration.
///
/// The bold face is looked up next to a user-supplied font first; if none is
/// found the regular face is used for both styles.
pub fn ensure_registered(explicit: Option<&Path>) -> Result<PathBuf> {
    let mut registered = REGISTERED
        .lock()
        .map_err(|_| anyhow!("font registration lock poisoned"))?;
    if let Some(path) = registered.as_ref() {
        return Ok(path.clone());
    }

    let Some(regular) = find_font(explicit) else {
        match explicit {
            Some(path) => bail!("font file {} does not exist", path.display()),
            None => bail!(
                "no TrueType font found in the usual system locations; \
                 pass --font <FILE> or set UNMIX_FONT_PATH"
            ),
        }
    };
    let bold = match explicit {
        Some(_) => sibling_bold(&regular),
        None => first_existing(BOLD_CANDIDATES),
    }
    .unwrap_or_else(|| regular.clone());

    register(&regular, FontStyle::Normal)?;
    register(&bold, FontStyle::Bold)?;
    info!(regular = %regular.display(), bold = %bold.display(), "Fonts registered");

    *registered = Some(regular.clone());
    Ok(regular)
}

/// `Foo.ttf` → `Foo-Bold.ttf`, if present.
fn sibling_bold(regular: &Path) -> Option<PathBuf> {
    let stem = regular.file_stem()?.to_str()?;
    let ext = regular.extension()?.to_str()?;
    let candidate = regular.with_file_name(format!("{stem}-Bold.{ext}"));
    candidate.is_file().then_some(candidate)
}

fn register(path: &Path, style: FontStyle) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Loading font");

    // plotters keeps a 'static reference for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font("sans-serif", style, bytes)
        .map_err(|_| anyhow!("{} is not a usable TrueType font", path.display()))
}
