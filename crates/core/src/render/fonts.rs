//! Runtime font registration for the bitmap backend.
//!
//! Text is rasterized with ab_glyph, which only knows fonts registered by
//! name. The first readable font from the configured list is registered as
//! `sans-serif` (normal and bold) once per process.
//!
//! Registered font data must be `'static`, so accepted bytes are leaked. Files
//! without a TrueType/OpenType signature are rejected before that point; a file
//! that passes the signature check but fails to parse is still leaked, at most
//! once per configured path since registration runs only once.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

pub const FAMILY: &str = "sans-serif";

/// sfnt version tags of TrueType, OpenType/CFF and font collections
const FONT_SIGNATURES: [&[u8; 4]; 4] = [b"\x00\x01\x00\x00", b"OTTO", b"true", b"ttcf"];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register a font if none is registered yet; returns whether text can be drawn
pub fn ensure_registered(candidates: &[PathBuf]) -> bool {
    REGISTERED
        .get_or_init(|| {
            let found = candidates.iter().find_map(|path| try_register(path));
            if found.is_none() {
                tracing::warn!("no usable font found, labels and panels will be omitted");
            }
            found
        })
        .is_some()
}

/// Whether `bytes` start with a known font file signature
fn looks_like_font(bytes: &[u8]) -> bool {
    bytes
        .get(..4)
        .is_some_and(|head| FONT_SIGNATURES.iter().any(|sig| head == sig.as_slice()))
}

fn try_register(path: &Path) -> Option<PathBuf> {
    let bytes = std::fs::read(path).ok()?;
    if !looks_like_font(&bytes) {
        tracing::debug!(path = %path.display(), "not a font file");
        return None;
    }
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

    for style in [FontStyle::Normal, FontStyle::Bold] {
        // The ab_glyph error type carries no Debug or Display impl
        if register_font(FAMILY, style, bytes).is_err() {
            tracing::debug!(path = %path.display(), "font rejected");
            return None;
        }
    }
    tracing::debug!(path = %path.display(), "registered font");
    Some(path.to_path_buf())
}
