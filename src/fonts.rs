//! # Font Resolution Module
//!
//! Resolves a usable text-rendering font from an ordered preference list of
//! TrueType files, falling back to a built-in 5x7 bitmap font when none of
//! the candidates can be loaded. Rendering never hard-fails because a font
//! file is missing.

use log::{info, warn};
use rusttype::Font;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Font files probed in order of preference.
const FONT_CANDIDATES: [&str; 5] = [
    "Montserrat-Light.ttf",
    "Montserrat-Regular.ttf",
    "Montserrat.ttf",
    "Poppins-Light.ttf",
    "segoeui.ttf",
];

/// Pixel scale applied to the 5x7 builtin glyphs. Fixed: the builtin font
/// ignores the requested size.
pub const BUILTIN_SCALE: u32 = 6;

/// Horizontal advance of a builtin glyph cell (5 columns plus 1 of spacing).
pub const BUILTIN_ADVANCE: u32 = 6 * BUILTIN_SCALE;

/// A resolved font ready for glyph rasterization.
#[derive(Clone)]
pub enum FontHandle {
    /// A parsed TrueType font at the requested pixel size.
    Truetype {
        font: Arc<Font<'static>>,
        size_px: f32,
    },
    /// The built-in bitmap font, fixed size.
    Builtin,
}

impl FontHandle {
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontHandle::Builtin)
    }
}

/// Resolves fonts from the filesystem with a per-size cache.
///
/// The cache is written at most once per size and protected by a mutex, so
/// concurrent renders may share one resolver.
pub struct FontResolver {
    search_dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<u32, FontHandle>>,
}

impl FontResolver {
    /// Resolver probing the working directory, `fonts/` and, when set, the
    /// directory named by the `FONTS_DIR` environment variable.
    pub fn new() -> Self {
        let mut dirs = vec![PathBuf::from("."), PathBuf::from("fonts")];
        if let Ok(extra) = std::env::var("FONTS_DIR") {
            dirs.push(PathBuf::from(extra));
        }
        Self::with_search_dirs(dirs)
    }

    /// Resolver restricted to an explicit set of directories.
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Return the first candidate font that loads at `size_px`, or the
    /// builtin bitmap font when every candidate fails. Never errors.
    pub fn resolve(&self, size_px: f32) -> FontHandle {
        let key = size_px.to_bits();
        if let Some(handle) = self.cache.lock().unwrap().get(&key) {
            return handle.clone();
        }

        let handle = self.probe_candidates(size_px);
        self.cache.lock().unwrap().insert(key, handle.clone());
        handle
    }

    fn probe_candidates(&self, size_px: f32) -> FontHandle {
        for name in FONT_CANDIDATES {
            for dir in &self.search_dirs {
                let path = dir.join(name);
                let Ok(bytes) = std::fs::read(&path) else {
                    continue;
                };
                match Font::try_from_vec(bytes) {
                    Some(font) => {
                        info!("Loaded font {} at {size_px}px", path.display());
                        return FontHandle::Truetype {
                            font: Arc::new(font),
                            size_px,
                        };
                    }
                    None => {
                        warn!("Failed to parse font file {}", path.display());
                    }
                }
            }
        }
        warn!("No candidate font available, using builtin bitmap font");
        FontHandle::Builtin
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Column bitmap for a printable ASCII character in the builtin 5x7 font.
/// Bytes are columns, least significant bit is the top row. Characters
/// outside 0x20..=0x7E render as blank cells.
pub fn builtin_glyph(c: char) -> [u8; 5] {
    let code = c as u32;
    if !(0x20..=0x7E).contains(&code) {
        return [0; 5];
    }
    BUILTIN_GLYPHS[(code - 0x20) as usize]
}

#[rustfmt::skip]
const BUILTIN_GLYPHS: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x00, 0x08, 0x14, 0x22, 0x41], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x41, 0x22, 0x14, 0x08, 0x00], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x01, 0x01], // 'F'
    [0x3E, 0x41, 0x41, 0x51, 0x32], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x08, 0x2A, 0x1C, 0x08], // '~'
];
