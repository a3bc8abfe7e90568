//! # Template Store Module
//!
//! Loads the two receipt background images once at startup and hands out
//! read-only references. A failed load is fatal: without templates no
//! receipt can be generated, so the process must not accept requests.

use image::RgbaImage;
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::layout::LayoutVariant;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load template for {variant} from {path}: {reason}")]
    Load {
        variant: &'static str,
        path: PathBuf,
        reason: String,
    },
    #[error("no template registered for {0} variant")]
    Missing(&'static str),
}

/// In-memory store of the background rasters, one per layout variant.
///
/// The stored images are never mutated: every render works on a clone, so
/// concurrent renders cannot interfere.
#[derive(Debug)]
pub struct TemplateStore {
    templates: HashMap<LayoutVariant, RgbaImage>,
}

impl TemplateStore {
    /// Decode every background image up front. Any failure aborts startup.
    pub fn load(paths: &HashMap<LayoutVariant, PathBuf>) -> Result<Self, TemplateError> {
        let mut templates = HashMap::new();
        for (&variant, path) in paths {
            let img = Self::load_one(variant, path)?;
            info!(
                "Loaded {} template from {} ({}x{})",
                variant.label(),
                path.display(),
                img.width(),
                img.height()
            );
            templates.insert(variant, img);
        }
        Ok(Self { templates })
    }

    fn load_one(variant: LayoutVariant, path: &Path) -> Result<RgbaImage, TemplateError> {
        let img = image::open(path).map_err(|e| TemplateError::Load {
            variant: variant.label(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(img.to_rgba8())
    }

    /// Read-only handle to the stored background for a variant.
    pub fn template(&self, variant: LayoutVariant) -> Result<&RgbaImage, TemplateError> {
        self.templates
            .get(&variant)
            .ok_or(TemplateError::Missing(variant.label()))
    }
}
