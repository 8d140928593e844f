//! Stage names, asset filenames, and asset filename safety rules.
//!
//! Every downloaded model lands in a single flat directory as
//! `{job_id}_{stage}.{ext}`. Filenames arriving from clients are checked
//! here before they are ever joined onto the asset root.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Model format fetched from the generation service.
pub const MODEL_EXTENSION: &str = "glb";

/// MIME type for binary glTF.
pub const CONTENT_TYPE_GLB: &str = "model/gltf-binary";

/// Fallback MIME type for anything else in the asset root.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Longest filename accepted from a client.
pub const MAX_ASSET_FILENAME_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One of the two sequential generation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Fast, low-fidelity first pass.
    Preview,
    /// Slower, high-fidelity pass built from the preview.
    Refined,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Preview => "preview",
            Stage::Refined => "refined",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filenames
// ---------------------------------------------------------------------------

/// Deterministic local filename for a job's stage output.
pub fn asset_filename(job_id: &str, stage: Stage) -> String {
    format!("{job_id}_{}.{MODEL_EXTENSION}", stage.as_str())
}

/// Reject any client-supplied filename that could escape the asset root.
///
/// The name must be exactly one normal path component: no separators of
/// either flavour, no `..`, no NUL, no leading dot, nothing empty.
pub fn validate_asset_filename(filename: &str) -> Result<(), CoreError> {
    let reject = |reason: &str| {
        Err(CoreError::Validation(format!(
            "Invalid asset filename: {reason}"
        )))
    };

    if filename.is_empty() {
        return reject("empty");
    }
    if filename.len() > MAX_ASSET_FILENAME_LEN {
        return reject("too long");
    }
    if filename.contains("..") {
        return reject("contains '..'");
    }
    if filename.contains(['/', '\\']) {
        return reject("contains a path separator");
    }
    if filename.contains('\0') {
        return reject("contains NUL");
    }
    if filename.starts_with('.') {
        return reject("hidden files are not served");
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => reject("not a plain file name"),
    }
}

/// Content type for a served asset, chosen by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let is_glb = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION));

    if is_glb {
        CONTENT_TYPE_GLB
    } else {
        CONTENT_TYPE_OCTET_STREAM
    }
}
