// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Image attachment lifecycle for the field under edit (UI-agnostic).

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

/// MIME types the API accepts for field images.
pub const ACCEPTED_MIME: [&str; 2] = ["image/png", "image/jpeg"];

/// Extensions offered by the file picker.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Local image file chosen by the operator as a replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedImage {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub size: u64,
}

impl SelectedImage {
    /// Inspect a picked file and accept it only when it is a PNG or JPEG.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported types or unreadable files.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        if !ACCEPTED_MIME.contains(&mime.as_str()) {
            return Err(anyhow!(
                "Unsupported image type '{mime}'. Please choose a PNG or JPEG file."
            ));
        }
        let size = path
            .metadata()
            .map_err(|err| anyhow!("Cannot read {}: {err}", path.display()))?
            .len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
            size,
        })
    }
}

/// Which image the field has, from the operator's point of view.
///
/// `P` is the decoded preview handle, owned by whichever layer renders it.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageState<P> {
    /// No remote image and nothing selected.
    Empty,
    /// Remote image present, untouched.
    Existing { url: String },
    /// A local file replaces whatever the field had.
    Replacing {
        file: SelectedImage,
        /// Filled once the asynchronous decode finishes.
        preview: Option<P>,
        /// Remote image still tracked underneath the selection.
        existing: Option<String>,
    },
    /// The operator cleared the remote image without choosing another.
    Removed,
}

impl<P> Default for ImageState<P> {
    fn default() -> Self {
        ImageState::Empty
    }
}

/// What the image panel should show.
#[derive(Debug, PartialEq)]
pub enum ImageDisplay<'a, P> {
    Preview(&'a P),
    Remote(&'a str),
    Placeholder,
}

impl<P> ImageState<P> {
    /// Initial state from the loaded field.
    pub fn from_remote(url: Option<String>) -> Self {
        match url.filter(|u| !u.is_empty()) {
            Some(url) => ImageState::Existing { url },
            None => ImageState::Empty,
        }
    }

    /// Apply a picker result. `None` means the selection was cancelled.
    ///
    /// Returns `true` when a new file was taken and a preview should be decoded.
    pub fn select(&mut self, file: Option<SelectedImage>) -> bool {
        let previous = std::mem::take(self);
        let (next, started) = match (previous, file) {
            (state, Some(file)) => {
                let existing = state.tracked_url().map(str::to_string);
                (
                    ImageState::Replacing {
                        file,
                        preview: None,
                        existing,
                    },
                    true,
                )
            }
            (ImageState::Replacing { existing, .. }, None) => {
                (ImageState::from_remote(existing), false)
            }
            (state, None) => (state, false),
        };
        *self = next;
        started
    }

    /// Drop any selection and mark the tracked remote image for deletion. Idempotent.
    pub fn remove(&mut self) {
        *self = match std::mem::take(self) {
            ImageState::Existing { .. } => ImageState::Removed,
            ImageState::Replacing {
                existing: Some(_), ..
            } => ImageState::Removed,
            ImageState::Replacing { existing: None, .. } => ImageState::Empty,
            other => other,
        };
    }

    /// Store a decoded preview if it still belongs to the selected file.
    ///
    /// Returns `false` when the preview is stale and was discarded.
    pub fn attach_preview(&mut self, path: &Path, decoded: P) -> bool {
        match self {
            ImageState::Replacing { file, preview, .. } if file.path == path => {
                *preview = Some(decoded);
                true
            }
            _ => false,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedImage> {
        match self {
            ImageState::Replacing { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&P> {
        match self {
            ImageState::Replacing { preview, .. } => preview.as_ref(),
            _ => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, ImageState::Removed)
    }

    /// Remote URL still offered to the operator.
    pub fn tracked_url(&self) -> Option<&str> {
        match self {
            ImageState::Existing { url } => Some(url),
            ImageState::Replacing { existing, .. } => existing.as_deref(),
            _ => None,
        }
    }

    /// Preview first, then the remote image, then the placeholder.
    pub fn display(&self) -> ImageDisplay<'_, P> {
        if let Some(preview) = self.preview() {
            return ImageDisplay::Preview(preview);
        }
        match self.tracked_url() {
            Some(url) => ImageDisplay::Remote(url),
            None => ImageDisplay::Placeholder,
        }
    }
}
