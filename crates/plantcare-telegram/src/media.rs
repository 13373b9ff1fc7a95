// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo download and the screen image catalog.

use std::path::{Path, PathBuf};

use plantcare_config::model::AssetsConfig;
use plantcare_core::error::PlantcareError;
use plantcare_core::types::Media;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, InputFile, PhotoSize};
use tracing::debug;

/// Asset key of the placeholder image shown for plants without a photo.
pub const PLANT_PLACEHOLDER: &str = "plant";

/// Downloads a file from Telegram servers by its file metadata.
pub async fn download_file(bot: &Bot, file_meta: &FileMeta) -> Result<Vec<u8>, PlantcareError> {
    let file = bot
        .get_file(file_meta.id.clone())
        .await
        .map_err(|e| PlantcareError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| PlantcareError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %file_meta.id, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}

/// Telegram lists photo sizes smallest first; the last one is the original.
pub async fn download_largest_photo(
    bot: &Bot,
    photos: &[PhotoSize],
) -> Result<Vec<u8>, PlantcareError> {
    let largest = photos.last().ok_or_else(|| PlantcareError::Channel {
        message: "photo array is empty".into(),
        source: None,
    })?;
    download_file(bot, &largest.file).await
}

/// Maps screen asset keys to image files on disk.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    dir: Option<PathBuf>,
    plant_placeholder: Option<PathBuf>,
}

impl AssetCatalog {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            dir: config.dir.as_ref().map(PathBuf::from),
            plant_placeholder: config.default_plant_photo.as_ref().map(PathBuf::from),
        }
    }

    /// Image file for `key`, if one exists on disk.
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        if key == PLANT_PLACEHOLDER
            && let Some(path) = &self.plant_placeholder
            && path.is_file()
        {
            return Some(path.clone());
        }
        let path = self.dir.as_deref()?.join(format!("{key}.jpg"));
        path.is_file().then_some(path)
    }

    /// The upload for `media`, or `None` for a caption-only message.
    pub fn resolve(&self, media: &Media) -> Option<InputFile> {
        match media {
            Media::None => None,
            Media::Asset(key) => self.path_for(key).map(InputFile::file),
            Media::Photo(bytes) => Some(InputFile::memory(bytes.clone()).file_name("plant.jpg")),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_fall_back_to_caption_only() {
        let catalog = AssetCatalog::default();
        assert!(catalog.path_for("menu").is_none());
        assert!(catalog.resolve(&Media::Asset("menu")).is_none());
        assert!(catalog.resolve(&Media::None).is_none());
        assert!(catalog.resolve(&Media::Photo(vec![1, 2, 3])).is_some());
    }

    #[test]
    fn assets_resolve_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("menu.jpg"), b"jpeg").unwrap();
        let placeholder = dir.path().join("default.jpg");
        std::fs::write(&placeholder, b"jpeg").unwrap();

        let catalog = AssetCatalog::new(&AssetsConfig {
            dir: Some(dir.path().display().to_string()),
            default_plant_photo: Some(placeholder.display().to_string()),
        });
        assert_eq!(catalog.path_for("menu"), Some(dir.path().join("menu.jpg")));
        assert_eq!(catalog.path_for(PLANT_PLACEHOLDER), Some(placeholder));
        assert!(catalog.path_for("groups").is_none());
    }
}
