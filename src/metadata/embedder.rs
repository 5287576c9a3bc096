use std::io::Cursor;
use std::path::Path;
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{ItemKey, Tag, TagExt};
use crate::errors::{AppError, Result};
use crate::metadata::TagWriter;

/// Writes into the container's native tag (ilst atoms for m4a, ID3v2 for mp3/wav).
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoftyTagWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TagWriter for LoftyTagWriter {
    fn embed(&self, file_path: &Path, cover: Option<&[u8]>, lyrics: Option<&str>) -> Result<()> {
        if cover.is_none() && lyrics.is_none() {
            log::info!("📝 [EMBED] Nothing to embed into {:?}", file_path);
            return Ok(());
        }

        let mut tagged_file = lofty::read_from_path(file_path)?;
        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .primary_tag_mut()
            .ok_or_else(|| AppError::Metadata(format!("No writable tag for {:?}", file_path)))?;

        if let Some(bytes) = cover {
            let picture = cover_picture(bytes);
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(picture);
            log::info!("🖼️ [EMBED] Cover art attached ({} bytes)", bytes.len());
        }

        if let Some(text) = lyrics {
            tag.insert_text(ItemKey::Lyrics, text.to_string());
            log::info!("🎵 [EMBED] Lyrics attached ({} characters)", text.len());
        }

        tag.save_to_path(file_path, WriteOptions::default())?;
        log::info!("✅ [EMBED] Metadata embedded into {:?}", file_path);
        Ok(())
    }
}

/// Scraped bytes are not always a recognizable image; those are stored as JPEG as-is.
fn cover_picture(bytes: &[u8]) -> Picture {
    match Picture::from_reader(&mut Cursor::new(bytes)) {
        Ok(mut picture) => {
            picture.set_pic_type(PictureType::CoverFront);
            picture
        }
        Err(e) => {
            log::warn!("⚠️ [EMBED] Cover is not a known image format ({}), storing as JPEG", e);
            Picture::new_unchecked(PictureType::CoverFront, Some(MimeType::Jpeg), None, bytes.to_vec())
        }
    }
}
