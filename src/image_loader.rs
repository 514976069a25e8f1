/// Image loading
///
/// Decodes the image referenced by a record and forces it to 8-bit RGB, the
/// only representation the example carries.
use std::path::Path;
use image::{ImageReader, RgbImage};

#[allow(unused_imports)]
use log::{debug, warn};

use crate::bbox::ImageSize;
use crate::error::SkipReason;

pub struct LoadedImage {
    pub image: RgbImage,
    pub size: ImageSize,
}

/// Open and decode `path`. The format is guessed from file content so a
/// wrong extension still decodes.
pub fn load_image(path: &Path) -> Result<LoadedImage, SkipReason> {
    let reader = ImageReader::open(path)
        .map_err(|source| SkipReason::ImageOpen { path: path.to_path_buf(), source })?
        .with_guessed_format()
        .map_err(|source| SkipReason::ImageOpen { path: path.to_path_buf(), source })?;

    let decoded = reader
        .decode()
        .map_err(|source| SkipReason::ImageDecode { path: path.to_path_buf(), source })?;

    let image = decoded.to_rgb8();
    let (width, height) = image.dimensions();
    let size = ImageSize::new(width, height)
        .ok_or_else(|| SkipReason::EmptyImage { path: path.to_path_buf() })?;

    debug!("Decoded {} ({} x {})", path.display(), width, height);
    Ok(LoadedImage { image, size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_load_converts_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 128])).save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.size, ImageSize::new(4, 3).unwrap());
        assert_eq!(loaded.image.dimensions(), (4, 3));
        assert_eq!(loaded.image.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_format_is_guessed_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("page.png");
        RgbImage::new(2, 2).save(&png).unwrap();
        let misnamed = dir.path().join("page.data");
        std::fs::rename(&png, &misnamed).unwrap();

        assert_eq!(load_image(&misnamed).unwrap().size.width(), 2);
    }

    #[test]
    fn test_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_image(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(SkipReason::ImageOpen { .. })));
    }

    #[test]
    fn test_undecodable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(load_image(&path), Err(SkipReason::ImageDecode { .. })));
    }
}
