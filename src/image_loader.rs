//! Loading sheet photographs from disk
//!
//! Photos are decoded with the `image` crate and converted to 8-bit RGB,
//! the only layout the locator and decoders work with. EXIF orientation is
//! not applied: sheets are located by their markers, so a rotated photo
//! still crops correctly as long as the sheet is upright in the frame.
//!
//! The format is guessed from the file contents, falling back to the
//! extension, so any format the `image` crate is built to decode works.

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};

use crate::error::{Result, ScanError};

/// Load an image from disk as 8-bit RGB
///
/// # Errors
///
/// Returns `ScanError::ImageLoad` if the format is recognised from neither
/// the contents nor the extension, or the file cannot be opened or decoded.
///
/// # Example
///
/// ```rust,no_run
/// use scan_sheets::image_loader::load_image;
/// use std::path::Path;
///
/// let photo = load_image(Path::new("sheet.jpg"))?;
/// println!("Loaded image: {}x{}", photo.width(), photo.height());
/// # Ok::<(), scan_sheets::ScanError>(())
/// ```
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| {
            ScanError::image_load(format!("Failed to open image file: {}", path.display()), e)
        })?;
    let format = reader.format().ok_or_else(|| ScanError::ImageLoad {
        message: format!("Unknown image format for file: {}", path.display()),
        source: None,
    })?;

    let img: DynamicImage = reader.decode().map_err(|e| {
        ScanError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        ?format,
        "loaded photo"
    );
    Ok(img.to_rgb8())
}

/// Check if files with this extension can be decoded
pub fn is_supported_extension(ext: &str) -> bool {
    ImageFormat::from_extension(ext).is_some_and(|format| format.reading_enabled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("jpg"));
        assert!(is_supported_extension("JPEG"));
        assert!(is_supported_extension("png"));
        assert!(!is_supported_extension("heic"));
        assert!(!is_supported_extension("xyz"));
        assert!(!is_supported_extension("doc"));
    }

    #[test]
    fn test_load_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let mut photo = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        photo.put_pixel(1, 1, Rgb([200, 10, 10]));
        photo.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, photo);
    }

    #[test]
    fn test_format_is_guessed_from_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let photo = RgbImage::from_pixel(4, 4, Rgb([10, 200, 10]));
        photo.save(&path).unwrap();

        let renamed = dir.path().join("sheet.photo");
        std::fs::rename(&path, &renamed).unwrap();
        assert_eq!(load_image(&renamed).unwrap(), photo);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let unknown = dir.path().join("sheet.xyz");
        std::fs::write(&unknown, b"plain text").unwrap();
        assert!(matches!(
            load_image(&unknown),
            Err(ScanError::ImageLoad { source: None, .. })
        ));

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            load_image(&missing),
            Err(ScanError::ImageLoad {
                source: Some(_),
                ..
            })
        ));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"not a png").unwrap();
        assert!(load_image(&corrupt).is_err());
    }
}
