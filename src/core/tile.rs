use crate::types::{PyroError, PyroResult};
use image::{imageops, RgbImage};

/// Split an image into non-overlapping square patches.
///
/// Patches are taken on a row-major grid starting at the top-left corner.
/// Remainder strips on the right and bottom edges are discarded: every
/// returned patch is exactly `patch_size` x `patch_size`, never padded or
/// resized, so an (H, W) image yields `(H / P) * (W / P)` patches.
pub fn split_into_patches(image: &RgbImage, patch_size: u32) -> PyroResult<Vec<RgbImage>> {
    if patch_size == 0 {
        return Err(PyroError::Processing(
            "Patch size must be at least 1 pixel".to_string(),
        ));
    }

    let (width, height) = image.dimensions();
    let mut patches = Vec::with_capacity(((height / patch_size) * (width / patch_size)) as usize);

    for y in (0..height).step_by(patch_size as usize) {
        if y + patch_size > height {
            break;
        }
        for x in (0..width).step_by(patch_size as usize) {
            if x + patch_size > width {
                break;
            }
            patches.push(imageops::crop_imm(image, x, y, patch_size, patch_size).to_image());
        }
    }

    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        })
    }

    #[test]
    fn test_patch_count_follows_floor_law() {
        // 300x200 at patch 128: floor(200/128) * floor(300/128) = 1 * 2
        let image = gradient_image(300, 200);
        let patches = split_into_patches(&image, 128).unwrap();

        assert_eq!(patches.len(), 2);
        for patch in &patches {
            assert_eq!(patch.dimensions(), (128, 128));
        }
    }

    #[test]
    fn test_exact_multiple_has_no_remainder() {
        let image = gradient_image(256, 512);
        let patches = split_into_patches(&image, 128).unwrap();
        assert_eq!(patches.len(), 8);
    }

    #[test]
    fn test_image_smaller_than_patch_yields_nothing() {
        let image = gradient_image(100, 100);
        let patches = split_into_patches(&image, 128).unwrap();
        assert!(patches.is_empty());
    }

    #[test]
    fn test_patches_are_row_major_and_disjoint() {
        let image = gradient_image(64, 64);
        let patches = split_into_patches(&image, 32).unwrap();

        assert_eq!(patches.len(), 4);
        // Top-left pixel of each patch reflects its grid position
        assert_eq!(patches[0].get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(patches[1].get_pixel(0, 0).0, [32, 0, 0]);
        assert_eq!(patches[2].get_pixel(0, 0).0, [0, 32, 0]);
        assert_eq!(patches[3].get_pixel(0, 0).0, [32, 32, 0]);
    }

    #[test]
    fn test_zero_patch_size_is_rejected() {
        let image = gradient_image(64, 64);
        assert!(split_into_patches(&image, 0).is_err());
    }
}
