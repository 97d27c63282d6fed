use crate::types::{PyroError, PyroResult};
use image::RgbImage;
use ndarray::Array2;

/// CLAHE parameters
#[derive(Debug, Clone)]
pub struct ClaheParams {
    /// Contrast limit as a multiple of the uniform histogram level
    pub clip_limit: f32,
    /// Tile grid as (rows, columns)
    pub tile_grid: (usize, usize),
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tile_grid: (8, 8),
        }
    }
}

/// Contrast Limited Adaptive Histogram Equalization on a single 8-bit plane.
///
/// The plane is divided into a `tile_grid` of regions. Each region gets a
/// clipped 256-bin histogram (excess mass redistributed uniformly) and a
/// CDF-derived lookup table; every pixel is then mapped through a bilinear
/// blend of the four surrounding region tables, which removes the block
/// seams a per-tile mapping would leave.
pub fn equalize_luma(plane: &Array2<u8>, params: &ClaheParams) -> PyroResult<Array2<u8>> {
    let (height, width) = plane.dim();
    let (grid_rows, grid_cols) = params.tile_grid;

    if grid_rows == 0 || grid_cols == 0 {
        return Err(PyroError::Processing(
            "CLAHE tile grid must be at least 1x1".to_string(),
        ));
    }
    if height < grid_rows || width < grid_cols {
        return Err(PyroError::Processing(format!(
            "Image size {}x{} is too small for a {}x{} tile grid",
            height, width, grid_rows, grid_cols
        )));
    }
    if params.clip_limit <= 0.0 {
        return Err(PyroError::Processing(
            "CLAHE clip limit must be positive".to_string(),
        ));
    }

    // Balanced partition: tile t covers [t*len/n, (t+1)*len/n), so every
    // tile is non-empty and in range for any image size >= the grid
    let row_bounds = axis_partition(height, grid_rows);
    let col_bounds = axis_partition(width, grid_cols);

    // One lookup table per tile
    let mut tables = vec![[0u8; 256]; grid_rows * grid_cols];
    for (ty, &(y0, y1)) in row_bounds.iter().enumerate() {
        for (tx, &(x0, x1)) in col_bounds.iter().enumerate() {
            let tile = plane.slice(ndarray::s![y0..y1, x0..x1]);
            tables[ty * grid_cols + tx] = clipped_equalization_table(
                &tile.iter().copied().collect::<Vec<u8>>(),
                params.clip_limit,
            );
        }
    }

    // Map every pixel through the four surrounding tile tables
    let row_spans = interpolation_spans(&row_bounds, height);
    let col_spans = interpolation_spans(&col_bounds, width);
    let mut output = Array2::zeros((height, width));
    for y in 0..height {
        let (ty0, ty1, fy) = row_spans[y];
        for x in 0..width {
            let (tx0, tx1, fx) = col_spans[x];
            let v = plane[[y, x]] as usize;

            let top = (1.0 - fx) * tables[ty0 * grid_cols + tx0][v] as f32
                + fx * tables[ty0 * grid_cols + tx1][v] as f32;
            let bottom = (1.0 - fx) * tables[ty1 * grid_cols + tx0][v] as f32
                + fx * tables[ty1 * grid_cols + tx1][v] as f32;
            let blended = (1.0 - fy) * top + fy * bottom;

            output[[y, x]] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(output)
}

/// Clipped-histogram equalization table for one tile
fn clipped_equalization_table(pixels: &[u8], clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }

    // Clip relative to the uniform level and hand the excess back evenly
    let uniform_level = pixels.len() as f32 / 256.0;
    let clip = ((clip_limit * uniform_level).max(1.0)) as u32;

    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    let bonus = excess / 256;
    for count in histogram.iter_mut() {
        *count += bonus;
    }
    // Spread the residual over the full range, not just the low bins,
    // so the redistributed histogram stays uniform
    let residual = (excess % 256) as usize;
    if residual > 0 {
        let step = (256 / residual).max(1);
        let mut handed_back = 0;
        for bin in (0..256).step_by(step) {
            if handed_back == residual {
                break;
            }
            histogram[bin] += 1;
            handed_back += 1;
        }
    }

    let total = pixels.len() as f32;
    let mut table = [0u8; 256];
    let mut cumulative = 0u32;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        table[value] = ((cumulative as f32 / total) * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Split an axis of `len` pixels into `tiles` contiguous ranges whose sizes
/// differ by at most one pixel
fn axis_partition(len: usize, tiles: usize) -> Vec<(usize, usize)> {
    (0..tiles)
        .map(|t| (t * len / tiles, (t + 1) * len / tiles))
        .collect()
}

/// Neighboring tile indices and blend weight for every coordinate of one axis.
///
/// Pixels are interpolated between the centers of the two nearest tiles;
/// pixels outside the first/last center clamp to the border tile.
fn interpolation_spans(bounds: &[(usize, usize)], len: usize) -> Vec<(usize, usize, f32)> {
    let centers: Vec<f32> = bounds
        .iter()
        .map(|&(start, end)| (start + end) as f32 / 2.0)
        .collect();
    let last = centers.len() - 1;

    let mut spans = Vec::with_capacity(len);
    let mut upper = 0;
    for coord in 0..len {
        let position = coord as f32;
        while upper < last && centers[upper] <= position {
            upper += 1;
        }
        let span = if position <= centers[0] {
            (0, 0, 0.0)
        } else if position >= centers[last] {
            (last, last, 0.0)
        } else {
            let lower = upper - 1;
            let weight = (position - centers[lower]) / (centers[upper] - centers[lower]);
            (lower, upper, weight)
        };
        spans.push(span);
    }
    spans
}

/// Apply CLAHE to the luma channel of an RGB image.
///
/// The image is taken to BT.601 YCbCr, the Y plane is equalized and the
/// original chroma planes are kept, so hue is preserved while local
/// contrast improves. Output dimensions always equal input dimensions.
pub fn apply_clahe_rgb(image: &RgbImage, params: &ClaheParams) -> PyroResult<RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PyroError::Processing(
            "Cannot equalize an empty image".to_string(),
        ));
    }

    let (h, w) = (height as usize, width as usize);
    let mut luma = Array2::zeros((h, w));
    let mut cb = Array2::zeros((h, w));
    let mut cr = Array2::zeros((h, w));

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (r as f32, g as f32, b as f32);

        luma[[y as usize, x as usize]] =
            (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8;
        cb[[y as usize, x as usize]] = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        cr[[y as usize, x as usize]] = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    }

    let equalized = equalize_luma(&luma, params)?;

    let mut output = RgbImage::new(width, height);
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let yc = equalized[[y as usize, x as usize]] as f32;
        let cb = cb[[y as usize, x as usize]] - 128.0;
        let cr = cr[[y as usize, x as usize]] - 128.0;

        let r = yc + 1.402 * cr;
        let g = yc - 0.344_136 * cb - 0.714_136 * cr;
        let b = yc + 1.772 * cb;

        pixel.0 = [
            r.round().clamp(0.0, 255.0) as u8,
            g.round().clamp(0.0, 255.0) as u8,
            b.round().clamp(0.0, 255.0) as u8,
        ];
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_equalize_preserves_shape() {
        let plane = Array2::from_shape_fn((64, 96), |(y, x)| ((y + x) % 256) as u8);
        let result = equalize_luma(&plane, &ClaheParams::default()).unwrap();
        assert_eq!(result.dim(), (64, 96));
    }

    #[test]
    fn test_dimensions_not_divisible_by_grid() {
        // Sizes that don't divide by the 8x8 grid must still partition
        // cleanly; edge tiles just end up a pixel larger
        for (h, w) in [(9, 100), (12, 12), (50, 37), (17, 257)] {
            let plane = Array2::from_shape_fn((h, w), |(y, x)| ((3 * y + 7 * x) % 256) as u8);
            let result = equalize_luma(&plane, &ClaheParams::default()).unwrap();
            assert_eq!(result.dim(), (h, w), "shape changed for {}x{}", h, w);
        }
    }

    #[test]
    fn test_axis_partition_covers_without_gaps() {
        for (len, tiles) in [(9, 8), (12, 8), (37, 8), (64, 8), (8, 8)] {
            let bounds = axis_partition(len, tiles);
            assert_eq!(bounds.len(), tiles);
            assert_eq!(bounds[0].0, 0);
            assert_eq!(bounds[tiles - 1].1, len);
            for t in 0..tiles {
                assert!(bounds[t].0 < bounds[t].1, "empty tile for len {}", len);
                if t > 0 {
                    assert_eq!(bounds[t].0, bounds[t - 1].1);
                }
            }
        }
    }

    #[test]
    fn test_constant_plane_stays_nearly_constant() {
        let plane = Array2::from_elem((256, 256), 120u8);
        let result = equalize_luma(&plane, &ClaheParams::default()).unwrap();

        // Clipping redistributes the single spike into a near-identity map
        for &v in result.iter() {
            assert!((v as i16 - 120).abs() <= 4, "value drifted to {}", v);
        }
    }

    #[test]
    fn test_low_contrast_range_is_expanded() {
        // Gradient confined to [100, 140]
        let plane = Array2::from_shape_fn((64, 64), |(y, _)| (100 + (y * 40) / 64) as u8);
        let result = equalize_luma(&plane, &ClaheParams::default()).unwrap();

        let min = *result.iter().min().unwrap();
        let max = *result.iter().max().unwrap();
        assert!(
            max - min > 40,
            "contrast not expanded: range {}..{}",
            min,
            max
        );
    }

    #[test]
    fn test_image_smaller_than_grid_is_rejected() {
        let plane = Array2::from_elem((4, 4), 0u8);
        assert!(equalize_luma(&plane, &ClaheParams::default()).is_err());
    }

    #[test]
    fn test_rgb_clahe_keeps_dimensions_and_gray_pixels_gray() {
        let mut image = RgbImage::new(64, 64);
        for (_, y, pixel) in image.enumerate_pixels_mut() {
            let v = (100 + (y * 40) / 64) as u8;
            pixel.0 = [v, v, v];
        }

        let result = apply_clahe_rgb(&image, &ClaheParams::default()).unwrap();
        assert_eq!(result.dimensions(), (64, 64));

        // Gray input has zero chroma; equalized output must stay gray
        for pixel in result.pixels() {
            let [r, g, b] = pixel.0;
            assert!((r as i16 - g as i16).abs() <= 1);
            assert!((g as i16 - b as i16).abs() <= 1);
        }
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);
        assert!(apply_clahe_rgb(&image, &ClaheParams::default()).is_err());
    }

    #[test]
    fn test_clipped_table_is_monotonic() {
        let pixels: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
        let table = clipped_equalization_table(&pixels, 2.0);
        for v in 1..256 {
            assert!(table[v] >= table[v - 1]);
        }
    }

    #[test]
    fn test_interpolation_spans_clamp_at_borders() {
        let bounds = axis_partition(64, 8);
        let spans = interpolation_spans(&bounds, 64);

        // Pixel 0 is left of the first tile center, the last pixel is
        // right of the last center; both clamp to the border tile
        assert_eq!(spans[0], (0, 0, 0.0));
        assert_eq!(spans[63], (7, 7, 0.0));

        // An interior pixel blends two neighboring tiles
        let (lo, hi, f) = spans[10];
        assert_eq!((lo, hi), (0, 1));
        assert!(f > 0.0 && f < 1.0);

        // Weights never leave [0, 1] even on uneven partitions
        for &(lo, hi, f) in interpolation_spans(&axis_partition(9, 8), 9).iter() {
            assert!(lo <= hi && hi < 8);
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn test_rgb_roundtrip_without_equalization_effects() {
        // A saturated color should survive the YCbCr trip within rounding
        let mut image = RgbImage::new(16, 16);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([200, 40, 40]);
        }

        let result = apply_clahe_rgb(
            &image,
            &ClaheParams {
                clip_limit: 2.0,
                tile_grid: (2, 2),
            },
        )
        .unwrap();

        // Chroma is untouched; luma may shift but hue ordering holds
        for pixel in result.pixels() {
            let [r, g, b] = pixel.0;
            assert!(r > g);
            assert!((g as i16 - b as i16).abs() <= 2);
        }
    }
}
