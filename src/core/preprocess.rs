use crate::core::enhance::{apply_clahe_rgb, ClaheParams};
use crate::core::tile::split_into_patches;
use crate::types::PyroResult;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Parameters for the dataset preprocessing pipeline
#[derive(Debug, Clone)]
pub struct PreprocessParams {
    /// Class folders expected under the input directory
    pub categories: Vec<String>,
    /// Side length of the square training patches
    pub patch_size: u32,
    pub clahe: ClaheParams,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            categories: vec!["fire".to_string(), "no_fire".to_string()],
            patch_size: 256,
            clahe: ClaheParams::default(),
        }
    }
}

/// Counts reported by one preprocessing run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessSummary {
    pub images_processed: usize,
    pub images_skipped: usize,
    pub patches_written: usize,
}

/// Contrast-enhance and patch every image in the class folders.
///
/// For each category folder under `input_dir`, every readable PNG/JPEG is
/// run through CLAHE and split into non-overlapping `patch_size` patches,
/// written as `{stem}_patch_{index}.png` (1-based index) into the matching
/// category folder under `output_dir`.
///
/// Unreadable or undersized images are logged and skipped; a write failure
/// abandons the remaining patches of that one image. Neither stops the
/// run. A missing category folder, however, is an error: the fixed class
/// layout is the dataset contract.
pub fn preprocess_and_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    params: &PreprocessParams,
) -> PyroResult<PreprocessSummary> {
    let mut summary = PreprocessSummary::default();

    for category in &params.categories {
        let src = input_dir.as_ref().join(category);
        let dst = output_dir.as_ref().join(category);
        fs::create_dir_all(&dst)?;

        log::info!("Preprocessing category '{}'", category);

        let mut files: Vec<PathBuf> = fs::read_dir(&src)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| has_image_extension(path))
            .collect();
        files.sort();

        for path in files {
            match process_one_image(&path, &dst, params) {
                Ok(written) => {
                    summary.images_processed += 1;
                    summary.patches_written += written;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    summary.images_skipped += 1;
                }
            }
        }
    }

    log::info!(
        "Preprocessing done: {} images -> {} patches ({} skipped)",
        summary.images_processed,
        summary.patches_written,
        summary.images_skipped
    );
    Ok(summary)
}

/// Enhance and patch a single image, returning the number of patches written
fn process_one_image(path: &Path, dst: &Path, params: &PreprocessParams) -> PyroResult<usize> {
    let image = image::open(path)?.to_rgb8();
    let enhanced = apply_clahe_rgb(&image, &params.clahe)?;
    let patches = split_into_patches(&enhanced, params.patch_size)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut written = 0;
    for (index, patch) in patches.iter().enumerate() {
        let out_path = dst.join(format!("{}_patch_{}.png", stem, index + 1));
        if let Err(e) = patch.save(&out_path) {
            // One bad write abandons this image only
            log::warn!("Failed to write {}: {}", out_path.display(), e);
            break;
        }
        written += 1;
    }

    log::debug!("{} -> {} patches", path.display(), written);
    Ok(written)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
