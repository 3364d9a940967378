//! Persistence boundary.
//!
//! Turns an [`IrisAnalysis`] into files under an [`OutputLayout`]. Output
//! identities come from a shared [`SequenceAllocator`]. Files are written
//! only after the pipeline has produced a complete analysis, so an input
//! error leaves nothing behind.
//!
//! `codes_index.json` is regenerated separately ([`refresh_index`]) once the
//! caller has finished writing outputs; concurrent [`persist`] calls never
//! touch it.

mod index;
mod layout;
mod record;
mod sequence;

use std::io::BufWriter;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::config::SpectralConfig;
use crate::error::{PipelineError, StoreError};
use crate::features::legacy_features;
use crate::pipeline::IrisAnalysis;
use crate::raster::RasterImage;
use crate::spectral::{self, render_spectrum};

pub use index::{CodesIndex, IndexEntry, INDEX_VERSION};
pub use layout::{metadata_path_for, OutputLayout, OutputPaths};
pub use record::{read_prior_confidence, AnalysisRecord, CodeRecord, RingMetadata};
pub use sequence::{OutputId, SequenceAllocator};

/// JPEG quality for saved rasters.
const JPEG_QUALITY: u8 = 95;

/// Outcome of persisting one analysis.
#[derive(Debug, Clone)]
pub struct PersistedOutput {
    pub id: OutputId,
    pub paths: OutputPaths,
}

/// Sequence allocator seeded from the safe-zone images already in `layout`.
pub fn open_sequence(layout: &OutputLayout) -> Result<SequenceAllocator, StoreError> {
    SequenceAllocator::scan(
        &layout.processed_dir(),
        OutputLayout::ID_PREFIX,
        &["jpg", "jpeg", "png"],
    )
}

/// Write every output file for `analysis` under a freshly reserved identity.
///
/// Safe to call from several threads sharing one `sequence`. The codes
/// index is left alone; call [`refresh_index`] afterwards.
///
/// `input_file` is recorded by name only in the metadata file.
/// `spectrum_size` is the side length of the spectrum visualization.
pub fn persist(
    layout: &OutputLayout,
    sequence: &SequenceAllocator,
    analysis: &IrisAnalysis,
    input_file: &Path,
    spectrum_size: u32,
) -> Result<PersistedOutput, StoreError> {
    layout.ensure_dirs()?;
    let id = sequence.reserve();
    let paths = layout.paths_for(&id);

    save_jpeg(&paths.safe_zone, &analysis.safe_zone.image().to_dynamic())?;

    let metadata = RingMetadata {
        iris_file: file_name(&paths.safe_zone),
        confidence: analysis.confidence(),
        input_file: file_name(input_file),
    };
    record::write_json(&paths.metadata, &metadata)?;

    let spectrum = render_spectrum(&analysis.spectrum, spectrum_size);
    save_jpeg(&paths.spectrum, &DynamicImage::ImageRgb8(spectrum))?;

    record::write_json(&paths.code_json, &CodeRecord::new(&analysis.latent, unix_now()))?;
    std::fs::write(&paths.code_txt, &analysis.latent.code)
        .map_err(|e| StoreError::io(&paths.code_txt, e))?;

    AnalysisRecord::new(analysis).write(&paths.analysis)?;

    tracing::info!(
        "{} written ({}, confidence {:.2})",
        id,
        paths.safe_zone.display(),
        metadata.confidence
    );

    Ok(PersistedOutput { id, paths })
}

/// Analysis record for an already-processed safe-zone image.
///
/// The confidence comes from the sibling `metadata_<stem>.json` written when
/// the image was produced; it is 0.0 when that file is missing or malformed.
pub fn analyze_processed(
    safe_zone: &Path,
    config: &SpectralConfig,
) -> Result<AnalysisRecord, PipelineError> {
    let gray = RasterImage::open(safe_zone)?.to_gray();
    let (_, waveform) = spectral::analyze(&gray, config);
    let confidence = read_prior_confidence(&metadata_path_for(safe_zone));
    tracing::info!(
        "analyzed {} (confidence {:.2})",
        safe_zone.display(),
        confidence
    );
    Ok(AnalysisRecord {
        legacy: legacy_features(&gray),
        waveform,
        confidence,
    })
}

/// Rebuild and write `codes_index.json`.
pub fn write_index(layout: &OutputLayout) -> Result<CodesIndex, StoreError> {
    let index = CodesIndex::scan(&layout.codes_dir())?;
    index.write(&layout.index_path())?;
    tracing::debug!("codes index: {} entries", index.count);
    Ok(index)
}

/// [`write_index`], logging and discarding any failure.
pub fn refresh_index(layout: &OutputLayout) {
    if let Err(e) = write_index(layout) {
        tracing::warn!("Could not update codes index: {}", e);
    }
}

fn save_jpeg(path: &Path, image: &DynamicImage) -> Result<(), StoreError> {
    let file = std::fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
    image
        .write_with_encoder(encoder)
        .map_err(|e| StoreError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
