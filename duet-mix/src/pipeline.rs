//! End-to-end render and combine-only runs
//!
//! Render: read script → parse → synthesize each segment in order into the
//! work directory (with a `segments.json` manifest) → fallback chain →
//! residual script record → cleanup.
//!
//! Combine-only: reuse clip files from an earlier run, with timing tags from
//! the manifest when one is present.

use crate::compose::{ChainReport, ClipInput, FallbackChain};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::script::{parse_script, serialize_script, Segment, SpeakerId, TimingTag};
use crate::synth::SpeechSynthesizer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Manifest file name inside a work directory
pub const MANIFEST_FILE: &str = "segments.json";

/// Clip file name prefix inside a work directory
pub const SEGMENT_PREFIX: &str = "segment_";

/// One synthesized clip in a work directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub index: usize,
    /// File name relative to the work directory
    pub file: String,
    pub speaker: SpeakerId,
    #[serde(default)]
    pub timing: TimingTag,
    pub chars: usize,
    #[serde(default)]
    pub text: Option<String>,
}

/// Record of the clips produced by one render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentManifest {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<ManifestEntry>,
}

impl SegmentManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            entries,
        }
    }

    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let mut manifest: SegmentManifest = serde_json::from_str(&content)?;
        manifest.entries.sort_by_key(|e| e.index);
        Ok(Some(manifest))
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Segments, when every entry carries its text
    pub fn segments(&self) -> Option<Vec<Segment>> {
        self.entries
            .iter()
            .map(|e| {
                e.text
                    .as_ref()
                    .map(|text| Segment::new(text.clone(), e.speaker, e.timing))
            })
            .collect()
    }
}

/// Clip file name for segment `index`
pub fn segment_file_name(index: usize) -> String {
    format!("{}{:02}.mp3", SEGMENT_PREFIX, index)
}

/// `<output-stem>_script.txt` next to the output
pub fn script_record_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_script.txt", stem))
}

/// Default work directory: `<output-stem>_segments` next to the output
pub fn default_work_dir(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_segments", stem))
}

/// Render run parameters
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub script: PathBuf,
    pub output: PathBuf,
    pub work_dir: Option<PathBuf>,
    pub keep_segments: bool,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub segments: usize,
    pub output: PathBuf,
    pub script_record: Option<PathBuf>,
    pub report: ChainReport,
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Remove clips and manifest, then the directory itself if it ended up empty
fn clean_work_dir(dir: &Path, clips: &[PathBuf]) {
    for clip in clips {
        remove_quietly(clip);
    }
    remove_quietly(&dir.join(MANIFEST_FILE));
    // Only succeeds when empty
    let _ = std::fs::remove_dir(dir);
}

/// Synthesize every segment in order into `work_dir`
///
/// On the first failure every clip written so far is removed and the
/// failing segment's index is reported.
pub async fn synthesize_segments(
    synthesizer: &dyn SpeechSynthesizer,
    segments: &[Segment],
    work_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(work_dir)?;

    let mut clips = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let dest = work_dir.join(segment_file_name(index));
        info!(
            index,
            total = segments.len(),
            speaker = %segment.speaker,
            "Synthesizing segment"
        );

        if let Err(e) = synthesizer.synthesize(&segment.text, segment.speaker, &dest).await {
            remove_quietly(&dest);
            clean_work_dir(work_dir, &clips);
            return Err(Error::Synthesis {
                index,
                message: e.to_string(),
            });
        }
        clips.push(dest);
    }
    Ok(clips)
}

/// Full run: script file → one audio file plus the script record
pub async fn render(
    config: &Config,
    synthesizer: &dyn SpeechSynthesizer,
    options: &RenderOptions,
) -> Result<RunSummary> {
    let script = std::fs::read_to_string(&options.script)?;
    let segments = parse_script(&script);
    if segments.is_empty() {
        return Err(Error::Composition(format!(
            "{} contains no dialogue segments",
            options.script.display()
        )));
    }
    info!(
        segments = segments.len(),
        provider = synthesizer.provider_name(),
        "Script parsed"
    );

    let work_dir = options
        .work_dir
        .clone()
        .unwrap_or_else(|| default_work_dir(&options.output));
    let clips = synthesize_segments(synthesizer, &segments, &work_dir).await?;

    let entries = segments
        .iter()
        .zip(&clips)
        .enumerate()
        .map(|(index, (segment, clip))| ManifestEntry {
            index,
            file: clip
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            speaker: segment.speaker,
            timing: segment.timing,
            chars: segment.text.chars().count(),
            text: Some(segment.text.clone()),
        })
        .collect();
    let manifest_path = SegmentManifest::new(entries).save(&work_dir)?;
    debug!(manifest = %manifest_path.display(), "Segment manifest written");

    let inputs = ClipInput::pair(&segments, &clips)?;
    let report = FallbackChain::from_config(&config.composition).compose(&inputs, &options.output)?;

    let record = script_record_path(&options.output);
    std::fs::write(&record, &script)?;

    if options.keep_segments {
        info!(work_dir = %work_dir.display(), "Keeping segment clips");
    } else {
        clean_work_dir(&work_dir, &clips);
    }

    Ok(RunSummary {
        segments: segments.len(),
        output: options.output.clone(),
        script_record: Some(record),
        report,
    })
}

/// Clip inputs for a directory: the manifest if present, otherwise every
/// `segment_*` file sorted by name with Normal timing
pub fn collect_segment_inputs(dir: &Path) -> Result<(Vec<ClipInput>, Option<SegmentManifest>)> {
    if let Some(manifest) = SegmentManifest::load(dir)? {
        let inputs = manifest
            .entries
            .iter()
            .map(|e| ClipInput::new(dir.join(&e.file), e.timing))
            .collect();
        return Ok((inputs, Some(manifest)));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(SEGMENT_PREFIX))
        })
        .collect();
    files.sort();

    let inputs = files
        .into_iter()
        .map(|path| ClipInput::new(path, TimingTag::Normal))
        .collect();
    Ok((inputs, None))
}

/// Combine-only run over existing clip files
pub fn combine_only(config: &Config, segments_dir: &Path, output: &Path) -> Result<RunSummary> {
    let (inputs, manifest) = collect_segment_inputs(segments_dir)?;
    if inputs.is_empty() {
        return Err(Error::Composition(format!(
            "no {}* files in {}",
            SEGMENT_PREFIX,
            segments_dir.display()
        )));
    }
    info!(
        clips = inputs.len(),
        manifest = manifest.is_some(),
        "Combining existing segments"
    );

    let report = FallbackChain::from_config(&config.composition).compose(&inputs, output)?;

    let script_record = match manifest.as_ref().and_then(SegmentManifest::segments) {
        Some(segments) => {
            let record = script_record_path(output);
            std::fs::write(&record, serialize_script(&segments))?;
            Some(record)
        }
        None => {
            debug!("No segment text available, skipping script record");
            None
        }
    };

    Ok(RunSummary {
        segments: inputs.len(),
        output: output.to_path_buf(),
        script_record,
        report,
    })
}
