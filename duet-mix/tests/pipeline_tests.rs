//! End-to-end runs with an offline speech provider

mod helpers;

use duet_mix::pipeline::{
    combine_only, default_work_dir, render, segment_file_name, RenderOptions, SegmentManifest,
    MANIFEST_FILE,
};
use duet_mix::script::{parse_script, SpeakerId, TimingTag};
use duet_mix::{Config, Error, Stage};
use helpers::{wav_duration_ms, FakeSynthesizer};
use std::path::Path;
use tempfile::TempDir;

const SCRIPT: &str = "\
[INTRO - Host 1] Welcome to the show.
[Host 2] Thanks, happy to be here.
[Applause]
[OVERLAP - Host 1] Me too!
[Host 2] Let's get started.
";

fn write_script(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("episode.txt");
    std::fs::write(&path, content).unwrap();
    path
}

fn segment_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with("segment_"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_render_writes_output_and_script_record() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), SCRIPT);
    let output = temp_dir.path().join("episode.wav");
    let synthesizer = FakeSynthesizer::new();

    let options = RenderOptions {
        script,
        output: output.clone(),
        work_dir: None,
        keep_segments: false,
    };
    let summary = render(&Config::default(), &synthesizer, &options).await.unwrap();

    assert_eq!(summary.segments, 4);
    assert_eq!(summary.report.winner(), Some("adaptive"));
    assert!(wav_duration_ms(&output).unwrap() > 1000);

    let record = summary.script_record.unwrap();
    assert_eq!(record, temp_dir.path().join("episode_script.txt"));
    assert_eq!(std::fs::read_to_string(record).unwrap(), SCRIPT);

    // Provider saw each segment once, in order, with its speaker
    let expected: Vec<_> = parse_script(SCRIPT)
        .into_iter()
        .map(|s| (s.text, s.speaker))
        .collect();
    assert_eq!(synthesizer.calls(), expected);
    assert_eq!(synthesizer.calls()[2], ("Me too!".to_string(), SpeakerId::A));

    // Intermediate clips are gone
    assert!(!default_work_dir(&output).exists());
}

#[tokio::test]
async fn test_render_keeps_segments_and_manifest_when_asked() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), SCRIPT);
    let work_dir = temp_dir.path().join("clips");

    let options = RenderOptions {
        script,
        output: temp_dir.path().join("episode.wav"),
        work_dir: Some(work_dir.clone()),
        keep_segments: true,
    };
    render(&Config::default(), &FakeSynthesizer::new(), &options)
        .await
        .unwrap();

    assert_eq!(
        segment_files(&work_dir),
        (0..4).map(segment_file_name).collect::<Vec<_>>()
    );
    let manifest = SegmentManifest::load(&work_dir).unwrap().unwrap();
    let timings: Vec<_> = manifest.entries.iter().map(|e| e.timing).collect();
    assert_eq!(
        timings,
        vec![TimingTag::Normal, TimingTag::Normal, TimingTag::Overlap, TimingTag::Normal]
    );
    assert_eq!(manifest.entries[1].speaker, SpeakerId::B);
    assert_eq!(manifest.entries[1].chars, "Thanks, happy to be here.".len());
}

#[tokio::test]
async fn test_synthesis_failure_reports_index_and_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), SCRIPT);
    let output = temp_dir.path().join("episode.wav");
    let work_dir = temp_dir.path().join("clips");

    let options = RenderOptions {
        script,
        output: output.clone(),
        work_dir: Some(work_dir.clone()),
        keep_segments: true,
    };
    let err = render(&Config::default(), &FakeSynthesizer::failing_at(2), &options)
        .await
        .unwrap_err();

    match &err {
        Error::Synthesis { index, message } => {
            assert_eq!(*index, 2);
            assert!(message.contains("503"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.stage(), Stage::Synthesis);

    // Earlier clips and the partial one are removed, nothing is composed
    assert!(segment_files(&work_dir).is_empty());
    assert!(!output.exists());
    assert!(!temp_dir.path().join("episode_script.txt").exists());
}

#[tokio::test]
async fn test_script_without_dialogue_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "[Host 1]\n[Music]\n\n");
    let synthesizer = FakeSynthesizer::new();

    let options = RenderOptions {
        script,
        output: temp_dir.path().join("episode.wav"),
        work_dir: None,
        keep_segments: false,
    };
    let err = render(&Config::default(), &synthesizer, &options).await.unwrap_err();

    assert!(matches!(err, Error::Composition(_)));
    assert!(synthesizer.calls().is_empty());
}

#[tokio::test]
async fn test_combine_only_reuses_rendered_segments() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), SCRIPT);
    let work_dir = temp_dir.path().join("clips");

    let options = RenderOptions {
        script,
        output: temp_dir.path().join("first.wav"),
        work_dir: Some(work_dir.clone()),
        keep_segments: true,
    };
    render(&Config::default(), &FakeSynthesizer::new(), &options)
        .await
        .unwrap();

    let output = temp_dir.path().join("second.wav");
    let summary = combine_only(&Config::default(), &work_dir, &output).unwrap();

    assert_eq!(summary.segments, 4);
    assert_eq!(summary.report.winner(), Some("adaptive"));
    // Same clips and timing tags as the original run
    assert_eq!(
        wav_duration_ms(&output).unwrap(),
        wav_duration_ms(&temp_dir.path().join("first.wav")).unwrap()
    );

    let record = std::fs::read_to_string(summary.script_record.unwrap()).unwrap();
    assert_eq!(parse_script(&record), parse_script(SCRIPT));
}

#[tokio::test]
async fn test_combine_only_without_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), SCRIPT);
    let work_dir = temp_dir.path().join("clips");

    let options = RenderOptions {
        script,
        output: temp_dir.path().join("first.wav"),
        work_dir: Some(work_dir.clone()),
        keep_segments: true,
    };
    render(&Config::default(), &FakeSynthesizer::new(), &options)
        .await
        .unwrap();
    std::fs::remove_file(work_dir.join(MANIFEST_FILE)).unwrap();

    let output = temp_dir.path().join("second.wav");
    let summary = combine_only(&Config::default(), &work_dir, &output).unwrap();

    assert_eq!(summary.segments, 4);
    assert!(summary.script_record.is_none());
    assert!(wav_duration_ms(&output).unwrap() > 1000);
}

#[test]
fn test_combine_only_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let err = combine_only(
        &Config::default(),
        temp_dir.path(),
        &temp_dir.path().join("out.wav"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Composition(_)));
}
