//! Single file and directory processing.
//!
//! Files are handled one at a time, each fully (analysis, planning,
//! rendering) before the next one starts.

use std::path::{Path, PathBuf};

use hushcut_media::silence_removal::{
    compute_interval_stats, plan_keep_intervals, IntervalStats, OUTPUT_SUFFIX,
};
use hushcut_media::{MediaBackend, SilenceRemovalConfig};
use tokio::fs;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{CliError, CliResult};

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Output written.
    Rendered { output: PathBuf, stats: IntervalStats },
    /// Everything was silence; no output written.
    NothingToKeep,
}

/// Counters for a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files rendered
    pub processed: usize,
    /// Files with nothing worth keeping
    pub nothing_to_keep: usize,
    /// Files whose output already existed
    pub skipped_existing: usize,
    /// Entries that are not media
    pub ignored: usize,
    /// Files abandoned after FFmpeg's packet buffering failure
    pub transient_failures: usize,
}

/// Runs the analyse, plan, render pipeline over files and directories.
pub struct Orchestrator<B> {
    backend: B,
    config: SilenceRemovalConfig,
}

impl<B: MediaBackend> Orchestrator<B> {
    pub fn new(backend: B, config: SilenceRemovalConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Remove silence from `input`, writing to `output` or the default name.
    pub async fn process_file(&self, input: &Path, output: Option<&Path>) -> CliResult<FileOutcome> {
        if !input.is_file() {
            return Err(CliError::InputNotFound(input.to_path_buf()));
        }

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_file_output(input)?,
        };

        let span = info_span!("file", input = %input.display());
        self.process_file_inner(input, output).instrument(span).await
    }

    async fn process_file_inner(&self, input: &Path, output: PathBuf) -> CliResult<FileOutcome> {
        info!(output = %output.display(), "Processing file");

        let analysis = self.backend.analyze(input, &self.config).await?;
        let duration = analysis.media.duration;
        let keep = plan_keep_intervals(duration, &analysis.silences, &self.config);

        if keep.is_empty() {
            info!(
                duration,
                silences = analysis.silences.len(),
                "Nothing worth keeping, no output written"
            );
            return Ok(FileOutcome::NothingToKeep);
        }

        let stats = compute_interval_stats(&keep, duration);
        debug!(
            mean_volume_db = analysis.media.mean_volume_db,
            intervals = ?keep,
            "Planned keep intervals"
        );

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        self.backend.render(&analysis.media.path, &keep, &output).await?;

        info!(
            output = %output.display(),
            segments = stats.keep_count,
            kept_secs = format!("{:.1}", stats.kept_secs),
            removed_secs = format!("{:.1}", stats.removed_secs),
            keep_ratio = format!("{:.1}%", stats.keep_ratio * 100.0),
            "File done"
        );

        Ok(FileOutcome::Rendered { output, stats })
    }

    /// Process every media file under `input`, mirroring the tree into `output`.
    ///
    /// Files whose mirrored output already probes as media are skipped.
    /// FFmpeg's packet buffering failure skips the file; any other error
    /// stops the run.
    pub async fn process_dir(&self, input: &Path, output: Option<&Path>) -> CliResult<BatchSummary> {
        if !input.is_dir() {
            return Err(CliError::NotADirectory(input.to_path_buf()));
        }

        let input = fs::canonicalize(input).await?;
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_dir_output(&input)?,
        };

        fs::create_dir_all(&output).await?;
        let output_root = fs::canonicalize(&output).await?;

        info!(input = %input.display(), output = %output.display(), "Processing directory");

        let mut summary = BatchSummary::default();
        let mut pending = vec![(input, output_root.clone())];

        while let Some((in_dir, out_dir)) = pending.pop() {
            fs::create_dir_all(&out_dir).await?;

            let mut subdirs = Vec::new();
            for entry in sorted_entries(&in_dir).await? {
                if entry == output_root {
                    continue;
                }
                let Some(name) = entry.file_name() else {
                    continue;
                };
                let mirrored = out_dir.join(name);

                if fs::symlink_metadata(&entry).await?.is_dir() {
                    subdirs.push((entry, mirrored));
                    continue;
                }

                self.process_dir_entry(&entry, &mirrored, &mut summary).await?;
            }

            // Reversed so the stack pops them in name order.
            pending.extend(subdirs.into_iter().rev());
        }

        info!(
            processed = summary.processed,
            nothing_to_keep = summary.nothing_to_keep,
            skipped_existing = summary.skipped_existing,
            ignored = summary.ignored,
            transient_failures = summary.transient_failures,
            "Directory done"
        );

        Ok(summary)
    }

    async fn process_dir_entry(
        &self,
        entry: &Path,
        mirrored: &Path,
        summary: &mut BatchSummary,
    ) -> CliResult<()> {
        if mirrored.exists() && self.backend.is_media_file(mirrored).await {
            info!(output = %mirrored.display(), "Output already exists, skipping");
            summary.skipped_existing += 1;
            return Ok(());
        }

        if !self.backend.is_media_file(entry).await {
            debug!(path = %entry.display(), "Not a media file, ignoring");
            summary.ignored += 1;
            return Ok(());
        }

        match self.process_file(entry, Some(mirrored)).await {
            Ok(FileOutcome::Rendered { .. }) => summary.processed += 1,
            Ok(FileOutcome::NothingToKeep) => summary.nothing_to_keep += 1,
            Err(e) if e.is_packet_buffering() => {
                warn!(
                    path = %entry.display(),
                    error = %e,
                    "FFmpeg buffered too many packets, skipping file"
                );
                summary.transient_failures += 1;
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

/// `<stem>.silenceremoved.<ext>` beside `input`.
pub fn default_file_output(input: &Path) -> CliResult<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| CliError::NoOutputName(input.to_path_buf()))?
        .to_string_lossy();

    let name = match input.extension() {
        Some(ext) => format!("{}.{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}.{}", stem, OUTPUT_SUFFIX),
    };

    Ok(input.with_file_name(name))
}

/// `<dir>.silenceremoved` beside `input`.
pub fn default_dir_output(input: &Path) -> CliResult<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| CliError::NoOutputName(input.to_path_buf()))?
        .to_string_lossy();

    Ok(input.with_file_name(format!("{}.{}", name, OUTPUT_SUFFIX)))
}

async fn sorted_entries(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(entry.path());
    }

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hushcut_media::silence_removal::{MediaFileDescriptor, SilenceAnalysis, TimeInterval};
    use hushcut_media::{MediaError, MediaResult};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const MEDIA_MAGIC: &str = "VIDEO";

    /// Treats files starting with `VIDEO` as media and renders by writing text.
    #[derive(Default)]
    struct FakeBackend {
        /// Silences per file name; files not listed get one silence at 2-3s.
        silences: HashMap<String, Vec<TimeInterval>>,
        /// File names whose render fails with the given stderr.
        render_failures: HashMap<String, String>,
        analyzed: Mutex<Vec<PathBuf>>,
        rendered: Mutex<Vec<(PathBuf, Vec<TimeInterval>, PathBuf)>>,
    }

    impl FakeBackend {
        fn silences(mut self, name: &str, silences: Vec<TimeInterval>) -> Self {
            self.silences.insert(name.to_string(), silences);
            self
        }

        fn failing(mut self, name: &str, stderr: &str) -> Self {
            self.render_failures.insert(name.to_string(), stderr.to_string());
            self
        }

        fn analyzed_names(&self) -> Vec<String> {
            self.analyzed
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                .collect()
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().to_string()
    }

    #[async_trait]
    impl MediaBackend for FakeBackend {
        async fn is_media_file(&self, path: &Path) -> bool {
            std::fs::read_to_string(path)
                .map(|s| s.starts_with(MEDIA_MAGIC))
                .unwrap_or(false)
        }

        async fn analyze(&self, path: &Path, _config: &SilenceRemovalConfig) -> MediaResult<SilenceAnalysis> {
            self.analyzed.lock().unwrap().push(path.to_path_buf());
            let silences = self
                .silences
                .get(&file_name(path))
                .cloned()
                .unwrap_or_else(|| vec![TimeInterval::new(2.0, 3.0)]);

            Ok(SilenceAnalysis {
                media: MediaFileDescriptor {
                    path: path.to_path_buf(),
                    duration: 10.0,
                    mean_volume_db: -25.0,
                },
                silences,
            })
        }

        async fn render(&self, source: &Path, intervals: &[TimeInterval], output: &Path) -> MediaResult<()> {
            if let Some(stderr) = self.render_failures.get(&file_name(source)) {
                return Err(MediaError::ffmpeg_failed("render failed", Some(stderr.clone()), Some(1)));
            }
            self.rendered
                .lock()
                .unwrap()
                .push((source.to_path_buf(), intervals.to_vec(), output.to_path_buf()));
            std::fs::write(output, format!("{} rendered", MEDIA_MAGIC))?;
            Ok(())
        }
    }

    fn write_media(path: &Path) {
        std::fs::write(path, format!("{} source", MEDIA_MAGIC)).unwrap();
    }

    #[test]
    fn test_default_file_output() {
        assert_eq!(
            default_file_output(Path::new("/v/talk.mp4")).unwrap(),
            PathBuf::from("/v/talk.silenceremoved.mp4")
        );
        assert_eq!(
            default_file_output(Path::new("clip.final.mkv")).unwrap(),
            PathBuf::from("clip.final.silenceremoved.mkv")
        );
        assert_eq!(
            default_file_output(Path::new("raw")).unwrap(),
            PathBuf::from("raw.silenceremoved")
        );
    }

    #[test]
    fn test_default_dir_output() {
        assert_eq!(
            default_dir_output(Path::new("/data/lectures")).unwrap(),
            PathBuf::from("/data/lectures.silenceremoved")
        );
        assert!(default_dir_output(Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn test_process_file_renders_padded_plan() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("talk.mp4");
        write_media(&input);

        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());
        let outcome = orchestrator.process_file(&input, None).await.unwrap();

        let expected_output = dir.path().join("talk.silenceremoved.mp4");
        match outcome {
            FileOutcome::Rendered { output, stats } => {
                assert_eq!(output, expected_output);
                assert_eq!(stats.keep_count, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(expected_output.exists());

        let rendered = orchestrator.backend().rendered.lock().unwrap();
        let (source, intervals, _) = &rendered[0];
        assert_eq!(source, &input);
        assert!((intervals[0].end - 2.2).abs() < 1e-9);
        assert!((intervals[1].start - 2.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_all_silence_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("quiet.mp4");
        write_media(&input);
        let output = dir.path().join("out").join("quiet.mp4");

        let backend = FakeBackend::default().silences("quiet.mp4", vec![TimeInterval::new(0.0, 10.0)]);
        let orchestrator = Orchestrator::new(backend, SilenceRemovalConfig::default());

        let outcome = orchestrator.process_file(&input, Some(&output)).await.unwrap();
        assert_eq!(outcome, FileOutcome::NothingToKeep);
        assert!(!output.exists());
        assert!(orchestrator.backend().rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_is_error() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());

        let err = orchestrator
            .process_file(&dir.path().join("nope.mp4"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_dir_skips_existing_outputs() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("videos");
        std::fs::create_dir(&input).unwrap();
        write_media(&input.join("a.mp4"));
        write_media(&input.join("b.mp4"));
        write_media(&input.join("c.mp4"));
        std::fs::write(input.join("notes.txt"), "not a video").unwrap();

        let output = root.path().join("videos.silenceremoved");
        std::fs::create_dir(&output).unwrap();
        // Valid previous output: skipped.
        write_media(&output.join("a.mp4"));
        // Leftover junk at the mirrored path: reprocessed.
        std::fs::write(output.join("b.mp4"), "truncated").unwrap();

        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());
        let summary = orchestrator.process_dir(&input, None).await.unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                skipped_existing: 1,
                ignored: 1,
                ..Default::default()
            }
        );
        assert_eq!(orchestrator.backend().analyzed_names(), vec!["b.mp4", "c.mp4"]);
        assert!(std::fs::read_to_string(output.join("b.mp4")).unwrap().ends_with("rendered"));

        // A second run has nothing left to do.
        let summary = orchestrator.process_dir(&input, None).await.unwrap();
        assert_eq!(summary.skipped_existing, 3);
        assert_eq!(summary.processed, 0);
    }

    #[tokio::test]
    async fn test_dir_recurses_into_mirrored_subdirectories() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("in");
        std::fs::create_dir_all(input.join("day1")).unwrap();
        write_media(&input.join("day1").join("talk.mp4"));

        let output = root.path().join("out");
        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());
        let summary = orchestrator.process_dir(&input, Some(&output)).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert!(output.join("day1").join("talk.mp4").exists());
    }

    #[tokio::test]
    async fn test_dir_visits_subdirectories_in_name_order() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("in");
        for name in ["c", "a", "b"] {
            std::fs::create_dir_all(input.join(name).join("inner")).unwrap();
            write_media(&input.join(name).join(format!("{}.mp4", name)));
            write_media(&input.join(name).join("inner").join(format!("{}_inner.mp4", name)));
        }
        write_media(&input.join("top.mp4"));

        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());
        let summary = orchestrator
            .process_dir(&input, Some(&root.path().join("out")))
            .await
            .unwrap();

        assert_eq!(summary.processed, 7);
        assert_eq!(
            orchestrator.backend().analyzed_names(),
            vec![
                "top.mp4",
                "a.mp4",
                "a_inner.mp4",
                "b.mp4",
                "b_inner.mp4",
                "c.mp4",
                "c_inner.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_dir_skips_nested_output_directory() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_media(&input.join("talk.mp4"));

        let output = input.join("done");
        let orchestrator = Orchestrator::new(FakeBackend::default(), SilenceRemovalConfig::default());
        let summary = orchestrator.process_dir(&input, Some(&output)).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert!(!output.join("done").exists());
    }

    #[tokio::test]
    async fn test_dir_continues_after_packet_buffering() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_media(&input.join("a.mp4"));
        write_media(&input.join("b.mp4"));

        let backend = FakeBackend::default().failing(
            "a.mp4",
            "[mp4 @ 0x1] Too many packets buffered for output stream 0:1.",
        );
        let orchestrator = Orchestrator::new(backend, SilenceRemovalConfig::default());
        let summary = orchestrator
            .process_dir(&input, Some(&root.path().join("out")))
            .await
            .unwrap();

        assert_eq!(summary.transient_failures, 1);
        assert_eq!(summary.processed, 1);
    }

    #[tokio::test]
    async fn test_dir_aborts_on_other_errors() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_media(&input.join("a.mp4"));
        write_media(&input.join("b.mp4"));

        let backend = FakeBackend::default().failing("a.mp4", "Invalid data found when processing input");
        let orchestrator = Orchestrator::new(backend, SilenceRemovalConfig::default());
        let err = orchestrator
            .process_dir(&input, Some(&root.path().join("out")))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Media(MediaError::FfmpegFailed { .. })));
        assert_eq!(orchestrator.backend().analyzed_names(), vec!["a.mp4"]);
    }
}
