//! FFmpeg and FFprobe command builders and runner.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of trailing stderr lines kept for error reports.
pub const STDERR_TAIL_LINES: usize = 64;

/// Locations of the FFmpeg and FFprobe executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Use explicit executable paths.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Resolve `ffmpeg` and `ffprobe` from `PATH`.
    pub fn from_path() -> MediaResult<Self> {
        Ok(Self {
            ffmpeg: check_ffmpeg()?,
            ffprobe: check_ffprobe()?,
        })
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output target (a path, or `-` for the null muxer)
    output: OsString,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Whether to emit `-progress pipe:2`
    progress: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().as_os_str().to_os_string(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            progress: true,
            log_level: "error".to_string(),
        }
    }

    /// Create an analysis command that decodes `input` and discards the result.
    ///
    /// Filter diagnostics are printed at `info` level, so the log level is raised.
    pub fn analysis(input: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new(input, "-")
            .log_level("info")
            .output_args(["-vn", "-sn", "-dn", "-f", "null"]);
        cmd.overwrite = false;
        cmd.progress = false;
        cmd
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.overwrite {
            args.push("-y".into());
        }

        args.push("-hide_banner".into());
        args.push("-nostdin".into());

        args.push("-v".into());
        args.push(self.log_level.clone().into());

        if self.progress {
            args.push("-progress".into());
            args.push("pipe:2".into());
            args.push("-nostats".into());
        }

        args.extend(self.input_args.iter().map(OsString::from));

        args.push("-i".into());
        args.push(self.input.clone().into_os_string());

        args.extend(self.output_args.iter().map(OsString::from));

        args.push(self.output.clone());

        args
    }

    /// Human readable command line for logs.
    pub fn display_args(&self) -> String {
        self.build_args()
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builder for FFprobe commands.
#[derive(Debug, Clone)]
pub struct FfprobeCommand {
    input: PathBuf,
    args: Vec<String>,
}

impl FfprobeCommand {
    /// Probe `input` with errors-only logging.
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            args: vec!["-v".to_string(), "error".to_string()],
        }
    }

    /// Print only the container duration as a bare number.
    pub fn format_duration(mut self) -> Self {
        self.args.extend(
            [
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ]
            .map(String::from),
        );
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(self.input.clone().into_os_string());
        args
    }
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runner for FFmpeg and FFprobe processes.
///
/// Every call is awaited to completion; there is no concurrency between calls.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    tools: ToolPaths,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            timeout_secs: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    ///
    /// Non-progress stderr lines are kept (last [`STDERR_TAIL_LINES`]) and
    /// attached to the error when FFmpeg fails.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.tools.ffmpeg.display(), cmd.display_args());

        let mut child = Command::new(&self.tools.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(e, MediaError::FfmpegNotFound))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("FFmpeg stderr was not captured", None, None))?;
        let mut reader = BufReader::new(stderr).lines();

        let stderr_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                    progress_callback(progress);
                } else if !is_progress_line(&line) {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            tail
        });

        let result = self.wait_for_completion(&mut child).await;
        let tail = stderr_handle.await.unwrap_or_default();

        match result? {
            Some(code) if code != 0 => {
                let message = last_line(&tail)
                    .unwrap_or("FFmpeg exited with non-zero status")
                    .to_string();
                Err(MediaError::ffmpeg_failed(
                    message,
                    Some(Vec::from(tail).join("\n")),
                    Some(code),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Run an FFmpeg command and capture its full output.
    ///
    /// Used for analysis passes whose results are printed to stderr.
    pub async fn capture(&self, cmd: &FfmpegCommand) -> MediaResult<CommandOutput> {
        debug!("Running FFmpeg: {} {}", self.tools.ffmpeg.display(), cmd.display_args());

        let output = self
            .output(&self.tools.ffmpeg, &cmd.build_args(), MediaError::FfmpegNotFound)
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffmpeg_failed(
                stderr.lines().last().unwrap_or("FFmpeg exited with non-zero status").to_string(),
                Some(stderr),
                output.status.code(),
            ));
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Run an FFprobe command and capture its output.
    pub async fn probe(&self, cmd: &FfprobeCommand) -> MediaResult<CommandOutput> {
        let output = self
            .output(&self.tools.ffprobe, &cmd.build_args(), MediaError::FfprobeNotFound)
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                stderr.lines().last().unwrap_or("FFprobe failed").to_string(),
                Some(stderr),
            ));
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
        })
    }

    async fn output(
        &self,
        program: &Path,
        args: &[OsString],
        not_found: MediaError,
    ) -> MediaResult<std::process::Output> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(e, not_found))?;

        match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
                .await
                .map_err(|_| {
                    warn!("{} timed out after {} seconds, killing process", program.display(), secs);
                    MediaError::Timeout(secs)
                })?
                .map_err(MediaError::from),
            None => Ok(child.wait_with_output().await?),
        }
    }

    /// Wait for the child process, honouring the timeout.
    ///
    /// Returns the exit code; termination by a signal is reported as `-1`.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<Option<i32>> {
        let status = match self.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("FFmpeg timed out after {} seconds, killing process", secs);
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(secs));
                }
            },
            None => child.wait().await?,
        };

        if status.success() {
            Ok(Some(0))
        } else {
            Ok(Some(status.code().unwrap_or(-1)))
        }
    }
}

fn spawn_error(e: std::io::Error, not_found: MediaError) -> MediaError {
    if e.kind() == std::io::ErrorKind::NotFound {
        not_found
    } else {
        MediaError::Io(e)
    }
}

fn last_line(tail: &VecDeque<String>) -> Option<&str> {
    tail.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty())
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
