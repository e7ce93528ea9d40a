//! Media resolution
//!
//! Turns user queries into track references and track references into
//! downloaded audio files. The controller and the HTTP layer only know
//! the `MediaResolver` trait; the bundled implementation shells out to
//! yt-dlp.

use crate::error::{Error, Result};
use async_trait::async_trait;
use mbx_common::Track;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Resolves queries into tracks and tracks into playable audio files
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve a query or URL into one or more track references
    ///
    /// Plain text is treated as a search (first hit), a watch URL as a
    /// single video, a playlist URL as its expansion. Anything else fails
    /// with `Resolution`.
    async fn resolve(&self, query: &str) -> Result<Vec<Track>>;

    /// Download the best audio for `source_url` into `storage_dir`,
    /// returning the local file path
    ///
    /// May fail with `Resolution` (source no longer resolvable) or
    /// `Network` (download failure). Failures propagate; the caller
    /// decides whether to retry or abandon, never auto-skip.
    async fn fetch_audio(&self, source_url: &str, storage_dir: &Path) -> Result<PathBuf>;
}

/// How a query string should be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    /// Free-text search, take the first hit
    Search,
    /// Single video watch URL
    Video,
    /// Playlist URL, expand to all entries
    Playlist,
}

/// Classify a raw user query
fn classify_query(query: &str) -> Result<QueryKind> {
    if !query.contains("https://") {
        return Ok(QueryKind::Search);
    }
    if query.contains("watch") {
        return Ok(QueryKind::Video);
    }
    if query.contains("playlist") {
        return Ok(QueryKind::Playlist);
    }
    Err(Error::Resolution(format!("unsupported URL: {}", query)))
}

/// Build a Track from one yt-dlp JSON object
///
/// Works for both full `--dump-json` output and `--flat-playlist`
/// entries, which carry a reduced field set.
fn track_from_json(value: &serde_json::Value) -> Option<Track> {
    let title = value["title"].as_str()?.to_string();

    let author = value["uploader"]
        .as_str()
        .or_else(|| value["channel"].as_str())
        .unwrap_or("Unknown")
        .to_string();

    let source_url = value["webpage_url"]
        .as_str()
        .or_else(|| value["url"].as_str())
        .map(str::to_string)
        .or_else(|| {
            value["id"]
                .as_str()
                .map(|id| format!("https://www.youtube.com/watch?v={}", id))
        })?;

    Some(Track {
        title,
        author,
        source_url,
    })
}

/// Parse newline-delimited yt-dlp JSON output into tracks
fn tracks_from_json_lines(stdout: &str) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| Error::Resolution(format!("bad yt-dlp output: {}", e)))?;
        if let Some(track) = track_from_json(&value) {
            tracks.push(track);
        }
    }
    if tracks.is_empty() {
        return Err(Error::Resolution("no playable results".to_string()));
    }
    Ok(tracks)
}

/// Media resolver backed by a yt-dlp subprocess
pub struct YtDlpResolver {
    program: String,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }

    /// Run yt-dlp with `args`, returning trimmed stdout
    async fn run(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} failed: {}", self.program, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Vec<Track>> {
        let kind = classify_query(query)?;
        debug!("Resolving {:?} query: {}", kind, query);

        let stdout = match kind {
            QueryKind::Search => {
                let target = format!("ytsearch1:{}", query);
                self.run(&["--dump-json", "--skip-download", "--no-playlist", &target])
                    .await
            }
            QueryKind::Video => {
                self.run(&["--dump-json", "--skip-download", "--no-playlist", query])
                    .await
            }
            QueryKind::Playlist => {
                self.run(&["--dump-json", "--flat-playlist", "--skip-download", query])
                    .await
            }
        }
        .map_err(Error::Resolution)?;

        tracks_from_json_lines(&stdout)
    }

    async fn fetch_audio(&self, source_url: &str, storage_dir: &Path) -> Result<PathBuf> {
        let template = storage_dir.join("%(id)s.%(ext)s");
        let template = template.to_string_lossy().to_string();

        let stdout = self
            .run(&[
                "-f",
                "bestaudio",
                "--no-playlist",
                "--no-simulate",
                "--print",
                "after_move:filepath",
                "-o",
                &template,
                source_url,
            ])
            .await
            .map_err(Error::Network)?;

        // yt-dlp prints the final file path as the last line
        let path = stdout
            .lines()
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Network("download produced no file path".to_string()))?;

        debug!("Downloaded {} to {}", source_url, path.display());
        Ok(path)
    }
}
