//! Batch token swapping over a config directory
//!
//! Every occurrence of one token becomes the other and vice versa. The swap
//! goes through a placeholder: first -> placeholder, second -> first,
//! placeholder -> second. Replacing directly would turn the original second
//! tokens back into themselves.

use crate::error::SwapError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Reserved prefix for placeholders. Control characters keep it out of any
/// real config text.
const SENTINEL_PREFIX: &str = "\u{1}\u{2}";
const SENTINEL_SUFFIX: &str = "\u{3}";

/// Tries before giving up on finding an unused placeholder
const MAX_SENTINEL_ATTEMPTS: u32 = 64;

/// Two tokens that are always exchanged together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    first: String,
    second: String,
}

impl TokenPair {
    /// Tokens must be non-empty, distinct and neither may contain the other
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Result<Self, SwapError> {
        let first = first.into();
        let second = second.into();

        if first.is_empty() || second.is_empty() {
            return Err(SwapError::InvalidTokens("tokens must not be empty".to_string()));
        }
        if first.contains(&second) || second.contains(&first) {
            return Err(SwapError::InvalidTokens(format!(
                "{:?} and {:?} overlap",
                first, second
            )));
        }

        Ok(Self { first, second })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Number of occurrences of either token
    pub fn count_in(&self, content: &str) -> usize {
        content.matches(self.first.as_str()).count() + content.matches(self.second.as_str()).count()
    }

    fn sentinel_for(&self, content: &str) -> Option<String> {
        (0..MAX_SENTINEL_ATTEMPTS)
            .map(|n| format!("{}{}{}", SENTINEL_PREFIX, n, SENTINEL_SUFFIX))
            .find(|s| !content.contains(s.as_str()) && !s.contains(self.second.as_str()))
    }

    /// Exchange both tokens in `content`.
    ///
    /// Returns `None` (content unchanged) when no token occurs, otherwise the
    /// new text and the number of tokens swapped.
    pub fn swap_text(&self, content: &str) -> Result<Option<(String, usize)>, SwapError> {
        let count = self.count_in(content);
        if count == 0 {
            return Ok(None);
        }

        let sentinel = self
            .sentinel_for(content)
            .ok_or_else(|| SwapError::SentinelCollision(PathBuf::new()))?;

        let swapped = content
            .replace(self.first.as_str(), &sentinel)
            .replace(self.second.as_str(), &self.first)
            .replace(&sentinel, &self.second);

        Ok(Some((swapped, count)))
    }
}

/// Result for one file in a batch
#[derive(Debug)]
pub struct FileSwap {
    pub path: PathBuf,
    pub outcome: Result<usize, SwapError>,
}

impl FileSwap {
    /// Swaps that landed on disk, failed files count as 0
    pub fn swaps(&self) -> usize {
        *self.outcome.as_ref().unwrap_or(&0)
    }
}

/// Per-file results for a directory
#[derive(Debug, Default)]
pub struct SwapReport {
    pub files: Vec<FileSwap>,
}

impl SwapReport {
    pub fn total(&self) -> usize {
        self.files.iter().map(FileSwap::swaps).sum()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_err()).count()
    }
}

/// Swap tokens in a single file, writing it back only if something changed
pub fn swap_file(path: &Path, tokens: &TokenPair) -> Result<usize, SwapError> {
    swap_file_with(path, tokens, &mut write_file)
}

fn write_file(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)
}

/// Like [`swap_file`], with the write-back done by `write`.
///
/// The count is only returned once `write` succeeded, so a failed write
/// contributes nothing to a batch total.
pub fn swap_file_with<W>(path: &Path, tokens: &TokenPair, write: &mut W) -> Result<usize, SwapError>
where
    W: FnMut(&Path, &str) -> io::Result<()>,
{
    let content = fs::read_to_string(path).map_err(|source| SwapError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let swapped = tokens.swap_text(&content).map_err(|e| match e {
        SwapError::SentinelCollision(_) => SwapError::SentinelCollision(path.to_path_buf()),
        other => other,
    })?;

    let Some((new_content, count)) = swapped else {
        return Ok(0);
    };

    write(path, &new_content).map_err(|source| SwapError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(count)
}

/// Files in `dir` (not recursive) with the given extension, sorted
pub fn list_config_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, SwapError> {
    let entries = fs::read_dir(dir).map_err(|source| SwapError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == suffix))
        .collect();

    files.sort();
    Ok(files)
}

/// Swap tokens in every matching file of `dir`.
///
/// Files are processed one after another; a failing file is logged and
/// counted as 0 without stopping the rest of the batch.
pub fn swap_directory(dir: &Path, suffix: &str, tokens: &TokenPair) -> Result<SwapReport, SwapError> {
    swap_directory_with(dir, suffix, tokens, &mut write_file)
}

/// [`swap_directory`] with a custom write-back, see [`swap_file_with`]
pub fn swap_directory_with<W>(
    dir: &Path,
    suffix: &str,
    tokens: &TokenPair,
    write: &mut W,
) -> Result<SwapReport, SwapError>
where
    W: FnMut(&Path, &str) -> io::Result<()>,
{
    let files = list_config_files(dir, suffix)?;
    if files.is_empty() {
        info!("No .{} files found in {:?}", suffix, dir);
        return Ok(SwapReport::default());
    }

    let mut report = SwapReport::default();
    for path in files {
        let outcome = swap_file_with(&path, tokens, write);
        match &outcome {
            Ok(count) => info!("Swapped {} joystick codes in: {:?}", count, path),
            Err(e) => error!("Error processing {:?}: {}", path, e),
        }
        report.files.push(FileSwap { path, outcome });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair() -> TokenPair {
        TokenPair::new("JOYCODE_2_", "JOYCODE_3_").unwrap()
    }

    #[test]
    fn test_interleaved_tokens() {
        let tokens = TokenPair::new("A", "B").unwrap();
        let (out, count) = tokens.swap_text("A B A B").unwrap().unwrap();
        assert_eq!(out, "B A B A");
        assert_eq!(count, 4);
    }

    #[test]
    fn test_mame_sequence() {
        let (out, count) = pair()
            .swap_text("JOYCODE_2_BUTTON1 OR JOYCODE_3_YAXIS_UP_SWITCH")
            .unwrap()
            .unwrap();
        assert_eq!(out, "JOYCODE_3_BUTTON1 OR JOYCODE_2_YAXIS_UP_SWITCH");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_no_tokens_no_change() {
        assert!(pair().swap_text("KEYCODE_A KEYCODE_B").unwrap().is_none());
    }

    #[test]
    fn test_invalid_pairs() {
        assert!(TokenPair::new("", "B").is_err());
        assert!(TokenPair::new("A", "A").is_err());
        assert!(TokenPair::new("JOY", "JOYCODE").is_err());
    }

    #[test]
    fn test_sentinel_avoids_existing_placeholder_text() {
        let tokens = TokenPair::new("A", "B").unwrap();
        let placeholder = format!("{}0{}", SENTINEL_PREFIX, SENTINEL_SUFFIX);
        let content = format!("A {} B", placeholder);
        let (out, _) = tokens.swap_text(&content).unwrap().unwrap();
        assert_eq!(out, format!("B {} A", placeholder));
    }

    #[test]
    fn test_untouched_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacman.cfg");
        fs::write(&path, "<mameconfig/>").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(swap_file(&path, &pair()).unwrap(), 0);

        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_directory_skips_other_suffixes_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.cfg"), "JOYCODE_2_BUTTON1").unwrap();
        fs::write(dir.path().join("notes.txt"), "JOYCODE_2_BUTTON1").unwrap();
        fs::create_dir(dir.path().join("sub.cfg")).unwrap();
        fs::write(dir.path().join("sub.cfg").join("b.cfg"), "JOYCODE_2_").unwrap();

        let report = swap_directory(dir.path(), "cfg", &pair()).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.total(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "JOYCODE_2_BUTTON1"
        );
    }

    #[test]
    fn test_bad_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        // Not UTF-8, reading it as text fails
        fs::write(dir.path().join("a_corrupt.cfg"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        fs::write(dir.path().join("b_good.cfg"), "JOYCODE_2_A JOYCODE_3_B JOYCODE_3_C").unwrap();

        let report = swap_directory(dir.path(), "cfg", &pair()).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total(), 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("b_good.cfg")).unwrap(),
            "JOYCODE_3_A JOYCODE_2_B JOYCODE_2_C"
        );
    }

    #[test]
    fn test_failed_write_counts_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.cfg"), "JOYCODE_2_A JOYCODE_3_B").unwrap();
        fs::write(dir.path().join("b.cfg"), "JOYCODE_2_A JOYCODE_2_B JOYCODE_3_C").unwrap();

        let mut write = |path: &Path, content: &str| {
            if path.file_name().is_some_and(|name| name == "a.cfg") {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            fs::write(path, content)
        };
        let report = swap_directory_with(dir.path(), "cfg", &pair(), &mut write).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.files[0].outcome, Err(SwapError::Write { .. })));
        assert_eq!(report.files[0].swaps(), 0);
        assert_eq!(report.total(), 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.cfg")).unwrap(),
            "JOYCODE_2_A JOYCODE_3_B"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("b.cfg")).unwrap(),
            "JOYCODE_3_A JOYCODE_3_B JOYCODE_2_C"
        );
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let report = swap_directory(dir.path(), "cfg", &pair()).unwrap();
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(swap_directory(&dir.path().join("nope"), "cfg", &pair()).is_err());
    }

    proptest! {
        #[test]
        fn prop_swapping_twice_restores_text(content in "[A-Z_0-9 ]{0,64}") {
            let tokens = pair();
            let once = match tokens.swap_text(&content).unwrap() {
                Some((text, _)) => text,
                None => content.clone(),
            };
            let twice = match tokens.swap_text(&once).unwrap() {
                Some((text, _)) => text,
                None => once.clone(),
            };
            prop_assert_eq!(twice, content);
        }
    }
}
