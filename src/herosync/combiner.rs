//! Joining chapter files into one video.

use crate::error::{HerosyncError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub trait Combiner {
    /// Writes `inputs`, in order, into the single file `output`.
    fn combine(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// Lossless concatenation with ffmpeg's concat demuxer.
pub struct FfmpegCombiner {
    program: PathBuf,
}

impl Default for FfmpegCombiner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegCombiner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Body of an ffmpeg concat list.
pub fn concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| format!("file '{}'\n", path.display().to_string().replace('\'', r"'\''")))
        .collect()
}

impl Combiner for FfmpegCombiner {
    fn combine(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        // Never in the output directory: anything there is scanned as a finished video.
        let mut list = tempfile::Builder::new()
            .prefix("herosync-concat-")
            .suffix(".txt")
            .tempfile()?;
        list.write_all(concat_list(inputs).as_bytes())?;
        list.flush()?;

        debug!(program = %self.program.display(), output = %output.display(), list = %list.path().display(), "running ffmpeg");
        let result = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(list.path())
            .args(["-c", "copy"])
            .arg(output)
            .output();
        drop(list);

        let run = result.map_err(|e| {
            HerosyncError::Combine(format!("could not run {}: {}", self.program.display(), e))
        })?;
        if !run.status.success() {
            let _ = fs::remove_file(output);
            return Err(HerosyncError::Combine(format!(
                "ffmpeg exited with {}: {}",
                run.status,
                String::from_utf8_lossy(&run.stderr).trim()
            )));
        }
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Appends the raw bytes of every input; good enough for size checks.
    #[derive(Default)]
    pub struct ByteConcatCombiner;

    impl Combiner for ByteConcatCombiner {
        fn combine(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
            let mut out = fs::File::create(output)?;
            for input in inputs {
                out.write_all(&fs::read(input)?)?;
            }
            Ok(())
        }
    }

    /// Always fails.
    #[derive(Default)]
    pub struct FailingCombiner;

    impl Combiner for FailingCombiner {
        fn combine(&self, _inputs: &[PathBuf], _output: &Path) -> Result<()> {
            Err(HerosyncError::Combine("ffmpeg exited with exit status: 1".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_list_quotes_paths() {
        let list = concat_list(&[
            PathBuf::from("/media/incoming/GH010007.MP4"),
            PathBuf::from("/media/it's here/GH020007.MP4"),
        ]);
        assert_eq!(
            list,
            "file '/media/incoming/GH010007.MP4'\nfile '/media/it'\\''s here/GH020007.MP4'\n"
        );
    }

    #[test]
    fn missing_program_is_a_combine_error_and_leaves_output_dir_clean() {
        let temp = tempfile::tempdir().unwrap();
        let combiner = FfmpegCombiner::new(temp.path().join("no-such-ffmpeg"));

        let err = combiner
            .combine(&[temp.path().join("a.mp4")], &temp.path().join("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, HerosyncError::Combine(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
