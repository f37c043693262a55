//! Transfer progress for downloads and uploads.
//!
//! Bytes are counted by an `indicatif` bar wrapped around the reader. The
//! bar is never drawn, since stderr belongs to the log output; instead its
//! position and rate are logged at most once per [`REPORT_INTERVAL`].

use indicatif::{DecimalBytes, ProgressBar, ProgressBarIter, ProgressDrawTarget};
use std::io::{self, Read};
use std::time::{Duration, Instant};
use tracing::info;

pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

pub struct ProgressReader<R> {
    inner: ProgressBarIter<R>,
    bar: ProgressBar,
    action: &'static str,
    filename: String,
    interval: Duration,
    last_report: Instant,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, action: &'static str, filename: impl Into<String>, total: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
        Self {
            inner: bar.wrap_read(inner),
            bar,
            action,
            filename: filename.into(),
            interval: REPORT_INTERVAL,
            last_report: Instant::now(),
        }
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn bytes_read(&self) -> u64 {
        self.bar.position()
    }

    /// Share of the expected total read so far, in percent.
    pub fn percent(&self) -> f64 {
        match self.bar.length() {
            Some(total) if total > 0 => self.bar.position() as f64 / total as f64 * 100.0,
            _ => 100.0,
        }
    }

    fn report(&self) {
        let written = self.bar.position();
        let total = self.bar.length().unwrap_or(written);
        info!(
            filename = %self.filename,
            written,
            total,
            progress = %format!("{:.2}%", self.percent()),
            rate = %format!("{}/s", DecimalBytes(self.bar.per_sec() as u64)),
            "{} progress: {} of {}",
            self.action,
            DecimalBytes(written),
            DecimalBytes(total)
        );
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.last_report.elapsed() >= self.interval {
            self.report();
            self.last_report = Instant::now();
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn passes_bytes_through_and_counts_them() {
        let mut reader = ProgressReader::new(Cursor::new(vec![7u8; 4096]), "download", "GH010007.MP4", 4096);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![7u8; 4096]);
        assert_eq!(reader.bytes_read(), 4096);
        assert_eq!(reader.percent(), 100.0);
    }

    #[test]
    fn percent_tracks_partial_reads() {
        let mut reader =
            ProgressReader::new(Cursor::new(vec![0u8; 1000]), "upload", "gopro-0007.mp4", 4000).with_interval(Duration::ZERO);
        let mut buf = [0u8; 1000];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.bytes_read(), 1000);
        assert_eq!(reader.percent(), 25.0);
    }

    #[test]
    fn empty_transfer_counts_as_complete() {
        let reader = ProgressReader::new(Cursor::new(Vec::new()), "download", "GH010007.MP4", 0);
        assert_eq!(reader.percent(), 100.0);
    }
}
