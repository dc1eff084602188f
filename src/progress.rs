//! Progress bars for long ingestions, and a tracing writer that prints above them.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static BARS: OnceLock<MultiProgress> = OnceLock::new();

fn bars() -> &'static MultiProgress {
    BARS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Bar counting stored records during an ingestion
pub fn record_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = bars().add(ProgressBar::new(total));
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} records ({eta})")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message(label.to_string());
    pb
}

/// `MakeWriter` for the fmt layer; log lines are routed through the shared
/// `MultiProgress` so active bars are redrawn below them.
#[derive(Default, Clone)]
pub struct PinnedLogWriter;

pub struct PinnedLines {
    pending: String,
}

impl PinnedLines {
    fn emit(line: &str) {
        let _ = bars().println(line.trim_end_matches('\r'));
    }
}

impl Write for PinnedLines {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));

        while let Some(end) = self.pending.find('\n') {
            Self::emit(&self.pending[..end]);
            self.pending.drain(..=end);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            Self::emit(&self.pending);
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for PinnedLines {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for PinnedLogWriter {
    type Writer = PinnedLines;

    fn make_writer(&'a self) -> Self::Writer {
        PinnedLines {
            pending: String::new(),
        }
    }
}
