//! CLI progress bars for the fetch pass.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const PREFIX_WIDTH: usize = 28;

struct Bars {
    mp: MultiProgress,
    files_bar: ProgressBar,
}

/// Draws an overall files bar plus one transient byte bar per transfer.
/// With bars disabled every call is a no-op, so the fetcher never branches.
pub(crate) struct ProgressReporter {
    bars: Option<Bars>,
}

impl ProgressReporter {
    /// Adds a byte bar for one file; `total` missing (chunked replies) gets a
    /// spinner instead.
    pub(crate) fn start_file(
        &self,
        name: &str,
        position: u64,
        total: Option<u64>,
    ) -> Option<ProgressBar> {
        let bars = self.bars.as_ref()?;
        let bar = match total {
            Some(len) => {
                let style = ProgressStyle::with_template(
                    "{prefix} {wide_bar} {percent:>3}% ({bytes}/{total_bytes})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
                let bar = bars.mp.add(ProgressBar::new(len));
                bar.set_style(style);
                bar
            }
            None => {
                let style = ProgressStyle::with_template("{prefix} {spinner} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                let bar = bars.mp.add(ProgressBar::new_spinner());
                bar.set_style(style);
                bar
            }
        };
        bar.set_prefix(short_prefix(name));
        bar.set_position(position);
        Some(bar)
    }

    pub(crate) fn finish_file(&self, bar: Option<ProgressBar>) {
        let Some(bar) = bar else {
            return;
        };
        bar.finish_and_clear();
        if let Some(bars) = self.bars.as_ref() {
            bars.mp.remove(&bar);
        }
    }

    pub(crate) fn file_done(&self) {
        if let Some(bars) = self.bars.as_ref() {
            bars.files_bar.inc(1);
        }
    }

    pub(crate) fn finish(&mut self) {
        let Some(bars) = self.bars.take() else {
            return;
        };
        bars.files_bar.finish_and_clear();
        drop(bars);
    }
}

pub(crate) fn make_reporter(total_files: usize, enabled: bool) -> ProgressReporter {
    if !enabled || total_files == 0 {
        return ProgressReporter { bars: None };
    }

    let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
    let style =
        ProgressStyle::with_template("{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

    let files_bar = mp.add(ProgressBar::new(total_files as u64));
    files_bar.set_style(style);
    files_bar.set_prefix("files");

    ProgressReporter {
        bars: Some(Bars { mp, files_bar }),
    }
}

fn short_prefix(name: &str) -> String {
    if name.chars().count() <= PREFIX_WIDTH {
        return name.to_string();
    }
    let mut out: String = name.chars().take(PREFIX_WIDTH - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prefix_keeps_small_names() {
        assert_eq!(short_prefix("a.pdf"), "a.pdf");
    }

    #[test]
    fn short_prefix_truncates_on_char_boundaries() {
        let long = "очень_длинное_имя_файла_которое_не_влезает.pdf";
        let short = short_prefix(long);
        assert_eq!(short.chars().count(), PREFIX_WIDTH);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn disabled_reporter_is_inert() {
        let mut reporter = make_reporter(5, false);
        let bar = reporter.start_file("a.pdf", 0, Some(10));
        assert!(bar.is_none());
        reporter.finish_file(bar);
        reporter.file_done();
        reporter.finish();
    }
}
