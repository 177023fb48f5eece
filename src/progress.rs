use indicatif::{ProgressBar, ProgressStyle};
use shoebox_library::pipeline::{PipelineEvent, Reporter};
use shoebox_library::place::Action;

const TEMPLATE: &str = "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {wide_msg}";

/// Draws a progress bar on stderr while a run is going.
///
/// With `list` set, every placement is also printed as
/// `source -> destination`, which is what a dry run is for.
pub struct ProgressReporter {
    bar: ProgressBar,
    list: bool,
}
impl ProgressReporter {
    pub fn new(list: bool) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), list)
    }

    fn with_bar(bar: ProgressBar, list: bool) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("=> "));
        Self { bar, list }
    }
}

impl Reporter for ProgressReporter {
    fn report(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started => self.bar.set_message("scanning"),
            PipelineEvent::DiscoveryComplete(total) => {
                self.bar.set_length(*total);
                self.bar.set_message("placing");
            },
            PipelineEvent::Placed(placement) => {
                self.bar.inc(1);
                let destination = placement.action.destination().display().to_string();
                if self.list {
                    let note = match placement.action {
                        Action::Copied(_) => "",
                        Action::Overwrote(_) => " (overwrite)",
                        Action::Renamed(_) => " (renamed)",
                        Action::Skipped(_) => " (skip)",
                        Action::AlreadyCorrect(_) => " (in place)",
                    };
                    self.bar.println(format!("{} -> {destination}{note}", placement.source.display()));
                }
                self.bar.set_message(destination);
            },
            PipelineEvent::Complete(_) => self.bar.finish_and_clear(),
        }
    }
}
