use crate::event::ReportEvent;
use crate::eventbus::ReportListener;
use log::Level;

/// A simple listener that logs every decoded report.
pub struct LogListener {
    level: Level,
}

impl LogListener {
    pub fn new() -> Self {
        Self {
            level: Level::Debug,
        }
    }

    pub fn with_level(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LogListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportListener for LogListener {
    fn on_report(&mut self, event: &ReportEvent<'_>) {
        if !log::log_enabled!(self.level) {
            return;
        }
        log::log!(
            self.level,
            "[report] dev={} {:?} {}x{} {:02x?}{}",
            event.device,
            event.delivery,
            event.unit_size,
            event.unit_count,
            event.report(),
            if event.truncated() { " (truncated)" } else { "" }
        );
    }
}
