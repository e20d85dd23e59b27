use crate::event::ReportEvent;
use crate::eventbus::ReportListener;

/// Wraps a listener and filters reports based on a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&ReportEvent<'_>) -> bool>,
    inner: Box<dyn ReportListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&ReportEvent<'_>) -> bool + 'static,
        inner: impl ReportListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl ReportListener for FilteredListener {
    fn on_report(&mut self, event: &ReportEvent<'_>) {
        if (self.predicate)(event) {
            self.inner.on_report(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodedReport, Delivery};
    use crate::device::DeviceHandle;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn forwards_only_matching_reports() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let mut l = FilteredListener::new(
            |e| e.report().first() == Some(&0x01),
            move |_: &ReportEvent<'_>| h.set(h.get() + 1),
        );

        let r = DecodedReport {
            device: DeviceHandle(1),
            delivery: Delivery::Foreground,
            unit_size: 1,
            unit_count: 1,
            copied: 1,
        };
        l.on_report(&ReportEvent::new(&r, &[0x01]));
        l.on_report(&ReportEvent::new(&r, &[0x02]));
        assert_eq!(hits.get(), 1);
    }
}
