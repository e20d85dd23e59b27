use crate::decoder::Delivery;
use crate::device::DeviceHandle;
use crate::event::ReportEvent;
use std::collections::BTreeMap;

/// Observer of decoded reports (`OnReportDecoded`).
///
/// Called on the message thread, synchronously, once per successful decode.
pub trait ReportListener {
    fn on_report(&mut self, event: &ReportEvent<'_>);
}

impl<F> ReportListener for F
where
    F: FnMut(&ReportEvent<'_>),
{
    fn on_report(&mut self, event: &ReportEvent<'_>) {
        self(event)
    }
}

/// Determines which reports a listener wants to receive.
#[derive(Clone, Copy)]
pub enum EventFilter {
    All,
    ForegroundOnly,
    BackgroundOnly,
    Custom(fn(&ReportEvent<'_>) -> bool),
}

impl EventFilter {
    fn passes(&self, event: &ReportEvent<'_>) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::ForegroundOnly => event.delivery == Delivery::Foreground,
            EventFilter::BackgroundOnly => event.delivery == Delivery::Background,
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn ReportListener>,
    enabled: bool,
    filter: EventFilter,
    device: Option<DeviceHandle>,
}

/// Fan-out of decoded reports to registered listeners, in registration order.
#[derive(Default)]
pub struct ReportBus {
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
}

impl ReportBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with a filter and an optional device tag.
    ///
    /// A tagged listener only sees reports from that device handle.
    pub fn add_listener(
        &mut self,
        listener: impl ReportListener + 'static,
        filter: EventFilter,
        device: Option<DeviceHandle>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                device,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely.
    pub fn remove_listener(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Emits one report to all active and matching listeners.
    pub fn emit(&mut self, event: &ReportEvent<'_>) {
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }
            if let Some(wanted) = entry.device {
                if event.device != wanted {
                    continue;
                }
            }
            if entry.filter.passes(event) {
                entry.listener.on_report(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedReport;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn report(device: usize, delivery: Delivery) -> DecodedReport {
        DecodedReport {
            device: DeviceHandle(device),
            delivery,
            unit_size: 2,
            unit_count: 1,
            copied: 2,
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<Vec<u8>>>>, impl ReportListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |e: &ReportEvent<'_>| sink.borrow_mut().push(e.report().to_vec()))
    }

    #[test]
    fn tagged_listener_only_sees_its_device() {
        let mut bus = ReportBus::new();
        let (all, l1) = recorder();
        let (tagged, l2) = recorder();
        bus.add_listener(l1, EventFilter::All, None);
        bus.add_listener(l2, EventFilter::All, Some(DeviceHandle(2)));

        let buf = [1u8, 2, 3];
        bus.emit(&ReportEvent::new(&report(1, Delivery::Foreground), &buf));
        bus.emit(&ReportEvent::new(&report(2, Delivery::Foreground), &buf));

        assert_eq!(all.borrow().len(), 2);
        assert_eq!(tagged.borrow().len(), 1);
        assert_eq!(tagged.borrow()[0], vec![1, 2]);
    }

    #[test]
    fn disabled_listener_is_muted_until_enabled() {
        let mut bus = ReportBus::new();
        let (seen, l) = recorder();
        let id = bus.add_listener(l, EventFilter::All, None);
        let buf = [0u8; 2];
        let r = report(1, Delivery::Foreground);

        bus.disable(id);
        bus.emit(&ReportEvent::new(&r, &buf));
        assert!(seen.borrow().is_empty());

        bus.enable(id);
        bus.emit(&ReportEvent::new(&r, &buf));
        assert_eq!(seen.borrow().len(), 1);

        assert!(bus.remove_listener(id));
        assert!(bus.is_empty());
    }

    #[test]
    fn delivery_filters() {
        let mut bus = ReportBus::new();
        let (bg, l) = recorder();
        bus.add_listener(l, EventFilter::BackgroundOnly, None);
        let buf = [0u8; 2];
        bus.emit(&ReportEvent::new(&report(1, Delivery::Foreground), &buf));
        bus.emit(&ReportEvent::new(&report(1, Delivery::Background), &buf));
        assert_eq!(bg.borrow().len(), 1);
    }
}
