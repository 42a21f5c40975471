use super::state::{AtomicDevice, AtomicState, SessionState};
use crate::{
    bridge::InputHandler,
    midi::{EventFilter, MidiEvent, MidiSink, SinkError},
};
use arc_swap::ArcSwapOption;
use crossbeam::utils::Backoff;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

pub(crate) type SharedSink = Box<dyn MidiSink>;

/// State shared between a session and every connection it opened.
pub(crate) struct Shared {
    pub state: AtomicState,
    pub device: AtomicDevice,
    pub sink: ArcSwapOption<SharedSink>,
    pub filter: EventFilter,
    pub counters: Counters,
}

impl Shared {
    pub fn new(filter: EventFilter) -> Self {
        Self {
            state: AtomicState::new(SessionState::Idle),
            device: AtomicDevice::empty(),
            sink: ArcSwapOption::empty(),
            filter,
            counters: Counters::default(),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub delivered: u64,
    pub filtered: u64,
    pub dropped: u64,
    pub incomplete: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    delivered: AtomicU64,
    filtered: AtomicU64,
    dropped: AtomicU64,
    incomplete: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            incomplete: self.incomplete.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The context handed to the bridge when a device is opened.
///
/// Callbacks for that device only ever see this context, never "the current
/// device" of the session.
pub(crate) struct CaptureContext {
    device: usize,
    shared: Arc<Shared>,
    active: AtomicBool,
    in_flight: AtomicUsize,
}

impl CaptureContext {
    pub fn new(device: usize, shared: Arc<Shared>) -> Self {
        Self {
            device,
            shared,
            active: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Stop accepting callbacks. Ones already past the check still need
    /// [`CaptureContext::quiesce`].
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Block until no callback is running for this device.
    pub fn quiesce(&self) {
        let backoff = Backoff::new();
        while self.in_flight() > 0 {
            if backoff.is_completed() {
                std::thread::sleep(Duration::from_micros(50));
            } else {
                backoff.snooze();
            }
        }
    }

    fn accepts(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.shared.state.load() == SessionState::Capturing
    }

    fn deliver(&self, bytes: &[u8], now_nanos: u64) {
        let counters = &self.shared.counters;

        let event = match MidiEvent::decode(bytes, now_nanos) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("[ MIDI ] : {e} from device {}", self.device);
                Counters::bump(&counters.incomplete);
                return;
            }
        };

        if !self.shared.filter.allows(event.command) {
            log::trace!("[ MIDI ] : command 0x{:X} filtered out", event.status_nibble());
            Counters::bump(&counters.filtered);
            return;
        }

        describe(&event);

        let sink = self.shared.sink.load();
        let Some(sink) = sink.as_ref() else {
            return;
        };

        match sink.try_push(event) {
            Ok(()) => Counters::bump(&counters.delivered),
            Err(SinkError::Full) => {
                log::warn!("[ MIDI ] : event buffer full; dropping MIDI event");
                Counters::bump(&counters.dropped);
            }
            Err(SinkError::Disconnected) => {
                log::warn!("[ MIDI ] : event buffer disconnected; dropping MIDI event");
                Counters::bump(&counters.dropped);
            }
        }
    }
}

impl InputHandler for CaptureContext {
    fn on_data(&self, bytes: &[u8], now_nanos: u64) {
        let _guard = InFlight::enter(&self.in_flight);

        if self.accepts() {
            self.deliver(bytes, now_nanos);
        }
    }
}

fn describe(event: &MidiEvent) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let channel = event.channel() + 1;
    if event.is_note_off() {
        log::debug!("[ MIDI ] : note off : channel {channel}, note {}", event.note);
    } else if event.is_note_on() {
        log::debug!(
            "[ MIDI ] : note on : channel {channel}, note {}, velocity {}",
            event.note,
            event.velocity
        );
    }
}

/// Counts a running callback for as long as it lives, whichever way the
/// callback returns.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
