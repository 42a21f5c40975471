use crate::{
    bridge::{Backend, DeviceDescriptor, NativeBridge},
    devices::DeviceDirectory,
    midi::{EventFilter, MidiSink},
    session::{CaptureSession, CaptureStats, SessionState},
    Result,
};
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_CLIENT_NAME: &str = "midicap";

/// Applied once when the client is built.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    log_level: Option<log::LevelFilter>,
    filter: EventFilter,
    client_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            log_level: None,
            filter: EventFilter::allow_all(),
            client_name: DEFAULT_CLIENT_NAME.to_owned(),
        }
    }
}

impl ClientOptions {
    pub fn with_log_level(mut self, level: log::LevelFilter) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

/// List devices, pick one and capture its events into a bounded sink.
///
/// ```no_run
/// use midicap::{ClientOptions, MidiClient, MidiEvent};
///
/// let client = MidiClient::new(ClientOptions::default());
/// for (id, device) in client.list_devices()?.iter().enumerate() {
///     println!("{id} : {}", device.name);
/// }
///
/// let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(512);
/// client.select_device(0)?;
/// client.start_capture(sender);
/// let _event = receiver.recv();
/// client.stop();
/// # Ok::<(), midicap::MidiError>(())
/// ```
pub struct MidiClient {
    bridge: Arc<dyn NativeBridge>,
    directory: DeviceDirectory,
    filter: EventFilter,
    session: Mutex<Arc<CaptureSession>>,
}

impl MidiClient {
    pub fn new(options: ClientOptions) -> Self {
        if let Some(level) = options.log_level {
            log::set_max_level(level);
        }
        let backend = Backend::select(&options.client_name);
        Self::with_bridge(options, Arc::new(backend))
    }

    pub fn with_bridge(options: ClientOptions, bridge: Arc<dyn NativeBridge>) -> Self {
        log::trace!(
            "[ MIDI ] : client {} on {} backend",
            options.client_name,
            bridge.name()
        );

        Self {
            directory: DeviceDirectory::new(bridge.clone()),
            session: Mutex::new(Arc::new(CaptureSession::new(
                bridge.clone(),
                options.filter.clone(),
            ))),
            filter: options.filter,
            bridge,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.bridge.name()
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        self.directory.list()
    }

    /// Open device `id`. A stopped client gets a fresh session.
    pub fn select_device(&self, id: usize) -> Result<()> {
        let session = {
            let mut session = self.lock();
            if session.state() == SessionState::Stopped {
                log::debug!("[ MIDI ] : replacing stopped session");
                *session = Arc::new(CaptureSession::new(
                    self.bridge.clone(),
                    self.filter.clone(),
                ));
            }
            session.clone()
        };

        session.select_device(id)
    }

    /// Errors are logged, never returned.
    pub fn start_capture(&self, sink: impl MidiSink + 'static) {
        match self.session().start_capture(sink) {
            Ok(()) => (),
            Err(e) if e.is_native() => log::error!("[ MIDI ] : failed to start capture : {e}"),
            Err(e) => log::warn!("[ MIDI ] : cannot start capture : {e}"),
        }
    }

    pub fn stop(&self) {
        if let Err(e) = self.session().stop() {
            log::error!("[ MIDI ] : failed to stop capture : {e}");
        }
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn selected_device(&self) -> Option<usize> {
        self.session().selected_device()
    }

    pub fn stats(&self) -> CaptureStats {
        self.session().stats()
    }

    fn session(&self) -> Arc<CaptureSession> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<CaptureSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        bridge::fake::FakeBridge,
        midi::{MidiCommand, MidiEvent},
        MidiError,
    };
    use std::sync::atomic::Ordering;

    fn client(devices: &[&str]) -> (Arc<FakeBridge>, MidiClient) {
        client_with(devices, ClientOptions::default())
    }

    fn client_with(devices: &[&str], options: ClientOptions) -> (Arc<FakeBridge>, MidiClient) {
        let bridge = Arc::new(FakeBridge::with_devices(devices));
        (bridge.clone(), MidiClient::with_bridge(options, bridge))
    }

    #[test]
    fn options_default_to_allowing_everything() {
        let options = ClientOptions::default();
        assert_eq!(options.client_name(), DEFAULT_CLIENT_NAME);
        assert!(options.filter.is_empty());
        assert_eq!(options.log_level, None);

        let options = options
            .with_client_name("studio")
            .with_filter(EventFilter::new([MidiCommand::NoteOn]))
            .with_log_level(log::LevelFilter::Warn);
        assert_eq!(options.client_name(), "studio");
        assert_eq!(options.filter.commands(), [MidiCommand::NoteOn]);
        assert_eq!(options.log_level, Some(log::LevelFilter::Warn));
    }

    #[test_log::test]
    fn capture_end_to_end() {
        let (bridge, client) = client(&["keys", "pads"]);
        assert_eq!(client.backend_name(), "fake");
        assert_eq!(client.list_devices().unwrap().len(), 2);

        client.select_device(1).unwrap();
        assert_eq!(client.state(), SessionState::DeviceSelected);
        assert_eq!(client.selected_device(), Some(1));

        let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(16);
        client.start_capture(sender);
        assert_eq!(client.state(), SessionState::Capturing);

        let endpoint = bridge.last_endpoint();
        assert_eq!(endpoint.index, 1);
        endpoint.fire(&[0x90, 0x3C, 0x64], 1_700_000_000_000_000_000, false);

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.command, 0x90);
        assert_eq!(event.note, 60);
        assert_eq!(event.velocity, 100);
        assert_ne!(event.timestamp, 0);

        client.stop();
        assert_eq!(client.state(), SessionState::Stopped);

        endpoint.fire(&[0x90, 0x3C, 0x64], 1, true);
        assert!(receiver.try_recv().is_err());
        assert_eq!(client.stats().delivered, 1);
    }

    #[test]
    fn starting_without_a_device_is_only_logged() {
        let (_, client) = client(&["keys"]);
        let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(1);
        client.start_capture(sender);
        assert_eq!(client.state(), SessionState::Idle);
        assert!(receiver.is_empty());
    }

    #[test]
    fn stop_always_succeeds() {
        let (bridge, client) = client(&["keys"]);
        client.stop();
        client.stop();

        client.select_device(0).unwrap();
        client.stop();
        client.stop();
        assert_eq!(bridge.last_endpoint().closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn a_stopped_client_can_select_again() {
        let (bridge, client) = client(&["keys"]);
        client.select_device(0).unwrap();
        client.start_capture(crossbeam::channel::bounded::<MidiEvent>(1).0);
        client.stop();

        client.select_device(0).unwrap();
        assert_eq!(client.state(), SessionState::DeviceSelected);
        assert_eq!(bridge.endpoints().len(), 2);
        assert_eq!(bridge.live_handles(), 1);
        assert_eq!(client.stats().delivered, 0);
    }

    #[test]
    fn the_filter_applies_to_every_session() {
        let options = ClientOptions::default().with_filter(EventFilter::new([MidiCommand::NoteOn]));
        let (bridge, client) = client_with(&["keys"], options);

        for _ in 0..2 {
            let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(4);
            client.select_device(0).unwrap();
            client.start_capture(sender);

            let endpoint = bridge.last_endpoint();
            endpoint.fire(&[0x80, 60, 0], 1, false);
            endpoint.fire(&[0x91, 60, 90], 2, false);

            assert_eq!(receiver.len(), 1);
            assert_eq!(receiver.try_recv().unwrap().command, 0x91);
            client.stop();
        }
    }

    #[test]
    fn errors_from_selection_are_returned() {
        let (bridge, client) = client(&["keys"]);
        assert_eq!(
            client.select_device(1),
            Err(MidiError::InvalidDevice { id: 1, count: 1 })
        );

        bridge.fail_next_open(MidiError::OpenInputPort("busy".into()));
        assert_eq!(
            client.select_device(0),
            Err(MidiError::OpenInputPort("busy".into()))
        );
        assert_eq!(client.state(), SessionState::Idle);
    }
}
