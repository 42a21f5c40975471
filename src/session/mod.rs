//! The capture session: device handle lifecycle, sink installation and the
//! shutdown protocol.
//!
//! Owner side calls (`select_device`, `start_capture`, `stop`) run one at a
//! time. A call checks the connection out of the control block, works on it
//! without holding any lock, and checks it back in when done. Native calls
//! and the wait for callbacks to drain happen outside of every lock, and the
//! read accessors only touch atomics, so a callback may query the session
//! at any time.
//!
//! `stop` marks the session stopped before closing anything, then waits for
//! every in-flight callback to leave. Once it returns, nothing can reach the
//! sink or the handle anymore.

mod context;
mod state;

pub use context::CaptureStats;
pub use state::SessionState;

use crate::{
    bridge::{NativeBridge, NativeHandle},
    devices::DeviceDirectory,
    midi::{EventFilter, MidiSink},
    MidiError, Result,
};
use context::{CaptureContext, Shared, SharedSink};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

pub struct CaptureSession {
    bridge: Arc<dyn NativeBridge>,
    directory: DeviceDirectory,
    shared: Arc<Shared>,
    control: Mutex<Control>,
    idle: Condvar,
}

#[derive(Default)]
struct Control {
    busy: bool,
    connection: Option<Connection>,
}

struct Connection {
    device: usize,
    context: Arc<CaptureContext>,
    handle: Box<dyn NativeHandle>,
}

impl Connection {
    /// Close the handle and wait for its callbacks to drain.
    fn disconnect(mut self) {
        let device = self.device;
        self.context.deactivate();

        if let Err(e) = self.handle.stop() {
            log::error!("[ MIDI ] : failed to stop device {device} : {e}");
        }
        self.context.quiesce();

        if let Err(e) = self.handle.close() {
            log::error!("[ MIDI ] : failed to close device {device} : {e}");
        }
        self.context.quiesce();

        log::trace!("[ MIDI ] : device {device} disconnected");
    }
}

/// Exclusive access to the connection for one owner call. The control
/// lock is not held while this lives.
struct Transition<'a> {
    session: &'a CaptureSession,
    connection: Option<Connection>,
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        let mut control = self.session.lock();
        control.connection = self.connection.take();
        control.busy = false;
        drop(control);
        self.session.idle.notify_all();
    }
}

impl CaptureSession {
    pub fn new(bridge: Arc<dyn NativeBridge>, filter: EventFilter) -> Self {
        Self {
            directory: DeviceDirectory::new(bridge.clone()),
            bridge,
            shared: Arc::new(Shared::new(filter)),
            control: Mutex::new(Control::default()),
            idle: Condvar::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.load()
    }

    pub fn is_capturing(&self) -> bool {
        self.state() == SessionState::Capturing
    }

    pub fn selected_device(&self) -> Option<usize> {
        self.shared.device.load()
    }

    pub fn filter(&self) -> &EventFilter {
        &self.shared.filter
    }

    pub fn stats(&self) -> CaptureStats {
        self.shared.counters.snapshot()
    }

    /// Open device `id`, closing any device opened before.
    ///
    /// An out of range `id` leaves the session untouched. A failed open
    /// leaves it `Idle`.
    pub fn select_device(&self, id: usize) -> Result<()> {
        let mut transition = self.begin();

        if self.state() == SessionState::Stopped {
            return Err(MidiError::SessionStopped);
        }

        let device = self.directory.validate(id)?;

        if let Some(previous) = transition.connection.take() {
            self.shared.state.store(SessionState::Idle);
            self.shared.device.clear();
            self.shared.sink.store(None);
            previous.disconnect();
        }

        let context = Arc::new(CaptureContext::new(id, self.shared.clone()));
        let handle = match self.bridge.open(id, context.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.state.store(SessionState::Idle);
                log::error!("[ MIDI ] : failed to open device {id} : {e}");
                return Err(e);
            }
        };

        transition.connection = Some(Connection {
            device: id,
            context,
            handle,
        });
        self.shared.device.store(id);
        self.shared.state.store(SessionState::DeviceSelected);

        log::info!("[ MIDI ] : device {id} selected : {}", device.name);
        Ok(())
    }

    /// Start delivering events into `sink`.
    ///
    /// Restarting an active capture drains callbacks bound to the previous
    /// sink before the new one is installed, so only one sink is ever live.
    pub fn start_capture(&self, sink: impl MidiSink + 'static) -> Result<()> {
        let mut transition = self.begin();

        match self.state() {
            SessionState::Idle => return Err(MidiError::NoDeviceSelected),
            SessionState::Stopped => return Err(MidiError::SessionStopped),
            SessionState::DeviceSelected | SessionState::Capturing => (),
        }

        let Some(connection) = transition.connection.as_mut() else {
            return Err(MidiError::NoDeviceSelected);
        };

        if self.state() == SessionState::Capturing {
            log::warn!("[ MIDI ] : capture already started; restarting it");
            self.shared.state.store(SessionState::DeviceSelected);
            if let Err(e) = connection.handle.stop() {
                log::error!("[ MIDI ] : failed to pause device {} : {e}", connection.device);
            }
            connection.context.quiesce();
        }

        self.shared
            .sink
            .store(Some(Arc::new(Box::new(sink) as SharedSink)));
        self.shared.state.store(SessionState::Capturing);

        if let Err(e) = connection.handle.start() {
            self.shared.state.store(SessionState::DeviceSelected);
            self.shared.sink.store(None);
            log::error!("[ MIDI ] : failed to start device {} : {e}", connection.device);
            return Err(e);
        }

        log::info!("[ MIDI ] : capture started on device {}", connection.device);
        Ok(())
    }

    /// Stop for good. Blocks until every callback has left.
    ///
    /// A second caller waits for the first to finish. Must not be called
    /// from inside a sink, the callback calling it would wait on itself.
    pub fn stop(&self) -> Result<()> {
        let mut transition = self.begin();

        if self.state() == SessionState::Stopped {
            return Ok(());
        }

        self.shared.state.store(SessionState::Stopped);
        self.shared.device.clear();

        if let Some(connection) = transition.connection.take() {
            connection.disconnect();
        }

        self.shared.sink.store(None);
        log::info!("[ MIDI ] : capture stopped");
        Ok(())
    }

    /// Wait for the running owner call, if any, then check the connection out.
    fn begin(&self) -> Transition<'_> {
        let mut control = self.lock();
        while control.busy {
            control = self
                .idle
                .wait(control)
                .unwrap_or_else(PoisonError::into_inner);
        }
        control.busy = true;

        Transition {
            connection: control.connection.take(),
            session: self,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
