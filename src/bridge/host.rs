use super::*;
use crate::MidiError;
use crossbeam::channel::{Receiver, Sender};
use midir::{MidiInput, MidiInputConnection};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread::JoinHandle,
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostApi {
    CoreMidi,
    WinMm,
}

/// Adapter over the host MIDI service exposed by `midir`.
pub struct HostBridge {
    client_name: String,
    api: HostApi,
}

impl HostBridge {
    pub fn new(client_name: &str, api: HostApi) -> Self {
        Self {
            client_name: client_name.to_owned(),
            api,
        }
    }
}

impl NativeBridge for HostBridge {
    fn name(&self) -> &'static str {
        match self.api {
            HostApi::CoreMidi => "coremidi",
            HostApi::WinMm => "winmm",
        }
    }

    /// Read straight from the platform service, which exposes the
    /// entity and manufacturer metadata `midir` leaves out. Indices match
    /// the `midir` port order used by `open`.
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        let devices = native_devices();
        log::trace!("[ MIDI ] : {} {} sources", devices.len(), self.name());
        Ok(devices)
    }

    fn open(
        &self,
        index: usize,
        handler: Arc<dyn InputHandler>,
    ) -> Result<Box<dyn NativeHandle>> {
        let gate = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam::channel::bounded::<Result<()>>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded::<()>(1);

        let thread = {
            let client_name = self.client_name.clone();
            let gate = gate.clone();

            std::thread::Builder::new()
                .name(format!("midicap-input-{index}"))
                .spawn(move || {
                    hold_connection(client_name, index, gate, handler, ready_tx, shutdown_rx)
                })
                .map_err(|e| MidiError::OpenInputPort(e.to_string()))?
        };

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(MidiError::OpenInputPort("input thread exited".into())));

        if let Err(e) = opened {
            if thread.join().is_err() {
                log::error!("[ MIDI ] : failed to join input thread for device {index}");
            }
            return Err(e);
        }

        Ok(Box::new(HostHandle {
            index,
            gate,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }))
    }
}

#[cfg(target_os = "macos")]
fn native_devices() -> Vec<DeviceDescriptor> {
    super::coremidi::sources()
}

#[cfg(target_os = "windows")]
fn native_devices() -> Vec<DeviceDescriptor> {
    super::winmm::inputs()
}

/// Owns the `midir` connection on its own thread, which keeps the
/// connection off threads it may not be sent across.
fn hold_connection(
    client_name: String,
    index: usize,
    gate: Arc<AtomicBool>,
    handler: Arc<dyn InputHandler>,
    ready: Sender<Result<()>>,
    shutdown: Receiver<()>,
) {
    let connection = match connect(&client_name, index, gate, handler) {
        Ok(connection) => connection,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        return;
    }

    // returns on close or when the handle is dropped
    let _ = shutdown.recv();

    let _ = connection.close();
    log::trace!("[ MIDI ] : input connection {index} closed");
}

fn connect(
    client_name: &str,
    index: usize,
    gate: Arc<AtomicBool>,
    handler: Arc<dyn InputHandler>,
) -> Result<MidiInputConnection<Arc<dyn InputHandler>>> {
    let input = MidiInput::new(client_name).map_err(|e| MidiError::OpenInputPort(e.to_string()))?;

    let ports = input.ports();
    let port = port_at(&ports, index)?;

    let callback = move |_: u64, bytes: &[u8], handler: &mut Arc<dyn InputHandler>| {
        if gate.load(Ordering::Acquire) {
            handler.on_data(bytes, wall_clock_nanos());
        }
    };

    input
        .connect(port, "midicap-input", callback, handler)
        .map_err(|e| MidiError::Connection(e.to_string()))
}

/// The directory validated `index` against an earlier listing, a port
/// missing now was unplugged in between.
fn port_at<P>(ports: &[P], index: usize) -> Result<&P> {
    ports.get(index).ok_or_else(|| {
        MidiError::Connection(format!(
            "device {index} disappeared, {} available",
            ports.len()
        ))
    })
}

fn wall_clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

struct HostHandle {
    index: usize,
    gate: Arc<AtomicBool>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl HostHandle {
    fn shutdown(&mut self) -> Result<()> {
        self.gate.store(false, Ordering::Release);

        // dropping the sender wakes the connection thread
        self.shutdown.take();

        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| {
                MidiError::Connection(format!("input thread for device {} panicked", self.index))
            }),
            None => Ok(()),
        }
    }
}

impl NativeHandle for HostHandle {
    fn start(&mut self) -> Result<()> {
        self.gate.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.gate.store(false, Ordering::Release);
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.shutdown()
    }
}

impl Drop for HostHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("[ MIDI ] : {e}");
        }
    }
}
