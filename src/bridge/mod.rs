//! The platform side of a capture: listing endpoints, opening them and
//! delivering raw bytes back through an [`InputHandler`].
//!
//! The bridge never knows about sessions. Whatever it opens gets an
//! `Arc<dyn InputHandler>` bound at open time and only ever calls back into
//! that, so a handle that outlives its session can only reach state it keeps
//! alive itself.

#[cfg(target_os = "macos")]
mod coremidi;
mod descriptor;
#[cfg(any(target_os = "macos", target_os = "windows"))]
mod host;
mod unsupported;
#[cfg(target_os = "windows")]
mod winmm;

#[cfg(test)]
pub(crate) mod fake;

#[cfg(any(target_os = "macos", target_os = "windows"))]
pub use host::*;
pub use descriptor::*;
pub use unsupported::*;

use crate::Result;
use std::sync::Arc;

/// Receives raw bytes from a native callback thread.
pub trait InputHandler: Send + Sync {
    /// `now_nanos` is assigned by the bridge when the bytes arrive.
    fn on_data(&self, bytes: &[u8], now_nanos: u64);
}

/// An open input endpoint.
///
/// No callback fires before `start` returns. Callbacks may still be running
/// while `stop` or `close` return, waiting for them is up to the caller.
pub trait NativeHandle: Send {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn close(self: Box<Self>) -> Result<()>;
}

pub trait NativeBridge: Send + Sync {
    fn name(&self) -> &'static str;

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>>;

    fn open(&self, index: usize, handler: Arc<dyn InputHandler>)
        -> Result<Box<dyn NativeHandle>>;
}

/// The native MIDI service of the host, chosen once at startup.
pub enum Backend {
    #[cfg(target_os = "macos")]
    CoreMidi(HostBridge),
    #[cfg(target_os = "windows")]
    WinMm(HostBridge),
    Unsupported(UnsupportedBridge),
}

impl Backend {
    #[cfg(target_os = "macos")]
    pub fn select(client_name: &str) -> Self {
        log::info!("[ MIDI ] : using CoreMIDI backend as {client_name}");
        Self::CoreMidi(HostBridge::new(client_name, HostApi::CoreMidi))
    }

    #[cfg(target_os = "windows")]
    pub fn select(client_name: &str) -> Self {
        log::info!("[ MIDI ] : using WinMM backend as {client_name}");
        Self::WinMm(HostBridge::new(client_name, HostApi::WinMm))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    pub fn select(client_name: &str) -> Self {
        log::warn!("[ MIDI ] : no MIDI backend for {client_name} on this platform");
        Self::Unsupported(UnsupportedBridge::default())
    }

    fn bridge(&self) -> &dyn NativeBridge {
        match self {
            #[cfg(target_os = "macos")]
            Self::CoreMidi(bridge) => bridge,
            #[cfg(target_os = "windows")]
            Self::WinMm(bridge) => bridge,
            Self::Unsupported(bridge) => bridge,
        }
    }
}

impl NativeBridge for Backend {
    fn name(&self) -> &'static str {
        self.bridge().name()
    }

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        self.bridge().enumerate()
    }

    fn open(
        &self,
        index: usize,
        handler: Arc<dyn InputHandler>,
    ) -> Result<Box<dyn NativeHandle>> {
        self.bridge().open(index, handler)
    }
}
