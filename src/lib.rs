//! Capture MIDI channel-voice messages from a platform input device into a
//! caller supplied bounded queue.
//!
//! [`MidiClient`] lists the input endpoints of the host MIDI service, opens
//! one and pushes every decoded [`MidiEvent`] into a [`MidiSink`] without
//! ever blocking the native callback thread. [`MidiClient::stop`] returns
//! only once no callback can reach the sink anymore.

pub mod bridge;
pub mod client;
pub mod devices;
pub mod error;
pub mod locations;
pub mod logger;
pub mod midi;
pub mod session;

pub use bridge::{Backend, DeviceDescriptor, InputHandler, NativeBridge, NativeHandle};
pub use client::{ClientOptions, MidiClient};
pub use devices::DeviceDirectory;
pub use error::{MidiError, Result};
pub use midi::{EventFilter, MidiCommand, MidiEvent, MidiSink, SinkError};
pub use session::{CaptureSession, CaptureStats, SessionState};
