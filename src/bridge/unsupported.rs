use super::*;
use crate::MidiError;

/// Stands in on hosts with no native MIDI service. Every call fails.
#[derive(Default, Debug, Clone, Copy)]
pub struct UnsupportedBridge;

impl UnsupportedBridge {
    fn error(operation: &str) -> MidiError {
        log::warn!("[ MIDI ] : {operation} called without a MIDI backend");
        MidiError::UnsupportedPlatform(std::env::consts::OS)
    }
}

impl NativeBridge for UnsupportedBridge {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>> {
        Err(Self::error("enumerate"))
    }

    fn open(&self, _index: usize, _: Arc<dyn InputHandler>) -> Result<Box<dyn NativeHandle>> {
        Err(Self::error("open"))
    }
}
