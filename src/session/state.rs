use std::{
    fmt,
    sync::atomic::{AtomicU8, AtomicUsize, Ordering},
};

/// `Idle -> DeviceSelected -> Capturing -> Stopped`, with `Stopped` terminal.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle = 0,
    DeviceSelected = 1,
    Capturing = 2,
    Stopped = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::DeviceSelected,
            2 => Self::Capturing,
            _ => Self::Stopped,
        }
    }

    /// A native handle is open in these states and only these.
    pub fn has_device(self) -> bool {
        matches!(self, Self::DeviceSelected | Self::Capturing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DeviceSelected => "device selected",
            Self::Capturing => "capturing",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Sequentially consistent, it pairs with the in-flight counter of the
/// callback path.
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn store(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst)
    }
}

/// The id of the open device, readable without locking.
pub(crate) struct AtomicDevice(AtomicUsize);

impl AtomicDevice {
    const NONE: usize = usize::MAX;

    pub fn empty() -> Self {
        Self(AtomicUsize::new(Self::NONE))
    }

    pub fn load(&self) -> Option<usize> {
        match self.0.load(Ordering::SeqCst) {
            Self::NONE => None,
            id => Some(id),
        }
    }

    pub fn store(&self, id: usize) {
        self.0.store(id, Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(Self::NONE, Ordering::SeqCst)
    }
}
