use thiserror::Error;

pub type Result<T> = std::result::Result<T, MidiError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MidiError {
    #[error("no MIDI devices found")]
    NoDevicesFound,

    #[error("invalid MIDI device {id} (found {count} devices)")]
    InvalidDevice { id: usize, count: usize },

    #[error("error connecting to MIDI device : {0}")]
    Connection(String),

    #[error("error creating input port : {0}")]
    OpenInputPort(String),

    #[error("no MIDI device selected")]
    NoDeviceSelected,

    #[error("error listing MIDI sources : {0}")]
    Enumeration(String),

    /// The capture session was stopped and cannot be reused.
    #[error("capture session is stopped")]
    SessionStopped,

    #[error("MIDI functionality is not available on this platform ({0})")]
    UnsupportedPlatform(&'static str),
}

impl MidiError {
    /// Native-layer failures, as opposed to caller misuse.
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::OpenInputPort(_)
                | Self::Enumeration(_)
                | Self::UnsupportedPlatform(_)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn misuse_is_not_a_native_failure() {
        assert!(MidiError::Connection("gone".into()).is_native());
        assert!(MidiError::UnsupportedPlatform("linux").is_native());
        assert!(!MidiError::NoDeviceSelected.is_native());
        assert!(!MidiError::InvalidDevice { id: 1, count: 1 }.is_native());
        assert!(!MidiError::SessionStopped.is_native());
    }
}
