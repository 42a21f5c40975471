use super::MidiEvent;
use crossbeam::channel::{Sender, TrySendError};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    #[error("event buffer full")]
    Full,
    #[error("event buffer disconnected")]
    Disconnected,
}

/// Caller owned destination for captured events.
///
/// `try_push` is called from native callback threads and must never block.
pub trait MidiSink: Send + Sync {
    fn try_push(&self, event: MidiEvent) -> Result<(), SinkError>;
}

impl MidiSink for Sender<MidiEvent> {
    fn try_push(&self, event: MidiEvent) -> Result<(), SinkError> {
        self.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn a_full_channel_rejects_without_blocking() {
        let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(1);
        assert_eq!(sender.try_push(MidiEvent::default()), Ok(()));
        assert_eq!(sender.try_push(MidiEvent::default()), Err(SinkError::Full));
        assert_eq!(receiver.len(), 1);
    }

    #[test]
    fn a_dropped_receiver_disconnects_the_sink() {
        let (sender, receiver) = crossbeam::channel::bounded::<MidiEvent>(1);
        drop(receiver);
        assert_eq!(
            sender.try_push(MidiEvent::default()),
            Err(SinkError::Disconnected)
        );
    }
}
