mod filter;
mod sink;

pub use filter::*;
pub use sink::*;

use std::{fmt, str::FromStr};

/// A decoded 3-byte channel message.
///
/// `command` keeps the full status byte, channel included. Use [`MidiEvent::kind`]
/// and [`MidiEvent::channel`] to split it.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiEvent {
    pub timestamp: u64,
    pub command: u8,
    pub note: u8,
    pub velocity: u8,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("incomplete MIDI packet ({len} bytes)")]
pub struct IncompleteMessage {
    pub len: usize,
}

impl MidiEvent {
    /// Decode the first three bytes of a native packet.
    ///
    /// Anything past the third byte is ignored, there is no running status
    /// or SysEx reassembly.
    pub fn decode(bytes: &[u8], timestamp: u64) -> Result<Self, IncompleteMessage> {
        let &[status, data1, data2, ..] = bytes else {
            return Err(IncompleteMessage { len: bytes.len() });
        };

        Ok(Self {
            timestamp,
            command: status,
            note: data1,
            velocity: data2,
        })
    }

    /// The status nibble, `command & 0xF0`.
    pub fn status_nibble(&self) -> u8 {
        self.command & 0xF0
    }

    pub fn kind(&self) -> Option<MidiCommand> {
        MidiCommand::from_status(self.command)
    }

    /// Zero based channel, taken from the low nibble.
    pub fn channel(&self) -> u8 {
        self.command & 0x0F
    }

    pub fn is_note_on(&self) -> bool {
        self.kind() == Some(MidiCommand::NoteOn) && self.velocity > 0
    }

    /// A note on with a zero velocity is a note off.
    pub fn is_note_off(&self) -> bool {
        match self.kind() {
            Some(MidiCommand::NoteOff) => true,
            Some(MidiCommand::NoteOn) => self.velocity == 0,
            _ => false,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiCommand {
    NoteOff = 0x80,
    NoteOn = 0x90,
    PolyPressure = 0xA0,
    ControlChange = 0xB0,
    ProgramChange = 0xC0,
    ChannelPressure = 0xD0,
    PitchBend = 0xE0,
    System = 0xF0,
}

impl MidiCommand {
    pub const ALL: [MidiCommand; 8] = [
        MidiCommand::NoteOff,
        MidiCommand::NoteOn,
        MidiCommand::PolyPressure,
        MidiCommand::ControlChange,
        MidiCommand::ProgramChange,
        MidiCommand::ChannelPressure,
        MidiCommand::PitchBend,
        MidiCommand::System,
    ];

    /// Map a status byte to its command, ignoring the channel.
    /// Data bytes (`< 0x80`) have no command.
    pub fn from_status(status: u8) -> Option<Self> {
        let nibble = status & 0xF0;
        Self::ALL.into_iter().find(|cmd| *cmd as u8 == nibble)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            MidiCommand::NoteOff => "note-off",
            MidiCommand::NoteOn => "note-on",
            MidiCommand::PolyPressure => "poly-pressure",
            MidiCommand::ControlChange => "control-change",
            MidiCommand::ProgramChange => "program-change",
            MidiCommand::ChannelPressure => "channel-pressure",
            MidiCommand::PitchBend => "pitch-bend",
            MidiCommand::System => "system",
        }
    }
}

impl fmt::Display for MidiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown MIDI command : {0}")]
pub struct UnknownCommand(String);

impl FromStr for MidiCommand {
    type Err = UnknownCommand;

    /// Accepts names (`note-on`, `note_on`, `noteon`) or a status byte
    /// in hex (`0x90`) or decimal (`144`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let unknown = || UnknownCommand(s.clone());

        let byte = if let Some(hex) = s.strip_prefix("0x") {
            Some(u8::from_str_radix(hex, 16).map_err(|_| unknown())?)
        } else if s.chars().all(|c| c.is_ascii_digit()) {
            Some(s.parse::<u8>().map_err(|_| unknown())?)
        } else {
            None
        };

        if let Some(byte) = byte {
            return Self::from_status(byte).ok_or_else(unknown);
        }

        let normalized: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().replace('-', "") == normalized)
            .ok_or_else(unknown)
    }
}
