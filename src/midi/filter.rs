use super::MidiCommand;

/// Allow-list over command types.
///
/// The channel nibble never takes part in the comparison, so a filter
/// holding `NoteOn` lets a note on through on every channel.
/// An empty filter allows everything.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    commands: Vec<MidiCommand>,
}

impl EventFilter {
    pub fn new(commands: impl IntoIterator<Item = MidiCommand>) -> Self {
        let mut filter = Self::default();
        for command in commands {
            if !filter.commands.contains(&command) {
                filter.commands.push(command);
            }
        }
        filter
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[MidiCommand] {
        self.commands.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn allows(&self, command: u8) -> bool {
        if self.commands.is_empty() {
            return true;
        }

        let nibble = command & 0xF0;
        self.commands.iter().any(|allowed| allowed.as_byte() == nibble)
    }
}

impl FromIterator<MidiCommand> for EventFilter {
    fn from_iter<I: IntoIterator<Item = MidiCommand>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn an_empty_filter_allows_everything() {
        let filter = EventFilter::allow_all();
        assert!((0..=u8::MAX).all(|byte| filter.allows(byte)));
    }

    #[test]
    fn only_listed_commands_are_allowed() {
        let filter = EventFilter::new([MidiCommand::NoteOn]);
        assert!(filter.allows(0x90));
        assert!(!filter.allows(0x80));
        assert!(!filter.allows(0xB0));
    }

    #[test]
    fn the_channel_nibble_is_ignored() {
        let filter = EventFilter::new([MidiCommand::NoteOn, MidiCommand::NoteOff]);
        for channel in 0..16 {
            assert!(filter.allows(0x90 | channel));
            assert!(filter.allows(0x80 | channel));
            assert!(!filter.allows(0xE0 | channel));
        }
    }

    #[test]
    fn duplicates_are_collapsed() {
        let filter: EventFilter = [MidiCommand::NoteOn, MidiCommand::NoteOn]
            .into_iter()
            .collect();
        assert_eq!(filter.commands(), &[MidiCommand::NoteOn]);
    }
}
