use super::DeviceDescriptor;
use windows::Win32::Media::Audio::{midiInGetDevCapsW, midiInGetNumDevs, MIDIINCAPSW};

/// Every WinMM input, in device id order as `midir` lists its ports.
pub(super) fn inputs() -> Vec<DeviceDescriptor> {
    let count = unsafe { midiInGetNumDevs() };
    (0..count as usize).map(input).collect()
}

fn input(id: usize) -> DeviceDescriptor {
    let mut caps = MIDIINCAPSW::default();
    let status =
        unsafe { midiInGetDevCapsW(id, &mut caps, std::mem::size_of::<MIDIINCAPSW>() as u32) };

    if status != 0 {
        log::warn!("[ MIDI ] : failed to get information for MIDI device {id} : {status}");
        return DeviceDescriptor::default();
    }

    let name = caps.szPname;
    DeviceDescriptor::from_caps(&name, caps.wMid, caps.wPid)
}
