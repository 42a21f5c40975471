use super::DeviceDescriptor;
use core_foundation::{
    base::TCFType,
    string::{CFString, CFStringRef},
};
use coremidi_sys::{
    kMIDIPropertyManufacturer, kMIDIPropertyName, MIDIEndpointGetEntity, MIDIEntityRef,
    MIDIGetNumberOfSources, MIDIGetSource, MIDIObjectGetStringProperty, MIDIObjectRef,
};

/// Every CoreMIDI source, in the order `midir` lists its ports.
pub(super) fn sources() -> Vec<DeviceDescriptor> {
    let count = unsafe { MIDIGetNumberOfSources() };

    (0..count)
        .map(|index| {
            let source = unsafe { MIDIGetSource(index) };
            let entity = entity_of(source);

            DeviceDescriptor::from_source(
                string_property(source, Property::Name),
                entity.and_then(|entity| string_property(entity, Property::Name)),
                entity.and_then(|entity| string_property(entity, Property::Manufacturer)),
            )
        })
        .collect()
}

enum Property {
    Name,
    Manufacturer,
}

fn entity_of(source: MIDIObjectRef) -> Option<MIDIEntityRef> {
    let mut entity: MIDIEntityRef = 0;
    let status = unsafe { MIDIEndpointGetEntity(source, &mut entity) };

    // virtual sources have no entity
    (status == 0 && entity != 0).then_some(entity)
}

fn string_property(object: MIDIObjectRef, property: Property) -> Option<String> {
    let mut value: CFStringRef = std::ptr::null();
    let status = unsafe {
        let id = match property {
            Property::Name => kMIDIPropertyName,
            Property::Manufacturer => kMIDIPropertyManufacturer,
        };
        MIDIObjectGetStringProperty(object, id, &mut value)
    };

    if status != 0 || value.is_null() {
        log::trace!("[ MIDI ] : property missing on object {object} : {status}");
        return None;
    }

    // the property getter hands over ownership
    Some(unsafe { CFString::wrap_under_create_rule(value) }.to_string())
}
