#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub entity_name: String,
    pub manufacturer: String,
}

impl DeviceDescriptor {
    /// A CoreMIDI source and the entity owning it. Missing properties are
    /// left empty, a missing entity name falls back to the source name.
    pub fn from_source(
        name: Option<String>,
        entity_name: Option<String>,
        manufacturer: Option<String>,
    ) -> Self {
        let name = name.unwrap_or_default();
        Self {
            entity_name: entity_name
                .filter(|entity| !entity.is_empty())
                .unwrap_or_else(|| name.clone()),
            manufacturer: manufacturer.unwrap_or_default(),
            name,
        }
    }

    /// A WinMM input from its capabilities. WinMM exposes no manufacturer
    /// string, only the registered manufacturer and product ids.
    pub fn from_caps(wide_name: &[u16], mid: u16, pid: u16) -> Self {
        let len = wide_name
            .iter()
            .position(|c| *c == 0)
            .unwrap_or(wide_name.len());
        let name = String::from_utf16_lossy(&wide_name[..len]);

        Self {
            entity_name: name.clone(),
            manufacturer: format!("MID: {mid} PID: {pid}"),
            name,
        }
    }
}
