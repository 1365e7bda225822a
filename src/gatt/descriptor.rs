//! Service layouts and the handle table produced by registering them.

use heapless::Vec;

use super::AttHandle;
use crate::config::{
    ATT_VALUE_MAX_LEN, COMMAND_CHAR_UUID, DISPLAY_OUT_CHAR_UUID, DISPLAY_SERVICE_UUID,
    VOLTAGE_CHAR_UUID, VOLTMETER_SERVICE_UUID,
};
use crate::protocol::Uuid;

pub const MAX_CHARACTERISTICS_PER_SERVICE: usize = 4;

/// Characteristics a node can hold handles for.
pub const HANDLE_TABLE_CAPACITY: usize = 8;

/// Logical name of a characteristic, independent of its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharKey {
    /// Display node: voltage triples written by the voltmeter.
    VoltageIn,
    /// Either node: text commands.
    Command,
    /// Display node: current display contents.
    DisplayOut,
    /// Voltmeter node: latest readings.
    VoltageOut,
}

/// Who handles bytes written to a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Consumer {
    CommandInterpreter,
    VoltageSink,
}

impl CharKey {
    /// `None` for characteristics peers cannot write.
    pub const fn consumer(self) -> Option<Consumer> {
        match self {
            CharKey::VoltageIn => Some(Consumer::VoltageSink),
            CharKey::Command => Some(Consumer::CommandInterpreter),
            CharKey::DisplayOut | CharKey::VoltageOut => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Access {
    pub const fn new() -> Self {
        Self {
            read: false,
            write: false,
            notify: false,
        }
    }

    pub const fn read(mut self) -> Self {
        self.read = true;
        self
    }

    pub const fn write(mut self) -> Self {
        self.write = true;
        self
    }

    pub const fn notify(mut self) -> Self {
        self.notify = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicDescriptor {
    pub key: CharKey,
    pub uuid: Uuid,
    pub access: Access,
    pub max_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub uuid: Uuid,
    pub characteristics: &'static [CharacteristicDescriptor],
}

const fn characteristic(key: CharKey, uuid: u128, access: Access) -> CharacteristicDescriptor {
    CharacteristicDescriptor {
        key,
        uuid: Uuid::U128(uuid),
        access,
        max_len: ATT_VALUE_MAX_LEN,
    }
}

pub const DISPLAY_SERVICE: ServiceDescriptor = ServiceDescriptor {
    uuid: Uuid::U128(DISPLAY_SERVICE_UUID),
    characteristics: &[
        characteristic(
            CharKey::VoltageIn,
            VOLTAGE_CHAR_UUID,
            Access::new().write().notify(),
        ),
        characteristic(CharKey::Command, COMMAND_CHAR_UUID, Access::new().write().read()),
        characteristic(
            CharKey::DisplayOut,
            DISPLAY_OUT_CHAR_UUID,
            Access::new().read().notify(),
        ),
    ],
};

pub const VOLTMETER_SERVICE: ServiceDescriptor = ServiceDescriptor {
    uuid: Uuid::U128(VOLTMETER_SERVICE_UUID),
    characteristics: &[
        characteristic(
            CharKey::VoltageOut,
            VOLTAGE_CHAR_UUID,
            Access::new().read().notify(),
        ),
        characteristic(CharKey::Command, COMMAND_CHAR_UUID, Access::new().write().read()),
    ],
};

static DISPLAY_SERVICES: [ServiceDescriptor; 1] = [DISPLAY_SERVICE];
static VOLTMETER_SERVICES: [ServiceDescriptor; 1] = [VOLTMETER_SERVICE];

/// Services hosted by the display node.
pub fn display_services() -> &'static [ServiceDescriptor] {
    &DISPLAY_SERVICES
}

/// Services hosted by the voltmeter node.
pub fn voltmeter_services() -> &'static [ServiceDescriptor] {
    &VOLTMETER_SERVICES
}

/// Maps logical keys to the handles the radio assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleTable {
    entries: Vec<(CharKey, AttHandle), HANDLE_TABLE_CAPACITY>,
}

impl HandleTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn handle(&self, key: CharKey) -> Option<AttHandle> {
        self.entries
            .iter()
            .find_map(|&(k, h)| (k == key).then_some(h))
    }

    pub fn key_for(&self, handle: AttHandle) -> Option<CharKey> {
        self.entries
            .iter()
            .find_map(|&(k, h)| (h == handle).then_some(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining(&self) -> usize {
        HANDLE_TABLE_CAPACITY - self.entries.len()
    }

    pub(crate) fn insert(&mut self, key: CharKey, handle: AttHandle) -> bool {
        self.entries.push((key, handle)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_layout_matches_access_table() {
        let chars = DISPLAY_SERVICE.characteristics;
        assert_eq!(chars.len(), 3);
        assert_eq!(chars[0].key, CharKey::VoltageIn);
        assert!(chars[0].access.write && chars[0].access.notify && !chars[0].access.read);
        assert!(chars[1].access.write && chars[1].access.read);
        assert!(chars[2].access.read && chars[2].access.notify && !chars[2].access.write);
    }

    #[test]
    fn voltage_uuid_shared_across_nodes() {
        assert_eq!(
            DISPLAY_SERVICE.characteristics[0].uuid,
            VOLTMETER_SERVICE.characteristics[0].uuid
        );
        assert_ne!(DISPLAY_SERVICE.uuid, VOLTMETER_SERVICE.uuid);
    }

    #[test]
    fn consumers_route_writable_keys() {
        assert_eq!(CharKey::VoltageIn.consumer(), Some(Consumer::VoltageSink));
        assert_eq!(CharKey::Command.consumer(), Some(Consumer::CommandInterpreter));
        assert_eq!(CharKey::DisplayOut.consumer(), None);
    }

    #[test]
    fn table_lookups_both_ways() {
        let mut t = HandleTable::new();
        assert!(t.insert(CharKey::Command, 12));
        assert!(t.insert(CharKey::DisplayOut, 15));
        assert_eq!(t.handle(CharKey::Command), Some(12));
        assert_eq!(t.key_for(15), Some(CharKey::DisplayOut));
        assert_eq!(t.key_for(99), None);
        assert_eq!(t.remaining(), HANDLE_TABLE_CAPACITY - 2);
    }
}
