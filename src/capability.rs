//! Table of the verb/object pairs a receiver declared it supports
//!
//! The table is filled once from the receiver's `Commands` object when a
//! client connects and is read-only afterwards. Every command is checked
//! against it before a request is issued.

use std::collections::HashSet;

use crate::{
    Result,
    error::TpiError,
    protocol::{
        decode::Record,
        types::{CapabilityKey, ObjectKind, Verb},
    },
};

/// Command that is always allowed so the table itself can be fetched
pub const BOOTSTRAP_COMMAND: CapabilityKey = CapabilityKey::new(Verb::Show, ObjectKind::Commands);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    supported: HashSet<CapabilityKey>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        CapabilityTable::bootstrap()
    }
}

impl CapabilityTable {
    /// A table holding only `show:commands`
    pub fn bootstrap() -> Self {
        CapabilityTable {
            supported: HashSet::from([BOOTSTRAP_COMMAND]),
        }
    }

    /// Builds the table from decoded `Commands` records
    ///
    /// Entries naming a verb or object unknown to this client are skipped.
    pub fn from_commands(records: &[Record]) -> Self {
        let mut table = CapabilityTable::bootstrap();
        for record in records {
            let (Ok(verb), Ok(object)) = (record.text("verb"), record.text("object")) else {
                continue;
            };
            match (Verb::from_name(verb), ObjectKind::from_name(object)) {
                (Some(verb), Some(object)) => {
                    table.supported.insert(CapabilityKey::new(verb, object));
                }
                _ => log::debug!("skipping unknown command {}:{}", verb, object),
            }
        }
        table
    }

    pub fn is_supported(&self, verb: Verb, object: ObjectKind) -> bool {
        self.supported.contains(&CapabilityKey::new(verb, object))
    }

    /// Fails with [`TpiError::UnsupportedCommand`] unless the pair is listed
    pub fn ensure(&self, verb: Verb, object: ObjectKind) -> Result<()> {
        if self.is_supported(verb, object) {
            Ok(())
        } else {
            Err(TpiError::UnsupportedCommand(verb, object))
        }
    }

    pub fn len(&self) -> usize {
        self.supported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supported.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityKey> {
        self.supported.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode::decode;

    fn table_from(body: &str) -> CapabilityTable {
        CapabilityTable::from_commands(&decode(ObjectKind::Commands, body).unwrap())
    }

    #[test]
    fn test_bootstrap_only_allows_commands() {
        let table = CapabilityTable::bootstrap();
        assert_eq!(table.len(), 1);
        assert!(table.is_supported(Verb::Show, ObjectKind::Commands));
        for verb in Verb::ALL {
            for object in ObjectKind::ALL {
                if (verb, *object) != (Verb::Show, ObjectKind::Commands) {
                    assert!(matches!(
                        table.ensure(verb, *object),
                        Err(TpiError::UnsupportedCommand(v, o)) if v == verb && o == *object
                    ));
                }
            }
        }
    }

    #[test]
    fn test_from_commands() {
        let table = table_from(
            "verb=show object=serialnumber\nverb=show object=position\nverb=set object=elevationmask",
        );
        let expected: HashSet<_> = [
            CapabilityKey::new(Verb::Show, ObjectKind::SerialNumber),
            CapabilityKey::new(Verb::Show, ObjectKind::Position),
            CapabilityKey::new(Verb::Set, ObjectKind::ElevationMask),
            BOOTSTRAP_COMMAND,
        ]
        .into();
        assert_eq!(table.iter().copied().collect::<HashSet<_>>(), expected);
        assert!(table.ensure(Verb::Set, ObjectKind::ElevationMask).is_ok());
        assert!(table.ensure(Verb::Set, ObjectKind::PdopMask).is_err());
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let table = table_from("verb=Show object=Voltages\nverb=show object=warpdrive\nverb=fly object=position");
        assert_eq!(table.len(), 2);
        assert!(table.is_supported(Verb::Show, ObjectKind::Voltages));
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let table = table_from("verb=show object=commands\nverb=show object=gpstime\nverb=show object=gpstime");
        assert_eq!(table.len(), 2);
    }
}
