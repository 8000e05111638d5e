use serde::{Deserialize, Serialize};

/// Protocol action keyword, the first path segment after `/prog/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Show,
    Set,
    Reset,
    Enable,
    Disable,
    Delete,
    Download,
    Upload,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::Show,
        Verb::Set,
        Verb::Reset,
        Verb::Enable,
        Verb::Disable,
        Verb::Delete,
        Verb::Download,
        Verb::Upload,
    ];

    /// Lowercase name as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Show => "show",
            Verb::Set => "set",
            Verb::Reset => "reset",
            Verb::Enable => "enable",
            Verb::Disable => "disable",
            Verb::Delete => "delete",
            Verb::Download => "download",
            Verb::Upload => "upload",
        }
    }

    /// Parses a wire name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(name))
    }

    /// The flag for this verb in a [`Verbs`] set
    pub fn flag(self) -> Verbs {
        match self {
            Verb::Show => Verbs::SHOW,
            Verb::Set => Verbs::SET,
            Verb::Reset => Verbs::RESET,
            Verb::Enable => Verbs::ENABLE,
            Verb::Disable => Verbs::DISABLE,
            Verb::Delete => Verbs::DELETE,
            Verb::Download => Verbs::DOWNLOAD,
            Verb::Upload => Verbs::UPLOAD,
        }
    }
}

impl core::fmt::Display for Verb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Verbs an object kind can accept in the receiver's object model
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Verbs: u8 {
        const SHOW = 0x01;
        const SET = 0x02;
        const RESET = 0x04;
        const ENABLE = 0x08;
        const DISABLE = 0x10;
        const DELETE = 0x20;
        const DOWNLOAD = 0x40;
        const UPLOAD = 0x80;
    }
}

macro_rules! object_kinds {
    ($($variant:ident => $name:literal : $verbs:expr),* $(,)?) => {
        /// Receiver-addressable object, the first query token of a request
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum ObjectKind {
            $($variant,)*
        }

        impl ObjectKind {
            pub const ALL: &'static [ObjectKind] = &[$(ObjectKind::$variant,)*];

            /// Lowercase name as it appears on the wire
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ObjectKind::$variant => $name,)*
                }
            }

            /// Verbs this kind of object accepts in the object model
            ///
            /// Whether a particular receiver accepts them is decided by its
            /// capability table, not by this set.
            pub fn verbs(self) -> Verbs {
                match self {
                    $(ObjectKind::$variant => $verbs,)*
                }
            }
        }
    };
}

object_kinds! {
    SerialNumber => "serialnumber": Verbs::SHOW,
    UtcTime => "utctime": Verbs::SHOW,
    GpsTime => "gpstime": Verbs::SHOW,
    Position => "position": Verbs::SHOW,
    Voltages => "voltages": Verbs::SHOW,
    Temperature => "temperature": Verbs::SHOW,
    Commands => "commands": Verbs::SHOW,
    TrackingStatus => "trackingstatus": Verbs::SHOW,
    Tracking => "tracking": Verbs::SHOW.union(Verbs::SET),
    GpsSatControls => "gpssatcontrols": Verbs::SHOW.union(Verbs::SET),
    SbasSatControls => "sbassatcontrols": Verbs::SHOW.union(Verbs::SET),
    GlonassSatControls => "glonasssatcontrols": Verbs::SHOW.union(Verbs::SET),
    Ephemeris => "ephemeris": Verbs::SHOW,
    Almanac => "almanac": Verbs::SHOW,
    GpsHealth => "gpshealth": Verbs::SHOW,
    GpsUtcData => "gpsutcdata": Verbs::SHOW,
    GpsIonoData => "gpsionodata": Verbs::SHOW,
    GnssData => "gnssdata": Verbs::RESET,
    System => "system": Verbs::RESET,
    ReferenceFrequency => "referencefrequency": Verbs::SHOW.union(Verbs::SET),
    ElevationMask => "elevationmask": Verbs::SHOW.union(Verbs::SET),
    PdopMask => "pdopmask": Verbs::SHOW.union(Verbs::SET),
    ClockSteering => "clocksteering": Verbs::SHOW.union(Verbs::SET),
    MultipathReject => "multipathreject": Verbs::SHOW.union(Verbs::SET),
    Pps => "pps": Verbs::SHOW.union(Verbs::SET),
    AntennaTypes => "antennatypes": Verbs::SHOW,
    Antenna => "antenna": Verbs::SHOW.union(Verbs::SET),
    RtkControls => "rtkcontrols": Verbs::SHOW.union(Verbs::SET),
    IoPorts => "ioports": Verbs::SHOW,
    IoPort => "ioport": Verbs::SHOW.union(Verbs::SET).union(Verbs::DELETE),
    RefStation => "refstation": Verbs::SHOW.union(Verbs::SET),
    OmniStarSeed => "omnistarseed": Verbs::SET,
    FirmwareVersion => "firmwareversion": Verbs::SHOW,
    FirmwareWarranty => "firmwarewarranty": Verbs::SHOW.union(Verbs::SET),
    FirmwareFile => "firmwarefile": Verbs::UPLOAD,
}

impl ObjectKind {
    /// Parses a wire name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        ObjectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb/object pair, the unit of authorization in the capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityKey {
    pub verb: Verb,
    pub object: ObjectKind,
}

impl CapabilityKey {
    pub const fn new(verb: Verb, object: ObjectKind) -> Self {
        CapabilityKey { verb, object }
    }
}

impl core::fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.verb, self.object)
    }
}

/// URI scheme used to reach the receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_case_insensitively() {
        assert_eq!(Verb::from_name("SHOW"), Some(Verb::Show));
        assert_eq!(
            ObjectKind::from_name("ElevationMask"),
            Some(ObjectKind::ElevationMask)
        );
        assert_eq!(ObjectKind::from_name("PPS"), Some(ObjectKind::Pps));
        assert_eq!(ObjectKind::from_name("flux"), None);
        assert_eq!(Verb::from_name("frobnicate"), None);
    }

    #[test]
    fn test_every_object_name_is_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in ObjectKind::ALL {
            let name = kind.as_str();
            assert_eq!(name, name.to_ascii_lowercase());
            assert!(seen.insert(name), "duplicate name {name}");
            assert_eq!(ObjectKind::from_name(name), Some(*kind));
        }
    }

    #[test]
    fn test_object_verbs() {
        assert!(ObjectKind::ElevationMask.verbs().contains(Verbs::SHOW | Verbs::SET));
        assert!(!ObjectKind::System.verbs().contains(Verbs::SHOW));
        assert!(ObjectKind::System.verbs().contains(Verb::Reset.flag()));
        assert_eq!(ObjectKind::FirmwareFile.verbs(), Verbs::UPLOAD);
    }

    #[test]
    fn test_capability_key_display() {
        let key = CapabilityKey::new(Verb::Show, ObjectKind::Commands);
        assert_eq!(key.to_string(), "show:commands");
    }
}
