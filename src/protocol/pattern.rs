//! Extraction patterns for receiver response bodies
//!
//! Each decodable object has one pattern describing its named, typed
//! fields. Patterns are compiled once per process and never change.
//!
//! Two body conventions exist on the wire:
//! - `name=value` tokens (Commands, Voltages, masks, ...), decoded by a
//!   [`ExtractionPattern::Records`] pattern that may match many times.
//! - bare `Label value` lines (Position), decoded by a
//!   [`ExtractionPattern::Labeled`] pattern where each field is found by
//!   its own label and all required fields must be present.

use std::sync::LazyLock;

use regex::Regex;

use super::types::ObjectKind;

use FieldKind::{Decimal, Integer, List, Text};

/// Declared type of a captured field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Optional sign followed by decimal digits
    Integer,
    /// Optional sign, digits, optional fractional part
    Decimal,
    /// Free text; surrounding double quotes are stripped
    Text,
    /// Comma-separated list of text items
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        optional: false,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        optional: true,
    }
}

/// A field located by its literal label, e.g. `Latitude 37.38 deg`
#[derive(Debug, Clone)]
pub struct LabeledField {
    pub spec: FieldSpec,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub enum ExtractionPattern {
    /// One regex covering a whole record, applied to every
    /// non-overlapping match in the body. Capture group names equal the
    /// field names.
    Records {
        regex: Regex,
        fields: Vec<FieldSpec>,
    },
    /// One regex per field, each anchored by its label. Produces at most
    /// one record.
    Labeled { fields: Vec<LabeledField> },
}

impl ExtractionPattern {
    fn records(pattern: &str, fields: &[FieldSpec]) -> Self {
        ExtractionPattern::Records {
            regex: compile(pattern),
            fields: fields.to_vec(),
        }
    }

    fn labeled(fields: &[(&'static str, FieldSpec)]) -> Self {
        let fields = fields
            .iter()
            .map(|(label, spec)| LabeledField {
                spec: *spec,
                regex: compile(&format!(r"(?m)\b{}[ \t]+(?P<value>\S+)", label)),
            })
            .collect();
        ExtractionPattern::Labeled { fields }
    }

    /// Field declarations in the order the decoder reports them
    pub fn fields(&self) -> Vec<FieldSpec> {
        match self {
            ExtractionPattern::Records { fields, .. } => fields.clone(),
            ExtractionPattern::Labeled { fields } => fields.iter().map(|f| f.spec).collect(),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("extraction patterns are valid regular expressions")
}

static COMMANDS: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\bverb=(?P<verb>\w+)\s+object=(?P<object>\w+)",
        &[required("verb", Text), required("object", Text)],
    )
});

static SERIAL_NUMBER: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\bsn=(?P<sn>\S+)(?:\s+rxType=(?P<rx_type>\S+))?",
        &[required("sn", Text), optional("rx_type", Text)],
    )
});

static UTC_TIME: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\byear=(?P<year>\S+)\s+month=(?P<month>\S+)\s+day=(?P<day>\S+)\s+hour=(?P<hour>\S+)\s+minute=(?P<minute>\S+)\s+second=(?P<second>\S+)",
        &[
            required("year", Integer),
            required("month", Integer),
            required("day", Integer),
            required("hour", Integer),
            required("minute", Integer),
            required("second", Integer),
        ],
    )
});

static GPS_TIME: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\bgpsWeek=(?P<week>\S+)\s+weekSeconds=(?P<week_seconds>\S+)",
        &[required("week", Integer), required("week_seconds", Integer)],
    )
});

static POSITION: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::labeled(&[
        ("GpsWeek", required("week", Integer)),
        ("WeekSeconds", required("week_seconds", Decimal)),
        ("Latitude", required("latitude", Decimal)),
        ("Longitude", required("longitude", Decimal)),
        ("Altitude", required("altitude", Decimal)),
        ("Qualifiers", required("qualifiers", List)),
        ("Satellites", required("satellites", List)),
        ("ClockOffset", required("clock_offset", Decimal)),
        ("ClockDrift", required("clock_drift", Decimal)),
        ("VelNorth", required("vel_north", Decimal)),
        ("VelEast", required("vel_east", Decimal)),
        ("VelUp", required("vel_up", Decimal)),
        ("PDOP", required("pdop", Decimal)),
        ("HDOP", required("hdop", Decimal)),
        ("VDOP", required("vdop", Decimal)),
        ("TDOP", required("tdop", Decimal)),
    ])
});

static VOLTAGES: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\bport=(?P<port>\S+)\s+volts=(?P<volts>\S+)\s+cap=(?P<capacity>[^\s%]+)%?",
        &[
            required("port", Text),
            required("volts", Decimal),
            required("capacity", Decimal),
        ],
    )
});

static TEMPERATURE: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(r"\btemp=(?P<temp>\S+)", &[required("temp", Decimal)])
});

static MASK: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(r"\bmask=(?P<mask>\S+)", &[required("mask", Integer)])
});

static FIRMWARE_VERSION: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r"\bversion=(?P<version>\S+)(?:\s+build=(?P<build>\S+))?\s+date=(?P<date>\S+)",
        &[
            required("version", Text),
            optional("build", Text),
            required("date", Text),
        ],
    )
});

static FIRMWARE_WARRANTY: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(r"\bdate=(?P<date>\S+)", &[required("date", Text)])
});

static ANTENNA_TYPES: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r#"\btype=(?P<type>\S+)\s+name=(?P<name>"[^"]*"|\S+)\s+measMethods=(?P<methods>\S+)"#,
        &[
            required("type", Integer),
            required("name", Text),
            required("methods", List),
        ],
    )
});

static ANTENNA: LazyLock<ExtractionPattern> = LazyLock::new(|| {
    ExtractionPattern::records(
        r#"\btype=(?P<type>\S+)\s+name=(?P<name>"[^"]*"|\S+)\s+height=(?P<height>\S+)\s+measMethod=(?P<method>\S+)(?:\s+serialNumber=(?P<serial>"[^"]*"|\S+))?"#,
        &[
            required("type", Integer),
            required("name", Text),
            required("height", Decimal),
            required("method", Text),
            optional("serial", Text),
        ],
    )
});

/// Returns the extraction pattern for an object
///
/// `None` means the client does not interpret the object's body: either
/// the object only supports actions and writes, or its bodies are only
/// exposed raw.
pub fn pattern_for(kind: ObjectKind) -> Option<&'static ExtractionPattern> {
    let pattern: &'static LazyLock<ExtractionPattern> = match kind {
        ObjectKind::Commands => &COMMANDS,
        ObjectKind::SerialNumber => &SERIAL_NUMBER,
        ObjectKind::UtcTime => &UTC_TIME,
        ObjectKind::GpsTime => &GPS_TIME,
        ObjectKind::Position => &POSITION,
        ObjectKind::Voltages => &VOLTAGES,
        ObjectKind::Temperature => &TEMPERATURE,
        ObjectKind::ElevationMask | ObjectKind::PdopMask => &MASK,
        ObjectKind::FirmwareVersion => &FIRMWARE_VERSION,
        ObjectKind::FirmwareWarranty => &FIRMWARE_WARRANTY,
        ObjectKind::AntennaTypes => &ANTENNA_TYPES,
        ObjectKind::Antenna => &ANTENNA,
        _ => return None,
    };
    Some(LazyLock::force(pattern))
}
