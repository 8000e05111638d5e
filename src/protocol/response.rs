//! Typed values decoded from receiver responses
//!
//! Every type here is built from one [`Record`] produced by the object's
//! extraction pattern. Values are constructed fresh on each call and are
//! not updated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::error::DecodeError;

use super::{FromRecord, decode::Record, types::ObjectKind};

/// Receiver identity reported by `SerialNumber`
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialNumber {
    pub serial: String,
    /// Receiver model, e.g. `NetR9`
    pub receiver_type: Option<String>,
}

impl FromRecord for SerialNumber {
    const OBJECT: ObjectKind = ObjectKind::SerialNumber;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(SerialNumber {
            serial: record.text("sn")?.to_string(),
            receiver_type: record.opt_text("rx_type").map(String::from),
        })
    }
}

/// Current UTC date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTime(pub DateTime<Utc>);

impl FromRecord for UtcTime {
    const OBJECT: ObjectKind = ObjectKind::UtcTime;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        let year = record.integer_as::<i32>("year")?;
        let month = record.integer_as::<u32>("month")?;
        let day = record.integer_as::<u32>("day")?;
        let hour = record.integer_as::<u32>("hour")?;
        let minute = record.integer_as::<u32>("minute")?;
        let second = record.integer_as::<u32>("second")?;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(|naive| UtcTime(naive.and_utc()))
            .ok_or_else(|| DecodeError::InvalidField {
                field: "utc_time",
                value: format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"),
            })
    }
}

/// GPS week number and seconds within the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpsTimestamp {
    /// Weeks since 1980-01-06, the start of GPS week zero
    pub week: u32,
    /// Seconds since the start of the week, 0 to 604799
    pub week_seconds: u32,
}

impl FromRecord for GpsTimestamp {
    const OBJECT: ObjectKind = ObjectKind::GpsTime;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(GpsTimestamp {
            week: record.integer_as("week")?,
            week_seconds: record.integer_as("week_seconds")?,
        })
    }
}

impl core::fmt::Display for GpsTimestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.week, self.week_seconds)
    }
}

/// Most recent position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// GPS week of the fix time tag
    pub week: u32,
    /// Seconds within the week of the fix time tag
    pub week_seconds: f64,
    /// Decimal degrees, positive north
    pub latitude: f64,
    /// Decimal degrees, positive east
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid
    pub altitude: f64,
    /// Receiver clock offset in milliseconds
    pub clock_offset: f64,
    /// Receiver clock drift in parts per million
    pub clock_drift: f64,
    /// Meters per second
    pub vel_north: f64,
    pub vel_east: f64,
    pub vel_up: f64,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    pub tdop: f64,
    /// Coordinate system, fix type and correction source, e.g. `WGS84`, `3D`, `Autonomous`
    pub qualifiers: Vec<String>,
    /// PRNs of the satellites used in the fix
    pub satellites: Vec<u32>,
}

impl FromRecord for PositionFix {
    const OBJECT: ObjectKind = ObjectKind::Position;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        let satellites = record
            .list("satellites")?
            .iter()
            .map(|prn| {
                prn.parse().map_err(|_| DecodeError::InvalidField {
                    field: "satellites",
                    value: prn.clone(),
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;

        Ok(PositionFix {
            week: record.integer_as("week")?,
            week_seconds: record.decimal("week_seconds")?,
            latitude: record.decimal("latitude")?,
            longitude: record.decimal("longitude")?,
            altitude: record.decimal("altitude")?,
            clock_offset: record.decimal("clock_offset")?,
            clock_drift: record.decimal("clock_drift")?,
            vel_north: record.decimal("vel_north")?,
            vel_east: record.decimal("vel_east")?,
            vel_up: record.decimal("vel_up")?,
            pdop: record.decimal("pdop")?,
            hdop: record.decimal("hdop")?,
            vdop: record.decimal("vdop")?,
            tdop: record.decimal("tdop")?,
            qualifiers: record.list("qualifiers")?.to_vec(),
            satellites,
        })
    }
}

/// Measured voltage on one power or battery input
///
/// The number of ports reported depends on the receiver model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageReading {
    pub port: String,
    /// Volts
    pub volts: f64,
    /// Remaining capacity in percent
    pub capacity: f64,
}

impl FromRecord for VoltageReading {
    const OBJECT: ObjectKind = ObjectKind::Voltages;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(VoltageReading {
            port: record.text("port")?.to_string(),
            volts: record.decimal("volts")?,
            capacity: record.decimal("capacity")?,
        })
    }
}

impl core::fmt::Display for PositionFix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Qualifiers: {}", self.qualifiers.join(","))?;
        writeln!(f, "Latitude: {}", self.latitude)?;
        writeln!(f, "Longitude: {}", self.longitude)?;
        writeln!(f, "Altitude: {}", self.altitude)?;
        writeln!(f, "ClockOffset: {}", self.clock_offset)?;
        writeln!(f, "GpsWeek: {}", self.week)?;
        writeln!(f, "WeekSeconds: {}", self.week_seconds)?;
        writeln!(f, "ClockDrift: {}", self.clock_drift)?;
        writeln!(f, "VelNorth: {}", self.vel_north)?;
        writeln!(f, "VelEast: {}", self.vel_east)?;
        writeln!(f, "VelUp: {}", self.vel_up)?;
        writeln!(f, "PDOP: {}", self.pdop)?;
        writeln!(f, "HDOP: {}", self.hdop)?;
        writeln!(f, "VDOP: {}", self.vdop)?;
        write!(f, "TDOP: {}", self.tdop)
    }
}

impl core::fmt::Display for VoltageReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}v, {}%", self.port, self.volts, self.capacity)
    }
}

/// Installed firmware identity
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub version: String,
    pub build: Option<String>,
    pub date: NaiveDate,
}

impl FromRecord for FirmwareVersion {
    const OBJECT: ObjectKind = ObjectKind::FirmwareVersion;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(FirmwareVersion {
            version: record.text("version")?.to_string(),
            build: record.opt_text("build").map(String::from),
            date: parse_date("date", record.text("date")?)?,
        })
    }
}

/// End of the firmware update warranty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareWarranty(pub NaiveDate);

impl FromRecord for FirmwareWarranty {
    const OBJECT: ObjectKind = ObjectKind::FirmwareWarranty;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(FirmwareWarranty(parse_date("date", record.text("date")?)?))
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, DecodeError> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| DecodeError::InvalidField {
            field,
            value: raw.to_string(),
        })
}

/// One entry of the receiver's antenna catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaType {
    /// Numeric antenna type identifier
    pub id: u32,
    pub name: String,
    /// Measurement methods valid for this antenna
    pub methods: Vec<String>,
}

impl AntennaType {
    pub fn supports(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

impl FromRecord for AntennaType {
    const OBJECT: ObjectKind = ObjectKind::AntennaTypes;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(AntennaType {
            id: record.integer_as("type")?,
            name: record.text("name")?.to_string(),
            methods: record.list("methods")?.to_vec(),
        })
    }
}

impl core::fmt::Display for AntennaType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}, {}", self.id, self.name, self.methods.join(","))
    }
}

/// Antenna catalog fetched once when the client connects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaTypeCatalog {
    types: Vec<AntennaType>,
}

impl AntennaTypeCatalog {
    pub fn new(types: Vec<AntennaType>) -> Self {
        AntennaTypeCatalog { types }
    }

    pub fn get(&self, id: u32) -> Option<&AntennaType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&AntennaType> {
        self.types.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AntennaType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<'a> IntoIterator for &'a AntennaTypeCatalog {
    type Item = &'a AntennaType;
    type IntoIter = std::slice::Iter<'a, AntennaType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

/// Live or desired antenna configuration
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaSetting {
    /// Antenna type identifier from the catalog
    pub type_id: u32,
    pub name: String,
    pub method: String,
    /// Antenna height in meters
    pub height: f64,
    pub serial: Option<String>,
}

impl FromRecord for AntennaSetting {
    const OBJECT: ObjectKind = ObjectKind::Antenna;

    fn from_record(record: &Record) -> Result<Self, DecodeError> {
        Ok(AntennaSetting {
            type_id: record.integer_as("type")?,
            name: record.text("name")?.to_string(),
            method: record.text("method")?.to_string(),
            height: record.decimal("height")?,
            serial: record.opt_text("serial").map(String::from),
        })
    }
}

impl core::fmt::Display for AntennaSetting {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.type_id,
            self.name,
            self.method,
            self.height,
            self.serial.as_deref().unwrap_or("")
        )
    }
}

/// Reads the `mask` field shared by ElevationMask and PdopMask
pub(crate) fn mask_from_record(record: &Record) -> Result<i32, DecodeError> {
    record.integer_as("mask")
}

/// Reads the `temp` field, degrees Celsius
pub(crate) fn temperature_from_record(record: &Record) -> Result<f64, DecodeError> {
    record.decimal("temp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_all, decode_first};

    #[test]
    fn test_utc_time() {
        let body = "UtcTime year=2012 month=08 day=20 hour=13 minute=21 second=07";
        let UtcTime(time) = decode_first::<UtcTime>(body).unwrap();
        assert_eq!(time.to_rfc3339(), "2012-08-20T13:21:07+00:00");
    }

    #[test]
    fn test_utc_time_rejects_impossible_date() {
        let body = "UtcTime year=2012 month=13 day=20 hour=13 minute=21 second=07";
        assert!(decode_first::<UtcTime>(body).is_err());
    }

    #[test]
    fn test_gps_time() {
        let time = decode_first::<GpsTimestamp>("GpsTime gpsWeek=1702 weekSeconds=134543").unwrap();
        assert_eq!(time, GpsTimestamp { week: 1702, week_seconds: 134543 });
        assert_eq!(time.to_string(), "1702,134543");
    }

    #[test]
    fn test_voltage_example() {
        let readings = decode_all::<VoltageReading>("port=MAIN volts=12.3 cap=87%").unwrap();
        assert_eq!(
            readings,
            [VoltageReading { port: "MAIN".into(), volts: 12.3, capacity: 87.0 }]
        );
        assert_eq!(readings[0].to_string(), "MAIN, 12.3v, 87%");
    }

    #[test]
    fn test_firmware_version() {
        let fw = decode_first::<FirmwareVersion>("FirmwareVersion version=4.60 date=2012-05-21")
            .unwrap();
        assert_eq!(fw.version, "4.60");
        assert_eq!(fw.build, None);
        assert_eq!(fw.date, NaiveDate::from_ymd_opt(2012, 5, 21).unwrap());

        let json = serde_json::to_string(&fw).unwrap();
        assert_eq!(json, r#"{"version":"4.60","date":"2012-05-21"}"#);
    }

    #[test]
    fn test_firmware_warranty_bad_date() {
        assert!(decode_first::<FirmwareWarranty>("FirmwareWarranty date=soon").is_err());
    }

    #[test]
    fn test_antenna_catalog_lookup() {
        let body = concat!(
            "AntennaTypes\n",
            "type=0 name=Unknown measMethods=AntennaPhaseCenter\n",
            "type=31 name=\"Zephyr Geodetic\" measMethods=BottomOfAntennaMount,CenterOfBumper\n",
        );
        let catalog = AntennaTypeCatalog::new(decode_all::<AntennaType>(body).unwrap());
        assert_eq!(catalog.len(), 2);
        let zephyr = catalog.get(31).unwrap();
        assert_eq!(zephyr.name, "Zephyr Geodetic");
        assert!(zephyr.supports("centerofbumper"));
        assert!(!zephyr.supports("AntennaPhaseCenter"));
        assert_eq!(catalog.by_name("zephyr geodetic"), Some(zephyr));
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_antenna_setting() {
        let body = r#"Antenna type=31 name="Zephyr Geodetic" height=1.500 measMethod=BottomOfAntennaMount"#;
        let antenna = decode_first::<AntennaSetting>(body).unwrap();
        assert_eq!(antenna.type_id, 31);
        assert_eq!(antenna.height, 1.5);
        assert_eq!(antenna.serial, None);
        assert_eq!(antenna.to_string(), "31,Zephyr Geodetic,BottomOfAntennaMount,1.5,");
    }

    #[test]
    fn test_position_display() {
        let body = "\
GpsWeek 1702\nWeekSeconds 3.5\nLatitude 37.5\nLongitude -122.25\nAltitude 10.0
Qualifiers WGS84,3D\nSatellites 2,5\nClockOffset 0.1\nClockDrift 0.0
VelNorth 0.0\nVelEast 0.0\nVelUp 0.0\nPDOP 1.5\nHDOP 1.0\nVDOP 1.25\nTDOP 0.5";
        let text = decode_first::<PositionFix>(body).unwrap().to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "Qualifiers: WGS84,3D");
        assert_eq!(lines[1], "Latitude: 37.5");
        assert_eq!(lines[2], "Longitude: -122.25");
        assert_eq!(lines[5], "GpsWeek: 1702");
        assert_eq!(lines[14], "TDOP: 0.5");
    }

    #[test]
    fn test_position_satellites_must_be_numeric() {
        let body = "\
GpsWeek 1702\nWeekSeconds 1.0\nLatitude 1.0\nLongitude 1.0\nAltitude 1.0
Qualifiers WGS84\nSatellites 2,x\nClockOffset 0.0\nClockDrift 0.0
VelNorth 0.0\nVelEast 0.0\nVelUp 0.0\nPDOP 1.0\nHDOP 1.0\nVDOP 1.0\nTDOP 1.0";
        assert!(matches!(
            decode_first::<PositionFix>(body),
            Err(crate::error::TpiError::Decode(DecodeError::InvalidField { field: "satellites", .. }))
        ));
    }
}
