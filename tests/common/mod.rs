//! Scripted receiver shared by the integration tests
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tpi_client::{
    Result,
    client::{TpiTransport, blocking::BlockingTransport},
    error::TpiError,
};

pub const ADDRESS: &str = "192.168.1.10";

pub const COMMANDS: &str = "\
verb=show object=commands
verb=show object=serialnumber
verb=show object=firmwareversion
verb=show object=firmwarewarranty
verb=show object=antennatypes
verb=show object=utctime
verb=show object=gpstime
verb=show object=position
verb=show object=voltages
verb=show object=temperature
verb=show object=elevationmask
verb=set object=elevationmask
verb=show object=pdopmask
verb=set object=pdopmask
verb=show object=antenna
verb=set object=antenna
verb=show object=ephemeris
verb=reset object=system
verb=reset object=gnssdata
";

pub const SERIAL_NUMBER: &str = "SerialNumber sn=5432A12345 rxType=NetR9";
pub const FIRMWARE_VERSION: &str = "FirmwareVersion version=4.60 build=123 date=2023-05-01";
pub const FIRMWARE_WARRANTY: &str = "FirmwareWarranty date=2025-12-31";
pub const ANTENNA_TYPES: &str = "\
AntennaTypes
type=31 name=\"Zephyr Geodetic\" measMethods=BottomOfAntennaMount,AntennaPhaseCenter
type=7 name=Generic measMethods=BottomOfAntennaMount
";

pub const POSITION: &str = "\
Position
GpsWeek 2305
WeekSeconds 395000.5
Latitude 37.3861
Longitude -122.0839
Altitude 12.5
Qualifiers WGS84,3D
Satellites 2,5,12
ClockOffset 0.1
ClockDrift -0.01
VelNorth 0.0
VelEast 0.25
VelUp 0.0
PDOP 1.6
HDOP 0.9
VDOP 1.3
TDOP 0.8
";

pub const VOLTAGES: &str = "\
Voltages
port=MAIN volts=12.3 cap=87%
port=BATT1 volts=7.9 cap=55%
port=BATT2 volts=0.0 cap=0%
";

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Refused,
}

/// Transport answering from a table of `/prog/...` targets
///
/// Every URI is recorded. Targets with no scripted reply fail as a
/// transport error, as do targets scripted with [`refuse`](Self::refuse).
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    /// A receiver listing [`COMMANDS`] with all reference data scripted
    pub fn standard() -> Self {
        ScriptedTransport::new()
            .reply("/prog/show?commands", COMMANDS)
            .reply("/prog/show?serialnumber", SERIAL_NUMBER)
            .reply("/prog/show?firmwareversion", FIRMWARE_VERSION)
            .reply("/prog/show?firmwarewarranty", FIRMWARE_WARRANTY)
            .reply("/prog/show?antennatypes", ANTENNA_TYPES)
    }

    pub fn reply(self, target: &str, body: &str) -> Self {
        self.script(target, Reply::Body(body.into()));
        self
    }

    pub fn refuse(self, target: &str) -> Self {
        self.script(target, Reply::Refused);
        self
    }

    /// Replaces a reply after the receiver has been opened
    pub fn set_reply(&self, target: &str, body: &str) {
        self.script(target, Reply::Body(body.into()));
    }

    /// Full URIs issued so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Targets issued so far, without scheme and host
    pub fn targets(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|uri| target_of(uri).to_string())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn script(&self, target: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(target.into(), reply);
    }

    fn respond(&self, uri: &str) -> Result<String> {
        self.calls.lock().unwrap().push(uri.to_string());
        match self.replies.lock().unwrap().get(target_of(uri)) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Refused) => Err(TpiError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            None => Err(TpiError::transport(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no reply scripted for {uri}"),
            ))),
        }
    }
}

fn target_of(uri: &str) -> &str {
    uri.find("/prog").map_or(uri, |at| &uri[at..])
}

impl TpiTransport for ScriptedTransport {
    async fn get(&self, uri: &str) -> Result<String> {
        self.respond(uri)
    }
}

impl BlockingTransport for ScriptedTransport {
    fn get(&self, uri: &str) -> Result<String> {
        self.respond(uri)
    }
}
