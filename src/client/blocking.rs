//! Blocking (synchronous) TPI receiver client
//!
//! This module provides a synchronous version of the receiver facade for
//! applications that don't use async I/O. It offers the same operations
//! as the async client; bootstrap reads are issued one after another.

use crate::client::{
    ELEVATION_MASK_RANGE, PDOP_MASK_RANGE, ReceiverOptions, ReferenceData, action_outcome,
    antenna_request, confirm_antenna, confirm_mask, ensure_showable, log_ready, mask_request,
    reference_value,
};
use crate::error::DecodeError;
use crate::protocol::{
    FromRecord,
    decode::{self, Record, check_body},
    decode_all, decode_first, decode_first_with,
    request::Request,
    response::{
        AntennaSetting, AntennaType, AntennaTypeCatalog, FirmwareVersion, FirmwareWarranty,
        GpsTimestamp, PositionFix, SerialNumber, UtcTime, VoltageReading, mask_from_record,
        temperature_from_record,
    },
    types::{ObjectKind, Verb},
};
use crate::{Result, capability::CapabilityTable};

/// Transport used by the blocking client
///
/// Implementations issue one HTTP GET for the absolute `uri` and return
/// the response body.
pub trait BlockingTransport {
    fn get(&self, uri: &str) -> Result<String>;
}

/// [`BlockingTransport`] over a `ureq` agent
#[cfg(feature = "blocking")]
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    authorization: Option<String>,
}

#[cfg(feature = "blocking")]
impl UreqTransport {
    /// Builds the transport; no request is issued
    pub fn new(options: &ReceiverOptions) -> Self {
        UreqTransport {
            agent: ureq::Agent::new_with_defaults(),
            authorization: options.authorization(),
        }
    }
}

#[cfg(feature = "blocking")]
impl BlockingTransport for UreqTransport {
    fn get(&self, uri: &str) -> Result<String> {
        let mut request = self.agent.get(uri);
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }
        let mut response = request
            .call()
            .map_err(crate::error::TpiError::transport)?;
        response
            .body_mut()
            .read_to_string()
            .map_err(crate::error::TpiError::transport)
    }
}

/// Blocking receiver facade
///
/// Same contract as [`crate::client::TpiReceiver`]: only constructed once
/// bootstrap has completed, and every operation checks the command table
/// before issuing a request.
///
/// # Type Parameters
/// * `Transport` - The blocking HTTP transport, e.g. `UreqTransport`
#[derive(Debug)]
pub struct TpiReceiver<Transport> {
    transport: Transport,
    address: String,
    base_uri: String,
    capabilities: CapabilityTable,
    reference: ReferenceData,
}

impl<Transport> TpiReceiver<Transport>
where
    Transport: BlockingTransport,
{
    /// Opens a receiver over the given transport
    ///
    /// # Arguments
    /// * `options` - Receiver address and scheme
    /// * `transport` - Transport that performs the GETs
    ///
    /// # Returns
    /// * `Ok(receiver)` - Command table loaded; reference reads that
    ///   failed are logged and left empty
    /// * `Err(_)` - Invalid address, or the command table could not be read
    pub fn open(options: &ReceiverOptions, transport: Transport) -> Result<Self> {
        let base_uri = options.base_uri()?;
        let mut receiver = TpiReceiver {
            transport,
            address: options.address().to_string(),
            base_uri,
            capabilities: CapabilityTable::bootstrap(),
            reference: ReferenceData::default(),
        };

        let body = receiver.send(&Request::show(ObjectKind::Commands))?;
        receiver.capabilities =
            CapabilityTable::from_commands(&decode::decode(ObjectKind::Commands, &body)?);

        receiver.reference = ReferenceData {
            serial_number: receiver.fetch_reference::<SerialNumber>(),
            firmware_version: receiver.fetch_reference::<FirmwareVersion>(),
            firmware_warranty: receiver.fetch_reference::<FirmwareWarranty>(),
            antenna_types: receiver.fetch_catalog(),
        };

        log_ready(&receiver.address, &receiver.capabilities, &receiver.reference);
        Ok(receiver)
    }

    fn send(&self, request: &Request) -> Result<String> {
        self.capabilities.ensure(request.verb(), request.object())?;
        let uri = request.uri(&self.base_uri);
        log::debug!("GET {}", uri);
        self.transport.get(&uri)
    }

    fn show<T: FromRecord>(&self) -> Result<T> {
        let body = self.send(&Request::show(T::OBJECT))?;
        decode_first(&body)
    }

    fn show_with<T>(
        &self,
        object: ObjectKind,
        convert: fn(&Record) -> core::result::Result<T, DecodeError>,
    ) -> Result<T> {
        let body = self.send(&Request::show(object))?;
        decode_first_with(object, &body, convert)
    }

    fn fetch_reference<T: FromRecord>(&self) -> Option<T> {
        if !self.capabilities.is_supported(Verb::Show, T::OBJECT) {
            return None;
        }
        reference_value(T::OBJECT, self.show())
    }

    fn fetch_catalog(&self) -> AntennaTypeCatalog {
        if !self
            .capabilities
            .is_supported(Verb::Show, ObjectKind::AntennaTypes)
        {
            return AntennaTypeCatalog::default();
        }
        let types = self
            .send(&Request::show(ObjectKind::AntennaTypes))
            .and_then(|body| decode_all::<AntennaType>(&body));
        reference_value(ObjectKind::AntennaTypes, types)
            .map(AntennaTypeCatalog::new)
            .unwrap_or_default()
    }

    /// Issues any command and decodes the response with the object's pattern
    pub fn execute(&self, request: &Request) -> Result<Vec<Record>> {
        let body = self.send(request)?;
        decode::decode(request.object(), &body)
    }

    /// Returns the raw body of `show {object}`
    pub fn show_raw(&self, object: ObjectKind) -> Result<String> {
        ensure_showable(object)?;
        let body = self.send(&Request::show(object))?;
        check_body(&body)?;
        Ok(body)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.reference
            .serial_number
            .as_ref()
            .map(|s| s.serial.as_str())
    }

    pub fn receiver_type(&self) -> Option<&str> {
        self.reference
            .serial_number
            .as_ref()
            .and_then(|s| s.receiver_type.as_deref())
    }

    pub fn firmware_version(&self) -> Option<&FirmwareVersion> {
        self.reference.firmware_version.as_ref()
    }

    pub fn firmware_warranty_date(&self) -> Option<chrono::NaiveDate> {
        self.reference.firmware_warranty.map(|w| w.0)
    }

    pub fn antenna_types(&self) -> &AntennaTypeCatalog {
        &self.reference.antenna_types
    }

    pub fn utc_time(&self) -> Result<chrono::DateTime<chrono::Utc>> {
        self.show::<UtcTime>().map(|t| t.0)
    }

    pub fn gps_time(&self) -> Result<GpsTimestamp> {
        self.show()
    }

    pub fn position(&self) -> Result<PositionFix> {
        self.show()
    }

    pub fn voltages(&self) -> Result<Vec<VoltageReading>> {
        let body = self.send(&Request::show(ObjectKind::Voltages))?;
        decode_all(&body)
    }

    pub fn temperature(&self) -> Result<f64> {
        self.show_with(ObjectKind::Temperature, temperature_from_record)
    }

    pub fn elevation_mask(&self) -> Result<i32> {
        self.show_with(ObjectKind::ElevationMask, mask_from_record)
    }

    /// Sets the elevation mask, -10 to 90 degrees
    pub fn set_elevation_mask(&self, mask: i32) -> Result<()> {
        self.set_mask(ObjectKind::ElevationMask, ELEVATION_MASK_RANGE, mask)
    }

    pub fn pdop_mask(&self) -> Result<i32> {
        self.show_with(ObjectKind::PdopMask, mask_from_record)
    }

    /// Sets the PDOP mask, 0 to 99
    pub fn set_pdop_mask(&self, mask: i32) -> Result<()> {
        self.set_mask(ObjectKind::PdopMask, PDOP_MASK_RANGE, mask)
    }

    fn set_mask(
        &self,
        object: ObjectKind,
        range: core::ops::RangeInclusive<i32>,
        mask: i32,
    ) -> Result<()> {
        self.capabilities.ensure(Verb::Set, object)?;
        let request = mask_request(object, range, mask)?;
        let body = self.send(&request)?;
        confirm_mask(object, &body, mask)
    }

    pub fn antenna(&self) -> Result<AntennaSetting> {
        self.show()
    }

    /// Configures the antenna and returns the receiver's echo
    pub fn set_antenna(&self, setting: &AntennaSetting) -> Result<AntennaSetting> {
        self.capabilities.ensure(Verb::Set, ObjectKind::Antenna)?;
        let request = antenna_request(&self.reference.antenna_types, setting)?;
        let body = self.send(&request)?;
        confirm_antenna(&body)
    }

    /// Reboots the receiver; see [`crate::client::TpiReceiver::restart_receiver`]
    pub fn restart_receiver(&self) -> Result<bool> {
        self.reset(ObjectKind::System)
    }

    pub fn reset_gnss_data(&self) -> Result<bool> {
        self.reset(ObjectKind::GnssData)
    }

    fn reset(&self, object: ObjectKind) -> Result<bool> {
        let request = Request::new(Verb::Reset, object);
        let body = self.send(&request)?;
        Ok(action_outcome(&request, &body))
    }

    /// Releases the transport
    pub fn close(self) -> Transport {
        log::debug!("closing receiver {}", self.address);
        self.transport
    }
}

#[cfg(feature = "blocking")]
impl TpiReceiver<UreqTransport> {
    /// Connects to a receiver over HTTP(S)
    ///
    /// # Example
    /// ```no_run
    /// # use tpi_client::client::{ReceiverOptions, blocking::TpiReceiver};
    /// let receiver = TpiReceiver::connect(&ReceiverOptions::new("192.168.1.10")).unwrap();
    /// println!("{:?}", receiver.position());
    /// ```
    pub fn connect(options: &ReceiverOptions) -> Result<Self> {
        options.base_uri()?;
        let transport = UreqTransport::new(options);
        TpiReceiver::open(options, transport)
    }
}
