//! Asynchronous TPI receiver client
//!
//! This module provides the async facade for talking to a receiver. A
//! [`TpiReceiver`] is only handed out once its bootstrap has completed:
//! the command table has been fetched and the reference data (serial
//! number, firmware identity, antenna catalog) is loaded.
//!
//! For synchronous/blocking operations, see the `blocking` submodule.
//!
//! # Example
//!
//! ```no_run
//! use tpi_client::client::{ReceiverOptions, TpiReceiver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ReceiverOptions::new("192.168.1.10").credentials("admin", "password");
//! let receiver = TpiReceiver::connect(&options).await?;
//!
//! println!("Serial: {:?}", receiver.serial_number());
//! let fix = receiver.position().await?;
//! println!("lat {:.6}, lon {:.6}", fix.latitude, fix.longitude);
//!
//! receiver.set_elevation_mask(10).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;

use crate::{
    Result,
    capability::CapabilityTable,
    error::{DecodeError, TpiError},
    protocol::{
        FromRecord,
        decode::{self, Record, check_body},
        decode_all, decode_first, decode_first_with,
        request::Request,
        response::{
            AntennaSetting, AntennaType, AntennaTypeCatalog, FirmwareVersion, FirmwareWarranty,
            GpsTimestamp, PositionFix, SerialNumber, UtcTime, VoltageReading, mask_from_record,
            temperature_from_record,
        },
        types::{ObjectKind, Scheme, Verb, Verbs},
    },
};

/// Blocking (synchronous) client implementation
pub mod blocking;

/// Default HTTP transport built on reqwest
#[cfg(feature = "reqwest")]
pub mod http;

#[cfg(feature = "reqwest")]
pub use http::HttpTransport;

/// Allowed elevation mask, degrees
pub const ELEVATION_MASK_RANGE: core::ops::RangeInclusive<i32> = -10..=90;

/// Allowed PDOP mask, unitless
pub const PDOP_MASK_RANGE: core::ops::RangeInclusive<i32> = 0..=99;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}$")
        .expect("address pattern is a valid regular expression")
});

/// Transport used by the async client
///
/// Implementations issue one HTTP GET for the absolute `uri` and return
/// the response body. Transport failures are reported as
/// [`TpiError::Transport`].
pub trait TpiTransport {
    fn get(&self, uri: &str) -> impl std::future::Future<Output = Result<String>>;
}

/// Connection settings for a receiver
///
/// # Example
/// ```
/// use tpi_client::client::ReceiverOptions;
/// use tpi_client::protocol::types::Scheme;
///
/// let options = ReceiverOptions::new("10.0.0.5").scheme(Scheme::Https);
/// assert_eq!(options.base_uri().unwrap(), "https://10.0.0.5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverOptions {
    address: String,
    scheme: Scheme,
    credentials: Option<(String, String)>,
}

impl ReceiverOptions {
    /// Creates options for the receiver at `address`
    ///
    /// The address must be a dotted-quad IPv4 address; it is checked when
    /// the client is opened.
    pub fn new<S: AsRef<str>>(address: S) -> Self {
        ReceiverOptions {
            address: address.as_ref().into(),
            scheme: Scheme::default(),
            credentials: None,
        }
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets HTTP Basic credentials
    ///
    /// The header is only sent when both user and password are non-empty.
    pub fn credentials<U: AsRef<str>, P: AsRef<str>>(mut self, user: U, password: P) -> Self {
        self.credentials = Some((user.as_ref().into(), password.as_ref().into()));
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Validates the address and renders `{scheme}://{address}`
    pub fn base_uri(&self) -> Result<String> {
        if !ADDRESS.is_match(&self.address) {
            return Err(TpiError::Configuration("Invalid receiver address"));
        }
        Ok(format!("{}://{}", self.scheme.as_str(), self.address))
    }

    /// Value of the `Authorization` header, if credentials are set
    pub fn authorization(&self) -> Option<String> {
        let (user, password) = self.credentials.as_ref()?;
        if user.is_empty() || password.is_empty() {
            return None;
        }
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
        Some(format!("Basic {token}"))
    }
}

/// Receiver data fetched once during bootstrap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub serial_number: Option<SerialNumber>,
    pub firmware_version: Option<FirmwareVersion>,
    pub firmware_warranty: Option<FirmwareWarranty>,
    pub antenna_types: AntennaTypeCatalog,
}

/// Keeps a bootstrap reference value, or logs why it is missing
pub(crate) fn reference_value<T>(object: ObjectKind, fetched: Result<T>) -> Option<T> {
    match fetched {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("{} unavailable: {}", object, err);
            None
        }
    }
}

/// Validates a mask value and builds its `set` request
pub(crate) fn mask_request(
    object: ObjectKind,
    range: core::ops::RangeInclusive<i32>,
    mask: i32,
) -> Result<Request> {
    if !range.contains(&mask) {
        return Err(TpiError::Validation(format!(
            "{} {} is outside {}..={}",
            object,
            mask,
            range.start(),
            range.end()
        )));
    }
    Ok(Request::new(Verb::Set, object).param("mask", mask))
}

/// Accepts a mask write only when the echo decodes to the requested value
pub(crate) fn confirm_mask(object: ObjectKind, body: &str, mask: i32) -> Result<()> {
    match decode_first_with(object, body, mask_from_record) {
        Ok(echoed) if echoed == mask => Ok(()),
        Ok(echoed) => {
            log::warn!("{} echoed {} after set to {}", object, echoed, mask);
            Err(TpiError::OperationFailed(Verb::Set, object))
        }
        Err(err) => {
            log::warn!("{} set not confirmed: {}", object, err);
            Err(TpiError::OperationFailed(Verb::Set, object))
        }
    }
}

/// Validates an antenna setting against the catalog and builds its `set` request
///
/// Name and serial number are checked but not transmitted.
pub(crate) fn antenna_request(
    catalog: &AntennaTypeCatalog,
    setting: &AntennaSetting,
) -> Result<Request> {
    let Some(entry) = catalog.get(setting.type_id) else {
        return Err(TpiError::Validation(format!(
            "antenna type {} is not in the receiver catalog",
            setting.type_id
        )));
    };
    if !entry.name.eq_ignore_ascii_case(&setting.name) {
        return Err(TpiError::Validation(format!(
            "antenna type {} is named {:?}, not {:?}",
            entry.id, entry.name, setting.name
        )));
    }
    if !entry.supports(&setting.method) {
        return Err(TpiError::Validation(format!(
            "antenna {:?} does not support measurement method {:?}",
            entry.name, setting.method
        )));
    }

    Ok(Request::new(Verb::Set, ObjectKind::Antenna)
        .param("type", setting.type_id)
        .param("height", setting.height)
        .param("measMethod", &setting.method))
}

pub(crate) fn confirm_antenna(body: &str) -> Result<AntennaSetting> {
    decode_first::<AntennaSetting>(body).map_err(|err| {
        log::warn!("antenna set not confirmed: {}", err);
        TpiError::OperationFailed(Verb::Set, ObjectKind::Antenna)
    })
}

/// Outcome of an action with no fields to decode
pub(crate) fn action_outcome(request: &Request, body: &str) -> bool {
    match check_body(body) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("{} rejected: {}", request.key(), err);
            false
        }
    }
}

pub(crate) fn ensure_showable(object: ObjectKind) -> Result<()> {
    if object.verbs().contains(Verbs::SHOW) {
        Ok(())
    } else {
        Err(TpiError::Validation(format!("{} can't be shown", object)))
    }
}

pub(crate) fn log_ready(address: &str, capabilities: &CapabilityTable, reference: &ReferenceData) {
    let serial = reference.serial_number.as_ref();
    log::info!(
        "receiver {} ready: sn={} type={} commands={} antenna types={}",
        address,
        serial.map(|s| s.serial.as_str()).unwrap_or("?"),
        serial
            .and_then(|s| s.receiver_type.as_deref())
            .unwrap_or("?"),
        capabilities.len(),
        reference.antenna_types.len()
    );
}

/// Async receiver facade
///
/// Owns the transport and the data fetched at bootstrap. All operations
/// take `&self` and issue at most one request; the command table and
/// reference data never change after construction.
///
/// # Type Parameters
/// * `Transport` - The HTTP transport, e.g. [`HttpTransport`]
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
    Transport: TpiTransport,
{
    /// Opens a receiver over the given transport
    ///
    /// Validates the address, fetches the command table, then fetches the
    /// reference data concurrently. Reference objects the receiver does
    /// not list are skipped, and a reference read that fails is logged
    /// and left empty. Only the address check and the command table can
    /// abort construction.
    ///
    /// # Arguments
    /// * `options` - Receiver address and scheme
    /// * `transport` - Transport that performs the GETs
    pub async fn open(options: &ReceiverOptions, transport: Transport) -> Result<Self> {
        let base_uri = options.base_uri()?;
        let mut receiver = TpiReceiver {
            transport,
            address: options.address().to_string(),
            base_uri,
            capabilities: CapabilityTable::bootstrap(),
            reference: ReferenceData::default(),
        };

        let body = receiver.send(&Request::show(ObjectKind::Commands)).await?;
        receiver.capabilities =
            CapabilityTable::from_commands(&decode::decode(ObjectKind::Commands, &body)?);

        let (serial_number, firmware_version, firmware_warranty, antenna_types) =
            futures_util::future::join4(
                receiver.fetch_reference::<SerialNumber>(),
                receiver.fetch_reference::<FirmwareVersion>(),
                receiver.fetch_reference::<FirmwareWarranty>(),
                receiver.fetch_catalog(),
            )
            .await;

        receiver.reference = ReferenceData {
            serial_number,
            firmware_version,
            firmware_warranty,
            antenna_types,
        };

        log_ready(&receiver.address, &receiver.capabilities, &receiver.reference);
        Ok(receiver)
    }

    /// Checks the command table, then issues the request
    async fn send(&self, request: &Request) -> Result<String> {
        self.capabilities.ensure(request.verb(), request.object())?;
        let uri = request.uri(&self.base_uri);
        log::debug!("GET {}", uri);
        self.transport.get(&uri).await
    }

    async fn show<T: FromRecord>(&self) -> Result<T> {
        let body = self.send(&Request::show(T::OBJECT)).await?;
        decode_first(&body)
    }

    async fn show_with<T>(
        &self,
        object: ObjectKind,
        convert: fn(&Record) -> core::result::Result<T, DecodeError>,
    ) -> Result<T> {
        let body = self.send(&Request::show(object)).await?;
        decode_first_with(object, &body, convert)
    }

    async fn fetch_reference<T: FromRecord>(&self) -> Option<T> {
        if !self.capabilities.is_supported(Verb::Show, T::OBJECT) {
            return None;
        }
        reference_value(T::OBJECT, self.show().await)
    }

    async fn fetch_catalog(&self) -> AntennaTypeCatalog {
        if !self
            .capabilities
            .is_supported(Verb::Show, ObjectKind::AntennaTypes)
        {
            return AntennaTypeCatalog::default();
        }
        let types = match self.send(&Request::show(ObjectKind::AntennaTypes)).await {
            Ok(body) => decode_all::<AntennaType>(&body),
            Err(err) => Err(err),
        };
        reference_value(ObjectKind::AntennaTypes, types)
            .map(AntennaTypeCatalog::new)
            .unwrap_or_default()
    }

    /// Issues any command and decodes the response with the object's pattern
    ///
    /// Objects without a pattern return no records on success.
    pub async fn execute(&self, request: &Request) -> Result<Vec<Record>> {
        let body = self.send(request).await?;
        decode::decode(request.object(), &body)
    }

    /// Returns the raw body of `show {object}`
    pub async fn show_raw(&self, object: ObjectKind) -> Result<String> {
        ensure_showable(object)?;
        let body = self.send(&Request::show(object)).await?;
        check_body(&body)?;
        Ok(body)
    }

    /// Address the receiver was opened with
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Command table reported by the receiver
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

    /// Antenna catalog fetched at bootstrap
    pub fn antenna_types(&self) -> &AntennaTypeCatalog {
        &self.reference.antenna_types
    }

    /// Current UTC date and time
    pub async fn utc_time(&self) -> Result<chrono::DateTime<chrono::Utc>> {
        self.show::<UtcTime>().await.map(|t| t.0)
    }

    /// Current GPS week and seconds of week
    ///
    /// GPS time is offset from UTC by the accumulated leap seconds.
    pub async fn gps_time(&self) -> Result<GpsTimestamp> {
        self.show().await
    }

    /// Most recent position fix with velocity, clock and DOP values
    pub async fn position(&self) -> Result<PositionFix> {
        self.show().await
    }

    /// Voltage of each power and battery input
    pub async fn voltages(&self) -> Result<Vec<VoltageReading>> {
        let body = self.send(&Request::show(ObjectKind::Voltages)).await?;
        decode_all(&body)
    }

    /// Internal receiver temperature in degrees Celsius
    ///
    /// Diagnostic only, not an indication of ambient temperature.
    pub async fn temperature(&self) -> Result<f64> {
        self.show_with(ObjectKind::Temperature, temperature_from_record)
            .await
    }

    /// Elevation below which satellites are not tracked, in degrees
    pub async fn elevation_mask(&self) -> Result<i32> {
        self.show_with(ObjectKind::ElevationMask, mask_from_record)
            .await
    }

    /// Sets the elevation mask, -10 to 90 degrees
    pub async fn set_elevation_mask(&self, mask: i32) -> Result<()> {
        self.set_mask(ObjectKind::ElevationMask, ELEVATION_MASK_RANGE, mask)
            .await
    }

    /// PDOP above which fixes are not logged or output
    pub async fn pdop_mask(&self) -> Result<i32> {
        self.show_with(ObjectKind::PdopMask, mask_from_record).await
    }

    /// Sets the PDOP mask, 0 to 99
    pub async fn set_pdop_mask(&self, mask: i32) -> Result<()> {
        self.set_mask(ObjectKind::PdopMask, PDOP_MASK_RANGE, mask)
            .await
    }

    async fn set_mask(
        &self,
        object: ObjectKind,
        range: core::ops::RangeInclusive<i32>,
        mask: i32,
    ) -> Result<()> {
        self.capabilities.ensure(Verb::Set, object)?;
        let request = mask_request(object, range, mask)?;
        let body = self.send(&request).await?;
        confirm_mask(object, &body, mask)
    }

    /// Currently configured antenna
    pub async fn antenna(&self) -> Result<AntennaSetting> {
        self.show().await
    }

    /// Configures the antenna and returns the receiver's echo
    ///
    /// The type must be in [`antenna_types`](Self::antenna_types) under
    /// the same name and support the measurement method.
    pub async fn set_antenna(&self, setting: &AntennaSetting) -> Result<AntennaSetting> {
        self.capabilities.ensure(Verb::Set, ObjectKind::Antenna)?;
        let request = antenna_request(&self.reference.antenna_types, setting)?;
        let body = self.send(&request).await?;
        confirm_antenna(&body)
    }

    /// Reboots the receiver
    ///
    /// Returns `false` when the receiver rejected the command. The
    /// receiver refuses further commands for roughly 30 seconds while
    /// it restarts.
    pub async fn restart_receiver(&self) -> Result<bool> {
        self.reset(ObjectKind::System).await
    }

    /// Clears stored ephemeris, almanac and other GNSS data
    pub async fn reset_gnss_data(&self) -> Result<bool> {
        self.reset(ObjectKind::GnssData).await
    }

    async fn reset(&self, object: ObjectKind) -> Result<bool> {
        let request = Request::new(Verb::Reset, object);
        let body = self.send(&request).await?;
        Ok(action_outcome(&request, &body))
    }

    /// Releases the transport
    pub fn close(self) -> Transport {
        log::debug!("closing receiver {}", self.address);
        self.transport
    }
}

#[cfg(feature = "reqwest")]
impl TpiReceiver<HttpTransport> {
    /// Connects to a receiver over HTTP(S)
    ///
    /// # Example
    /// ```no_run
    /// # use tpi_client::client::{ReceiverOptions, TpiReceiver};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let receiver = TpiReceiver::connect(&ReceiverOptions::new("192.168.1.10")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(options: &ReceiverOptions) -> Result<Self> {
        options.base_uri()?;
        let transport = HttpTransport::new(options)?;
        TpiReceiver::open(options, transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        for ok in ["192.168.1.10", "10.0.0.1", "999.999.999.999"] {
            assert!(ReceiverOptions::new(ok).base_uri().is_ok(), "{ok}");
        }
        for bad in ["receiver.local", "10.0.0", "10.0.0.1:80", "1234.0.0.1", " 10.0.0.1", ""] {
            assert!(
                matches!(
                    ReceiverOptions::new(bad).base_uri(),
                    Err(TpiError::Configuration(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_base_uri_scheme() {
        let options = ReceiverOptions::new("10.1.2.3");
        assert_eq!(options.base_uri().unwrap(), "http://10.1.2.3");
        assert_eq!(
            options.scheme(Scheme::Https).base_uri().unwrap(),
            "https://10.1.2.3"
        );
    }

    #[test]
    fn test_authorization_requires_both_parts() {
        let options = ReceiverOptions::new("10.1.2.3");
        assert_eq!(options.authorization(), None);
        assert_eq!(options.clone().credentials("admin", "").authorization(), None);
        assert_eq!(options.clone().credentials("", "secret").authorization(), None);
        assert_eq!(
            options.credentials("admin", "password").authorization().as_deref(),
            Some("Basic YWRtaW46cGFzc3dvcmQ=")
        );
    }

    #[test]
    fn test_mask_request_bounds() {
        assert!(mask_request(ObjectKind::ElevationMask, ELEVATION_MASK_RANGE, -10).is_ok());
        assert!(mask_request(ObjectKind::ElevationMask, ELEVATION_MASK_RANGE, 90).is_ok());
        assert!(matches!(
            mask_request(ObjectKind::ElevationMask, ELEVATION_MASK_RANGE, 91),
            Err(TpiError::Validation(_))
        ));
        assert!(matches!(
            mask_request(ObjectKind::PdopMask, PDOP_MASK_RANGE, -1),
            Err(TpiError::Validation(_))
        ));
        let request = mask_request(ObjectKind::PdopMask, PDOP_MASK_RANGE, 99).unwrap();
        assert_eq!(request.target(), "/prog/set?pdopmask&mask=99");
    }

    #[test]
    fn test_confirm_mask() {
        assert!(confirm_mask(ObjectKind::ElevationMask, "ElevationMask mask=0", 0).is_ok());
        for body in ["ElevationMask mask=5", "ERROR: bad value", "", "OK"] {
            assert!(matches!(
                confirm_mask(ObjectKind::ElevationMask, body, 0),
                Err(TpiError::OperationFailed(Verb::Set, ObjectKind::ElevationMask))
            ));
        }
    }

    #[test]
    fn test_antenna_request_omits_name_and_serial() {
        let catalog = AntennaTypeCatalog::new(vec![AntennaType {
            id: 31,
            name: "Zephyr Geodetic".into(),
            methods: vec!["BottomOfAntennaMount".into()],
        }]);
        let setting = AntennaSetting {
            type_id: 31,
            name: "Zephyr Geodetic".into(),
            method: "BottomOfAntennaMount".into(),
            height: 1.25,
            serial: Some("12345".into()),
        };
        let request = antenna_request(&catalog, &setting).unwrap();
        assert_eq!(
            request.target(),
            "/prog/set?antenna&type=31&height=1.25&measMethod=BottomOfAntennaMount"
        );

        let renamed = AntennaSetting {
            name: "Zephyr".into(),
            ..setting
        };
        assert!(matches!(
            antenna_request(&catalog, &renamed),
            Err(TpiError::Validation(_))
        ));
    }

    #[test]
    fn test_show_raw_refuses_action_objects() {
        assert!(ensure_showable(ObjectKind::Ephemeris).is_ok());
        assert!(matches!(
            ensure_showable(ObjectKind::System),
            Err(TpiError::Validation(_))
        ));
    }
}
