//! # tpi-client
//!
//! A Rust client for the TPI command protocol spoken by GNSS receivers
//! over HTTP.
//!
//! ## Overview
//!
//! Every TPI operation is an HTTP GET of the form
//! `/prog/{verb}?{object}&name=value...`, where the verb is one of
//! show/set/reset/enable/disable/delete/download/upload and the object is
//! a receiver state or control such as `Position` or `ElevationMask`. The
//! receiver answers with a plain-text body that this crate decodes into
//! typed values.
//!
//! On connection the client asks the receiver for its command table and
//! refuses, without any network traffic, every command the firmware did
//! not list.
//!
//! ## Example
//!
//! ```ignore
//! use tpi_client::client::{ReceiverOptions, TpiReceiver};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ReceiverOptions::new("192.168.1.10").credentials("admin", "password");
//!     let receiver = TpiReceiver::connect(&options).await?;
//!
//!     println!("{:?} {:?}", receiver.receiver_type(), receiver.serial_number());
//!     for reading in receiver.voltages().await? {
//!         println!("{reading}");
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::TpiError;

/// Command table discovered from the receiver
pub mod capability;

/// Client facades for establishing connections and issuing commands
pub mod client;

/// Error types used throughout the library
pub mod error;

/// Protocol definitions: requests, patterns and response decoding
pub mod protocol;

/// Convenience type alias for Results with TpiError
pub type Result<T> = core::result::Result<T, TpiError>;
