//! Channel addressing.
//!
//! Every receiver channel of a station is identified by three small numbers: the station, the receiver signal processor (RSP) board and the receiver unit (RCU) attached to it.
//! A [`ChannelKey`] encodes them into the 9-digit name of the channel's dataset, three zero-padded digits each.
//!
//! ```rust
//! # use dalarray::channel::{decode, encode, ChannelKey};
//! assert_eq!(encode(1, 2, 3)?, "001002003");
//! assert_eq!(decode("001002003")?, (1, 2, 3));
//!
//! let key: ChannelKey = "017005042".parse()?;
//! assert_eq!(key.rcu_id(), 42);
//! assert_eq!(key.channel_id(), 17_005_042);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

use crate::node::NodeName;

/// The largest id representable in one field of a channel key.
pub const MAX_CHANNEL_ID_COMPONENT: u32 = 999;

/// The length of an encoded channel key.
pub const CHANNEL_KEY_LENGTH: usize = 9;

/// A channel key encoding error.
#[derive(Clone, Debug, Error)]
pub enum EncodingError {
    /// An id is larger than [`MAX_CHANNEL_ID_COMPONENT`].
    #[error("{field} id {value} is out of range, must be at most {MAX_CHANNEL_ID_COMPONENT}")]
    OutOfRange {
        /// The field name.
        field: &'static str,
        /// The offending value.
        value: u32,
    },
}

/// A channel key decoding error.
#[derive(Clone, Debug, Error)]
pub enum DecodingError {
    /// The key is not composed of exactly nine ASCII digits.
    #[error("malformed channel key {0:?}, expected {CHANNEL_KEY_LENGTH} decimal digits")]
    MalformedKey(String),
}

/// A channel key.
///
/// Formats as the 9-digit dataset name, e.g. `001002003`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{station_id:03}{rsp_id:03}{rcu_id:03}")]
pub struct ChannelKey {
    station_id: u32,
    rsp_id: u32,
    rcu_id: u32,
}

impl ChannelKey {
    /// Create a new channel key.
    ///
    /// # Errors
    /// Returns [`EncodingError::OutOfRange`] if any id exceeds [`MAX_CHANNEL_ID_COMPONENT`].
    pub fn new(station_id: u32, rsp_id: u32, rcu_id: u32) -> Result<Self, EncodingError> {
        for (field, value) in [("station", station_id), ("rsp", rsp_id), ("rcu", rcu_id)] {
            if value > MAX_CHANNEL_ID_COMPONENT {
                return Err(EncodingError::OutOfRange { field, value });
            }
        }
        Ok(Self {
            station_id,
            rsp_id,
            rcu_id,
        })
    }

    /// The station id.
    #[must_use]
    pub const fn station_id(&self) -> u32 {
        self.station_id
    }

    /// The RSP board id.
    #[must_use]
    pub const fn rsp_id(&self) -> u32 {
        self.rsp_id
    }

    /// The RCU id.
    #[must_use]
    pub const fn rcu_id(&self) -> u32 {
        self.rcu_id
    }

    /// The numeric channel id, `station * 10^6 + rsp * 10^3 + rcu`.
    ///
    /// This is the decimal value of the key.
    #[must_use]
    pub const fn channel_id(&self) -> u32 {
        self.station_id * 1_000_000 + self.rsp_id * 1_000 + self.rcu_id
    }

    /// The dataset name of the channel.
    #[must_use]
    pub fn node_name(&self) -> NodeName {
        // a channel key is always a valid node name
        NodeName::new(&self.to_string()).unwrap_or_else(|_| unreachable!())
    }
}

impl FromStr for ChannelKey {
    type Err = DecodingError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (station_id, rsp_id, rcu_id) = decode(key)?;
        Ok(Self {
            station_id,
            rsp_id,
            rcu_id,
        })
    }
}

impl TryFrom<&NodeName> for ChannelKey {
    type Error = DecodingError;

    fn try_from(name: &NodeName) -> Result<Self, Self::Error> {
        name.as_str().parse()
    }
}

/// Encode a channel key from its ids.
///
/// # Errors
/// Returns [`EncodingError::OutOfRange`] if any id exceeds [`MAX_CHANNEL_ID_COMPONENT`].
pub fn encode(station_id: u32, rsp_id: u32, rcu_id: u32) -> Result<String, EncodingError> {
    Ok(ChannelKey::new(station_id, rsp_id, rcu_id)?.to_string())
}

/// Decode the ids of a channel key.
///
/// # Errors
/// Returns [`DecodingError::MalformedKey`] unless `key` is exactly nine ASCII digits.
pub fn decode(key: &str) -> Result<(u32, u32, u32), DecodingError> {
    let malformed = || DecodingError::MalformedKey(key.to_string());
    if key.len() != CHANNEL_KEY_LENGTH || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    // all ascii, so slicing on byte offsets is on char boundaries
    let field = |range: std::ops::Range<usize>| key[range].parse::<u32>().map_err(|_| malformed());
    Ok((field(0..3)?, field(3..6)?, field(6..9)?))
}
