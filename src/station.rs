//! Channel-addressed station groups.
//!
//! A [`StationGroup`] is a view of a [`GroupNode`] holding one rank-1 time-series dataset per receiver channel.
//! Each dataset is named by its [`ChannelKey`] and carries per-channel attributes such as [`TIME`] and [`SAMPLE_NUMBER`].
//! The station group itself carries trigger and pointing attributes.
//!
//! ```text
//! /
//! `-- Station001                 group
//!     |-- TRIGGER_TYPE           attribute  string
//!     |-- TRIGGER_OFFSET         attribute  f64
//!     |-- STATION_POSITION_VALUE attribute  [f64; 3]
//!     |-- 001000000              dataset    [samples] int16
//!     `-- 001000001              dataset    [samples] int16
//! ```
//!
//! Per-channel attribute accessors such as [`StationGroup::times`] aggregate one value per channel in channel enumeration order and fail on the first channel lacking the attribute.

use std::sync::Arc;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    array::{DataType, Element, ExtensibleArray, ExtensibleArrayBuilder, ReadError},
    channel::ChannelKey,
    config::global_config,
    group::{get_fixed_length_attribute, AggregationError, AttributeError, GroupNode},
    hyperslab::Hyperslab,
    node::{CreateError, NodeName, OpenError},
    storage::{Attributes, ReadableStorageTraits, ReadableWritableStorageTraits, StorageError},
};

/// Channel attribute: the station id.
pub const STATION_ID: &str = "STATION_ID";
/// Channel attribute: the RSP board id.
pub const RSP_ID: &str = "RSP_ID";
/// Channel attribute: the RCU id.
pub const RCU_ID: &str = "RCU_ID";
/// Channel attribute: the time of the first sample, in seconds since the epoch.
pub const TIME: &str = "TIME";
/// Channel attribute: the sample number of the first sample within [`TIME`].
pub const SAMPLE_NUMBER: &str = "SAMPLE_NUMBER";
/// Channel attribute: the number of samples per frame.
pub const SAMPLES_PER_FRAME: &str = "SAMPLES_PER_FRAME";
/// Channel attribute: the number of samples recorded.
pub const DATA_LENGTH: &str = "DATA_LENGTH";
/// Channel attribute: the Nyquist zone of the analog-to-digital conversion.
pub const NYQUIST_ZONE: &str = "NYQUIST_ZONE";
/// Channel attribute: the numerical value of the sample frequency.
pub const SAMPLE_FREQUENCY_VALUE: &str = "SAMPLE_FREQUENCY_VALUE";
/// Channel attribute: the unit of the sample frequency.
pub const SAMPLE_FREQUENCY_UNIT: &str = "SAMPLE_FREQUENCY_UNIT";
/// Channel attribute: the feed type.
pub const FEED: &str = "FEED";

/// Station attribute: the trigger type which caused the recording.
pub const TRIGGER_TYPE: &str = "TRIGGER_TYPE";
/// Station attribute: the trigger offset.
pub const TRIGGER_OFFSET: &str = "TRIGGER_OFFSET";
/// Station attribute: the antennas for which the trigger was raised.
pub const TRIGGERED_ANTENNAS: &str = "TRIGGERED_ANTENNAS";
/// Station attribute: the beam direction.
pub const BEAM_DIRECTION_VALUE: &str = "BEAM_DIRECTION_VALUE";
/// Station attribute: the unit of [`BEAM_DIRECTION_VALUE`].
pub const BEAM_DIRECTION_UNIT: &str = "BEAM_DIRECTION_UNIT";
/// Station attribute: the reference frame of [`BEAM_DIRECTION_VALUE`].
pub const BEAM_DIRECTION_FRAME: &str = "BEAM_DIRECTION_FRAME";
/// Station attribute: the station position.
pub const STATION_POSITION_VALUE: &str = "STATION_POSITION_VALUE";
/// Station attribute: the unit of [`STATION_POSITION_VALUE`].
pub const STATION_POSITION_UNIT: &str = "STATION_POSITION_UNIT";
/// Station attribute: the reference frame of [`STATION_POSITION_VALUE`].
pub const STATION_POSITION_FRAME: &str = "STATION_POSITION_FRAME";

/// A station group error.
#[derive(Debug, Error)]
pub enum StationError {
    /// An array member is not named by a channel key.
    ///
    /// Only raised if [`Config::strict_channel_names`](crate::config::Config::strict_channel_names) is enabled.
    #[error("array {0} is not named by a channel key")]
    NotAChannel(NodeName),
    /// A channel could not be opened.
    #[error("failed to open channel {channel}: {source}")]
    Open {
        /// The channel.
        channel: ChannelKey,
        /// The open error.
        #[source]
        source: OpenError,
    },
    /// A channel could not be read.
    #[error("failed to read channel {channel}: {source}")]
    Read {
        /// The channel.
        channel: ChannelKey,
        /// The read error.
        #[source]
        source: ReadError,
    },
    /// A per-channel attribute could not be aggregated.
    #[error(transparent)]
    AggregationError(#[from] AggregationError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// A station group.
///
/// Wraps a [`GroupNode`] whose array members are channel datasets.
#[derive(Debug)]
pub struct StationGroup<TStorage: ?Sized + ReadableStorageTraits> {
    group: GroupNode<TStorage>,
}

impl<TStorage: ?Sized + ReadableStorageTraits> From<GroupNode<TStorage>> for StationGroup<TStorage> {
    fn from(group: GroupNode<TStorage>) -> Self {
        Self::new(group)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> StationGroup<TStorage> {
    /// Create a station view of `group`.
    #[must_use]
    pub fn new(group: GroupNode<TStorage>) -> Self {
        Self { group }
    }

    /// Open the station group `name` in `parent`.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if there is no member named `name`, the member is an array, or there is an underlying storage error.
    pub fn open(parent: &GroupNode<TStorage>, name: &str) -> Result<Self, OpenError> {
        Ok(Self::new(parent.open_subgroup(name)?))
    }

    /// Get the underlying group.
    #[must_use]
    pub fn group(&self) -> &GroupNode<TStorage> {
        &self.group
    }

    /// Unwrap the underlying group.
    #[must_use]
    pub fn into_group(self) -> GroupNode<TStorage> {
        self.group
    }

    /// Get the storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<TStorage> {
        self.group.storage()
    }

    /// Get the name of the station group.
    #[must_use]
    pub fn name(&self) -> NodeName {
        self.group.name()
    }

    /// Return the keys of the channels in the station, in enumeration order.
    ///
    /// Array members not named by a channel key fail the enumeration if [`Config::strict_channel_names`](crate::config::Config::strict_channel_names) is enabled, and are skipped otherwise.
    ///
    /// # Errors
    /// Returns [`StationError::NotAChannel`] for the first array member with a non-channel name in strict mode, or a [`StationError::StorageError`] on an underlying storage error.
    pub fn channel_keys(&self) -> Result<Vec<ChannelKey>, StationError> {
        let strict = global_config().strict_channel_names();
        let mut keys = Vec::new();
        for name in self.group.array_names()? {
            match ChannelKey::try_from(&name) {
                Ok(key) => keys.push(key),
                Err(_) if strict => return Err(StationError::NotAChannel(name)),
                Err(err) => log::warn!("skipping array {name} in {}: {err}", self.group.path()),
            }
        }
        Ok(keys)
    }

    /// Return the dataset names of the channels, e.g. `001002003`.
    ///
    /// # Errors
    /// See [`channel_keys`](StationGroup::channel_keys).
    pub fn channel_names(&self) -> Result<Vec<String>, StationError> {
        Ok(self
            .channel_keys()?
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Return the numeric channel ids, e.g. `1002003`.
    ///
    /// # Errors
    /// See [`channel_keys`](StationGroup::channel_keys).
    pub fn channel_ids(&self) -> Result<Vec<u32>, StationError> {
        Ok(self
            .channel_keys()?
            .iter()
            .map(ChannelKey::channel_id)
            .collect())
    }

    /// Return the number of channels.
    ///
    /// # Errors
    /// See [`channel_keys`](StationGroup::channel_keys).
    pub fn nof_channels(&self) -> Result<usize, StationError> {
        Ok(self.channel_keys()?.len())
    }

    /// Open the dataset of `channel`.
    ///
    /// # Errors
    /// Returns an [`OpenError`] if the channel does not exist or there is an underlying storage error.
    pub fn open_channel(&self, channel: ChannelKey) -> Result<ExtensibleArray<TStorage>, OpenError> {
        self.group.open_array(&channel.to_string())
    }

    /// Read the channel attribute `name` of every channel, in enumeration order.
    ///
    /// # Errors
    /// Returns a [`StationError`] if channel enumeration fails, or [`StationError::AggregationError`] for the first channel lacking the attribute or holding an incompatible value.
    pub fn channel_attribute<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Vec<T>, StationError> {
        let members: Vec<NodeName> = self
            .channel_keys()?
            .iter()
            .map(ChannelKey::node_name)
            .collect();
        Ok(self.group.aggregate_attribute_over(&members, name)?)
    }

    /// Return the [`STATION_ID`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn station_ids(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(STATION_ID)
    }

    /// Return the [`RSP_ID`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn rsp_ids(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(RSP_ID)
    }

    /// Return the [`RCU_ID`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn rcu_ids(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(RCU_ID)
    }

    /// Return the [`TIME`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn times(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(TIME)
    }

    /// Return the [`SAMPLE_NUMBER`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn sample_numbers(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(SAMPLE_NUMBER)
    }

    /// Return the [`SAMPLES_PER_FRAME`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn samples_per_frame(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(SAMPLES_PER_FRAME)
    }

    /// Return the [`DATA_LENGTH`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn data_lengths(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(DATA_LENGTH)
    }

    /// Return the [`NYQUIST_ZONE`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn nyquist_zones(&self) -> Result<Vec<u32>, StationError> {
        self.channel_attribute(NYQUIST_ZONE)
    }

    /// Return the [`SAMPLE_FREQUENCY_VALUE`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn sample_frequency_values(&self) -> Result<Vec<f64>, StationError> {
        self.channel_attribute(SAMPLE_FREQUENCY_VALUE)
    }

    /// Return the [`SAMPLE_FREQUENCY_UNIT`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn sample_frequency_units(&self) -> Result<Vec<String>, StationError> {
        self.channel_attribute(SAMPLE_FREQUENCY_UNIT)
    }

    /// Return the [`FEED`] of every channel.
    ///
    /// # Errors
    /// See [`channel_attribute`](StationGroup::channel_attribute).
    pub fn feeds(&self) -> Result<Vec<String>, StationError> {
        self.channel_attribute(FEED)
    }

    /// Return the [`TRIGGER_TYPE`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a string.
    pub fn trigger_type(&self) -> Result<String, AttributeError> {
        self.group.attribute(TRIGGER_TYPE)
    }

    /// Return the [`TRIGGER_OFFSET`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a number.
    pub fn trigger_offset(&self) -> Result<f64, AttributeError> {
        self.group.attribute(TRIGGER_OFFSET)
    }

    /// Return the [`TRIGGERED_ANTENNAS`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a vector of unsigned integers.
    pub fn triggered_antennas(&self) -> Result<Vec<u32>, AttributeError> {
        self.group.attribute(TRIGGERED_ANTENNAS)
    }

    /// Return the [`BEAM_DIRECTION_VALUE`] of the station.
    ///
    /// # Errors
    /// Returns [`AttributeError::InvalidLength`] unless the attribute holds exactly two values, or another [`AttributeError`] if it is missing or not numeric.
    pub fn beam_direction_value(&self) -> Result<[f64; 2], AttributeError> {
        get_fixed_length_attribute(
            &**self.storage(),
            self.group.handle(),
            BEAM_DIRECTION_VALUE,
        )
    }

    /// Return the [`BEAM_DIRECTION_UNIT`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a string.
    pub fn beam_direction_unit(&self) -> Result<String, AttributeError> {
        self.group.attribute(BEAM_DIRECTION_UNIT)
    }

    /// Return the [`BEAM_DIRECTION_FRAME`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a string.
    pub fn beam_direction_frame(&self) -> Result<String, AttributeError> {
        self.group.attribute(BEAM_DIRECTION_FRAME)
    }

    /// Return the [`STATION_POSITION_VALUE`] of the station.
    ///
    /// # Errors
    /// Returns [`AttributeError::InvalidLength`] unless the attribute holds exactly three values, or another [`AttributeError`] if it is missing or not numeric.
    pub fn station_position_value(&self) -> Result<[f64; 3], AttributeError> {
        get_fixed_length_attribute(
            &**self.storage(),
            self.group.handle(),
            STATION_POSITION_VALUE,
        )
    }

    /// Return the [`STATION_POSITION_UNIT`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a string.
    pub fn station_position_unit(&self) -> Result<String, AttributeError> {
        self.group.attribute(STATION_POSITION_UNIT)
    }

    /// Return the [`STATION_POSITION_FRAME`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if the attribute is missing or not a string.
    pub fn station_position_frame(&self) -> Result<String, AttributeError> {
        self.group.attribute(STATION_POSITION_FRAME)
    }

    /// Read `nof_samples` samples starting at sample `start` from every channel.
    ///
    /// Returns one vector per channel, in enumeration order.
    /// Channels are read in parallel.
    ///
    /// # Errors
    /// Returns a [`StationError`] if channel enumeration fails, or the first channel error if a channel cannot be opened or read.
    /// A channel cannot be read if it is not rank 1, `T` does not match its data type, or the window exceeds its current extent.
    pub fn read_block<T: Element>(
        &self,
        start: u64,
        nof_samples: u64,
    ) -> Result<Vec<Vec<T>>, StationError> {
        self.read_block_selected(&self.channel_keys()?, start, nof_samples)
    }

    /// Read `nof_samples` samples starting at sample `start` from each of `channels`, in order.
    ///
    /// # Errors
    /// See [`read_block`](StationGroup::read_block).
    pub fn read_block_selected<T: Element>(
        &self,
        channels: &[ChannelKey],
        start: u64,
        nof_samples: u64,
    ) -> Result<Vec<Vec<T>>, StationError> {
        let hyperslab = Hyperslab::new(vec![start], vec![nof_samples]);
        channels
            .par_iter()
            .map(|&channel| -> Result<Vec<T>, StationError> {
                let array = self
                    .open_channel(channel)
                    .map_err(|source| StationError::Open { channel, source })?;
                let samples = array
                    .read_elements::<T>(&hyperslab)
                    .map_err(|source| StationError::Read { channel, source })?;
                array.close()?;
                Ok(samples)
            })
            .collect()
    }

    /// Read `nof_samples` samples starting at sample `start` from every channel into a `[nof_samples, nof_channels]` matrix.
    ///
    /// # Errors
    /// See [`read_block`](StationGroup::read_block).
    #[cfg(feature = "ndarray")]
    pub fn read_block_ndarray<T: Element>(
        &self,
        start: u64,
        nof_samples: u64,
    ) -> Result<ndarray::Array2<T>, StationError> {
        let channels = self.read_block::<T>(start, nof_samples)?;
        // every channel holds exactly nof_samples samples
        let rows = channels.first().map_or(0, Vec::len);
        Ok(ndarray::Array2::from_shape_fn(
            (rows, channels.len()),
            |(sample, channel)| channels[channel][sample],
        ))
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> StationGroup<TStorage> {
    /// Create the station group `name` in `parent`.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if `name` is invalid or already in use, or there is an underlying storage error.
    pub fn create(parent: &GroupNode<TStorage>, name: &str) -> Result<Self, CreateError> {
        Ok(Self::new(parent.create_subgroup(name)?))
    }

    /// Create the dataset of `channel`.
    ///
    /// The dataset is rank 1, initially empty, unbounded, and chunked by `chunk_size` samples.
    /// It is created with the [`STATION_ID`], [`RSP_ID`] and [`RCU_ID`] attributes of `channel`.
    ///
    /// # Errors
    /// Returns a [`CreateError`] if the channel already exists, `chunk_size` is zero, or there is an underlying storage error.
    pub fn create_channel(
        &self,
        channel: ChannelKey,
        data_type: DataType,
        chunk_size: u64,
    ) -> Result<ExtensibleArray<TStorage>, CreateError> {
        let mut attributes = Attributes::new();
        attributes.insert(STATION_ID.to_string(), channel.station_id().into());
        attributes.insert(RSP_ID.to_string(), channel.rsp_id().into());
        attributes.insert(RCU_ID.to_string(), channel.rcu_id().into());
        ExtensibleArrayBuilder::new(data_type, vec![0], vec![chunk_size])
            .max_shape(vec![None])
            .attributes(attributes)
            .build(&self.group, &channel.to_string())
    }

    /// Set the [`TRIGGER_TYPE`] and [`TRIGGER_OFFSET`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if there is an underlying storage error.
    pub fn set_trigger(&self, trigger_type: &str, trigger_offset: f64) -> Result<(), AttributeError> {
        self.group.set_attribute(TRIGGER_TYPE, trigger_type)?;
        self.group.set_attribute(TRIGGER_OFFSET, &trigger_offset)
    }

    /// Set the [`TRIGGERED_ANTENNAS`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if there are too many antennas or there is an underlying storage error.
    pub fn set_triggered_antennas(&self, antennas: &[u32]) -> Result<(), AttributeError> {
        self.group.set_attribute(TRIGGERED_ANTENNAS, antennas)
    }

    /// Set the [`BEAM_DIRECTION_VALUE`], [`BEAM_DIRECTION_UNIT`] and [`BEAM_DIRECTION_FRAME`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if there is an underlying storage error.
    pub fn set_beam_direction(
        &self,
        value: [f64; 2],
        unit: &str,
        frame: &str,
    ) -> Result<(), AttributeError> {
        self.group.set_attribute(BEAM_DIRECTION_VALUE, &value)?;
        self.group.set_attribute(BEAM_DIRECTION_UNIT, unit)?;
        self.group.set_attribute(BEAM_DIRECTION_FRAME, frame)
    }

    /// Set the [`STATION_POSITION_VALUE`], [`STATION_POSITION_UNIT`] and [`STATION_POSITION_FRAME`] of the station.
    ///
    /// # Errors
    /// Returns an [`AttributeError`] if there is an underlying storage error.
    pub fn set_station_position(
        &self,
        value: [f64; 3],
        unit: &str,
        frame: &str,
    ) -> Result<(), AttributeError> {
        self.group.set_attribute(STATION_POSITION_VALUE, &value)?;
        self.group.set_attribute(STATION_POSITION_UNIT, unit)?;
        self.group.set_attribute(STATION_POSITION_FRAME, frame)
    }
}
