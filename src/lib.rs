//! A rust library for hierarchical, chunked, extensible array storage of large multidimensional time-series.
//!
//! `dalarray` organises data as a tree of groups, each containing one or more N-dimensional datasets that can grow along a time axis and be written or read in arbitrary rectangular sub-regions.
//! It was written for radio-telescope dipole and beam-formed data, where each station group holds one dataset per receiver channel.
//!
//! ## Getting Started
//! - [`group::GroupNode`] and [`array::ExtensibleArray`] are good places to start.
//! - Regions of an array are addressed with a [`hyperslab::Hyperslab`] (start, block, stride, count).
//! - Channel-addressed station groups are provided by [`station::StationGroup`] and [`channel::ChannelKey`].
//! - Storage is pluggable through the [`storage`] traits. [`storage::store::MemoryStore`] is a native chunked backend and [`storage::store::NullStore`] is a stub.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use dalarray::array::{DataType, ExtensibleArray};
//! use dalarray::group::GroupNode;
//! use dalarray::hyperslab::Hyperslab;
//! use dalarray::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let root = GroupNode::open_root(store)?;
//! let station = root.create_subgroup("Station001")?;
//! let mut array = station.create_array(
//!     "001002003",
//!     DataType::Int16,
//!     vec![0],         // initial shape
//!     vec![1024],      // chunk shape
//!     vec![None],      // unbounded along the time axis
//! )?;
//!
//! // Writing past the current extent grows the array
//! array.write_elements::<i16>(&Hyperslab::new(vec![0], vec![4]), &[1, 2, 3, 4])?;
//! assert_eq!(array.shape(), &[4]);
//!
//! let samples = array.read_elements::<i16>(&Hyperslab::new(vec![1], vec![2]))?;
//! assert_eq!(samples, vec![2, 3]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: [`ndarray`] utility functions for [`StationGroup`](crate::station::StationGroup).
//!
//! ## Licence
//! `dalarray` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](./LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](./LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod channel;
pub mod config;
pub mod group;
pub mod hyperslab;
pub mod node;
pub mod station;
pub mod storage;
