//! A lazy block cache for multi-resolution (pyramidal) volumetric data.
//!
//! Very large n-dimensional images are stored as a pyramid of resolution levels, each split into fixed-size blocks.
//! `pyramid_cache` presents each level as a [virtual array](view::VirtualArrayView) whose blocks are decoded on demand and cached.
//!
//! The crate is made up of:
//!  - the [resolution level table](pyramid::Pyramid), built once from the channel attributes supplied by an [`AttributeProvider`](pyramid::AttributeProvider),
//!  - [block decoders](block::BlockDecoder) selected once per channel from its data type, substituting zeros for absent or undecodable blocks,
//!  - [fetch queues](fetch::FetchQueues) (one per priority) drained by a [worker pool](fetch::WorkerPool), coarser levels first,
//!  - the [block loader](loader::BlockLoader), implementing the get-or-load protocol over a [block cache](block_cache::BlockCache)
//!    with [blocking and budgeted](fetch::LoadPolicy) access.
//!
//! Encoded blocks are read through a [`BlockReader`](storage::BlockReader), so the crate is agnostic to the storage format.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use pyramid_cache::array_subset::ArraySubset;
//! use pyramid_cache::block::BlockKey;
//! use pyramid_cache::data_type::DataType;
//! use pyramid_cache::loader::BlockLoader;
//! use pyramid_cache::pyramid::{ChannelAttributes, MemoryAttributeProvider};
//! use pyramid_cache::storage::MemoryBlockReader;
//!
//! // A 3 level pyramid of 32x32x32 blocks
//! let attributes = MemoryAttributeProvider::new().with_channel(
//!     0,
//!     ChannelAttributes::new_pyramid(DataType::UInt16, vec![128, 128, 64], vec![32, 32, 32], 3)
//!         .with_voxel_size(vec![0.5, 0.5, 1.0]),
//! );
//! let reader = Arc::new(MemoryBlockReader::new());
//! reader.set(
//!     BlockKey::new(0, 0, 2, vec![0, 0, 0]),
//!     bytemuck::cast_slice::<u16, u8>(&vec![7u16; 32 * 32 * 16]).to_vec(),
//! );
//! let loader = BlockLoader::new(Arc::new(attributes), reader);
//!
//! let image = loader.image(0, 0, 2)?;
//! assert_eq!(image.shape(), &[32, 32, 16]);
//! let elements = image.retrieve_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[0..2, 0..2, 0..2]))?;
//! assert_eq!(elements, vec![7u16; 8]);
//! assert_eq!(loader.mipmap_transform(0, 2).unwrap().scale(), &[2.0, 2.0, 4.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `gzip`: gzip compressed blocks.
//!  - `zstd`: zstd compressed blocks.
//!
//! ## Logging
//! The crate emits [`tracing`] events but does not install a subscriber.
//! Skipped channels and failed block loads are logged at `warn` level, loader lifecycle at `debug` level and individual blocks at `trace` level.
//!
//! ## Licence
//! `pyramid_cache` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
// #![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array_subset;
pub mod block;
pub mod block_cache;
pub mod config;
pub mod data_type;
pub mod element;
pub mod fetch;
pub mod loader;
pub mod pyramid;
pub mod storage;
pub mod view;

/// An alias for the indices of an element or block.
pub type ArrayIndices = Vec<u64>;

/// An alias for the shape of an array or block grid.
pub type ArrayShape = Vec<u64>;
