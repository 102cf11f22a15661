use std::{sync::Arc, thread, time::Duration};

use pyramid_cache::{
    array_subset::ArraySubset,
    block::{BlockKey, Compression},
    data_type::{DataType, Endianness},
    fetch::{LoadPolicy, Priority},
    loader::{BlockLoader, BlockLoaderError, BlockLoaderOptions},
    pyramid::{ChannelAttributes, LevelAttributes, MemoryAttributeProvider},
    storage::MemoryBlockReader,
    view::ViewError,
};

/// A 2D channel of 10x6 `i32` with 4x4 blocks. Element `(y, x)` holds `10 * y + x`.
fn loader() -> BlockLoader {
    let attributes = MemoryAttributeProvider::new().with_channel(
        0,
        ChannelAttributes::new(
            DataType::Int32,
            vec![
                LevelAttributes::new(vec![10, 6], vec![4, 4], vec![1, 1]),
                LevelAttributes::new(vec![5, 3], vec![4, 4], vec![2, 2]),
            ],
        )
        .with_endianness(Endianness::Big),
    );
    let reader = Arc::new(MemoryBlockReader::new());
    for by in 0..3u64 {
        for bx in 0..2u64 {
            // edge blocks are stored full size
            let mut bytes = Vec::with_capacity(16 * 4);
            for y in by * 4..by * 4 + 4 {
                for x in bx * 4..bx * 4 + 4 {
                    let value = if y < 10 && x < 6 { 10 * y + x } else { 0 };
                    bytes.extend_from_slice(&i32::try_from(value).unwrap().to_be_bytes());
                }
            }
            reader.set(BlockKey::new(0, 0, 0, vec![by, bx]), bytes);
        }
    }
    BlockLoader::with_options(
        Arc::new(attributes),
        reader,
        BlockLoaderOptions::builder().fetcher_threads(2).build(),
    )
}

#[test]
fn virtual_array_view_properties() {
    let loader = loader();
    let image = loader.image(0, 0, 0).unwrap();
    assert_eq!(image.shape(), &[10, 6]);
    assert_eq!(image.block_shape(), &[4, 4]);
    assert_eq!(image.grid_shape(), &[3, 2]);
    assert_eq!(image.data_type(), DataType::Int32);
    assert_eq!(image.policy(), LoadPolicy::Blocking);
    assert_eq!(image.block_indices_of(&[9, 5]), Some(vec![2, 1]));
    assert_eq!(image.block_indices_of(&[10, 0]), None);

    let volatile = loader.volatile_image(0, 0, 1).unwrap();
    assert_eq!(volatile.shape(), &[5, 3]);
    assert_eq!(volatile.block_shape(), &[4, 3]);
    assert_eq!(volatile.policy(), LoadPolicy::Budgeted(Priority::HIGHEST));
    assert!(matches!(
        loader.image(0, 0, 2),
        Err(BlockLoaderError::InvalidLevel(0, 2, 2))
    ));
    assert!(matches!(
        loader.image(3, 0, 0),
        Err(BlockLoaderError::UnknownChannel(3))
    ));
}

#[test]
fn virtual_array_view_get() {
    let loader = loader();
    let image = loader.image(0, 0, 0).unwrap();
    assert_eq!(image.get::<i32>(&[0, 0]).unwrap(), 0);
    assert_eq!(image.get::<i32>(&[5, 3]).unwrap(), 53);
    assert_eq!(image.get::<i32>(&[9, 5]).unwrap(), 95);
    assert_eq!(image.get_f64(&[7, 2]).unwrap(), 72.0);
    assert!(matches!(
        image.get::<i32>(&[10, 0]),
        Err(ViewError::InvalidArrayIndices(..))
    ));
    assert!(matches!(
        image.get::<u8>(&[0, 0]),
        Err(ViewError::IncompatibleElementType(DataType::UInt8, DataType::Int32))
    ));
    // only touched blocks are cached
    assert_eq!(loader.cached_block_count(), 3);
}

#[test]
fn virtual_array_view_retrieve_subset() {
    let loader = loader();
    let image = loader.image(0, 0, 0).unwrap();
    let subset = ArraySubset::new_with_ranges(&[3..6, 2..5]);
    let elements = image.retrieve_subset_elements::<i32>(&subset).unwrap();
    assert_eq!(elements, vec![32, 33, 34, 42, 43, 44, 52, 53, 54]);
    assert_eq!(loader.cached_block_count(), 4);

    let all = image
        .retrieve_subset_elements::<i32>(&ArraySubset::new_with_shape(vec![10, 6]))
        .unwrap();
    assert_eq!(all.len(), 60);
    assert_eq!(all[59], 95);

    assert!(matches!(
        image.retrieve_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[8..11, 0..1])),
        Err(ViewError::InvalidArraySubset(..))
    ));
    assert!(image
        .retrieve_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[2..2, 0..3]))
        .unwrap()
        .is_empty());
}

#[test]
fn virtual_array_view_volatile() {
    let loader = loader();
    let volatile = loader.view(0, 0, 0, LoadPolicy::Budgeted(Priority::HIGHEST)).unwrap();
    let subset = ArraySubset::new_with_shape(vec![10, 6]);
    let pending = volatile.prefetch(&subset).unwrap();
    assert!(pending <= 6);

    let expected: Vec<i32> = (0..10)
        .flat_map(|y| (0..6).map(move |x| 10 * y + x))
        .collect();
    let mut elements = volatile.retrieve_subset_elements::<i32>(&subset).unwrap();
    for _ in 0..2000 {
        if elements == expected {
            break;
        }
        thread::sleep(Duration::from_millis(5));
        elements = volatile.retrieve_subset_elements::<i32>(&subset).unwrap();
    }
    assert_eq!(elements, expected);
    assert_eq!(loader.statistics().decodes(), 6);
}

#[cfg(feature = "zstd")]
#[test]
fn virtual_array_view_compressed_blocks() {
    let attributes = MemoryAttributeProvider::new().with_channel(
        7,
        ChannelAttributes::new_pyramid(DataType::Float32, vec![4, 4], vec![4, 4], 1)
            .with_compression(Compression::Zstd),
    );
    let elements: Vec<f32> = (0..16u8).map(f32::from).collect();
    let encoded = Compression::Zstd
        .encode(bytemuck::cast_slice::<f32, u8>(&elements))
        .unwrap();
    let reader = Arc::new(MemoryBlockReader::new());
    reader.set(BlockKey::new(7, 0, 0, vec![0, 0]), encoded);
    let loader = BlockLoader::new(Arc::new(attributes), reader);
    let image = loader.image(7, 0, 0).unwrap();
    assert_eq!(image.get::<f32>(&[2, 1]).unwrap(), 9.0);
    assert_eq!(
        image
            .retrieve_subset_elements::<f32>(&ArraySubset::new_with_shape(vec![4, 4]))
            .unwrap(),
        elements
    );
}
