use std::sync::Arc;

use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use pyramid_cache::{
    array_subset::ArraySubset,
    block::{BlockDecoder, BlockKey, Compression},
    data_type::{DataType, Endianness},
    fetch::LoadPolicy,
    loader::{BlockLoader, BlockLoaderOptions},
    pyramid::{ChannelAttributes, MemoryAttributeProvider},
    storage::MemoryBlockReader,
};

fn block_decoder(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("block_decoder");
    group.plot_config(plot_config);

    // Use the opposite of the target endianness, so the decoder swaps bytes
    #[cfg(target_endian = "big")]
    let endianness = Endianness::Little;
    #[cfg(target_endian = "little")]
    let endianness = Endianness::Big;

    let native = BlockDecoder::new(DataType::UInt16, Endianness::default(), Compression::Raw);
    let swapped = BlockDecoder::new(DataType::UInt16, endianness, Compression::Raw);
    let key = BlockKey::new(0, 0, 0, vec![0, 0, 0]);
    for size in [16u64, 32, 64, 128] {
        let num_elements = usize::try_from(size * size * size).unwrap();
        let bytes = bytes::Bytes::from(vec![0u8; num_elements * 2]);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(BenchmarkId::new("native", num_elements), |b| {
            b.iter(|| native.decode(&key, Ok(Some(bytes.clone())), num_elements));
        });
        group.bench_function(BenchmarkId::new("swapped", num_elements), |b| {
            b.iter(|| swapped.decode(&key, Ok(Some(bytes.clone())), num_elements));
        });
    }
}

fn block_loader_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_loader");
    let attributes = MemoryAttributeProvider::new().with_channel(
        0,
        ChannelAttributes::new_pyramid(DataType::UInt8, vec![256, 256, 256], vec![32, 32, 32], 4),
    );
    let reader = Arc::new(MemoryBlockReader::new());
    for z in 0..8 {
        for y in 0..8 {
            for x in 0..8 {
                reader.set(BlockKey::new(0, 0, 0, vec![z, y, x]), vec![1u8; 32 * 32 * 32]);
            }
        }
    }
    let loader = BlockLoader::with_options(
        Arc::new(attributes),
        reader,
        BlockLoaderOptions::builder().fetcher_threads(2).build(),
    );

    let key = BlockKey::new(0, 0, 0, vec![1, 2, 3]);
    group.bench_function("get_cached", |b| {
        loader.get(&key, LoadPolicy::Blocking).unwrap();
        b.iter(|| loader.get(&key, LoadPolicy::Blocking).unwrap());
    });
    group.bench_function("get_uncached", |b| {
        b.iter(|| {
            loader.clear_cache();
            loader.get(&key, LoadPolicy::Blocking).unwrap()
        });
    });

    let image = loader.image(0, 0, 0).unwrap();
    for size in [16u64, 64, 128] {
        let subset = ArraySubset::new_with_ranges(&[8..8 + size, 8..8 + size, 8..8 + size]);
        group.throughput(Throughput::Elements(subset.num_elements()));
        group.bench_function(BenchmarkId::new("retrieve_subset", size), |b| {
            b.iter(|| image.retrieve_subset_elements::<u8>(&subset).unwrap());
        });
    }
}

criterion_group!(benches, block_decoder, block_loader_get);
criterion_main!(benches);
