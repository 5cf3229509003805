use criterion::{black_box, criterion_group, criterion_main, Criterion};
use packetfs::name::{decompose, unique_packet_paths};
use packetfs::sanitize::rename_troublesome;
use packetfs::{sort, LocalFs, PropertiesCache, PropertyCriterion, PropertyKind, PropertyOrder, PropertyStore};
use serde_json::json;

fn bench_decompose(c: &mut Criterion) {
    let paths: Vec<String> = (0..1000)
        .map(|i| format!("/archive/{:04}/item{}_scan_{}.tar.gz", i / 10, i % 37, i))
        .collect();

    c.bench_function("decompose_1k_paths", |b| {
        b.iter(|| {
            for p in &paths {
                black_box(decompose(black_box(p)));
            }
        })
    });
    c.bench_function("unique_packet_paths_1k", |b| b.iter(|| unique_packet_paths(black_box(&paths))));
}

fn bench_sanitize(c: &mut Criterion) {
    let clean = "An ordinary file name with spaces.txt";
    let dirty = "  -rf <script>\t|  \"quoted\" {a; b} ~/100% [done]?*  ";

    c.bench_function("rename_clean_name", |b| b.iter(|| rename_troublesome(black_box(clean))));
    c.bench_function("rename_dirty_name", |b| b.iter(|| rename_troublesome(black_box(dirty))));
}

fn bench_sort_by_property(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..200)
        .map(|i| {
            let packet = tmp.path().join(format!("item{i:03}"));
            let sidecar = tmp.path().join(format!("item{i:03}_properties.json"));
            std::fs::write(sidecar, json!({ "rank": (i * 7919) % 200 }).to_string()).unwrap();
            packet
        })
        .collect();
    let order = PropertyOrder::new("rank").kind(PropertyKind::Numeric);

    c.bench_function("sort_200_packets_cold", |b| {
        b.iter(|| {
            let mut cache = PropertiesCache::new(PropertyStore::new(LocalFs));
            sort(paths.clone(), &mut PropertyCriterion::new(&mut cache, order.clone())).unwrap()
        })
    });

    let mut warm = PropertiesCache::new(PropertyStore::new(LocalFs));
    c.bench_function("sort_200_packets_cached", |b| {
        b.iter(|| sort(paths.clone(), &mut PropertyCriterion::new(&mut warm, order.clone())).unwrap())
    });
}

criterion_group!(benches, bench_decompose, bench_sanitize, bench_sort_by_property);
criterion_main!(benches);
