use crate::cache::{CacheLine, CacheStore};
use crate::config::{CacheGeometry, GeometryError};

fn store(set_bits: u32, lines_per_set: u64) -> CacheStore {
    CacheStore::new(&CacheGeometry::new(set_bits, lines_per_set, 0)).unwrap()
}

#[test]
fn decompose_splits_offset_set_and_tag() {
    let geometry = CacheGeometry::new(4, 1, 4);
    // offset 0x5, set 0x3, tag 0xab
    assert_eq!(geometry.decompose(0xab35), (0xab, 0x3));
    let geometry = CacheGeometry::new(1, 1, 1);
    assert_eq!(geometry.decompose(0), (0, 0));
    assert_eq!(geometry.decompose(2), (0, 1));
    assert_eq!(geometry.decompose(4), (1, 0));
}

#[test]
fn decompose_without_set_bits_uses_a_single_set() {
    let geometry = CacheGeometry::new(0, 4, 3);
    assert_eq!(geometry.decompose(u64::MAX), (u64::MAX >> 3, 0));
    assert_eq!(geometry.decompose(0x78), (0xf, 0));
}

#[test]
fn decompose_without_offset_bits_keeps_every_bit() {
    let geometry = CacheGeometry::new(2, 1, 0);
    assert_eq!(geometry.decompose(0b1110), (0b11, 0b10));
    let geometry = CacheGeometry::new(0, 1, 0);
    assert_eq!(geometry.decompose(u64::MAX), (u64::MAX, 0));
}

#[test]
fn decompose_at_full_address_width() {
    let geometry = CacheGeometry::new(0, 1, 64);
    assert_eq!(geometry.decompose(u64::MAX), (0, 0));
    let geometry = CacheGeometry::new(8, 1, 56);
    assert_eq!(geometry.decompose(0xab00_0000_0000_0000), (0, 0xab));
    let geometry = CacheGeometry::new(4, 1, 60);
    assert_eq!(geometry.decompose(u64::MAX), (0, 0xf));
}

#[test]
fn geometry_counts_lines() {
    let geometry = CacheGeometry::new(3, 2, 4);
    assert_eq!(geometry.validate(), Ok(16));
    assert_eq!(geometry.num_sets(), 8);
    assert_eq!(geometry.total_lines(), 16);
    assert_eq!(CacheGeometry::new(0, 1, 0).validate(), Ok(1));
}

#[test]
fn invalid_geometries_are_rejected() {
    assert_eq!(
        CacheGeometry::new(2, 0, 2).validate(),
        Err(GeometryError::NoLines { lines_per_set: 0 })
    );
    assert_eq!(
        CacheGeometry::new(32, 1, 33).validate(),
        Err(GeometryError::AddressWidth { set_bits: 32, block_bits: 33 })
    );
    assert_eq!(
        CacheGeometry::new(65, 1, 0).validate(),
        Err(GeometryError::AddressWidth { set_bits: 65, block_bits: 0 })
    );
    assert!(matches!(
        CacheGeometry::new(60, u64::MAX, 0).validate(),
        Err(GeometryError::TooManyLines { .. })
    ));
    assert!(CacheStore::new(&CacheGeometry::new(1, 0, 1)).is_err());
}

#[test]
fn geometry_parses_from_json() {
    let short: CacheGeometry = serde_json::from_str(r#"{ "s": 4, "E": 2, "b": 5 }"#).unwrap();
    let long: CacheGeometry = serde_json::from_str(r#"{ "set_bits": 4, "lines_per_set": 2, "block_bits": 5 }"#).unwrap();
    assert_eq!(short, CacheGeometry::new(4, 2, 5));
    assert_eq!(short, long);
}

#[test]
fn new_store_is_empty() {
    let store = store(2, 3);
    assert_eq!(store.len(), 12);
    assert_eq!(store.uninitialised_line_count(), 12);
    for set in 0..4 {
        assert_eq!(store.set(set), &[CacheLine::default(); 3]);
        assert_eq!(store.first_free(set), Some(set as usize * 3));
        assert_eq!(store.find(set, 0), None);
    }
}

#[test]
fn find_only_matches_valid_lines_in_the_set() {
    let mut store = store(1, 2);
    store.install(3, 7);
    assert_eq!(store.find(1, 7), Some(3));
    assert_eq!(store.find(0, 7), None);
    // The initial tag of an invalid line never matches
    assert_eq!(store.find(0, u64::MAX), None);
}

#[test]
fn first_free_fills_in_position_order() {
    let mut store = store(0, 3);
    store.install(0, 1);
    assert_eq!(store.first_free(0), Some(1));
    store.install(2, 2);
    assert_eq!(store.first_free(0), Some(1));
    store.install(1, 3);
    assert_eq!(store.first_free(0), None);
    assert_eq!(store.uninitialised_line_count(), 0);
}

#[test]
fn oldest_prefers_the_lowest_position_on_ties() {
    let mut store = store(0, 4);
    for position in 0..4 {
        store.install(position, position as u64);
    }
    assert_eq!(store.oldest(0), 0);
    store.age_all();
    store.touch(0);
    // Lines 1, 2 and 3 are all age 1
    assert_eq!(store.oldest(0), 1);
    store.age_all();
    store.touch(1);
    assert_eq!(store.oldest(0), 2);
}

#[test]
fn age_all_skips_invalid_lines() {
    let mut store = store(1, 2);
    store.install(0, 5);
    store.age_all();
    store.age_all();
    assert_eq!(store.line(0).age, 2);
    assert_eq!(store.line(1).age, 0);
    assert_eq!(store.line(2).age, 0);
    store.touch(0);
    assert_eq!(store.line(0), &CacheLine { valid: true, tag: 5, age: 0 });
}
