mod common;

use std::path::Path;

use common::assert_floats_eq;
use rand::{rngs::StdRng, SeedableRng};
use snore::{
    config::DatasetConfig,
    features::FeatureVector,
    store::{recording, FsStorage, MemStorage, Storage},
    tinn::{activation::Activation, Network, Topology},
    Error,
};

fn samples() -> Vec<(FeatureVector, u8)> {
    (0..5u32)
        .map(|i| {
            let sample = FeatureVector {
                bands: vec![10 * i, 20, 30, 40 + i],
                amplitude: 100 * i,
            };
            (sample, (i % 2) as u8)
        })
        .collect()
}

fn record_all<S: Storage>(storage: &S, path: &Path) {
    recording::create(storage, path, 4).unwrap();
    for (sample, label) in samples() {
        recording::append(storage, path, &sample, label).unwrap();
    }
}

#[test]
fn recording_layout_on_storage() {
    let storage = MemStorage::new();
    let path = Path::new("dataset.txt");
    record_all(&storage, path);
    let text = String::from_utf8(storage.contents(path).unwrap()).unwrap();
    assert_eq!(
        text,
        "4\n\
         0 20 30 40 0 0\n\
         10 20 30 41 100 1\n\
         20 20 30 42 200 0\n\
         30 20 30 43 300 1\n\
         40 20 30 44 400 0\n"
    );
}

#[test]
fn recording_loads_attenuated_rows() {
    let storage = MemStorage::new();
    let path = Path::new("dataset.txt");
    record_all(&storage, path);

    let loaded = recording::load(&storage, path, &DatasetConfig::default()).unwrap();
    assert_eq!(loaded.bands, 4);
    assert_eq!(loaded.inputs(), 5);
    assert_eq!(loaded.rows.len(), 5);
    for (row, (sample, label)) in loaded.rows.iter().zip(samples()) {
        let expected = sample.to_input(500.0);
        assert_floats_eq(&row.input, &expected, 1e-7);
        assert_eq!(row.label, label);
    }
    assert_floats_eq(&loaded.rows[3].input, &[0.06, 0.04, 0.06, 0.086, 0.6], 1e-6);
}

#[test]
fn create_erases_previous_rows() {
    let storage = MemStorage::new();
    let path = Path::new("dataset.txt");
    record_all(&storage, path);
    recording::create(&storage, path, 8).unwrap();
    assert_eq!(storage.contents(path).unwrap(), b"8\n");
    let loaded = recording::load(&storage, path, &DatasetConfig::default()).unwrap();
    assert_eq!(loaded.bands, 8);
    assert!(loaded.rows.is_empty());
}

#[test]
fn missing_recording_is_not_found() {
    let storage = MemStorage::new();
    let err = recording::load(&storage, Path::new("nope.txt"), &DatasetConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(ref p) if p == Path::new("nope.txt")), "{:?}", err);
}

#[test]
fn too_many_bands_are_rejected() {
    let config = DatasetConfig::default();
    let err = recording::read("129\n".as_bytes(), &config).unwrap_err();
    assert!(
        matches!(err, Error::TooManyInputs { bands: 129, max: 128 }),
        "{:?}",
        err
    );
    assert!(recording::read("128\n".as_bytes(), &config).is_ok());
}

#[test]
fn empty_recording_has_no_header() {
    let err = recording::read("".as_bytes(), &DatasetConfig::default()).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }), "{:?}", err);
}

#[test]
fn rows_past_the_limit_are_dropped() {
    let config = DatasetConfig {
        max_rows: 2,
        ..DatasetConfig::default()
    };
    let text = "1\n1 2 0\n3 4 1\n5 6 0\n";
    let loaded = recording::read(text.as_bytes(), &config).unwrap();
    assert_eq!(loaded.rows.len(), 2);
    assert_eq!(loaded.rows[1].label, 1);
}

#[test]
fn crlf_blank_and_malformed_lines() {
    let config = DatasetConfig {
        attenuation: 1.0,
        ..DatasetConfig::default()
    };
    let text = "2\r\n1 2 3 1\r\n\r\n7 8\r\n4 5 6 0";
    let loaded = recording::read(text.as_bytes(), &config).unwrap();
    assert_eq!(loaded.rows.len(), 2);
    assert_eq!(loaded.rows[0].input, vec![1.0, 2.0, 3.0]);
    assert_eq!(loaded.rows[0].label, 1);
    assert_eq!(loaded.rows[1].input, vec![4.0, 5.0, 6.0]);
    assert_eq!(loaded.rows[1].label, 0);
}

#[test]
fn file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsStorage::new(dir.path());
    let path = Path::new("/dataset.txt");
    assert!(!storage.exists(path));
    record_all(&storage, path);
    assert!(dir.path().join("dataset.txt").is_file());

    let loaded = recording::load(&storage, path, &DatasetConfig::default()).unwrap();
    assert_eq!(loaded.rows.len(), 5);
    assert_eq!(loaded.rows[4].label, 0);

    storage.remove(path).unwrap();
    assert!(!storage.exists(path));
    storage.remove(path).unwrap();
}

#[test]
fn file_storage_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsStorage::new(dir.path());
    let err = storage.open_read(Path::new("Network.txt")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{:?}", err);
}

#[test]
fn network_through_storage() {
    let storage = MemStorage::new();
    let path = Path::new("Network.txt");
    let topology = Topology::new(5, 6, 1).unwrap();
    let network = Network::build(topology, Activation::Relu, &mut StdRng::seed_from_u64(1));
    network.save(storage.open_write(path).unwrap()).unwrap();
    // Saving again replaces the file.
    network.save(storage.open_write(path).unwrap()).unwrap();

    let loaded = Network::load(storage.open_read(path).unwrap(), Activation::Relu).unwrap();
    assert_eq!(loaded.topology(), topology);
    assert_floats_eq(loaded.weights(), network.weights(), 1e-6);
}
