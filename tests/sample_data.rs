//! Integration tests for the sample-data fetcher, driven by an in-memory
//! transport.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use posetracks::sample_data::{sha256_file, SampleFetcher, Transport, REGISTRY_FILE};
use posetracks::{PoseError, TimeUnit};

const BASE: &str = "http://data.test/repo";
const POSES: &str = "DLC_single-mouse_EPM.predictions.csv";

/// Serves files from memory and counts downloads per URL.
#[derive(Default)]
struct MemoryTransport {
    files: RefCell<HashMap<String, Vec<u8>>>,
    calls: RefCell<HashMap<String, usize>>,
    total: Cell<usize>,
}

impl MemoryTransport {
    fn serve(&self, remote: &str, bytes: impl Into<Vec<u8>>) {
        self.files
            .borrow_mut()
            .insert(format!("{}/{}", BASE, remote), bytes.into());
    }

    fn calls(&self, remote: &str) -> usize {
        self.calls
            .borrow()
            .get(&format!("{}/{}", BASE, remote))
            .copied()
            .unwrap_or(0)
    }
}

impl Transport for MemoryTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<(), String> {
        self.total.set(self.total.get() + 1);
        *self.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
        let files = self.files.borrow();
        let bytes = files.get(url).ok_or_else(|| format!("404 Not Found: {}", url))?;
        fs::write(dest, bytes).map_err(|e| e.to_string())
    }
}

fn poses_bytes() -> Vec<u8> {
    fs::read("tests/fixtures/dlc_single_mouse.csv").expect("fixture")
}

fn registry_for(bytes: &[u8]) -> String {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("poses.csv");
    fs::write(&path, bytes).expect("write");
    let digest = sha256_file(&path).expect("hash");
    format!(
        "{name}:\n  file_name: {name}\n  sha256sum: {digest}\n  source_software: DeepLabCut\n  \
         type: poses\n  fps: 30\n  species: mouse\n  number_of_individuals: 1\n\
         VIA_crabs.csv:\n  file_name: VIA_crabs.csv\n  sha256sum: '00'\n  \
         source_software: VIA-tracks\n  type: bboxes\n",
        name = POSES,
        digest = digest
    )
}

fn serving_transport() -> MemoryTransport {
    let transport = MemoryTransport::default();
    transport.serve(REGISTRY_FILE, registry_for(&poses_bytes()));
    transport.serve(&format!("poses/{}", POSES), poses_bytes());
    transport
}

#[test]
fn lists_pose_datasets_only() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = serving_transport();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    assert_eq!(fetcher.list_datasets().expect("list"), vec![POSES]);
    assert!(cache.path().join(REGISTRY_FILE).is_file());

    // The registry is fetched once per fetcher and then read from the cache.
    fetcher.list_datasets().expect("list again");
    let again = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);
    again.list_datasets().expect("list from cache");
    assert_eq!(transport.calls(REGISTRY_FILE), 1);
}

#[test]
fn fetches_once_then_uses_cache() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = serving_transport();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let path = fetcher.fetch_sample_data_path(POSES).expect("fetch");
    assert_eq!(path, cache.path().join("poses").join(POSES));
    assert_eq!(fs::read(&path).expect("read"), poses_bytes());

    fetcher.fetch_sample_data_path(POSES).expect("fetch again");
    assert_eq!(transport.calls(&format!("poses/{}", POSES)), 1);
}

#[test]
fn fetch_dataset_applies_registry_fps() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = serving_transport();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let ds = fetcher.fetch_dataset(POSES).expect("load");
    assert_eq!(ds.metadata.fps, Some(30.0));
    assert_eq!(ds.metadata.time_unit, TimeUnit::Seconds);
    assert_eq!(ds.keypoints, vec!["snout", "tailbase"]);
}

#[test]
fn corrupt_cache_is_refetched() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = serving_transport();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let path = fetcher.fetch_sample_data_path(POSES).expect("fetch");
    fs::write(&path, "garbage").expect("corrupt");

    let again = fetcher.fetch_sample_data_path(POSES).expect("refetch");
    assert_eq!(fs::read(&again).expect("read"), poses_bytes());
    assert_eq!(transport.calls(&format!("poses/{}", POSES)), 2);
}

#[test]
fn persistent_mismatch_removes_file_and_fails() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = MemoryTransport::default();
    transport.serve(REGISTRY_FILE, registry_for(&poses_bytes()));
    transport.serve(&format!("poses/{}", POSES), b"tampered".to_vec());
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let err = fetcher.fetch_sample_data_path(POSES).unwrap_err();
    match err {
        PoseError::Download { name, message } => {
            assert_eq!(name, POSES);
            assert!(message.contains("SHA-256"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.calls(&format!("poses/{}", POSES)), 2);
    assert!(!cache.path().join("poses").join(POSES).exists());
}

#[test]
fn unknown_and_non_pose_names_are_rejected() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = serving_transport();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let err = fetcher.fetch_sample_data_path("nope.h5").unwrap_err();
    match err {
        PoseError::Download { message, .. } => assert!(message.contains(POSES), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fetcher.fetch_dataset("VIA_crabs.csv").is_err());
    assert_eq!(transport.total.get(), 1, "only the registry was downloaded");
}

#[test]
fn transport_failure_is_a_download_error() {
    let cache = tempfile::tempdir().expect("tempdir");
    let transport = MemoryTransport::default();
    let fetcher = SampleFetcher::new(&transport, cache.path()).with_base_url(BASE);

    let err = fetcher.list_datasets().unwrap_err();
    assert!(matches!(err, PoseError::Download { .. }), "{err:?}");
}
