//! Integration tests for importing packaged profile material

use std::io::Write;

use tempfile::TempDir;

use berth_core::profile::{
    BootstrapImporter, ConnectionProfile, CredentialMaterial, Endpoint, FileProfileStore,
    ImportError, ProfileStore, TlsMaterial,
};
use berth_core::types::EndpointKind;

// =========================================================================
// Helper Functions
// =========================================================================

/// Create a profile zip archive in memory
fn create_profile_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (name, content) in entries {
            zip.start_file(*name, options)
                .expect("Failed to start zip entry");
            zip.write_all(content.as_bytes())
                .expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish zip");
    }
    buf.into_inner()
}

fn setup() -> (TempDir, FileProfileStore) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = FileProfileStore::new(temp.path().join("profiles"));
    (temp, store)
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn exported_profile_imports_to_equal_profile() {
    let (temp, store) = setup();
    let original = ConnectionProfile {
        name: "cnab".to_string(),
        description: Some("installer target".to_string()),
        endpoints: Default::default(),
    }
    .with_endpoint(
        EndpointKind::Docker,
        Endpoint::new("tcp://10.0.0.1:2376").with_material(CredentialMaterial {
            tls: Some(TlsMaterial {
                ca: Some("CA".to_string()),
                cert: Some("CERT".to_string()),
                key: Some("KEY".to_string()),
            }),
            token: None,
        }),
    );

    let material = temp.path().join("profile.json");
    std::fs::write(&material, serde_json::to_vec(&original).unwrap()).unwrap();

    BootstrapImporter::new(&store)
        .import("cnab", &material)
        .expect("Import should succeed");

    assert_eq!(store.lookup("cnab").expect("Profile should exist"), original);
}

#[test]
fn zip_material_imports_tls_files() {
    let (temp, store) = setup();
    let archive = create_profile_zip(&[
        (
            "meta.json",
            r#"{"endpoints": {"docker": {"host": "tcp://10.0.0.1:2376"}}}"#,
        ),
        ("tls/docker/ca.pem", "CA"),
        ("tls/docker/cert.pem", "CERT"),
        ("tls/docker/key.pem", "KEY"),
    ]);
    let material = temp.path().join("context.berthprofile");
    std::fs::write(&material, archive).unwrap();

    BootstrapImporter::new(&store)
        .import("cnab", &material)
        .expect("Import should succeed");

    let profile = store.lookup("cnab").expect("Profile should exist");
    let tls = profile.endpoints[&EndpointKind::Docker]
        .material
        .as_ref()
        .and_then(|m| m.tls.as_ref())
        .expect("TLS material should be attached");
    assert_eq!(tls.ca.as_deref(), Some("CA"));
    assert_eq!(tls.cert.as_deref(), Some("CERT"));
    assert_eq!(tls.key.as_deref(), Some("KEY"));
}

#[test]
fn zip_without_meta_is_invalid_material() {
    let (temp, store) = setup();
    let material = temp.path().join("context.berthprofile");
    std::fs::write(&material, create_profile_zip(&[("tls/docker/ca.pem", "CA")])).unwrap();

    let err = BootstrapImporter::new(&store)
        .import("cnab", &material)
        .unwrap_err();

    assert!(matches!(err, ImportError::InvalidMaterial { .. }));
    assert!(!store.contains("cnab").unwrap());
}

#[test]
fn import_is_idempotent() {
    let (temp, store) = setup();
    let material = temp.path().join("profile.json");
    std::fs::write(
        &material,
        r#"{"endpoints": {"kubernetes": {"host": "https://k8s:6443", "namespace": "apps"}}}"#,
    )
    .unwrap();
    let importer = BootstrapImporter::new(&store);

    importer.import("cnab", &material).expect("First import");
    let first = store.lookup("cnab").unwrap();
    importer.import("cnab", &material).expect("Second import");

    assert_eq!(store.lookup("cnab").unwrap(), first);
}

#[test]
fn import_replaces_existing_profile() {
    let (temp, store) = setup();
    let old = temp.path().join("old.json");
    let new = temp.path().join("new.json");
    std::fs::write(&old, r#"{"endpoints": {"docker": {"host": "tcp://old:2376"}}}"#).unwrap();
    std::fs::write(&new, r#"{"endpoints": {"docker": {"host": "tcp://new:2376"}}}"#).unwrap();
    let importer = BootstrapImporter::new(&store);

    importer.import("cnab", &old).unwrap();
    importer.import("cnab", &new).unwrap();

    let profile = store.lookup("cnab").unwrap();
    assert_eq!(profile.endpoints[&EndpointKind::Docker].host, "tcp://new:2376");
}

#[test]
fn import_from_reader_uses_store_trait() {
    let (_temp, store) = setup();
    let data = br#"{"endpoints": {"docker": {"host": "unix:///var/run/docker.sock"}}}"#;

    store
        .import("local", &mut &data[..])
        .expect("Import should succeed");

    assert!(store.contains("local").unwrap());
}

#[test]
fn packaged_registry_credentials_are_loaded() {
    let (temp, store) = setup();
    let path = temp.path().join("registry-creds.json");
    std::fs::write(
        &path,
        r#"{"registry.example.com": {"username": "ci", "password": "pw", "serveraddress": "registry.example.com"}}"#,
    )
    .unwrap();

    let entries = BootstrapImporter::new(&store)
        .load_registry_auth(&path)
        .expect("Registry credentials should load");

    let entry = &entries["registry.example.com"];
    assert_eq!(entry.username.as_deref(), Some("ci"));
    assert_eq!(entry.server_address.as_deref(), Some("registry.example.com"));
}

#[test]
fn missing_registry_credentials_are_source_unavailable() {
    let (temp, store) = setup();

    let err = BootstrapImporter::new(&store)
        .load_registry_auth(&temp.path().join("absent.json"))
        .unwrap_err();

    assert!(matches!(err, ImportError::SourceUnavailable { .. }));
}
