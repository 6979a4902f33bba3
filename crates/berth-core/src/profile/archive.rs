//! Decoding of packaged connection profile material.
//!
//! Two encodings are accepted:
//! - a plain JSON document describing the profile, material inline
//! - a zip archive with `meta.json` plus `tls/<kind>/{ca,cert,key}.pem`
//!
//! The encoding is detected from the zip local-file-header magic.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use anyhow::Context;
use serde::Deserialize;

use super::{ConnectionProfile, CredentialMaterial, Endpoint, TlsMaterial};
use crate::types::EndpointKind;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Largest single archive entry accepted.
const MAX_ENTRY_BYTES: u64 = 1024 * 1024;

/// Profile document as packaged. The name is assigned by the importer.
#[derive(Debug, Deserialize)]
struct PackagedProfile {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    endpoints: BTreeMap<EndpointKind, Endpoint>,
}

/// Decode packaged material into a profile named `profile_name`.
///
/// The endpoints are validated; a profile is never returned half-built. The
/// name is checked by the store the profile is written to.
pub fn decode_profile(profile_name: &str, data: &[u8]) -> anyhow::Result<ConnectionProfile> {
    let packaged = if data.starts_with(ZIP_MAGIC) {
        decode_archive(data)?
    } else {
        serde_json::from_slice::<PackagedProfile>(data)
            .context("Failed to parse profile material as JSON")?
    };

    let profile = ConnectionProfile {
        name: profile_name.to_string(),
        description: packaged.description,
        endpoints: packaged.endpoints,
    };
    profile.validate_endpoints()?;
    Ok(profile)
}

fn decode_archive(data: &[u8]) -> anyhow::Result<PackagedProfile> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .context("Failed to read profile material as zip archive")?;

    let meta = read_entry(&mut archive, "meta.json")?
        .ok_or_else(|| anyhow::anyhow!("Profile archive is missing meta.json"))?;
    let mut packaged: PackagedProfile =
        serde_json::from_str(&meta).context("Failed to parse meta.json in profile archive")?;

    for (kind, endpoint) in packaged.endpoints.iter_mut() {
        let dir = format!("tls/{}", kind.as_str());
        let tls = TlsMaterial {
            ca: read_entry(&mut archive, &format!("{dir}/ca.pem"))?,
            cert: read_entry(&mut archive, &format!("{dir}/cert.pem"))?,
            key: read_entry(&mut archive, &format!("{dir}/key.pem"))?,
        };
        if tls.is_empty() {
            continue;
        }
        let material = endpoint.material.get_or_insert_with(CredentialMaterial::default);
        if material.tls.is_some() {
            anyhow::bail!(
                "Profile archive has TLS material for the {} endpoint both inline and in {}/",
                kind,
                dir
            );
        }
        material.tls = Some(tls);
    }

    Ok(packaged)
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> anyhow::Result<Option<String>> {
    let file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read archive entry: {name}"));
        }
    };

    if file.size() > MAX_ENTRY_BYTES {
        anyhow::bail!(
            "Archive entry {} is too large ({} bytes, limit {})",
            name,
            file.size(),
            MAX_ENTRY_BYTES
        );
    }

    let mut content = String::new();
    file.take(MAX_ENTRY_BYTES)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read archive entry: {name}"))?;
    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_profile_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, content) in entries {
                zip.start_file(*name, options).expect("Failed to start entry");
                zip.write_all(content.as_bytes())
                    .expect("Failed to write entry");
            }
            zip.finish().expect("Failed to finish zip");
        }
        buf.into_inner()
    }

    #[test]
    fn test_decode_json_material() {
        let json = r#"{
            "description": "installer endpoint",
            "endpoints": {
                "docker": {
                    "host": "tcp://10.0.0.5:2376",
                    "material": { "token": "abc" }
                }
            }
        }"#;

        let profile = decode_profile("cnab", json.as_bytes()).unwrap();
        assert_eq!(profile.name, "cnab");
        assert_eq!(profile.description.as_deref(), Some("installer endpoint"));
        let docker = &profile.endpoints[&EndpointKind::Docker];
        assert_eq!(docker.host, "tcp://10.0.0.5:2376");
        assert_eq!(
            docker.material.as_ref().unwrap().token.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_decode_zip_material_attaches_tls() {
        let data = create_profile_zip(&[
            (
                "meta.json",
                r#"{"endpoints": {"docker": {"host": "tcp://10.0.0.5:2376"}}}"#,
            ),
            ("tls/docker/ca.pem", "CA"),
            ("tls/docker/cert.pem", "CERT"),
            ("tls/docker/key.pem", "KEY"),
        ]);

        let profile = decode_profile("cnab", &data).unwrap();
        let tls = profile.endpoints[&EndpointKind::Docker]
            .material
            .as_ref()
            .unwrap()
            .tls
            .as_ref()
            .unwrap();
        assert_eq!(tls.ca.as_deref(), Some("CA"));
        assert_eq!(tls.cert.as_deref(), Some("CERT"));
        assert_eq!(tls.key.as_deref(), Some("KEY"));
    }

    #[test]
    fn test_decode_zip_without_meta_fails() {
        let data = create_profile_zip(&[("tls/docker/ca.pem", "CA")]);
        let err = decode_profile("cnab", &data).unwrap_err().to_string();
        assert!(err.contains("meta.json"));
    }

    #[test]
    fn test_decode_rejects_duplicate_tls_sources() {
        let data = create_profile_zip(&[
            (
                "meta.json",
                r#"{"endpoints": {"docker": {"host": "tcp://h:2376", "material": {"tls": {"ca": "X"}}}}}"#,
            ),
            ("tls/docker/ca.pem", "CA"),
        ]);
        assert!(decode_profile("cnab", &data).is_err());
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        assert!(decode_profile("cnab", b"{not json").is_err());
    }

    #[test]
    fn test_decode_validates_profile() {
        let json = r#"{"endpoints": {}}"#;
        let err = decode_profile("cnab", json.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("no endpoints"));
    }
}
