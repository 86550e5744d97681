// Tests for the TLS policy
//
// Certificate parsing failures must surface as errors so startup can exit
// before any connection attempt.

use rcs7100::{ClientIdentity, TlsPolicy};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_policy_skips_verification() {
    let policy = TlsPolicy::default();
    assert!(policy.insecure_skip_verify);
    assert!(policy.client_identity.is_none());
    assert!(policy.client_config().is_ok());
}

#[test]
fn test_verifying_policy_builds() {
    let policy = TlsPolicy {
        insecure_skip_verify: false,
        client_identity: None,
    };
    assert!(policy.client_config().is_ok());
}

#[test]
fn test_missing_pem_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(ClientIdentity::load_pem(dir.path().join("absent.pem")).is_err());
}

#[test]
fn test_pem_without_certificate_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.pem");
    fs::write(&path, "just some text\n").unwrap();

    let err = ClientIdentity::load_pem(&path).unwrap_err();
    assert!(err.to_string().contains("No certificate found"));
}

#[test]
fn test_malformed_certificate_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pem");
    fs::write(
        &path,
        "-----BEGIN CERTIFICATE-----\n!!!! not base64 !!!!\n-----END CERTIFICATE-----\n",
    )
    .unwrap();

    assert!(ClientIdentity::load_pem(&path).is_err());
}
