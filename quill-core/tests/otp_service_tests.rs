//! Integration tests for code issuance and verification
//!
//! Exercises the single-use, overwrite, expiry and hashing guarantees of
//! the OTP service against the in-memory store.

use quill_core::auth::{hash_code, OtpService};
use quill_core::store::{CredentialStore, MemoryStore};
use quill_core::types::{OtpCode, SigningKey, SubjectId};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(300);

fn setup() -> (Arc<MemoryStore>, OtpService) {
    let store = Arc::new(MemoryStore::new());
    let key = SigningKey::new("integration-signing-key".to_string()).unwrap();
    let otp = OtpService::new(key, store.clone(), TTL);
    (store, otp)
}

/// A six-digit code guaranteed to differ from `code`
fn wrong_code(code: &OtpCode) -> OtpCode {
    let n: u32 = code.expose().parse().unwrap();
    OtpCode::new(format!("{:06}", (n + 1) % 1_000_000))
}

#[test]
fn test_issue_returns_six_digit_code() {
    let (_, otp) = setup();
    let code = otp.issue_code(42).unwrap();

    assert_eq!(code.expose().len(), 6);
    assert!(code.expose().chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_verify_succeeds_exactly_once() {
    let (_, otp) = setup();
    let code = otp.issue_code(42).unwrap();

    assert!(otp.verify_code(42, code.expose()).unwrap());
    assert!(!otp.verify_code(42, code.expose()).unwrap());
}

#[test]
fn test_wrong_code_does_not_consume_credential() {
    let (_, otp) = setup();
    let subject = SubjectId::new(7);
    let code = otp.issue(subject).unwrap();

    assert!(!otp.verify(subject, &wrong_code(&code)).unwrap());
    assert!(otp.verify(subject, &code).unwrap());
}

#[test]
fn test_reissue_invalidates_previous_code() {
    let (_, otp) = setup();
    let subject = SubjectId::new(3);

    let first = otp.issue(subject).unwrap();
    let second = otp.issue(subject).unwrap();

    if first.expose() != second.expose() {
        assert!(!otp.verify(subject, &first).unwrap());
    }
    assert!(otp.verify(subject, &second).unwrap());
}

#[test]
fn test_codes_differ_across_issuances() {
    let (_, otp) = setup();
    let subject = SubjectId::new(1);

    // Secrets embed a nanosecond timestamp; a handful of collisions in a
    // 10^6 space over 50 draws would point at a broken derivation
    let codes: std::collections::HashSet<String> = (0..50)
        .map(|_| otp.issue(subject).unwrap().expose().to_string())
        .collect();

    assert!(codes.len() > 45);
}

#[test]
fn test_expired_code_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let key = SigningKey::new("integration-signing-key".to_string()).unwrap();
    let otp = OtpService::new(key, store, Duration::from_millis(40));

    let code = otp.issue_code(12).unwrap();
    thread::sleep(Duration::from_millis(100));

    assert!(!otp.verify_code(12, code.expose()).unwrap());
}

#[test]
fn test_verify_without_issue_is_false() {
    let (_, otp) = setup();

    assert!(!otp.verify_code(1000, "123456").unwrap());
    assert!(!otp.verify_code(1000, "").unwrap());
    assert!(!otp.verify_code(1000, "not a code").unwrap());
}

#[test]
fn test_subjects_are_isolated() {
    let (_, otp) = setup();
    let code_42 = otp.issue_code(42).unwrap();
    let code_43 = otp.issue_code(43).unwrap();

    assert!(otp.verify_code(42, code_42.expose()).unwrap());
    assert!(!otp.verify_code(42, code_42.expose()).unwrap());

    if code_43.expose() != "000000" {
        assert!(!otp.verify_code(42, "000000").unwrap());
    }
    assert!(otp.verify_code(43, code_43.expose()).unwrap());
}

#[test]
fn test_store_never_holds_plaintext() {
    let (store, otp) = setup();
    let codes: Vec<OtpCode> = (1..=10).map(|id| otp.issue_code(id).unwrap()).collect();

    let values = store.raw_values().unwrap();
    assert_eq!(values.len(), codes.len());

    for code in &codes {
        assert!(values.contains(&hash_code(code)));
        assert!(values.iter().all(|v| v != code.expose()));
    }
}

#[test]
fn test_credential_lives_under_subject_key() {
    let (store, otp) = setup();
    let code = otp.issue_code(77).unwrap();

    assert_eq!(
        store.get("otp:77").unwrap(),
        Some(hash_code(&code))
    );
}

#[test]
fn test_concurrent_verification_succeeds_once() {
    let (_, otp) = setup();
    let code = otp.issue_code(5).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let otp = otp.clone();
            let code = code.clone();
            thread::spawn(move || otp.verify_code(5, code.expose()).unwrap())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
}
