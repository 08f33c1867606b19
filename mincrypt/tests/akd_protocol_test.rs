use mincrypt::akd::{
    AkdOperation, AkdParams, Direction, FieldMask, KeyFiles, count_file_elements, read_file,
};
use mincrypt::errors::MincryptError;
use mincrypt::{MincryptConfig, Session};

use std::path::Path;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap();
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_line_number(false)
            .with_file(false)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

fn params(
    operation: AkdOperation,
    direction: Direction,
    step: u32,
    count: usize,
    file: &Path,
) -> AkdParams {
    AkdParams {
        operation,
        direction,
        step,
        count,
        filename: file.to_path_buf(),
    }
}

#[test]
fn two_party_exchange_agrees() -> Result<(), MincryptError> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let alice = dir.path().join("alice");
    let bob = dir.path().join("bob");

    let mut alice_session = Session::seeded(1);
    let mut bob_session = Session::seeded(2);

    // step 1: alice creates the common parameters, bob receives a copy of the file
    let common = alice_session.process_step(&params(
        AkdOperation::GenerateCommon { bits: 32 },
        Direction::SENDER,
        1,
        1,
        &alice,
    ))?;
    assert_eq!(common.count(), 2);
    assert_eq!(common.before.common.size, None);
    assert_eq!(common.after.common.size, Some(32));
    assert_eq!(common.after.private.size, None);

    let alice_files = KeyFiles::for_base(&alice);
    let bob_files = KeyFiles::for_base(&bob);
    std::fs::copy(&alice_files.common, &bob_files.common)?;

    // step 2: both generate keypairs
    let alice_keys = alice_session.process_step(&params(
        AkdOperation::GenerateKeypair,
        Direction::SENDER,
        2,
        1,
        &alice,
    ))?;
    let bob_keys = bob_session.process_step(&params(
        AkdOperation::GenerateKeypair,
        Direction::RECEIVER,
        2,
        1,
        &bob,
    ))?;
    assert_eq!(alice_keys.before.common.size, Some(32));
    assert_eq!(alice_keys.after.private.size, Some(16));
    assert_eq!(alice_keys.after.public.size, Some(16));
    assert_eq!(bob_keys.direction, Direction::RECEIVER);

    // step 3: each side combines its private value with the other's public file
    let alice_secret = alice_session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: bob_files.public.clone(),
        },
        Direction::SENDER,
        3,
        1,
        &alice,
    ))?;
    let bob_secret = bob_session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: alice_files.public.clone(),
        },
        Direction::RECEIVER,
        3,
        1,
        &bob,
    ))?;

    assert_eq!(alice_secret.values, bob_secret.values);
    assert_eq!(alice_secret.before, alice_secret.after);
    assert!(alice_secret.to_string().contains("AKD step 3 (sender)"));
    Ok(())
}

#[test]
fn multi_party_values_are_index_aligned() -> Result<(), MincryptError> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let left = dir.path().join("left");
    let right = dir.path().join("right");
    let mut session = Session::seeded(9);

    session.process_step(&params(
        AkdOperation::GenerateCommon { bits: 20 },
        Direction::SENDER,
        1,
        4,
        &left,
    ))?;
    std::fs::copy(
        KeyFiles::for_base(&left).common,
        KeyFiles::for_base(&right).common,
    )?;

    for base in [&left, &right] {
        session.process_step(&params(
            AkdOperation::GenerateKeypair,
            Direction::SENDER,
            2,
            4,
            base,
        ))?;
        assert_eq!(count_file_elements(KeyFiles::for_base(base).public)?, 4);
    }

    let left_secret = session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: KeyFiles::for_base(&right).public,
        },
        Direction::SENDER,
        3,
        4,
        &left,
    ))?;
    let right_secret = session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: KeyFiles::for_base(&left).public,
        },
        Direction::RECEIVER,
        3,
        4,
        &right,
    ))?;

    assert_eq!(left_secret.count(), 4);
    assert_eq!(left_secret.values, right_secret.values);
    Ok(())
}

#[test]
fn keypair_files_hold_consistent_material() -> Result<(), MincryptError> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("party");
    let mut session = Session::seeded(4);

    let descriptor = format!("op=common,dir=sender,bits=24,file={}", base.display());
    session.process_step(&descriptor.parse::<AkdParams>()?)?;
    let data = session.process_step(&params(
        AkdOperation::GenerateKeypair,
        Direction::SENDER,
        2,
        3,
        &base,
    ))?;

    let files = KeyFiles::for_base(&base);
    let common = read_file(&files.common, FieldMask::COMMON, 16)?.common;
    let private = read_file(&files.private, FieldMask::PRIVATE, 16)?.private_values;
    let public = read_file(&files.public, FieldMask::PUBLIC, 16)?.public_values;

    assert_eq!(public, data.values);
    for (public, private) in public.iter().zip(&private) {
        assert_eq!(*public, common.public_value(*private)?);
    }
    Ok(())
}

#[test]
fn out_of_order_steps_surface_missing_files() -> Result<(), MincryptError> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("early");
    let mut session = Session::new(MincryptConfig::seeded(5))?;

    let keypair_first = session.process_step(&params(
        AkdOperation::GenerateKeypair,
        Direction::SENDER,
        1,
        1,
        &base,
    ));
    assert!(matches!(keypair_first, Err(MincryptError::IoError(_))));

    session.process_step(&params(
        AkdOperation::GenerateCommon { bits: 16 },
        Direction::SENDER,
        1,
        1,
        &base,
    ))?;
    let exchange_early = session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: dir.path().join("nobody.public"),
        },
        Direction::SENDER,
        2,
        1,
        &base,
    ));
    assert!(matches!(exchange_early, Err(MincryptError::IoError(_))));
    Ok(())
}

#[test]
fn exchange_with_too_few_peer_values_fails() -> Result<(), MincryptError> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("many");
    let small = dir.path().join("few");
    let mut session = Session::seeded(6);

    session.process_step(&params(
        AkdOperation::GenerateCommon { bits: 16 },
        Direction::SENDER,
        1,
        1,
        &base,
    ))?;
    std::fs::copy(
        KeyFiles::for_base(&base).common,
        KeyFiles::for_base(&small).common,
    )?;
    for (base, count) in [(&base, 3), (&small, 1)] {
        session.process_step(&params(
            AkdOperation::GenerateKeypair,
            Direction::SENDER,
            2,
            count,
            base,
        ))?;
    }

    let result = session.process_step(&params(
        AkdOperation::Exchange {
            peer_public: KeyFiles::for_base(&small).public,
        },
        Direction::SENDER,
        3,
        3,
        &base,
    ));
    assert!(matches!(result, Err(MincryptError::FormatError(_))));
    Ok(())
}

#[test]
fn process_data_dumps_as_json() -> Result<(), MincryptError> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("dump");
    let mut session = Session::seeded(8);

    let data = session.process_step(&params(
        AkdOperation::GenerateCommon { bits: 12 },
        Direction::SENDER,
        1,
        1,
        &base,
    ))?;
    let json: serde_json::Value = serde_json::from_str(&data.to_json()?)?;

    assert_eq!(json["step"], 1);
    assert_eq!(json["values"].as_array().map(Vec::len), Some(2));
    assert!(json["before"]["common"]["size"].is_null());
    assert_eq!(json["after"]["common"]["size"], 32);
    Ok(())
}
