mod common;

use argon2_sandbox::{
    EngineConfig, HashError, HashParameters, Hasher, SharedHasher, Variant, Version,
    generate_salt, hash,
};

use common::{PASSWORD, SALT, TrackingEngine, quick_params, reference_params, tracking_hasher};

fn reference_hash(variant: Variant, version: Version) -> String {
    common::init_tracing();
    let mut hasher = tracking_hasher();
    let tag = hasher
        .hash(PASSWORD, SALT, Some(&reference_params(variant, version)))
        .expect("reference hash failed");
    assert_eq!(hasher.engine().outstanding(), 0);
    hex::encode(tag)
}

// ── Reference Vectors ───────────────────────────────────────────

#[test]
fn argon2d_v0x10() {
    assert_eq!(
        reference_hash(Variant::Argon2d, Version::V0x10),
        "2ec0d925358f5830caf0c1cc8a3ee58b34505759428b859c79b72415f51f9221"
    );
}

#[test]
fn argon2d_v0x13() {
    assert_eq!(
        reference_hash(Variant::Argon2d, Version::V0x13),
        "955e5d5b163a1b60bba35fc36d0496474fba4f6b59ad53628666f07fb2f93eaf"
    );
}

#[test]
fn argon2i_v0x10() {
    assert_eq!(
        reference_hash(Variant::Argon2i, Version::V0x10),
        "f6c4db4a54e2a370627aff3db6176b94a2a209a62c8e36152711802f7b30c694"
    );
}

#[test]
fn argon2i_v0x13() {
    assert_eq!(
        reference_hash(Variant::Argon2i, Version::V0x13),
        "c1628832147d9720c5bd1cfd61367078729f6dfb6f8fea9ff98158e0d7816ed0"
    );
}

#[test]
fn argon2id_v0x10() {
    assert_eq!(
        reference_hash(Variant::Argon2id, Version::V0x10),
        "980ebd24a4e667f16346f9d4a78b175728783613e0cc6fb17c2ec884b16435df"
    );
}

#[test]
fn argon2id_v0x13() {
    assert_eq!(
        reference_hash(Variant::Argon2id, Version::V0x13),
        "09316115d5cf24ed5a15a31a3ba326e5cf32edc24702987c02b6566f61913cf7"
    );
}

#[test]
fn one_shot_hash_matches_reference() {
    let params = reference_params(Variant::Argon2id, Version::V0x13);
    let tag = hash(PASSWORD, SALT, Some(&params)).unwrap();
    assert_eq!(
        hex::encode(tag),
        "09316115d5cf24ed5a15a31a3ba326e5cf32edc24702987c02b6566f61913cf7"
    );
}

// ── Determinism & Output ────────────────────────────────────────

#[test]
fn hash_is_deterministic() {
    let mut hasher = tracking_hasher();
    let params = quick_params();

    let a = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
    let b = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
    assert_eq!(a, b);

    let mut other = tracking_hasher();
    let c = other.hash(PASSWORD, SALT, Some(&params)).unwrap();
    assert_eq!(a, c);
}

#[test]
fn hash_changes_with_salt_and_password() {
    let mut hasher = tracking_hasher();
    let params = quick_params();

    let base = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
    let salted = hasher.hash(PASSWORD, b"othersalt", Some(&params)).unwrap();
    let other = hasher.hash(b"different", SALT, Some(&params)).unwrap();

    assert_ne!(base, salted);
    assert_ne!(base, other);
}

#[test]
fn output_length_is_respected() {
    let mut hasher = tracking_hasher();

    for len in [4u32, 16, 32, 64, 128] {
        let params = quick_params().output_length(len);
        let tag = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
        assert_eq!(tag.len(), len as usize);
    }

    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn defaults_produce_32_bytes() {
    let mut hasher = tracking_hasher();
    let tag = hasher.hash(PASSWORD, SALT, None).unwrap();
    assert_eq!(tag.len(), 32);

    let args = hasher.engine().last_args.unwrap();
    assert_eq!(args[10], Variant::Argon2id.code());
    assert_eq!(args[11], 2);
    assert_eq!(args[12], 19456);
    assert_eq!(args[13], 1);
    assert_eq!(args[14], 32);
    assert_eq!(args[15], 0x13);
}

// ── Optional Inputs ─────────────────────────────────────────────

#[test]
fn empty_secret_matches_absent_secret() {
    let mut hasher = tracking_hasher();

    let absent = hasher.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();
    let empty = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().secret(Vec::<u8>::new())))
        .unwrap();

    assert_eq!(absent, empty);
}

#[test]
fn empty_associated_data_matches_absent() {
    let mut hasher = tracking_hasher();

    let absent = hasher.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();
    let empty = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().associated_data(Vec::<u8>::new())))
        .unwrap();

    assert_eq!(absent, empty);
}

#[test]
fn secret_and_associated_data_change_output() {
    let mut hasher = tracking_hasher();

    let plain = hasher.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();
    let keyed = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().secret(b"pepper".to_vec())))
        .unwrap();
    let bound = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().associated_data(b"context".to_vec())))
        .unwrap();

    assert_ne!(plain, keyed);
    assert_ne!(plain, bound);
    assert_ne!(keyed, bound);
    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn absent_optionals_are_encoded_as_null() {
    let mut hasher = tracking_hasher();
    hasher.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();

    let args = hasher.engine().last_args.unwrap();
    assert_eq!(&args[4..8], &[0, 0, 0, 0]);
    assert_ne!(args[0], 0);
    assert_ne!(args[2], 0);
    assert_ne!(args[8], 0);
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn out_of_range_parameters_fail_before_allocation() {
    let cases = [
        quick_params().parallelism(0),
        quick_params().parallelism(256),
        quick_params().time_cost(0),
        quick_params().memory_cost(0),
        quick_params().output_length(0),
    ];

    for params in cases {
        let mut hasher = tracking_hasher();
        let err = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap_err();
        assert!(err.is_validation(), "expected validation error, got {err}");
        assert_eq!(hasher.engine().allocs, 0);
        assert_eq!(hasher.engine().hash_calls, 0);
    }
}

#[test]
fn parallelism_bounds_are_inclusive() {
    let mut hasher = tracking_hasher();

    let params = HashParameters::new()
        .time_cost(1)
        .memory_cost(8 * 255)
        .parallelism(255);
    let tag = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
    assert_eq!(tag.len(), 32);
}

// ── Cleanup ─────────────────────────────────────────────────────

#[test]
fn every_allocation_is_released_on_success() {
    let mut hasher = tracking_hasher();
    let params = quick_params()
        .secret(b"pepper".to_vec())
        .associated_data(b"context".to_vec());

    hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();

    let engine = hasher.engine();
    assert_eq!(engine.allocs, 5);
    assert_eq!(engine.deallocs, 5);
    assert_eq!(engine.outstanding(), 0);
}

#[test]
fn engine_panic_is_reported_and_cleaned_up() {
    let mut hasher = tracking_hasher();

    // Passes host validation, rejected by the engine (needs 8 KiB per lane).
    let params = quick_params().memory_cost(1);
    let err = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap_err();

    match &err {
        HashError::Engine(msg) => assert!(msg.contains("invalid argon2 parameters"), "{msg}"),
        other => panic!("expected engine failure, got {other}"),
    }
    assert_eq!(hasher.engine().hash_calls, 1);
    assert_eq!(hasher.engine().outstanding(), 0);
    assert_eq!(hasher.engine().allocs, hasher.engine().deallocs);
}

#[test]
fn short_salt_is_an_engine_failure() {
    let mut hasher = tracking_hasher();
    let err = hasher.hash(PASSWORD, b"short", Some(&quick_params())).unwrap_err();

    assert!(err.is_engine(), "expected engine failure, got {err}");
    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn engine_failure_does_not_poison_later_calls() {
    let mut hasher = tracking_hasher();
    let params = quick_params();

    let before = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();
    assert!(hasher.hash(PASSWORD, b"short", Some(&params)).is_err());
    let after = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();

    assert_eq!(before, after);
    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn allocation_failure_releases_earlier_inputs() {
    let config = EngineConfig {
        initial_pages: 1,
        max_pages: 1,
    };
    let mut hasher = Hasher::with_engine(TrackingEngine::new(&config));

    let salt = vec![7u8; 128 * 1024];
    let err = hasher.hash(PASSWORD, &salt, Some(&quick_params())).unwrap_err();

    match err {
        HashError::Allocation { size, .. } => assert_eq!(size, 128 * 1024),
        other => panic!("expected allocation failure, got {other}"),
    }
    assert_eq!(hasher.engine().hash_calls, 0);
    assert_eq!(hasher.engine().outstanding(), 0);
}

fn assert_working_set_refused(err: &HashError) {
    match err {
        HashError::Engine(msg) => assert!(msg.starts_with("memory allocation of"), "{msg}"),
        other => panic!("expected allocation failure from the engine, got {other}"),
    }
}

#[test]
fn memory_cost_is_bounded_by_page_cap() {
    let config = EngineConfig {
        initial_pages: 1,
        max_pages: 1,
    };
    let mut hasher = Hasher::with_engine(TrackingEngine::new(&config));

    let err = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().memory_cost(65536)))
        .unwrap_err();
    assert_working_set_refused(&err);
    assert_eq!(hasher.engine().hash_calls, 1);
    assert_eq!(hasher.engine().outstanding(), 0);
    assert_eq!(hasher.engine().inner.pages(), 1);

    let tag = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().memory_cost(32)))
        .unwrap();
    assert_eq!(tag.len(), 32);
    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn unsatisfiable_memory_cost_is_an_error() {
    let mut hasher = tracking_hasher();

    let err = hasher
        .hash(PASSWORD, SALT, Some(&quick_params().memory_cost(u32::MAX)))
        .unwrap_err();
    assert_working_set_refused(&err);
    assert_eq!(hasher.engine().outstanding(), 0);

    let tag = hasher.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();
    assert_eq!(tag.len(), 32);
    assert_eq!(hasher.engine().outstanding(), 0);
}

#[test]
fn errors_do_not_expose_addresses() {
    let mut hasher = tracking_hasher();
    let err = hasher.hash(PASSWORD, SALT, Some(&quick_params().memory_cost(1))).unwrap_err();
    let text = err.to_string();

    let args = hasher.engine().last_args.unwrap();
    assert!(!text.contains(&args[0].to_string()));
    assert!(!text.contains(&args[8].to_string()));
}

// ── Verify & Salt ───────────────────────────────────────────────

#[test]
fn verify_accepts_matching_password() {
    let mut hasher = tracking_hasher();
    let params = quick_params();
    let tag = hasher.hash(PASSWORD, SALT, Some(&params)).unwrap();

    assert!(hasher.verify(PASSWORD, SALT, &tag, Some(&params)).unwrap());
    assert!(!hasher.verify(b"wrong", SALT, &tag, Some(&params)).unwrap());
    assert!(!hasher.verify(PASSWORD, SALT, &tag[..16], Some(&params)).unwrap());
}

#[test]
fn generated_salts_are_random() {
    let a = generate_salt(40);
    let b = generate_salt(40);

    assert_eq!(a.len(), 40);
    assert_ne!(a, b);
}

// ── Shared Engine ───────────────────────────────────────────────

#[test]
fn shared_hasher_serializes_concurrent_calls() {
    let shared = SharedHasher::from_hasher(tracking_hasher());
    let expected = shared.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let shared = shared.clone();
            let expected = &expected;
            scope.spawn(move || {
                for _ in 0..3 {
                    let tag = shared.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();
                    assert_eq!(&tag, expected);
                }
            });
        }
    });

    let outstanding = shared.with(|hasher| Ok(hasher.engine().outstanding())).unwrap();
    assert_eq!(outstanding, 0);
}

#[test]
fn shared_hasher_verifies() {
    let shared = SharedHasher::new(&EngineConfig::default()).unwrap();
    let tag = shared.hash(PASSWORD, SALT, Some(&quick_params())).unwrap();

    assert!(shared.verify(PASSWORD, SALT, &tag, Some(&quick_params())).unwrap());
}
