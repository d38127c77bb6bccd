use std::sync::{atomic::Ordering, Arc};

use assert_matches::assert_matches;
use da_gateway_config::StorageConfig;
use da_gateway_da_client::{EigenDAV1Store, EigenDAV2Store, SecondaryStore};
use da_gateway_da_clients::memstore::{encode_payload, MemstoreCert};
use da_gateway_types::{
    keccak256, BackendType, EigenDABackend, GetOpts, VersionByte, VersionedCert,
};
use test_casing::{test_casing, Product};

use self::mocks::{Behavior, CountingV1, CountingV2, MockSecondary};
use crate::{EigenDAManager, SecondaryError, SecondaryManager, StoreError};


const PAYLOAD: &[u8] = b"rollup batch #1";
const BACKENDS: [EigenDABackend; 2] = [EigenDABackend::V1, EigenDABackend::V2];

struct TestSetup {
    v1: Arc<CountingV1>,
    v2: Arc<CountingV2>,
    caches: Vec<Arc<MockSecondary>>,
    fallbacks: Vec<Arc<MockSecondary>>,
    manager: Arc<EigenDAManager>,
}

impl TestSetup {
    fn new(caches: &[Behavior], fallbacks: &[Behavior]) -> Self {
        Self::custom(CountingV2::default(), caches, fallbacks, &StorageConfig::default())
    }

    fn custom(
        v2: CountingV2,
        caches: &[Behavior],
        fallbacks: &[Behavior],
        config: &StorageConfig,
    ) -> Self {
        let v1 = Arc::new(CountingV1::default());
        let v2 = Arc::new(v2);
        let caches: Vec<_> = caches
            .iter()
            .map(|&behavior| Arc::new(MockSecondary::new(BackendType::CacheV2Memory, behavior)))
            .collect();
        let fallbacks: Vec<_> = fallbacks
            .iter()
            .map(|&behavior| Arc::new(MockSecondary::new(BackendType::ObjectStore, behavior)))
            .collect();
        let secondary = SecondaryManager::new(
            caches.iter().map(|store| store.clone() as Arc<dyn SecondaryStore>).collect(),
            fallbacks.iter().map(|store| store.clone() as Arc<dyn SecondaryStore>).collect(),
            config,
        );
        let manager = EigenDAManager::new(
            Some(v1.clone() as Arc<dyn EigenDAV1Store>),
            Some(v2.clone() as Arc<dyn EigenDAV2Store>),
            Arc::new(secondary),
            config.dispersal_backend,
        )
        .unwrap();
        Self {
            v1,
            v2,
            caches,
            fallbacks,
            manager: Arc::new(manager),
        }
    }

    fn secondary_calls(&self) -> usize {
        self.caches
            .iter()
            .chain(&self.fallbacks)
            .map(|store| store.calls())
            .sum()
    }

    fn primary_gets(&self) -> usize {
        self.v1.gets.load(Ordering::SeqCst) + self.v2.gets.load(Ordering::SeqCst)
    }

    /// Disperses directly to the V2 primary, leaving secondary storage untouched.
    async fn disperse_to_primary(&self, payload: &[u8]) -> VersionedCert {
        let cert = self.v2.put(payload).await.unwrap();
        VersionedCert::new(cert, VersionByte::V2)
    }
}

#[test_casing(4, Product((BACKENDS, [false, true])))]
#[tokio::test]
async fn put_then_get_round_trip(backend: EigenDABackend, with_cache: bool) {
    let caches = if with_cache {
        vec![Behavior::Healthy]
    } else {
        vec![]
    };
    let setup = TestSetup::new(&caches, &[]);
    setup.manager.set_dispersal_backend(backend);

    let cert = setup.manager.put(PAYLOAD).await.unwrap();
    assert_eq!(cert.version, VersionByte::for_dispersal(backend));
    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, PAYLOAD);

    if with_cache {
        assert_eq!(setup.caches[0].len(), 1);
        assert_eq!(setup.primary_gets(), 0);
    } else {
        assert_eq!(setup.primary_gets(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_backend_switches_never_mix_versions() {
    const PUTS: usize = 64;

    let setup = TestSetup::new(&[], &[]);
    let toggler = {
        let manager = setup.manager.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                manager.set_dispersal_backend(BACKENDS[i % 2]);
                tokio::task::yield_now().await;
            }
        })
    };
    let puts: Vec<_> = (0..PUTS)
        .map(|i| {
            let manager = setup.manager.clone();
            tokio::spawn(async move { manager.put(format!("payload #{i}").as_bytes()).await })
        })
        .collect();

    let mut certs = Vec::with_capacity(PUTS);
    for put in puts {
        certs.push(put.await.unwrap().unwrap());
    }
    toggler.await.unwrap();

    let v1_puts = setup.v1.puts.load(Ordering::SeqCst);
    let v2_puts = setup.v2.puts.load(Ordering::SeqCst);
    assert_eq!(v1_puts + v2_puts, PUTS);
    let legacy_certs = certs.iter().filter(|cert| cert.version.is_legacy()).count();
    assert_eq!(legacy_certs, v1_puts);

    // Every cert must be resolvable by the backend its version points to.
    for (i, cert) in certs.iter().enumerate() {
        let payload = setup.manager.get(cert, GetOpts::default()).await.unwrap();
        assert_eq!(payload, format!("payload #{i}").as_bytes());
    }
}

#[tokio::test]
async fn dispersal_backend_can_be_switched() {
    let setup = TestSetup::new(&[], &[]);
    assert_eq!(setup.manager.get_dispersal_backend(), EigenDABackend::V2);
    setup.manager.set_dispersal_backend(EigenDABackend::V1);
    assert_eq!(setup.manager.get_dispersal_backend(), EigenDABackend::V1);

    setup.manager.put(PAYLOAD).await.unwrap();
    assert_eq!(setup.v1.puts.load(Ordering::SeqCst), 1);
    assert_eq!(setup.v2.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn manager_requires_dispersal_backend() {
    let secondary = Arc::new(SecondaryManager::disabled());
    let v2: Arc<dyn EigenDAV2Store> = Arc::new(CountingV2::default());
    let err = EigenDAManager::new(None, Some(v2.clone()), secondary.clone(), EigenDABackend::V1)
        .unwrap_err();
    assert_matches!(
        err,
        StoreError::DispersalBackendNotConfigured(EigenDABackend::V1)
    );

    let manager = EigenDAManager::new(None, Some(v2), secondary, EigenDABackend::V2).unwrap();
    manager.set_dispersal_backend(EigenDABackend::V1);
    let err = manager.put(PAYLOAD).await.unwrap_err();
    assert_matches!(
        err,
        StoreError::DispersalBackendNotConfigured(EigenDABackend::V1)
    );
}

#[tokio::test]
async fn reading_cert_without_backend() {
    let v1: Arc<dyn EigenDAV1Store> = Arc::new(CountingV1::default());
    let manager = EigenDAManager::new(
        Some(v1),
        None,
        Arc::new(SecondaryManager::disabled()),
        EigenDABackend::V1,
    )
    .unwrap();
    let cert = VersionedCert::new(vec![1; 32], VersionByte::V2);
    let err = manager.get(&cert, GetOpts::default()).await.unwrap_err();
    assert_matches!(err, StoreError::BackendNotInitialized(VersionByte::V2));

    let cert = manager.put(PAYLOAD).await.unwrap();
    assert_eq!(cert.version, VersionByte::V0);
    let manager = EigenDAManager::new(
        None,
        Some(Arc::new(CountingV2::default()) as Arc<dyn EigenDAV2Store>),
        Arc::new(SecondaryManager::disabled()),
        EigenDABackend::V2,
    )
    .unwrap();
    let err = manager.get(&cert, GetOpts::default()).await.unwrap_err();
    assert_matches!(err, StoreError::BackendNotInitialized(VersionByte::V0));
}

#[tokio::test]
async fn encoded_payload_reads_bypass_secondary_storage() {
    let setup = TestSetup::new(&[Behavior::Healthy], &[Behavior::Healthy]);
    let cert = setup.disperse_to_primary(PAYLOAD).await;

    let opts = GetOpts {
        return_encoded_payload: true,
        ..GetOpts::default()
    };
    let encoded = setup.manager.get(&cert, opts).await.unwrap();
    assert_eq!(encoded, encode_payload(PAYLOAD));
    assert_eq!(setup.secondary_calls(), 0);
}

#[tokio::test]
async fn encoded_payloads_are_not_supported_for_legacy_certs() {
    let setup = TestSetup::new(&[], &[]);
    setup.manager.set_dispersal_backend(EigenDABackend::V1);
    let cert = setup.manager.put(PAYLOAD).await.unwrap();

    let opts = GetOpts {
        return_encoded_payload: true,
        ..GetOpts::default()
    };
    let err = setup.manager.get(&cert, opts).await.unwrap_err();
    assert_matches!(err, StoreError::UnsupportedEncodedPayload(VersionByte::V0));
    assert_eq!(setup.primary_gets(), 0);
}

#[tokio::test]
async fn invalid_certs_are_rejected_before_lookups() {
    let setup = TestSetup::new(&[Behavior::Healthy], &[Behavior::Healthy]);
    let stale_cert = MemstoreCert {
        reference_block_number: 1_000,
        payload_digest: [0; 32],
        nonce: 0,
    };
    let cert = VersionedCert::new(stale_cert.encode(), VersionByte::V2);
    let opts = GetOpts {
        l1_inclusion_block_number: 1_000_000,
        ..GetOpts::default()
    };

    let err = setup.manager.get(&cert, opts).await.unwrap_err();
    assert_matches!(&err, StoreError::CertVerification(err) if !err.is_retriable());
    assert_eq!(setup.secondary_calls(), 0);
    assert_eq!(setup.primary_gets(), 0);
}

#[tokio::test]
async fn tampered_cached_payload_falls_through_to_primary() {
    let setup = TestSetup::new(&[Behavior::Healthy], &[]);
    setup.manager.set_dispersal_backend(EigenDABackend::V1);
    let cert = setup.manager.put(PAYLOAD).await.unwrap();
    setup.caches[0].insert_raw(&keccak256(&cert.serialized_cert), b"tampered");

    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, PAYLOAD);
    assert_eq!(setup.v1.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn v2_replicas_are_checked_against_cert_only() {
    let setup = TestSetup::new(&[Behavior::Healthy], &[]);
    let cert = setup.manager.put(PAYLOAD).await.unwrap();
    assert_eq!(cert.version, VersionByte::V2);
    setup.caches[0].insert_raw(&keccak256(&cert.serialized_cert), b"tampered");

    // The cert is valid, and the V2 verifier does not inspect payload bytes.
    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, b"tampered");
    assert_eq!(setup.primary_gets(), 0);
}

#[tokio::test]
async fn fallback_serves_reads_if_primary_fails() {
    let setup = TestSetup::custom(
        CountingV2::new(true),
        &[],
        &[Behavior::Healthy],
        &StorageConfig::default(),
    );
    let cert = setup.manager.put(PAYLOAD).await.unwrap();
    assert_eq!(setup.fallbacks[0].len(), 1);

    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, PAYLOAD);
    assert_eq!(setup.v2.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn primary_error_is_returned_as_is_without_secondary_storage() {
    let setup = TestSetup::custom(CountingV2::new(true), &[], &[], &StorageConfig::default());
    let cert = setup.manager.put(PAYLOAD).await.unwrap();
    let err = setup.manager.get(&cert, GetOpts::default()).await.unwrap_err();
    assert_matches!(err, StoreError::Primary(err) if err.is_retriable());
}

#[tokio::test]
async fn every_failure_is_reported_if_all_backends_fail() {
    let setup = TestSetup::custom(
        CountingV2::new(true),
        &[Behavior::Broken],
        &[Behavior::AlwaysMiss],
        &StorageConfig::default(),
    );
    let cert = setup.disperse_to_primary(PAYLOAD).await;

    let err = setup.manager.get(&cert, GetOpts::default()).await.unwrap_err();
    let StoreError::Exhausted(errors) = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(errors.len(), 3);
    let message = err.to_string();
    for part in ["cache tier", "primary backend", "relay unavailable", "fallback tier"] {
        assert!(message.contains(part), "{message}");
    }
}

#[tokio::test]
async fn cache_misses_are_backfilled() {
    let config = StorageConfig {
        write_on_cache_miss: true,
        ..StorageConfig::default()
    };
    let setup = TestSetup::custom(
        CountingV2::default(),
        &[Behavior::Healthy],
        &[Behavior::Healthy],
        &config,
    );
    let cert = setup.disperse_to_primary(PAYLOAD).await;

    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, PAYLOAD);
    assert_eq!(setup.caches[0].len(), 1);
    assert_eq!(setup.fallbacks[0].len(), 1);

    // The next read is served by the cache.
    let payload = setup.manager.get(&cert, GetOpts::default()).await.unwrap();
    assert_eq!(payload, PAYLOAD);
    assert_eq!(setup.v2.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_backfill_fails_read() {
    let config = StorageConfig {
        write_on_cache_miss: true,
        ..StorageConfig::default()
    };
    let setup = TestSetup::custom(CountingV2::default(), &[Behavior::Broken], &[], &config);
    let cert = setup.disperse_to_primary(PAYLOAD).await;

    let err = setup.manager.get(&cert, GetOpts::default()).await.unwrap_err();
    assert_matches!(
        err,
        StoreError::Secondary(SecondaryError::NoSuccessfulWrites { total: 1, .. })
    );
}

#[test_casing(2, [false, true])]
#[tokio::test]
async fn partial_secondary_write_failure_on_put(strict: bool) {
    let config = StorageConfig {
        error_on_secondary_insert_failure: strict,
        ..StorageConfig::default()
    };
    let setup = TestSetup::custom(
        CountingV2::default(),
        &[Behavior::Healthy],
        &[Behavior::Broken],
        &config,
    );

    let result = setup.manager.put(PAYLOAD).await;
    if strict {
        let err = result.unwrap_err();
        assert_matches!(
            &err,
            StoreError::Secondary(SecondaryError::PartialFailure { failed: 1, total: 2, .. })
        );
        assert!(err.to_string().contains("1 of 2"), "{err}");
    } else {
        result.unwrap();
    }
    assert_eq!(setup.caches[0].len(), 1);
}

#[tokio::test]
async fn put_fails_if_no_secondary_write_succeeds() {
    let setup = TestSetup::new(&[Behavior::Broken], &[]);
    let err = setup.manager.put(PAYLOAD).await.unwrap_err();
    assert_matches!(
        err,
        StoreError::Secondary(SecondaryError::NoSuccessfulWrites { .. })
    );
}
