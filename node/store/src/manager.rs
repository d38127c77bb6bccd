use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use async_trait::async_trait;
use da_gateway_da_client::{types::BackendError, EigenDAV1Store, EigenDAV2Store};
use da_gateway_types::{EigenDABackend, GetOpts, VersionByte, VersionedCert};

use crate::{
    errors::{AggregateError, StoreError},
    metrics::{Method, Outcome, METRICS},
    secondary::{PayloadVerifier, SecondaryManager},
};

/// Verification applied to payloads read for a specific cert.
enum CertVerifier<'a> {
    /// Legacy certs commit to the payload, so the payload itself is checked.
    V1(&'a dyn EigenDAV1Store),
    V2 {
        store: &'a dyn EigenDAV2Store,
        version: VersionByte,
        l1_inclusion_block_number: u64,
    },
}

#[async_trait]
impl<'a> PayloadVerifier for CertVerifier<'a> {
    async fn verify(&self, cert: &[u8], payload: &[u8]) -> Result<(), BackendError> {
        match self {
            Self::V1(store) => store.verify(cert, payload).await,
            Self::V2 {
                store,
                version,
                l1_inclusion_block_number,
            } => {
                let cert = VersionedCert::new(cert.to_vec(), *version);
                store.verify_cert(&cert, *l1_inclusion_block_number).await
            }
        }
    }
}

/// Routes puts and gets between the primary backends and secondary storage.
#[derive(Debug)]
pub struct EigenDAManager {
    v1: Option<Arc<dyn EigenDAV1Store>>,
    v2: Option<Arc<dyn EigenDAV2Store>>,
    dispersal_backend: AtomicU8,
    secondary: Arc<SecondaryManager>,
}

impl EigenDAManager {
    /// # Errors
    ///
    /// Fails if the primary backend for `dispersal_backend` is not provided.
    pub fn new(
        v1: Option<Arc<dyn EigenDAV1Store>>,
        v2: Option<Arc<dyn EigenDAV2Store>>,
        secondary: Arc<SecondaryManager>,
        dispersal_backend: EigenDABackend,
    ) -> Result<Self, StoreError> {
        let is_configured = match dispersal_backend {
            EigenDABackend::V1 => v1.is_some(),
            EigenDABackend::V2 => v2.is_some(),
        };
        if !is_configured {
            return Err(StoreError::DispersalBackendNotConfigured(dispersal_backend));
        }
        Ok(Self {
            v1,
            v2,
            dispersal_backend: AtomicU8::new(dispersal_backend.to_u8()),
            secondary,
        })
    }

    pub fn secondary(&self) -> &Arc<SecondaryManager> {
        &self.secondary
    }

    pub fn get_dispersal_backend(&self) -> EigenDABackend {
        let raw = self.dispersal_backend.load(Ordering::Acquire);
        // Only values produced by `EigenDABackend::to_u8()` are ever stored.
        EigenDABackend::from_u8(raw).unwrap_or(EigenDABackend::V2)
    }

    /// Redirects subsequent dispersals. Puts already in progress keep their backend.
    pub fn set_dispersal_backend(&self, backend: EigenDABackend) {
        let previous = self
            .dispersal_backend
            .swap(backend.to_u8(), Ordering::AcqRel);
        if previous != backend.to_u8() {
            tracing::info!("Switched dispersal backend to {backend}");
        }
    }

    /// Disperses `payload` to the active primary backend and replicates it to secondary storage.
    ///
    /// The returned cert is tagged with the version of the backend that actually served the put.
    pub async fn put(&self, payload: &[u8]) -> Result<VersionedCert, StoreError> {
        let result = self.put_inner(payload).await;
        METRICS.manager_requests[&(Method::Put, Outcome::of(&result))].inc();
        result
    }

    async fn put_inner(&self, payload: &[u8]) -> Result<VersionedCert, StoreError> {
        let backend = self.get_dispersal_backend();
        tracing::debug!(%backend, "Dispersing {} bytes", payload.len());
        let serialized_cert = match backend {
            EigenDABackend::V1 => {
                let store = self
                    .v1
                    .as_ref()
                    .ok_or(StoreError::DispersalBackendNotConfigured(backend))?;
                store.put(payload).await.map_err(StoreError::Primary)?
            }
            EigenDABackend::V2 => {
                let store = self
                    .v2
                    .as_ref()
                    .ok_or(StoreError::DispersalBackendNotConfigured(backend))?;
                store.put(payload).await.map_err(StoreError::Primary)?
            }
        };
        let cert = VersionedCert::new(serialized_cert, VersionByte::for_dispersal(backend));

        if self.secondary.enabled() {
            self.secondary
                .replicate(&cert.serialized_cert, payload)
                .await?;
        }
        Ok(cert)
    }

    /// Resolves `cert` into its payload.
    ///
    /// The cache tier is consulted first, then the primary backend for the cert version, then the
    /// fallback tier. Every returned payload is verified against the cert. Reads of encoded payloads
    /// bypass secondary storage.
    pub async fn get(&self, cert: &VersionedCert, opts: GetOpts) -> Result<Vec<u8>, StoreError> {
        let result = self.get_inner(cert, opts).await;
        METRICS.manager_requests[&(Method::Get, Outcome::of(&result))].inc();
        result
    }

    async fn get_inner(&self, cert: &VersionedCert, opts: GetOpts) -> Result<Vec<u8>, StoreError> {
        let verifier = self.verifier(cert, opts).await?;
        let use_secondary = !opts.return_encoded_payload;
        let mut failures = vec![];

        if use_secondary && self.secondary.caching_enabled() {
            tracing::debug!(cert_version = %cert.version, "Retrieving payload from cache backends");
            match self
                .secondary
                .multi_source_read(&cert.serialized_cert, false, &verifier)
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(err) => {
                    tracing::warn!("Failed reading payload from cache backends: {err}");
                    failures.push(anyhow::Error::from(err).context("cache tier"));
                }
            }
        }

        let primary_err = match self.get_from_primary(cert, opts, &verifier).await {
            Ok(payload) => {
                if use_secondary && self.secondary.write_on_cache_miss_enabled() {
                    self.secondary
                        .replicate(&cert.serialized_cert, &payload)
                        .await?;
                }
                return Ok(payload);
            }
            Err(err) => err,
        };

        if !(use_secondary && self.secondary.fallback_enabled()) {
            if failures.is_empty() {
                return Err(StoreError::Primary(primary_err));
            }
            failures.push(anyhow::Error::from(primary_err).context("primary backend"));
            return Err(StoreError::Exhausted(AggregateError(failures)));
        }
        tracing::warn!("Failed reading payload from primary backend: {primary_err}");
        failures.push(anyhow::Error::from(primary_err).context("primary backend"));

        match self
            .secondary
            .multi_source_read(&cert.serialized_cert, true, &verifier)
            .await
        {
            Ok(payload) => Ok(payload),
            Err(err) => {
                tracing::error!("Failed reading payload from fallback backends: {err}");
                failures.push(anyhow::Error::from(err).context("fallback tier"));
                Err(StoreError::Exhausted(AggregateError(failures)))
            }
        }
    }

    /// Resolves the primary backend for the cert version and verifies V2 certs up front,
    /// so that no data is looked up for an invalid cert.
    async fn verifier(
        &self,
        cert: &VersionedCert,
        opts: GetOpts,
    ) -> Result<CertVerifier<'_>, StoreError> {
        match cert.version {
            VersionByte::V0 => {
                let store = self
                    .v1
                    .as_deref()
                    .ok_or(StoreError::BackendNotInitialized(cert.version))?;
                if opts.return_encoded_payload {
                    return Err(StoreError::UnsupportedEncodedPayload(cert.version));
                }
                Ok(CertVerifier::V1(store))
            }
            VersionByte::V1 | VersionByte::V2 => {
                let store = self
                    .v2
                    .as_deref()
                    .ok_or(StoreError::BackendNotInitialized(cert.version))?;
                store
                    .verify_cert(cert, opts.l1_inclusion_block_number)
                    .await
                    .map_err(StoreError::CertVerification)?;
                Ok(CertVerifier::V2 {
                    store,
                    version: cert.version,
                    l1_inclusion_block_number: opts.l1_inclusion_block_number,
                })
            }
        }
    }

    async fn get_from_primary(
        &self,
        cert: &VersionedCert,
        opts: GetOpts,
        verifier: &CertVerifier<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        match verifier {
            CertVerifier::V1(store) => {
                tracing::debug!("Reading payload from EigenDA V1 backend");
                let payload = store.get(&cert.serialized_cert).await?;
                store
                    .verify(&cert.serialized_cert, &payload)
                    .await
                    .map_err(|err| BackendError {
                        error: err.error.context("payload failed verification against cert"),
                        is_retriable: false,
                    })?;
                Ok(payload)
            }
            CertVerifier::V2 { store, .. } => {
                tracing::debug!(
                    return_encoded_payload = opts.return_encoded_payload,
                    "Reading payload from EigenDA V2 backend"
                );
                // The cert was verified when the verifier was created.
                store.get(cert, opts.return_encoded_payload).await
            }
        }
    }
}
