use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use da_gateway_types::{
    commitment::{decode_commitment, encode_commitment},
    EigenDABackend, GetOpts,
};
use serde::{Deserialize, Serialize};

use crate::{errors::ApiError, metrics::METRICS, RestApi};

type ApiResult<T> = Result<T, ApiError>;

/// Decodes a hex path segment; the `0x` prefix is optional.
fn parse_hex(raw: &str) -> ApiResult<Vec<u8>> {
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw).map_err(ApiError::InvalidHex)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetQuery {
    #[serde(default)]
    l1_inclusion_block_number: u64,
    #[serde(default)]
    return_encoded_payload: bool,
}

impl From<GetQuery> for GetOpts {
    fn from(query: GetQuery) -> Self {
        Self {
            l1_inclusion_block_number: query.l1_inclusion_block_number,
            return_encoded_payload: query.return_encoded_payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct DispersalBackendBody {
    pub backend: EigenDABackend,
}

impl RestApi {
    /// Disperses the request body and responds with the raw standard commitment.
    #[tracing::instrument(skip_all, fields(len = body.len()))]
    pub(crate) async fn put_payload(
        State(self_): State<Arc<Self>>,
        body: Bytes,
    ) -> ApiResult<Vec<u8>> {
        let method_latency = METRICS.call[&"put"].start();
        let cert = self_.manager.put(&body).await?;
        tracing::debug!(cert_version = %cert.version, "Dispersed payload");
        method_latency.observe();
        Ok(encode_commitment(&cert))
    }

    #[tracing::instrument(skip(self_))]
    pub(crate) async fn get_payload(
        State(self_): State<Arc<Self>>,
        Path(commitment): Path<String>,
        Query(query): Query<GetQuery>,
    ) -> ApiResult<Vec<u8>> {
        let method_latency = METRICS.call[&"get"].start();
        let cert = decode_commitment(&parse_hex(&commitment)?)?;
        let payload = self_.manager.get(&cert, query.into()).await?;
        method_latency.observe();
        Ok(payload)
    }

    #[tracing::instrument(skip(self_, body), fields(len = body.len()))]
    pub(crate) async fn put_preimage(
        State(self_): State<Arc<Self>>,
        Path(key): Path<String>,
        body: Bytes,
    ) -> ApiResult<StatusCode> {
        let method_latency = METRICS.call[&"put_keccak"].start();
        let key = parse_hex(&key)?;
        self_.keccak_manager.put(&key, &body).await?;
        method_latency.observe();
        Ok(StatusCode::OK)
    }

    #[tracing::instrument(skip(self_))]
    pub(crate) async fn get_preimage(
        State(self_): State<Arc<Self>>,
        Path(key): Path<String>,
    ) -> ApiResult<Vec<u8>> {
        let method_latency = METRICS.call[&"get_keccak"].start();
        let key = parse_hex(&key)?;
        let preimage = self_.keccak_manager.get(&key).await?;
        method_latency.observe();
        Ok(preimage)
    }

    pub(crate) async fn get_dispersal_backend(
        State(self_): State<Arc<Self>>,
    ) -> Json<DispersalBackendBody> {
        Json(DispersalBackendBody {
            backend: self_.manager.get_dispersal_backend(),
        })
    }

    #[tracing::instrument(skip(self_))]
    pub(crate) async fn set_dispersal_backend(
        State(self_): State<Arc<Self>>,
        Json(body): Json<DispersalBackendBody>,
    ) -> Json<DispersalBackendBody> {
        self_.manager.set_dispersal_backend(body.backend);
        Json(DispersalBackendBody {
            backend: self_.manager.get_dispersal_backend(),
        })
    }
}
