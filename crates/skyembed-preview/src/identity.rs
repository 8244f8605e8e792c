//! Handle → DID resolution and DID document lookup.
//!
//! Handles are resolved through an ordered chain of [`HandleStrategy`]
//! implementations (AppView, DNS TXT, HTTPS well-known). The first strategy
//! that yields a `did:` wins; if all of them fail the input is used as-is,
//! so resolution never fails a request on its own.
//!
//! DID documents come from the PLC directory (`did:plc`) or the host's
//! `/.well-known/did.json` (`did:web`) and provide the PDS endpoint used for
//! blob URLs and the account's primary handle.

use std::time::Duration;

use futures::future::BoxFuture;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use serde::Deserialize;
use serde_json::Value;

use crate::api::AppView;
use crate::config::Config;

/// Max body size of a well-known `atproto-did` response.
const WELL_KNOWN_LIMIT: usize = 32;

/// Max body size of a DID document.
const DID_DOCUMENT_LIMIT: usize = 10 * 1024 * 1024;

const PDS_SERVICE_ID: &str = "#atproto_pds";
const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// One way of turning a handle into a DID.
pub trait HandleStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to resolve `handle`; `None` means "try the next strategy".
    fn attempt<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Option<String>>;
}

/// `com.atproto.identity.resolveHandle` on the AppView.
pub struct DirectoryStrategy {
    appview: AppView,
}

impl DirectoryStrategy {
    pub fn new(appview: AppView) -> Self {
        Self { appview }
    }
}

impl HandleStrategy for DirectoryStrategy {
    fn name(&self) -> &'static str {
        "appview"
    }

    fn attempt<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            match self.appview.resolve_handle(handle).await {
                Ok(did) if did.starts_with("did:") => Some(did),
                Ok(other) => {
                    tracing::debug!(handle, result = %other, "resolveHandle returned a non-DID");
                    None
                }
                Err(err) => {
                    tracing::debug!(handle, error = %err, "resolveHandle failed");
                    None
                }
            }
        })
    }
}

/// TXT record at `_atproto.<handle>`.
pub struct DnsTxtStrategy {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsTxtStrategy {
    /// Build a resolver from the system configuration, falling back to the
    /// library defaults when it cannot be read.
    pub fn from_system_conf(timeout: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "no system DNS configuration, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver, timeout }
    }
}

impl HandleStrategy for DnsTxtStrategy {
    fn name(&self) -> &'static str {
        "dns"
    }

    fn attempt<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let name = format!("_atproto.{handle}.");
            let lookup = match tokio::time::timeout(self.timeout, self.resolver.txt_lookup(name)).await {
                Ok(Ok(lookup)) => lookup,
                Ok(Err(err)) => {
                    tracing::debug!(handle, error = %err, "TXT lookup failed");
                    return None;
                }
                Err(_) => {
                    tracing::debug!(handle, "TXT lookup timed out");
                    return None;
                }
            };

            let records: Vec<String> = lookup.iter().map(|txt| txt.to_string()).collect();
            did_from_txt(&records)
        })
    }
}

/// `https://<handle>/.well-known/atproto-did`.
pub struct WellKnownStrategy {
    http: reqwest::Client,
}

impl WellKnownStrategy {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl HandleStrategy for WellKnownStrategy {
    fn name(&self) -> &'static str {
        "well-known"
    }

    fn attempt<'a>(&'a self, handle: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let url = well_known_url(handle)?;
            let resp = match self.http.get(url).send().await {
                Ok(resp) if resp.status().is_success() => resp,
                Ok(resp) => {
                    tracing::debug!(handle, status = %resp.status(), "well-known returned error status");
                    return None;
                }
                Err(err) => {
                    tracing::debug!(handle, error = %err, "well-known request failed");
                    return None;
                }
            };

            match read_capped(resp, WELL_KNOWN_LIMIT).await {
                Ok(body) => did_from_well_known(&body),
                Err(err) => {
                    tracing::debug!(handle, error = %err, "well-known body read failed");
                    None
                }
            }
        })
    }
}

/// Result of resolving an identifier for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolution {
    pub canonical_id: String,
    pub service_endpoint: String,
    /// Primary handle from the DID document, when one was found.
    pub handle: Option<String>,
}

/// A DID document, reduced to the fields the service reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DidDocument {
    pub also_known_as: Vec<String>,
    pub service: Vec<DidService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DidService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: Value,
}

impl DidDocument {
    /// The `#atproto_pds` service endpoint, if declared.
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.id.ends_with(PDS_SERVICE_ID) && s.service_type == PDS_SERVICE_TYPE)
            .and_then(|s| s.service_endpoint.as_str())
            .filter(|endpoint| !endpoint.is_empty())
    }

    /// The primary handle (`alsoKnownAs[0]` without `at://`).
    pub fn handle(&self) -> Option<&str> {
        let first = self.also_known_as.first()?;
        let handle = first.strip_prefix("at://").unwrap_or(first);
        (!handle.is_empty()).then_some(handle)
    }
}

/// Resolves handles and DID documents.
pub struct IdentityResolver {
    strategies: Vec<Box<dyn HandleStrategy>>,
    http: reqwest::Client,
    plc_url: String,
    default_pds: String,
}

impl IdentityResolver {
    pub fn new(
        strategies: Vec<Box<dyn HandleStrategy>>,
        http: reqwest::Client,
        plc_url: impl Into<String>,
        default_pds: impl Into<String>,
    ) -> Self {
        Self {
            strategies,
            http,
            plc_url: plc_url.into(),
            default_pds: default_pds.into(),
        }
    }

    /// The standard chain: AppView, then DNS, then well-known.
    pub fn from_config(config: &Config, http: reqwest::Client, appview: AppView) -> Self {
        let strategies: Vec<Box<dyn HandleStrategy>> = vec![
            Box::new(DirectoryStrategy::new(appview)),
            Box::new(DnsTxtStrategy::from_system_conf(config.http_timeout)),
            Box::new(WellKnownStrategy::new(http.clone())),
        ];
        Self::new(strategies, http, &config.plc_url, &config.default_pds)
    }

    /// Resolve an identifier to a DID, its PDS endpoint and primary handle.
    /// The DID document is fetched once for both.
    pub async fn resolve(&self, input: &str) -> IdentityResolution {
        let canonical_id = self.resolve_did(input).await;
        let document = self.fetch_did_document(&canonical_id).await;
        IdentityResolution {
            service_endpoint: self.endpoint_or_default(document.as_ref()),
            handle: document
                .as_ref()
                .and_then(DidDocument::handle)
                .map(str::to_string),
            canonical_id,
        }
    }

    /// Resolve a handle to a DID. DIDs pass through without network calls;
    /// an unresolvable handle is returned unchanged.
    pub async fn resolve_did(&self, input: &str) -> String {
        if input.starts_with("did:") {
            return input.to_string();
        }

        for strategy in &self.strategies {
            if let Some(did) = strategy.attempt(input).await {
                tracing::debug!(handle = input, did = %did, strategy = strategy.name(), "handle resolved");
                return did;
            }
            tracing::debug!(handle = input, strategy = strategy.name(), "strategy did not resolve handle");
        }

        tracing::debug!(handle = input, "handle unresolved, using input as identifier");
        input.to_string()
    }

    /// PDS endpoint for a DID, or the default PDS.
    pub async fn resolve_service_endpoint(&self, did: &str) -> String {
        let document = self.fetch_did_document(did).await;
        self.endpoint_or_default(document.as_ref())
    }

    fn endpoint_or_default(&self, document: Option<&DidDocument>) -> String {
        document
            .and_then(DidDocument::pds_endpoint)
            .map(|endpoint| endpoint.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.default_pds.clone())
    }

    /// Fetch a DID document. Any failure is logged and yields `None`.
    pub async fn fetch_did_document(&self, did: &str) -> Option<DidDocument> {
        let url = did_document_url(&self.plc_url, did)?;

        let resp = match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!(did, status = %resp.status(), "DID document request returned error status");
                return None;
            }
            Err(err) => {
                tracing::debug!(did, error = %err, "DID document request failed");
                return None;
            }
        };

        let body = match read_capped(resp, DID_DOCUMENT_LIMIT).await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(did, error = %err, "DID document read failed");
                return None;
            }
        };

        match serde_json::from_slice::<DidDocument>(&body) {
            Ok(doc) => Some(doc),
            Err(err) => {
                tracing::debug!(did, error = %err, "DID document did not decode");
                None
            }
        }
    }
}

/// Where a DID's document lives. Only `did:plc` and `did:web` are supported.
pub fn did_document_url(plc_url: &str, did: &str) -> Option<String> {
    if did.starts_with("did:plc:") {
        return Some(format!("{}/{did}", plc_url.trim_end_matches('/')));
    }

    let host = did.strip_prefix("did:web:")?;
    if host.is_empty() {
        return None;
    }
    let host = host.replace("%3A", ":");
    Some(format!("https://{host}/.well-known/did.json"))
}

fn well_known_url(handle: &str) -> Option<url::Url> {
    let url = url::Url::parse(&format!("https://{handle}/.well-known/atproto-did")).ok()?;
    let host_matches = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(handle));
    host_matches.then_some(url)
}

/// First `did=` TXT value.
fn did_from_txt(records: &[String]) -> Option<String> {
    records
        .iter()
        .find_map(|record| record.strip_prefix("did="))
        .map(str::to_string)
}

fn did_from_well_known(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?.trim();
    text.starts_with("did:").then(|| text.to_string())
}

/// Read at most `limit` bytes of a response body.
async fn read_capped(mut resp: reqwest::Response, limit: usize) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= limit {
            break;
        }
    }
    Ok(body)
}
