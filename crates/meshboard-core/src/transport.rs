// ── Transport seam ──
//
// The scheduler drives the network through this trait, never through a
// concrete HTTP client. `meshboard-api`'s `ApiClient` is the production
// implementation; tests substitute scripted fakes.

use std::future::Future;

use meshboard_api::{ApiClient, Error as ApiError, HttpMethod};
use serde_json::Value;

/// Capability to perform one HTTP request and decode its JSON body.
///
/// Implementations must not retry internally — the scheduler owns
/// failure semantics.
pub trait Transport: Send + Sync {
    fn perform(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

impl Transport for ApiClient {
    fn perform(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send {
        self.request(method, path, body)
    }
}
