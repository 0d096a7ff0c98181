use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for outbound requests. Wrappers such as
/// [`BearerAuth`](super::auth::BearerAuth) decorate another client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
