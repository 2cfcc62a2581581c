use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;

use crate::{
    dao::api::SumulaApi,
    dto::{
        finalize::FinalizeRequest,
        listing::{ActiveSumulasResponse, AddRefereeRequest},
    },
    state::sumula::SumulaKind,
};

use super::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
};

const ACTIVE_SUMULAS_PATH: &str = "api/sumula/ativas/";
const ADD_REFEREE_PATH: &str = "api/sumula/add-referee/";

/// [`SumulaApi`] implementation speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpSumulaApi {
    client: Client,
    base_url: Arc<str>,
    access_token: Option<Arc<str>>,
}

impl HttpSumulaApi {
    /// Build a client for the backend described by `config`.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            access_token: config.access_token.map(Arc::<str>::from),
        })
    }

    fn request(&self, method: Method, path: &str, event_id: i64) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .query(&[("event_id", event_id)]);
        if let Some(ref token) = self.access_token {
            builder.bearer_auth(token.as_ref())
        } else {
            builder
        }
    }

    async fn put_json<T>(&self, path: &str, event_id: i64, body: &T) -> ApiResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, path, event_id)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            other => Err(ApiError::RequestStatus {
                path: path.to_string(),
                status: other,
            }),
        }
    }
}

impl SumulaApi for HttpSumulaApi {
    fn list_active(&self, event_id: i64) -> BoxFuture<'static, ApiResult<ActiveSumulasResponse>> {
        let api = self.clone();
        Box::pin(async move {
            let response = api
                .request(Method::GET, ACTIVE_SUMULAS_PATH, event_id)
                .send()
                .await
                .map_err(|source| ApiError::RequestSend {
                    path: ACTIVE_SUMULAS_PATH.to_string(),
                    source,
                })?;

            if response.status() != StatusCode::OK {
                return Err(ApiError::RequestStatus {
                    path: ACTIVE_SUMULAS_PATH.to_string(),
                    status: response.status(),
                });
            }

            response
                .json::<ActiveSumulasResponse>()
                .await
                .map_err(|source| ApiError::DecodeResponse {
                    path: ACTIVE_SUMULAS_PATH.to_string(),
                    source,
                })
        })
    }

    fn add_referee(
        &self,
        event_id: i64,
        request: AddRefereeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let api = self.clone();
        Box::pin(async move { api.put_json(ADD_REFEREE_PATH, event_id, &request).await })
    }

    fn finalize(
        &self,
        event_id: i64,
        kind: SumulaKind,
        request: FinalizeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let api = self.clone();
        Box::pin(async move {
            let path = format!("api/sumula/{}/", kind.endpoint_segment());
            api.put_json(&path, event_id, &request).await
        })
    }
}
