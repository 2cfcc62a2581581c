/// Backend connection settings.
pub mod config;
/// Backend client errors.
pub mod error;
/// reqwest-backed [`SumulaApi`].
pub mod http;

use futures::future::BoxFuture;

use crate::{
    dto::{
        finalize::FinalizeRequest,
        listing::{ActiveSumulasResponse, AddRefereeRequest},
    },
    state::sumula::SumulaKind,
};

use self::error::ApiResult;

/// Abstraction over the competition backend calls the referee client needs.
pub trait SumulaApi: Send + Sync {
    /// `GET api/sumula/ativas/`: every súmula still open in the event.
    fn list_active(&self, event_id: i64) -> BoxFuture<'static, ApiResult<ActiveSumulasResponse>>;
    /// `PUT api/sumula/add-referee/`: register the caller as referee.
    fn add_referee(
        &self,
        event_id: i64,
        request: AddRefereeRequest,
    ) -> BoxFuture<'static, ApiResult<()>>;
    /// `PUT api/sumula/{classificatoria|imortal}/`: send the final tally.
    fn finalize(
        &self,
        event_id: i64,
        kind: SumulaKind,
        request: FinalizeRequest,
    ) -> BoxFuture<'static, ApiResult<()>>;
}
