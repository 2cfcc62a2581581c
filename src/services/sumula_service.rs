use tracing::info;

use crate::{
    dao::{
        api::SumulaApi,
        local_store::{CURRENT_SUMULA_SLOT, LocalStore},
    },
    dto::{listing::AddRefereeRequest, sumula::SumulaDto},
    error::{ServiceError, SessionError},
    state::SumulaSession,
};

/// Active súmulas of the event, qualifying ones first.
pub async fn list_active_sumulas(
    api: &dyn SumulaApi,
    event_id: i64,
) -> Result<Vec<SumulaDto>, ServiceError> {
    let response = api.list_active(event_id).await?;
    let sumulas = response.into_sumulas();
    info!(event_id, count = sumulas.len(), "active súmulas listed");
    Ok(sumulas)
}

/// Refuse to replace a session that has not reached `Done` or `Left`.
///
/// Claiming overwrites the local slot, so callers check this before
/// [`claim_by_id`] or [`claim_sumula`].
pub fn ensure_no_active_session(session: Option<&SumulaSession>) -> Result<(), ServiceError> {
    match session {
        Some(session) if !session.phase().is_terminal() => {
            Err(ServiceError::SessionActive(session.sumula().id))
        }
        _ => Ok(()),
    }
}

/// Register the caller as referee of `sumula` and keep it in the local slot.
///
/// The slot is cleared first, so a failed claim never leaves a stale súmula
/// behind.
pub async fn claim_sumula(
    api: &dyn SumulaApi,
    store: &dyn LocalStore,
    event_id: i64,
    sumula: &SumulaDto,
) -> Result<(), ServiceError> {
    store.remove(CURRENT_SUMULA_SLOT)?;

    api.add_referee(event_id, AddRefereeRequest::from(sumula))
        .await?;

    let encoded = serde_json::to_string(sumula).map_err(|source| ServiceError::Encode {
        id: sumula.id,
        source,
    })?;
    store.set(CURRENT_SUMULA_SLOT, &encoded)?;

    info!(
        sumula_id = sumula.id,
        is_imortal = sumula.is_imortal,
        "súmula claimed"
    );
    Ok(())
}

/// Look `sumula_id` up among the active súmulas and claim it.
pub async fn claim_by_id(
    api: &dyn SumulaApi,
    store: &dyn LocalStore,
    event_id: i64,
    sumula_id: i64,
) -> Result<SumulaDto, ServiceError> {
    let sumula = list_active_sumulas(api, event_id)
        .await?
        .into_iter()
        .find(|sumula| sumula.id == sumula_id)
        .ok_or_else(|| ServiceError::NotFound(format!("súmula `{sumula_id}` is not active")))?;

    claim_sumula(api, store, event_id, &sumula).await?;
    Ok(sumula)
}

/// Abandon `session` without submitting and forget the claimed súmula.
pub fn leave_session(
    session: &mut SumulaSession,
    store: &dyn LocalStore,
) -> Result<(), SessionError> {
    session.leave()?;
    store.remove(CURRENT_SUMULA_SLOT)?;
    Ok(())
}
