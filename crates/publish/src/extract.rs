//! Bundle extraction for message enrichment

use contracts::{Artifact, Bundle, Collect, ContractError, Reduxer};

use crate::context::PublishContext;

/// Resolve the bundle entry of the first record's source.
///
/// Fails with [`ContractError::InvalidReduxer`] when the context carries no
/// bundle and with [`ContractError::ReduxerNotFound`] when the bundle has no
/// entry for that source, so callers can fall back to an unenriched message.
pub fn extract<'a>(
    ctx: &'a PublishContext,
    cols: &[Collect],
) -> Result<(&'a Reduxer, &'a Artifact), ContractError> {
    let (reduxer, bundle) = extract_bundle(ctx, cols)?;
    Ok((reduxer, &bundle.artifact))
}

/// Same lookup as [`extract`], returning the whole bundle (artifact and article)
pub fn extract_bundle<'a>(
    ctx: &'a PublishContext,
    cols: &[Collect],
) -> Result<(&'a Reduxer, &'a Bundle), ContractError> {
    let first = cols
        .first()
        .ok_or_else(|| ContractError::empty_collects("reduxer"))?;
    let reduxer = ctx.reduxer().ok_or(ContractError::InvalidReduxer)?;
    let bundle = reduxer
        .load(&first.source)
        .ok_or_else(|| ContractError::ReduxerNotFound {
            source_url: first.source.clone(),
        })?;
    Ok((reduxer, bundle))
}
