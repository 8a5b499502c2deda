//! Lookup shortcuts for handlers

use crate::error::{ApiError, ApiResult};
use crate::persistence::{Manager, Model};

/// Fetch `pk` or fail with a 404.
pub fn get_object_or_404<G>(manager: &G, pk: i64) -> ApiResult<G::Model>
where
    G: Manager + ?Sized,
{
    manager.get(pk)?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "{} with id = {} was not found",
            <G::Model as Model>::NAME,
            pk
        ))
    })
}

/// Fetch `pk`, treating a missing row as `None`.
pub fn get_object_or_none<G>(manager: &G, pk: i64) -> ApiResult<Option<G::Model>>
where
    G: Manager + ?Sized,
{
    Ok(manager.get(pk)?)
}
