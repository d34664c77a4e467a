//! Deprecation and correction: the two editorial operations an operator
//! or an agent's own correction-detection path can apply to existing
//! memories.

use crate::error::{Error, Result};
use crate::store::Store;

/// Mark `old_id` deprecated in favour of `new_id`. Returns
/// [`Error::NotFound`] if either `old_id` or `new_id` does not exist; no
/// rows are mutated in that case. `superseded_by` must reference an
/// existing memory, active or deprecated.
pub async fn deprecate(store: &dyn Store, old_id: &str, new_id: &str) -> Result<()> {
    if store.get_memory(old_id).await?.is_none() {
        return Err(Error::NotFound(old_id.to_string()));
    }
    if store.get_memory(new_id).await?.is_none() {
        return Err(Error::NotFound(new_id.to_string()));
    }
    store.deprecate(old_id, new_id).await
}

/// Record that `correction_id` corrects `corrected_id`. The correction
/// stays active; the corrected memory is left untouched (retrieval's
/// scoring and the operator's own judgement decide which one to surface).
/// Returns [`Error::NotFound`] if either id does not exist; `corrects`
/// must reference an existing memory, active or deprecated.
pub async fn mark_correction(
    store: &dyn Store,
    correction_id: &str,
    corrected_id: &str,
) -> Result<()> {
    if store.get_memory(correction_id).await?.is_none() {
        return Err(Error::NotFound(correction_id.to_string()));
    }
    if store.get_memory(corrected_id).await?.is_none() {
        return Err(Error::NotFound(corrected_id.to_string()));
    }
    store.mark_correction(correction_id, corrected_id).await
}
