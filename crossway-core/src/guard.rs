//! Mutual-exclusion guard for signal aspects.
//!
//! Runs before every phase is committed. Under a correctly built table it
//! never fails; a failure means a logic or configuration fault and the
//! caller must stop advancing.

use crate::error::SignalError;
use crate::status::StatusSnapshot;

/// Verifies that only the active approach shows a permissive aspect.
///
/// # Errors
///
/// Returns [`SignalError::ConflictDetected`] listing every inactive
/// approach that is green or yellow.
pub fn check(snapshot: &StatusSnapshot) -> Result<(), SignalError> {
    let conflicting = snapshot.permissive_inactive();
    if conflicting.is_empty() {
        Ok(())
    } else {
        Err(SignalError::ConflictDetected {
            active: snapshot.active_direction,
            conflicting,
        })
    }
}
