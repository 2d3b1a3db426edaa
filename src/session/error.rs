use thiserror::Error;

/// Guarded-transition violations in the session core. These are programmer
/// errors at the calling layer: a correct UI disables the triggers (e.g. the
/// edit action unless exactly one step is checked), so none of them should be
/// reachable interactively. No remote call is ever issued on this path.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("edit session does not allow {0} in its current state")]
    InvalidEditState(&'static str),

    #[error("editing requires exactly one checked step ({checked} checked)")]
    EditSelection { checked: usize },
}
