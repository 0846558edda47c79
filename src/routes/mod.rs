/// Router Module Index
///
/// Routes are grouped by the gates they sit behind. Access control is applied to
/// each group as a whole in `create_router`, never per handler.

/// Routes open to anonymous callers.
pub mod public;

/// Routes behind the credential verifier.
pub mod authenticated;

/// Routes behind the credential verifier and the admin authority gate.
pub mod admin;
