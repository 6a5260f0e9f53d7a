//! File write checks: target resolution, sensitive-file guard, and
//! auto-approval for writes inside trusted roots.

pub mod containment;
pub mod guard;
pub mod writes;

pub use containment::{ResolveError, is_inside, lexical_normalize, relative_to, resolve_target};
pub use guard::{guard_write, is_sensitive};
pub use writes::{PathDecision, RootKind, auto_approve, locate};
