//! Reconciliation of source entities against the target platform.
//!
//! Correlation is inferred at match time; there is no stored cross-system key.
//!
//! 1. [`Matcher::find_candidate`] picks a target entity (email for users,
//!    then name, case-insensitive).
//! 2. [`diff`] lists scalar and association differences.
//! 3. [`score`] turns the difference count into a 0-100 match percentage and
//!    classifies the pair.

pub mod diff;
pub mod matcher;
pub mod score;

pub use diff::{AssociationPair, Difference, DifferenceKind};
pub use matcher::{MatchResult, Matcher};
pub use score::{match_percentage, MatchStatus};
