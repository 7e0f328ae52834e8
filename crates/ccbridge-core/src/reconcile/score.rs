//! Match scoring.
//!
//! One tiered policy for every entity type:
//!
//! | Differences | Score |
//! |-------------|-------|
//! | 0           | 100   |
//! | 1-2         | 90    |
//! | 3-4         | 80    |
//! | 5-6         | 70    |
//! | 7+          | 60    |
//!
//! A source entity with no matching target scores 0.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::diff::Difference;

/// Upper bound (inclusive) of each tier and its score.
const SCORE_TIERS: &[(usize, u8)] = &[(0, 100), (2, 90), (4, 80), (6, 70)];

/// Score of the last tier.
const FLOOR_SCORE: u8 = 60;

/// Score for an entity with no match.
pub const NOT_FOUND_SCORE: u8 = 0;

/// Reconciliation outcome for one source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Matched with no differences.
    Identical,
    /// Matched; every difference is a taxonomy artifact.
    Similar,
    /// Matched with real differences.
    Different,
    /// No target entity matched.
    NotFound,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Identical => write!(f, "identical"),
            MatchStatus::Similar => write!(f, "similar"),
            MatchStatus::Different => write!(f, "different"),
            MatchStatus::NotFound => write!(f, "not_found"),
        }
    }
}

/// Match percentage for a number of differences.
pub fn match_percentage(difference_count: usize) -> u8 {
    SCORE_TIERS
        .iter()
        .find(|(max, _)| difference_count <= *max)
        .map(|(_, score)| *score)
        .unwrap_or(FLOOR_SCORE)
}

/// Status of a matched pair given its differences.
pub fn classify(differences: &[Difference]) -> MatchStatus {
    if differences.is_empty() {
        MatchStatus::Identical
    } else if differences.iter().all(Difference::is_taxonomy_artifact) {
        MatchStatus::Similar
    } else {
        MatchStatus::Different
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityType, SourceEntity, TargetEntity, TargetStatus};
    use crate::reconcile::diff::compare_scalars;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(match_percentage(0), 100);
        assert_eq!(match_percentage(1), 90);
        assert_eq!(match_percentage(2), 90);
        assert_eq!(match_percentage(3), 80);
        assert_eq!(match_percentage(4), 80);
        assert_eq!(match_percentage(5), 70);
        assert_eq!(match_percentage(6), 70);
        assert_eq!(match_percentage(7), 60);
        assert_eq!(match_percentage(42), 60);
    }

    #[test]
    fn test_score_is_monotonic() {
        for d1 in 0..20 {
            for d2 in d1 + 1..21 {
                assert!(
                    match_percentage(d1) >= match_percentage(d2),
                    "score({d1}) < score({d2})"
                );
            }
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&[]), MatchStatus::Identical);

        let source = SourceEntity::new("q1", EntityType::Queue, "Sales").with_state("frozen");
        let target = TargetEntity {
            id: "t1".into(),
            entity_type: EntityType::Queue,
            name: "Sales".into(),
            email: None,
            description: None,
            status: TargetStatus::Active,
            source_type: None,
        };
        let artifacts_only = compare_scalars(&source, &target);
        assert_eq!(classify(&artifacts_only), MatchStatus::Similar);

        let mut renamed = target.clone();
        renamed.name = "Inside Sales".into();
        let mixed = compare_scalars(&source, &renamed);
        assert_eq!(classify(&mixed), MatchStatus::Different);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(MatchStatus::NotFound.to_string(), "not_found");
        assert_eq!(
            serde_json::to_string(&MatchStatus::Similar).unwrap(),
            "\"similar\""
        );
    }
}
