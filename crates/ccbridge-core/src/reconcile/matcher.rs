//! Candidate selection and match evaluation.

use serde::{Deserialize, Serialize};

use super::diff::{compare_associations, compare_scalars, AssociationPair, Difference};
use super::score::{classify, match_percentage, MatchStatus, NOT_FOUND_SCORE};
use crate::model::{EntityType, SourceEntity, TargetEntity};

/// Result of reconciling one source entity against the target set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub source_id: String,
    pub source_name: String,
    pub matched_target_entity: Option<TargetEntity>,
    pub differences: Vec<Difference>,
    pub match_percentage: u8,
    pub status: MatchStatus,
}

impl MatchResult {
    /// Result for a source entity with no matching target.
    pub fn not_found(source: &SourceEntity) -> Self {
        Self {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            matched_target_entity: None,
            differences: vec![Difference::not_found()],
            match_percentage: NOT_FOUND_SCORE,
            status: MatchStatus::NotFound,
        }
    }

    /// Whether a target counterpart exists.
    pub fn is_matched(&self) -> bool {
        self.status != MatchStatus::NotFound
    }
}

/// Correlates source entities with target entities without a shared key.
pub struct Matcher;

impl Matcher {
    /// Pick the target entity a source entity corresponds to.
    ///
    /// Users match on email first; every type then falls back to name. Both
    /// comparisons are exact and case-insensitive. Candidates of another
    /// entity type are ignored.
    pub fn find_candidate<'a>(
        source: &SourceEntity,
        candidates: &'a [TargetEntity],
    ) -> Option<&'a TargetEntity> {
        let same_type = move || {
            candidates
                .iter()
                .filter(move |c| c.entity_type == source.entity_type)
        };

        if source.entity_type == EntityType::User {
            if let Some(email) = source.email.as_deref().filter(|e| !e.is_empty()) {
                let email = email.to_lowercase();
                let by_email = same_type().find(|c| {
                    c.email
                        .as_deref()
                        .is_some_and(|candidate| candidate.to_lowercase() == email)
                });
                if by_email.is_some() {
                    return by_email;
                }
            }
        }

        let name = source.name.to_lowercase();
        same_type().find(|c| c.name.to_lowercase() == name)
    }

    /// Evaluate a source entity against an already selected candidate.
    pub fn evaluate(
        source: &SourceEntity,
        candidate: Option<&TargetEntity>,
        associations: Option<&AssociationPair>,
    ) -> MatchResult {
        let Some(target) = candidate else {
            return MatchResult::not_found(source);
        };

        let mut differences = compare_scalars(source, target);
        if let Some(pair) = associations {
            differences.extend(compare_associations(pair));
        }

        MatchResult {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            matched_target_entity: Some(target.clone()),
            match_percentage: match_percentage(differences.len()),
            status: classify(&differences),
            differences,
        }
    }

    /// Select a candidate and evaluate scalars only.
    pub fn compare(source: &SourceEntity, candidates: &[TargetEntity]) -> MatchResult {
        Self::evaluate(source, Self::find_candidate(source, candidates), None)
    }
}
