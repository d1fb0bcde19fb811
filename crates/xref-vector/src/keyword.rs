//! Keyword fallback matching.
//!
//! Used by callers when the vector index is unavailable. Matches are found
//! by case-insensitive substring search for the query's significant terms
//! and always report similarity 0.0.

use xref_core::RequirementId;

use crate::record::{MatchSource, RequirementMatch};

/// Minimum length, in characters, of a term worth matching on.
const MIN_TERM_CHARS: usize = 4;

/// Lowercased, de-duplicated words of at least four characters, in order
/// of first appearance.
pub fn significant_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() < MIN_TERM_CHARS {
            continue;
        }
        let lower = word.to_lowercase();
        if !terms.contains(&lower) {
            terms.push(lower);
        }
    }
    terms
}

/// Rank `candidates` by how many of the query's significant terms their
/// text contains, keeping at most `k`.
///
/// Candidates matching no term are dropped. Ties keep candidate order.
/// Every returned match has similarity 0.0 and [`MatchSource::Keyword`].
pub fn keyword_matches<'a, I>(query_text: &str, candidates: I, k: usize) -> Vec<RequirementMatch>
where
    I: IntoIterator<Item = (RequirementId, &'a str)>,
{
    let terms = significant_terms(query_text);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, RequirementId)> = candidates
        .into_iter()
        .filter_map(|(id, text)| {
            let lower = text.to_lowercase();
            let hits = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (hits > 0).then_some((hits, id))
        })
        .collect();
    // Stable sort keeps candidate order among equal hit counts.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(_, requirement_id)| RequirementMatch {
            requirement_id,
            similarity: 0.0,
            source: MatchSource::Keyword,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_skip_short_words_and_duplicates() {
        assert_eq!(
            significant_terms("Access to the ACCESS control log"),
            vec!["access", "control"]
        );
    }

    #[test]
    fn ranks_by_hits_and_zeroes_similarity() {
        let a = RequirementId::new();
        let b = RequirementId::new();
        let c = RequirementId::new();
        let matches = keyword_matches(
            "Access control policy",
            [
                (a, "Backup policy"),
                (b, "Access control policy review"),
                (c, "Physical perimeter"),
            ],
            10,
        );
        let ids: Vec<_> = matches.iter().map(|m| m.requirement_id).collect();
        assert_eq!(ids, vec![b, a]);
        assert!(matches
            .iter()
            .all(|m| m.similarity == 0.0 && m.source == MatchSource::Keyword));
    }

    #[test]
    fn no_terms_no_matches() {
        let a = RequirementId::new();
        assert!(keyword_matches("a b c", [(a, "a b c")], 10).is_empty());
    }
}
