use crate::path_utils::KEY_SEPARATOR;
use crate::types::RankedMatch;
use std::path::Path;
use tracing::Level;

/// Targets further than this from the query are not meaningful fuzzy matches.
pub const MAX_FUZZY_DISTANCE: u32 = 10;

pub const DEFAULT_RANK_LIMIT: usize = 10;

/// Case-insensitive, order preserving subsequence distance.
///
/// Every character of `query` must appear in `target` in order. The distance is
/// the number of target characters skipped to embed the query, so an exact
/// case-insensitive match scores 0 and inserting unmatched characters never
/// lowers the score. Returns `None` when the query is not a subsequence.
pub fn subsequence_distance(query: &str, target: &str) -> Option<u32> {
    let mut target_chars = target.chars().flat_map(char::to_lowercase);
    let mut skipped = 0u32;

    for wanted in query.chars().flat_map(char::to_lowercase) {
        loop {
            let candidate = target_chars.next()?;
            if candidate == wanted {
                break;
            }
            skipped = skipped.saturating_add(1);
        }
    }

    let trailing = target_chars.count() as u32;
    Some(skipped.saturating_add(trailing))
}

/// Best distance of `candidate` against `query`, looking at the whole relative path
/// and at each of its components.
fn best_distance(query: &str, candidate: &str) -> Option<u32> {
    std::iter::once(candidate)
        .chain(candidate.split(KEY_SEPARATOR))
        .filter_map(|target| subsequence_distance(query, target))
        .filter(|distance| *distance <= MAX_FUZZY_DISTANCE)
        .min()
}

/// Fuzzy rank `candidates` (relative paths) against `query`.
///
/// Returns at most `limit` matches with absolute targets, ordered by distance and
/// then lexicographically by target. Candidates with no target within
/// [`MAX_FUZZY_DISTANCE`] are dropped.
#[tracing::instrument(skip(candidates), level = Level::DEBUG)]
pub fn rank<'a, I>(query: &str, candidates: I, root: &Path, limit: usize) -> Vec<RankedMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    if limit == 0 {
        return vec![];
    }

    let mut results: Vec<RankedMatch> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = best_distance(query, candidate)?;
            Some(RankedMatch {
                target: root.join(candidate).to_string_lossy().into_owned(),
                distance,
            })
        })
        .collect();

    let total_matched = results.len();
    // partition first when only a small head of a large set is needed
    if total_matched > limit.saturating_mul(2) {
        results.select_nth_unstable(limit - 1);
        results.truncate(limit);
    }

    glidesort::sort_by(results.as_mut_slice(), |a, b| a.cmp(b));
    results.truncate(limit);

    tracing::debug!(total_matched, returned = results.len(), "Fuzzy rank completed");
    results
}
