use std::cmp::Ordering;

use serde::Serialize;

use super::{Match, Span};

/// A match that lost to an already-accepted, overlapping one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discarded {
    pub candidate: Match,
    pub overlapped_by: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FusionOutcome {
    /// Non-overlapping, ordered by start offset.
    pub accepted: Vec<Match>,
    pub discarded: Vec<Discarded>,
}

/// Earlier start first, then longer, then heavier, then earlier category,
/// then exact before flexible.
fn priority(a: &Match, b: &Match) -> Ordering {
    a.span
        .start
        .cmp(&b.span.start)
        .then_with(|| b.span.len().cmp(&a.span.len()))
        .then_with(|| b.weight.total_cmp(&a.weight))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.source.cmp(&b.source))
}

/// Greedy left-to-right sweep over both match streams. Matches are atomic:
/// one that overlaps an accepted span is dropped whole, never clipped.
#[must_use]
pub fn fuse(mut matches: Vec<Match>) -> FusionOutcome {
    matches.sort_by(priority);

    let mut outcome = FusionOutcome::default();

    for candidate in matches {
        // Accepted spans are disjoint and sorted, so only the last can overlap.
        if let Some(last) = outcome.accepted.last() {
            if candidate.span.start < last.span.end {
                tracing::trace!(
                    text = %candidate.text,
                    span = %candidate.span,
                    winner = %last.span,
                    source = %candidate.source,
                    "Discarding overlapped match"
                );
                let overlapped_by = last.span;
                outcome.discarded.push(Discarded {
                    candidate,
                    overlapped_by,
                });
                continue;
            }
        }
        outcome.accepted.push(candidate);
    }

    outcome
}
