use crate::canonical::{CanonicalEntity, EntityId};
use crate::matcher::Span;

pub const OPEN: char = '⟦';
pub const CLOSE: char = '⟧';
pub const SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    /// The source already contained a marker delimiter, so
    /// [`strip_markers`] may not reproduce it exactly.
    pub collision: bool,
}

/// Wraps every entity mention as `⟦E1|surface⟧`. Mentions must not overlap,
/// which fusion guarantees.
#[must_use]
pub fn annotate(text: &str, entities: &[CanonicalEntity]) -> Annotation {
    let collision = text.contains(OPEN) || text.contains(CLOSE);

    let mut spans: Vec<(Span, EntityId)> = entities
        .iter()
        .flat_map(|e| e.mentions.iter().map(move |m| (m.span, e.id)))
        .collect();
    spans.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(text.len() + spans.len() * 8);
    let mut copied = 0;
    for (span, id) in spans {
        out.push_str(&text[copied..span.start]);
        out.push(OPEN);
        out.push_str(&id.to_string());
        out.push(SEPARATOR);
        out.push_str(span.slice(text));
        out.push(CLOSE);
        copied = span.end;
    }
    out.push_str(&text[copied..]);

    Annotation {
        text: out,
        collision,
    }
}

/// Removes `⟦E<n>|` openers and their matching `⟧` closers. Delimiters that
/// do not form a marker are kept.
#[must_use]
pub fn strip_markers(annotated: &str) -> String {
    let mut out = String::with_capacity(annotated.len());
    let mut depth = 0usize;
    let mut rest = annotated;

    while let Some(c) = rest.chars().next() {
        if c == OPEN {
            if let Some(len) = marker_prefix_len(rest) {
                depth += 1;
                rest = &rest[len..];
                continue;
            }
        } else if c == CLOSE && depth > 0 {
            depth -= 1;
            rest = &rest[c.len_utf8()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Byte length of a `⟦E<digits>|` opener at the start of `s`.
fn marker_prefix_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix(OPEN)?.strip_prefix('E')?;
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !body[digits..].starts_with(SEPARATOR) {
        return None;
    }
    Some(OPEN.len_utf8() + 1 + digits + SEPARATOR.len_utf8())
}
