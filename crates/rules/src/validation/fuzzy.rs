//! "Did you mean" helpers for operator tokens and action types.

use crate::model::Operator;

/// Spellings people reach for instead of the accepted operator tokens.
const OPERATOR_ALIASES: &[(&str, &str)] = &[
    ("gt", ">"),
    ("gte", ">="),
    ("ge", ">="),
    ("=>", ">="),
    ("lt", "<"),
    ("lte", "<="),
    ("le", "<="),
    ("=<", "<="),
    ("=", "=="),
    ("eq", "=="),
    ("neq", "!="),
    ("ne", "!="),
    ("<>", "!="),
    ("not in", "not_in"),
    ("notin", "not_in"),
    ("not-in", "not_in"),
];

/// Suggest the operator token meant by an unknown `input`.
pub(super) fn suggest_operator(input: &str) -> Option<&'static str> {
    let needle = input.trim().to_lowercase();
    if let Some((_, token)) = OPERATOR_ALIASES.iter().find(|(alias, _)| *alias == needle) {
        return Some(*token);
    }
    // Symbolic tokens are too short for edit distance to mean anything;
    // only the word operators are fuzzy-matched.
    let words: Vec<&'static str> = Operator::TOKENS
        .iter()
        .copied()
        .filter(|token| token.chars().all(|c| c.is_ascii_alphabetic() || c == '_'))
        .collect();
    closest(&needle, &words)
}

/// Closest candidate by edit distance, if within half the longer length.
pub(super) fn closest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_lowercase();
    let (best, dist) = candidates
        .iter()
        .map(|&c| (c, levenshtein(&input, &c.to_lowercase())))
        .min_by_key(|&(_, d)| d)?;

    let limit = input.chars().count().max(best.chars().count()) / 2;
    (dist <= limit).then_some(best)
}

/// Levenshtein edit distance over chars.
pub(super) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitute = diag + usize::from(ca != *cb);
            row[j + 1] = substitute.min(above + 1).min(row[j] + 1);
            diag = above;
        }
    }

    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::KNOWN_ACTION_TYPES;

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("fire_clip", "fire_clip"), 0);
    }

    #[test]
    fn operator_aliases() {
        assert_eq!(suggest_operator("GTE"), Some(">="));
        assert_eq!(suggest_operator("=>"), Some(">="));
        assert_eq!(suggest_operator("not in"), Some("not_in"));
        assert_eq!(suggest_operator("nto_in"), Some("not_in"));
        assert_eq!(suggest_operator("between"), None);
    }

    #[test]
    fn action_type_typos() {
        assert_eq!(closest("fire_clp", KNOWN_ACTION_TYPES), Some("fire_clip"));
        assert_eq!(closest("set_param", KNOWN_ACTION_TYPES), Some("set_parameter"));
        assert_eq!(closest("send_midi_note", KNOWN_ACTION_TYPES), None);
    }
}
