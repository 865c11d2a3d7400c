//! Lexical similarity primitives on a 0-100 scale.
//!
//! All scorers here compare strings as given; callers normalize first.
//! [`wratio`] is the weighted composite used for name matching: it takes
//! the best of a plain Indel ratio, a partial (sliding window) ratio and
//! token-order-insensitive ratios, scaled down when the comparison had to
//! ignore order or length.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;

use crate::normalize::normalize;

/// Scale applied to token-based ratios.
const UNBASE_SCALE: f64 = 0.95;

/// Length ratio at which partial matching kicks in.
const PARTIAL_LEN_RATIO: f64 = 1.5;

/// Length ratio beyond which partial matches are heavily discounted.
const LONG_LEN_RATIO: f64 = 8.0;

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    100.0 * indel::normalized_similarity(a.iter().copied(), b.iter().copied())
}

/// Normalized Indel similarity: `2 * LCS / (len_a + len_b)`.
pub fn ratio(a: &str, b: &str) -> f64 {
    100.0 * indel::normalized_similarity(a.chars(), b.chars())
}

/// Best [`ratio`] of the shorter string against any same-length window of
/// the longer one, including windows clipped at either edge.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (chars(a), chars(b));
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let mut best = 0.0f64;
    for start in 0..=long.len() - n {
        best = best.max(indel_ratio(&short, &long[start..start + n]));
        if best >= 100.0 {
            return best;
        }
    }
    for k in 1..n {
        best = best.max(indel_ratio(&short, &long[..k]));
        best = best.max(indel_ratio(&short, &long[long.len() - k..]));
    }
    best
}

fn sorted_joined(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// [`ratio`] after sorting whitespace tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_joined(a), &sorted_joined(b))
}

struct TokenSets<'a> {
    sect: Vec<&'a str>,
    diff_ab: Vec<&'a str>,
    diff_ba: Vec<&'a str>,
}

fn token_sets<'a>(a: &'a str, b: &'a str) -> TokenSets<'a> {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    TokenSets {
        sect: set_a.intersection(&set_b).copied().collect(),
        diff_ab: set_a.difference(&set_b).copied().collect(),
        diff_ba: set_b.difference(&set_a).copied().collect(),
    }
}

fn join_pair(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

/// Compares the shared tokens plus each side's remainder. A strict token
/// subset scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    if a.trim().is_empty() || b.trim().is_empty() {
        return 0.0;
    }
    let sets = token_sets(a, b);
    if !sets.sect.is_empty() && (sets.diff_ab.is_empty() || sets.diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = sets.sect.join(" ");
    let combined_ab = join_pair(&sect, &sets.diff_ab.join(" "));
    let combined_ba = join_pair(&sect, &sets.diff_ba.join(" "));

    let mut best = ratio(&combined_ab, &combined_ba);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &combined_ab));
        best = best.max(ratio(&sect, &combined_ba));
    }
    best
}

/// Partial matching on tokens. Any shared token scores 100.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    if a.trim().is_empty() || b.trim().is_empty() {
        return 0.0;
    }
    let sets = token_sets(a, b);
    if !sets.sect.is_empty() {
        return 100.0;
    }
    let sorted = partial_ratio(&sorted_joined(a), &sorted_joined(b));
    let diff = partial_ratio(&sets.diff_ab.join(" "), &sets.diff_ba.join(" "));
    sorted.max(diff)
}

/// Weighted composite ratio. Returns 0 if either side is empty.
pub fn wratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let mut best = ratio(a, b);

    if len_ratio < PARTIAL_LEN_RATIO {
        let token = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return best.max(token * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < LONG_LEN_RATIO { 0.9 } else { 0.6 };
    best = best.max(partial_ratio(a, b) * partial_scale);
    best.max(partial_token_ratio(a, b) * partial_scale * UNBASE_SCALE)
}

/// Round to one decimal place so ties and thresholds are stable.
pub fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Similarity of two raw names after normalization.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    round_score(wratio(&normalize(a), &normalize(b)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub index: usize,
    pub name: &'a str,
    pub score: f64,
}

/// Highest-scoring candidate for `query`, first occurrence on ties.
///
/// `None` is NO_MATCH (score 0): empty candidates, empty query, or no
/// candidate scoring above zero.
pub fn best_match<'a, S: AsRef<str>>(query: &str, candidates: &'a [S]) -> Option<BestMatch<'a>> {
    let query = normalize(query);
    if query.is_empty() {
        return None;
    }

    let mut best: Option<BestMatch<'a>> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let name = candidate.as_ref();
        let score = round_score(wratio(&query, &normalize(name)));
        if score > best.map_or(0.0, |b| b.score) {
            best = Some(BestMatch { index, name, score });
        }
    }
    best
}

/// Mean over query tokens of each token's best score against any component.
/// Inputs must already be normalized.
pub fn split_name_score(query_tokens: &[String], components: &[String]) -> f64 {
    if query_tokens.is_empty() || components.is_empty() {
        return 0.0;
    }
    let total: f64 = query_tokens
        .iter()
        .map(|token| {
            components
                .iter()
                .map(|component| wratio(token, component))
                .fold(0.0, f64::max)
        })
        .sum();
    round_score(total / query_tokens.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_basic() {
        assert_eq!(ratio("JOHN", "JOHN"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("ABC", "XYZ"), 0.0);
        // LCS("JONH SMITH", "JOHN SMITH") = 9 → 18/20
        assert_eq!(round_score(ratio("JONH SMITH", "JOHN SMITH")), 90.0);
        assert_eq!(round_score(ratio("JON", "JONATHAN")), 54.5);
    }

    #[test]
    fn partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("JON", "JONATHAN"), 100.0);
        assert_eq!(partial_ratio("JONATHAN", "JON"), 100.0);
        assert_eq!(partial_ratio("", "JON"), 0.0);
        assert!(partial_ratio("XJON", "JONATHAN") > 80.0);
    }

    #[test]
    fn token_ratios_ignore_order() {
        assert_eq!(token_sort_ratio("SMITH JOHN", "JOHN SMITH"), 100.0);
        assert_eq!(token_set_ratio("JOHN SMITH", "JOHN PAUL SMITH"), 100.0);
        assert_eq!(partial_token_ratio("JON SMITH", "JONATHAN SMITH"), 100.0);
        assert_eq!(token_set_ratio("", "JOHN"), 0.0);
    }

    #[test]
    fn wratio_exact_and_empty() {
        assert_eq!(wratio("ALEX LEE", "ALEX LEE"), 100.0);
        assert_eq!(wratio("", "ALEX LEE"), 0.0);
        assert_eq!(wratio("ALEX LEE", ""), 0.0);
    }

    #[test]
    fn wratio_reordered_tokens() {
        assert_eq!(round_score(wratio("SMITH JOHN", "JOHN SMITH")), 95.0);
    }

    #[test]
    fn wratio_tolerates_nickname_prefix() {
        // Length ratio ≥ 1.5 with a shared token: 100 * 0.9 * 0.95
        let score = name_similarity("Jon Smith", "Jonathan Smith");
        assert_eq!(score, 85.5);
    }

    #[test]
    fn wratio_degrades_on_typos() {
        let exact = name_similarity("John Smith", "John Smith");
        let typo = name_similarity("Jonh Smith", "John Smith");
        assert_eq!(exact, 100.0);
        assert!(typo < exact);
        assert!(typo >= 80.0, "typo score {typo}");
    }

    #[test]
    fn wratio_unrelated_names_score_low() {
        let score = name_similarity("Zzz Nomatch", "Jonathan Smith");
        assert!(score < 60.0, "score {score}");
    }

    #[test]
    fn name_similarity_is_case_insensitive() {
        assert_eq!(name_similarity("alex lee", "ALEX LEE"), 100.0);
    }

    #[test]
    fn best_match_empty_candidates() {
        let empty: Vec<String> = Vec::new();
        assert!(best_match("Alex Lee", &empty).is_none());
    }

    #[test]
    fn best_match_empty_query() {
        assert!(best_match("", &["Alex Lee"]).is_none());
        assert!(best_match("   ", &["Alex Lee"]).is_none());
    }

    #[test]
    fn best_match_picks_highest() {
        let names = ["Priya Patel", "Jonathan Smith", "Joan Smythe"];
        let best = best_match("Jon Smith", &names).unwrap();
        assert_eq!(best.name, "Jonathan Smith");
        assert_eq!(best.index, 1);
        assert_eq!(best.score, 85.5);
    }

    #[test]
    fn best_match_tie_prefers_first() {
        let names = ["ALEX LEE", "alex lee"];
        let best = best_match("Alex Lee", &names).unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(best.score, 100.0);
    }

    #[test]
    fn split_name_score_uses_buyer_surname() {
        let query = vec!["MIA".to_string(), "NGUYEN".to_string()];
        // Student registered under a different surname, buyer shares it
        let with_buyer = vec!["MIA".to_string(), "TRAN".to_string(), "NGUYEN".to_string()];
        let without_buyer = vec!["MIA".to_string(), "TRAN".to_string()];
        assert_eq!(split_name_score(&query, &with_buyer), 100.0);
        assert!(split_name_score(&query, &without_buyer) < 100.0);
    }

    #[test]
    fn split_name_score_empty() {
        assert_eq!(split_name_score(&[], &["A".to_string()]), 0.0);
        assert_eq!(split_name_score(&["A".to_string()], &[]), 0.0);
    }
}
