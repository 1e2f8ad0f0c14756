//! Deterministic candidate scoring
//!
//! Scores how well a search candidate matches a seed name, on [0, 1]. The
//! function is pure and reproducible: the same inputs always produce the
//! same score, which regression tests and re-scoring after a detail fetch
//! both rely on. The score is a layered heuristic, not a probability.

/// Title keywords suggesting an official artist or label presence
const OFFICIALDOM_KEYWORDS: [&str; 8] = [
    "official",
    "music",
    "records",
    "productions",
    "entertainment",
    "films",
    "audio",
    "label",
];

/// Music-domain vocabulary looked for in titles and descriptions
const MUSIC_KEYWORDS: [&str; 8] = [
    "songs",
    "hits",
    "albums",
    "jukebox",
    "soundtrack",
    "melodies",
    "singer",
    "composer",
];

/// Minimum score for accepting a direct handle lookup
pub const HANDLE_MIN_SCORE: f64 = 0.3;

/// Minimum score for accepting the best search candidate
pub const SEARCH_MIN_SCORE: f64 = 0.2;

/// Inputs to one scoring evaluation
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    /// The seed name being resolved
    pub seed: &'a str,
    /// Candidate channel title
    pub title: &'a str,
    /// Candidate channel description
    pub description: &'a str,
    /// Subscriber count when known (only after a full detail fetch)
    pub popularity: Option<u64>,
    /// 1-based position of the candidate in the search results
    pub rank: u32,
}

/// Scores a candidate against a seed name
///
/// Components:
/// - exact case-insensitive title match +0.4, else substring containment
///   either direction +0.3, else +0.1 per common token longer than two
///   characters, capped at three tokens
/// - officialdom keyword in the title +0.1, first match only
/// - music-domain keyword in the title or description +0.1, first match only
/// - popularity: +0.15 at 10M subscribers, +0.10 at 1M, +0.05 at 100k
/// - rank penalty of 0.05 per position below the top
///
/// The result is clamped to [0, 1].
pub fn score_candidate(inputs: &ScoreInputs) -> f64 {
    let seed = inputs.seed.trim().to_lowercase();
    let title = inputs.title.trim().to_lowercase();
    let description = inputs.description.to_lowercase();

    let mut score = 0.0;

    if !seed.is_empty() && seed == title {
        score += 0.4;
    } else if !seed.is_empty() && !title.is_empty() && (title.contains(&seed) || seed.contains(&title))
    {
        score += 0.3;
    } else {
        let seed_tokens: Vec<&str> = seed
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .collect();
        let title_tokens: Vec<&str> = title
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .collect();
        let common = seed_tokens
            .iter()
            .filter(|t| title_tokens.contains(t))
            .count()
            .min(3);
        score += 0.1 * common as f64;
    }

    if OFFICIALDOM_KEYWORDS.iter().any(|k| title.contains(k)) {
        score += 0.1;
    }

    if MUSIC_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || description.contains(k))
    {
        score += 0.1;
    }

    if let Some(popularity) = inputs.popularity {
        if popularity >= 10_000_000 {
            score += 0.15;
        } else if popularity >= 1_000_000 {
            score += 0.10;
        } else if popularity >= 100_000 {
            score += 0.05;
        }
    }

    score -= 0.05 * inputs.rank.saturating_sub(1) as f64;

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(seed: &str, title: &str, description: &str, popularity: Option<u64>, rank: u32) -> f64 {
        score_candidate(&ScoreInputs {
            seed,
            title,
            description,
            popularity,
            rank,
        })
    }

    #[test]
    fn test_exact_match_with_officialdom_and_popularity() {
        // 0.4 exact + 0.1 "official" + 0.15 popularity
        let result = score(
            "A.R. Rahman Official",
            "A.R. Rahman Official",
            "",
            Some(12_000_000),
            1,
        );
        assert_eq!(result, 0.65);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        assert_eq!(score("artist name", "Artist Name", "", None, 1), 0.4);
    }

    #[test]
    fn test_substring_containment_either_direction() {
        assert_eq!(score("Rahman", "A.R. Rahman Fan Club", "", None, 1), 0.3);
        assert_eq!(score("A.R. Rahman Fan Club", "Rahman", "", None, 1), 0.3);
    }

    #[test]
    fn test_word_overlap_caps_at_three_tokens() {
        // Four common tokens, none of the strings contain the other
        let result = score(
            "alpha beta gamma delta",
            "delta gamma beta alpha extra",
            "",
            None,
            1,
        );
        assert!((result - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_word_overlap_ignores_short_tokens() {
        // "of" never counts toward overlap
        let result = score("best of alpha", "of unrelated wholly", "", None, 1);
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_music_keyword_counts_once() {
        // Exact match + one music keyword hit from the description; a second
        // keyword must not stack
        let result = score(
            "artist name",
            "artist name",
            "songs and more songs, hits too",
            None,
            1,
        );
        assert!((result - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_popularity_tiers() {
        let base = score("artist xyz", "artist xyz", "", None, 1);
        assert_eq!(score("artist xyz", "artist xyz", "", Some(99_999), 1), base);
        assert!(
            (score("artist xyz", "artist xyz", "", Some(100_000), 1) - base - 0.05).abs() < 1e-12
        );
        assert!(
            (score("artist xyz", "artist xyz", "", Some(1_000_000), 1) - base - 0.10).abs() < 1e-12
        );
        assert!(
            (score("artist xyz", "artist xyz", "", Some(10_000_000), 1) - base - 0.15).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_rank_three_scores_a_tenth_below_rank_one() {
        let at_rank_1 = score("A.R. Rahman Official", "A.R. Rahman Official", "", Some(12_000_000), 1);
        let at_rank_3 = score("A.R. Rahman Official", "A.R. Rahman Official", "", Some(12_000_000), 3);
        assert!((at_rank_1 - at_rank_3 - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_score_floors_at_zero() {
        // A weak candidate deep in the ranking cannot go negative
        let result = score("something", "unrelated", "", None, 9);
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let a = score("Artist", "Artist Official Music", "songs", Some(2_000_000), 2);
        let b = score("Artist", "Artist Official Music", "songs", Some(2_000_000), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_acceptance_threshold_edges() {
        // Two common tokens at rank 1, no other bonuses: exactly the
        // acceptance threshold
        let at_threshold = score("alpha beta", "gamma alpha delta beta", "", None, 1);
        assert!(at_threshold >= SEARCH_MIN_SCORE);
        assert!((at_threshold - 0.2).abs() < 1e-12);

        // Just below must be rejected
        assert!(0.1999 < SEARCH_MIN_SCORE);
    }
}
