//! "Did you mean" suggestions for unknown identifiers and missing properties.
//!
//! Candidates are ranked by normalized Damerau-Levenshtein similarity, and the best one is only
//! retained when it's similar enough.
use strsim::normalized_damerau_levenshtein;

/// Candidates below this similarity aren't suggested. Short names differing by one letter, such
/// as `pt` and `p`, already sit around `0.5`.
pub const MIN_SIMILARITY: f64 = 0.5;

/// Return the candidate closest to `input`, if any is similar enough. A case-insensitive exact
/// match always wins.
pub fn best_match<'c, S: AsRef<str>>(candidates: &'c [S], input: &str) -> Option<&'c str> {
    let lowercase = input.to_lowercase();

    if let Some(exact) = candidates
        .iter()
        .find(|candidate| candidate.as_ref().to_lowercase() == lowercase)
    {
        return Some(exact.as_ref());
    }

    candidates
        .iter()
        .map(|candidate| {
            (
                candidate.as_ref(),
                normalized_damerau_levenshtein(candidate.as_ref(), input),
            )
        })
        .filter(|(_, similarity)| *similarity >= MIN_SIMILARITY)
        .max_by(|(_, sim1), (_, sim2)| sim1.total_cmp(sim2))
        .map(|(candidate, _)| candidate)
}

/// Push a note suggesting the closest candidate, if there is one.
pub fn add_suggestion<S: AsRef<str>>(notes: &mut Vec<String>, candidates: &[S], input: &str) {
    if let Some(candidate) = best_match(candidates, input) {
        notes.push(format!("Did you mean `{candidate}`?"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_names() {
        let names = ["point", "makePoint", "id"];

        assert_eq!(best_match(&names, "piont"), Some("point"));
        assert_eq!(best_match(&names, "MAKEPOINT"), Some("makePoint"));
        assert_eq!(best_match(&names, "unrelated"), None);
    }

    #[test]
    fn no_candidate_no_note() {
        let mut notes = Vec::new();
        add_suggestion::<&str>(&mut notes, &[], "x");
        assert!(notes.is_empty());
    }
}
