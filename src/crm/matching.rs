//! Fuzzy name matching
//!
//! A candidate matches when the whole stored name, or either half of a
//! "first rest" split, is within the similarity threshold of the query.

use strsim::jaro_winkler;

/// A stored name that resembles the query
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub name: String,
    pub similarity: f64,
}

/// Stored names similar to `target`, at most one entry per stored name
pub fn similar_names(target: &str, names: &[String], threshold: f64) -> Vec<NameMatch> {
    let target = target.trim().to_lowercase();
    let mut matches = Vec::new();

    for name in names {
        let lowered = name.to_lowercase();
        let parts: Vec<&str> = match lowered.split_once(' ') {
            Some((first, rest)) => vec![first, rest],
            None => vec![lowered.as_str()],
        };

        let best = std::iter::once(lowered.as_str())
            .chain(parts)
            .map(|candidate| jaro_winkler(&target, candidate))
            .fold(0.0_f64, f64::max);

        if best >= threshold {
            matches.push(NameMatch {
                name: name.clone(),
                similarity: best,
            });
        }
    }

    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["john doe".into(), "jane roe".into(), "chandru".into()]
    }

    #[test]
    fn test_first_name_matches_split_name() {
        let found = similar_names("John", &names(), 0.86);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "john doe");
    }

    #[test]
    fn test_typo_still_matches() {
        let found = similar_names("chandu", &names(), 0.86);
        assert_eq!(found.first().map(|m| m.name.as_str()), Some("chandru"));
    }

    #[test]
    fn test_unrelated_name_does_not_match() {
        assert!(similar_names("zebulon", &names(), 0.86).is_empty());
    }
}
