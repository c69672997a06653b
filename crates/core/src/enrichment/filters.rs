//! Keyword heuristics turning raw search hits into specialists and clinics.

use super::search::SearchHit;
use crate::constants::{EXCLUDED_TERMS, MAX_CLINICS, MAX_SPECIALISTS};
use api_shared::{Clinic, Specialist};
use std::collections::HashSet;

const SPECIALIST_TITLE_TERMS: [&str; 2] = ["dr.", "doctor"];
const SPECIALIST_SNIPPET_TERM: &str = "dermatologist";
const CLINIC_TITLE_TERMS: [&str; 3] = ["clinic", "center", "hospital"];

/// Lowercase, alphanumerics only, single spaces.
pub fn normalise_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the hit mentions an excluded term as a whole word or phrase.
pub fn has_excluded_term(hit: &SearchHit) -> bool {
    let text = format!(" {} ", normalise_name(&hit.searchable_text()));
    EXCLUDED_TERMS
        .iter()
        .any(|term| text.contains(&format!(" {} ", term)))
}

pub fn select_specialists(hits: &[SearchHit], condition: &str) -> Vec<Specialist> {
    let candidates = hits.iter().filter_map(|hit| {
        let (title, link, snippet) = (hit.title()?, hit.url()?, hit.summary()?);
        let lower_title = title.to_lowercase();
        let relevant = SPECIALIST_TITLE_TERMS
            .iter()
            .any(|term| lower_title.contains(term))
            || snippet.to_lowercase().contains(SPECIALIST_SNIPPET_TERM);
        (relevant && !has_excluded_term(hit)).then(|| Specialist {
            name: title.to_string(),
            link: link.to_string(),
            description: snippet.to_string(),
            specialty: condition.to_string(),
        })
    });
    dedupe_by(candidates, |s| &s.name, MAX_SPECIALISTS)
}

pub fn select_clinics(hits: &[SearchHit], condition: &str) -> Vec<Clinic> {
    let candidates = hits.iter().filter_map(|hit| {
        let (title, link, snippet) = (hit.title()?, hit.url()?, hit.summary()?);
        let lower_title = title.to_lowercase();
        let relevant = CLINIC_TITLE_TERMS
            .iter()
            .any(|term| lower_title.contains(term));
        (relevant && !has_excluded_term(hit)).then(|| Clinic {
            title: title.to_string(),
            link: link.to_string(),
            snippet: snippet.to_string(),
            condition: condition.to_string(),
        })
    });
    dedupe_by(candidates, |c| &c.title, MAX_CLINICS)
}

fn dedupe_by<T, I, F>(items: I, name: F, limit: usize) -> Vec<T>
where
    I: Iterator<Item = T>,
    F: Fn(&T) -> &String,
{
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(normalise_name(name(item))))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_name() {
        assert_eq!(normalise_name("  Dr. Ana  Cruz, MD "), "dr ana cruz md");
        assert_eq!(normalise_name("Skin-Care Center!"), "skin care center");
    }

    #[test]
    fn test_excluded_terms_match_whole_words() {
        assert!(has_excluded_term(&SearchHit::web(
            "Best derm blog",
            "https://x",
            "tips"
        )));
        assert!(has_excluded_term(&SearchHit::web(
            "Acne Clinic",
            "https://x",
            "A review site for clinics"
        )));
        assert!(!has_excluded_term(&SearchHit::web(
            "Dr. Lawrence Reyes",
            "https://x",
            "Board-certified dermatologist"
        )));
    }

    #[test]
    fn test_select_specialists_filters_and_limits() {
        let hits = vec![
            SearchHit::web("Dr. Ana Cruz", "https://a", "Acne care"),
            SearchHit::web("Skin Hub", "https://b", "Our dermatologist treats acne"),
            SearchHit::web("DR. ANA CRUZ", "https://e", "Duplicate listing"),
            SearchHit::web("Acne explained", "https://c", "Wikipedia entry"),
            SearchHit::web("Doctor Ben Tan", "https://d", "General practice"),
            SearchHit::web("Dr. Cara Lim", "https://f", "Skin"),
            SearchHit::web("Dr. No Link", "", "missing link"),
        ];

        let specialists = select_specialists(&hits, "Acne");
        let names: Vec<_> = specialists.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Dr. Ana Cruz", "Skin Hub", "Doctor Ben Tan"]);
        assert!(specialists.iter().all(|s| s.specialty == "Acne"));
    }

    #[test]
    fn test_select_clinics_uses_place_fields() {
        let place = SearchHit {
            title: Some("Makati Skin Clinic".into()),
            website: Some("https://clinic".into()),
            address: Some("Ayala Ave".into()),
            ..SearchHit::default()
        };
        let hits = vec![
            place,
            SearchHit::web("Derm Pharmacy Center", "https://p", "pharmacy"),
            SearchHit::web("City Hospital", "https://h", "Dermatology ward"),
            SearchHit::web("Acne Products", "https://s", "shop"),
        ];

        let clinics = select_clinics(&hits, "Acne");
        assert_eq!(clinics.len(), 2);
        assert_eq!(clinics[0].link, "https://clinic");
        assert_eq!(clinics[0].snippet, "Ayala Ave");
        assert_eq!(clinics[1].title, "City Hospital");
    }

    #[test]
    fn test_select_clinics_caps_at_five() {
        let hits: Vec<_> = (0..8)
            .map(|i| SearchHit::web(&format!("Clinic {}", i), "https://x", "skin"))
            .collect();
        assert_eq!(select_clinics(&hits, "Acne").len(), MAX_CLINICS);
    }
}
