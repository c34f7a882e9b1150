//! Language ratio, language tag, and editorial-content detection (§4.4
//! "Auxiliary detections").

use std::collections::HashMap;

use crate::types::Language;

/// True if `c` falls in the Bengali Unicode block (U+0980–U+09FF).
fn is_bengali_char(c: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&c)
}

/// Compute the Bengali/English character ratio over `content`, the
/// resulting `content_language` tag, and whether editorial (non-legal,
/// likely site-furniture) content is present.
///
/// `content_language` is whichever script has the larger share of
/// alphabetic characters; ties favor Bengali, since the corpus treats
/// Bengali as the preferred representation (§4.9).
pub fn analyze_language(content: &str) -> (HashMap<String, f32>, Language, bool) {
    let mut bengali = 0usize;
    let mut english = 0usize;

    for c in content.chars() {
        if is_bengali_char(c) {
            bengali += 1;
        } else if c.is_ascii_alphabetic() {
            english += 1;
        }
    }

    let total = bengali + english;
    let (bengali_ratio, english_ratio) = if total == 0 {
        (0.0, 0.0)
    } else {
        (bengali as f32 / total as f32, english as f32 / total as f32)
    };

    let mut distribution = HashMap::new();
    distribution.insert("bengali".to_string(), bengali_ratio);
    distribution.insert("english".to_string(), english_ratio);

    let content_language = if bengali_ratio >= english_ratio {
        Language::Bengali
    } else {
        Language::English
    };

    let editorial_content_present = contains_editorial_markers(content);

    (distribution, content_language, editorial_content_present)
}

const EDITORIAL_MARKERS: &[&str] = &[
    "Home",
    "Contact Us",
    "Site Map",
    "Copyright",
    "All Rights Reserved",
];

fn contains_editorial_markers(content: &str) -> bool {
    EDITORIAL_MARKERS.iter().any(|m| content.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predominantly_english_text_tags_english() {
        let (dist, lang, _) = analyze_language("This Act shall come into force at once.");
        assert_eq!(lang, Language::English);
        assert!(dist["english"] > dist["bengali"]);
    }

    #[test]
    fn predominantly_bengali_text_tags_bengali() {
        let (dist, lang, _) = analyze_language("এই আইন অবিলম্বে কার্যকর হইবে।");
        assert_eq!(lang, Language::Bengali);
        assert!(dist["bengali"] > dist["english"]);
    }

    #[test]
    fn no_alphabetic_characters_yields_zero_ratios_and_defaults_to_bengali() {
        let (dist, lang, _) = analyze_language("123 456 789");
        assert_eq!(dist["bengali"], 0.0);
        assert_eq!(dist["english"], 0.0);
        assert_eq!(lang, Language::Bengali);
    }

    #[test]
    fn editorial_markers_are_flagged() {
        let (_, _, editorial) = analyze_language("Home | Contact Us | Copyright 2020");
        assert!(editorial);
    }

    #[test]
    fn legal_text_without_site_furniture_is_not_editorial() {
        let (_, _, editorial) = analyze_language("Whereas it is expedient to consolidate the law.");
        assert!(!editorial);
    }
}
