//! Label normalizer. Collapses raw archetype strings onto a closed label
//! set shared by the ASI and NBAC trainers.

use std::collections::{HashMap, HashSet};

use crate::corpus::DeckEntry;

/// Color/color-combination tokens stripped as a leading prefix. Order
/// matters: earlier entries are tried first, matching the source table
/// (`original_source/src/nbac/archetypes.py::ARCHETYPE_COLORS`), which is a
/// superset of the ASI-side table (it additionally spells out the five
/// basic colors by name).
pub const COLORS: &[&str] = &[
    // 1-color combinations
    "Mono-White", "Mono-Blue", "Mono-Black", "Mono-Red", "Mono-Green",
    "White", "Blue", "Black", "Red", "Green",
    "W", "U", "B", "R", "G",
    // 2-color combinations
    "Azorius", "Orzhov", "Boros", "Selesnya", "Dimir", "Izzet", "Rakdos",
    "WU", "WB", "WR", "WG", "UB", "UR", "BR",
    "Golgari", "Gruul", "Simic",
    "BG", "RG", "UG",
    // 3-color combinations
    "Jeskai", "Grixis", "Jund", "Naya", "Bant", "Abzan", "Sultai", "Mardu",
    "WUR", "UBR", "BRG", "WRG", "GWU", "WBG", "UBG", "WBR",
    "Temur", "Esper", "Bant",
    "URG", "WUB", "WUG",
    // 4/5-color combinations
    "WBRG", "WURG", "WUBG", "WUBR", "UBRG", "WUBRG", "4c", "5c", "4/5c",
    // Specialty
    "Colorless", "Snow",
    "C", "S",
];

/// Macro archetype labels.
pub const MACRO_ARCHETYPES: &[&str] = &[
    "Aggro", "Control", "Midrange", "Combo", "Prison", "Tempo", "Ramp",
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strip `prefix` from the start of `s`, case-insensitively, only if the
/// match lands on a word boundary (end of string, or a non-word character
/// immediately after the prefix).
fn strip_prefix_on_boundary<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() {
        return None;
    }
    let (head, tail) = s.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    match tail.chars().next() {
        None => Some(tail),
        Some(c) if !is_word_char(c) => Some(tail),
        _ => None,
    }
}

/// Strip each color in `COLORS` off the front of `name`, in declaration
/// order, case-insensitively, matched on a word boundary. Each strip
/// operates on the result of the previous one.
pub fn remove_colors(name: Option<&str>) -> Option<String> {
    let mut current = name?.to_string();
    for color in COLORS {
        if let Some(rest) = strip_prefix_on_boundary(&current, color) {
            current = rest.to_string();
        }
    }
    Some(current.trim().to_string())
}

/// Build the allowed label set by grouping every deck's preliminary label:
/// `remove_colors(archetype_raw)` unless that residue is itself a macro
/// archetype, in which case the raw label is kept verbatim. Decks whose
/// `display_name` is itself a bare color token are excluded entirely (they
/// carry no archetype signal).
pub fn build_allowed_labels<'a>(
    entries: impl IntoIterator<Item = &'a DeckEntry>,
) -> HashMap<String, usize> {
    let mut analyzed: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let Some(raw) = entry.archetype_raw.as_deref() else {
            continue;
        };
        if COLORS.contains(&entry.display_name.as_str()) {
            continue;
        }
        let base = remove_colors(Some(raw)).unwrap_or_default();
        let label = if MACRO_ARCHETYPES.contains(&base.as_str()) {
            raw.to_string()
        } else {
            base
        };
        *analyzed.entry(label).or_insert(0) += 1;
    }
    analyzed
}

/// Final label for one deck, given the allowed set: strip colors from the
/// raw archetype, and use the stripped form if it's in the allowed set and
/// isn't itself a macro archetype; otherwise fall back to the raw label.
/// Returns `None` if the deck should be dropped (no archetype, color-only
/// display name, or the resulting label isn't in `allowed`).
pub fn normalize_label(entry: &DeckEntry, allowed: &HashSet<String>) -> Option<String> {
    let raw = entry.archetype_raw.as_deref()?;
    if COLORS.contains(&entry.display_name.as_str()) {
        return None;
    }
    let stripped = remove_colors(Some(raw)).unwrap_or_default();
    let label = if allowed.contains(&stripped) && !MACRO_ARCHETYPES.contains(&stripped.as_str()) {
        stripped
    } else {
        raw.to_string()
    };
    if allowed.contains(&label) {
        Some(label)
    } else {
        None
    }
}

/// Normalize an entire corpus, returning `(deck, label)` pairs for every
/// deck that survives filtering.
pub fn normalize_corpus(entries: &[DeckEntry]) -> Vec<(&DeckEntry, String)> {
    let analyzed = build_allowed_labels(entries);
    let allowed: HashSet<String> = analyzed.into_keys().collect();

    entries
        .iter()
        .filter_map(|entry| normalize_label(entry, &allowed).map(|label| (entry, label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mono_color_prefix() {
        assert_eq!(remove_colors(Some("Mono-Red Burn")).unwrap(), "Burn");
    }

    #[test]
    fn leaves_unprefixed_name_alone() {
        assert_eq!(remove_colors(Some("Burn")).unwrap(), "Burn");
    }

    #[test]
    fn strips_guild_prefix() {
        assert_eq!(remove_colors(Some("Boros Burn")).unwrap(), "Burn");
    }

    #[test]
    fn null_in_null_out() {
        assert_eq!(remove_colors(None), None);
    }

    #[test]
    fn does_not_strip_mid_word() {
        // "Reanimator" must not lose its leading "R" just because "R" is a
        // color token: the boundary check should fail ('e' is a word char).
        assert_eq!(remove_colors(Some("Reanimator")).unwrap(), "Reanimator");
    }

    fn color_only_deck() -> DeckEntry {
        DeckEntry {
            id: "1".to_string(),
            display_name: "Mono-Red".to_string(),
            archetype_raw: Some("Mono-Red".to_string()),
            format: "modern".to_string(),
            date: "2026-01-01".to_string(),
            mainboard: vec![],
            sideboard: vec![],
        }
    }

    #[test]
    fn drops_decks_whose_display_name_is_a_bare_color_token() {
        let decks = vec![color_only_deck()];
        let analyzed = build_allowed_labels(&decks);
        assert!(analyzed.is_empty());

        let allowed: HashSet<String> = HashSet::new();
        assert_eq!(normalize_label(&decks[0], &allowed), None);
    }

    #[test]
    fn normalize_corpus_excludes_color_only_decks() {
        let decks = vec![color_only_deck()];
        assert!(normalize_corpus(&decks).is_empty());
    }
}
