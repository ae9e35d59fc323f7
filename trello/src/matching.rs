//! Utilitários de fuzzy matching e normalização de strings
//!
//! Usados para:
//! - mapear membros do board (nome completo no Trello) para o roster do time
//! - comparar trechos de transcrição com nomes de cards

use deunicode::deunicode;
use std::collections::HashSet;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Normaliza uma string para comparação fuzzy
///
/// - Remove acentos (deunicode)
/// - Converte para lowercase
/// - Remove espaços nas pontas
///
/// # Exemplos
///
/// ```
/// use trello::matching::normalize;
///
/// assert_eq!(normalize("  Brayan Ngoné "), "brayan ngone");
/// assert_eq!(normalize("LANCEY"), "lancey");
/// ```
pub fn normalize(text: &str) -> String {
    deunicode(text).to_lowercase().trim().to_string()
}

/// Similaridade Jaro-Winkler entre duas strings normalizadas (0.0 a 1.0)
///
/// ```
/// use trello::matching::similarity;
///
/// assert!(similarity("Lancey", "Lancey") > 0.99);
/// assert!(similarity("Lancey", "Lancy") > 0.90);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    jaro_winkler(&normalize(a), &normalize(b))
}

/// `Some(score)` se a similaridade for >= threshold
pub fn fuzzy_match(a: &str, b: &str, threshold: f64) -> Option<f64> {
    let score = similarity(a, b);
    if score >= threshold {
        Some(score)
    } else {
        None
    }
}

/// Verifica se uma string contém outra (case-insensitive, sem acentos)
///
/// ```
/// use trello::matching::contains;
///
/// assert!(contains("Wendy Tamba", "wendy"));
/// assert!(!contains("Levy", "wendy"));
/// ```
pub fn contains(haystack: &str, needle: &str) -> bool {
    normalize(haystack).contains(&normalize(needle))
}

/// Extrai tokens (palavras) de uma string normalizada
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

/// Conjunto de palavras com mais de `min_len` caracteres
///
/// Pontuação nas pontas das palavras é descartada ("app," -> "app").
pub fn significant_words(text: &str, min_len: usize) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| w.chars().count() > min_len)
        .collect()
}

/// Índice de Jaccard entre dois conjuntos de palavras (0.0 a 1.0)
pub fn jaccard_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Similaridade de sequência (Levenshtein normalizado) entre duas strings normalizadas
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b))
}

/// Variações de grafia de um nome do roster
///
/// Cobre as trocas comuns entre o nome cadastrado e o nome no Trello
/// ("Lancey" vs "Lancy") e nomes compostos sem espaço.
///
/// ```
/// use trello::matching::name_variations;
///
/// let v = name_variations("Lancey");
/// assert!(v.contains(&"lancy".to_string()));
/// ```
pub fn name_variations(name: &str) -> Vec<String> {
    let lower = normalize(name);
    let candidates = [
        lower.clone(),
        lower.replace("ey", "y"),
        lower.replace('y', "ey"),
        lower.replace(' ', ""),
    ];

    let mut variations = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !variations.contains(&candidate) {
            variations.push(candidate);
        }
    }
    variations
}

/// Método 1: alguma variação do nome do time aparece no nome completo (ou vice-versa),
/// ou alguma parte da variação com mais de 2 letras aparece no nome completo
pub fn names_match(team_name: &str, full_name: &str) -> bool {
    let full = normalize(full_name);
    if full.is_empty() {
        return false;
    }

    name_variations(team_name).iter().any(|variation| {
        variation.contains(&full)
            || full.contains(variation.as_str())
            || variation
                .split_whitespace()
                .filter(|part| part.chars().count() > 2)
                .any(|part| full.contains(part))
    })
}

/// Método 2: comparação palavra a palavra com tolerância de até 2 letras
///
/// Para cada palavra do nome do time com mais de 2 letras, procura uma palavra do
/// nome completo que a contenha (ou esteja contida nela) ou tenha tamanho parecido,
/// e exige que pelo menos `max(3, len - 2)` letras coincidam na mesma posição.
pub fn words_match(team_name: &str, full_name: &str) -> bool {
    let team_words = tokenize(team_name);
    let member_words = tokenize(full_name);

    for team_word in team_words.iter().filter(|w| w.chars().count() > 2) {
        let team_len = team_word.chars().count();
        let required = std::cmp::max(3, team_len.saturating_sub(2));

        for member_word in &member_words {
            let member_len = member_word.chars().count();
            let comparable = team_word.contains(member_word.as_str())
                || member_word.contains(team_word.as_str())
                || team_len.abs_diff(member_len) <= 2;

            if !comparable {
                continue;
            }

            let same_position = team_word
                .chars()
                .zip(member_word.chars())
                .filter(|(a, b)| a == b)
                .count();

            if same_position >= required {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Brayan Ngoné"), "brayan ngone");
        assert_eq!(normalize("  FORKA  "), "forka");
    }

    #[test]
    fn test_similarity() {
        assert!(similarity("Breyden", "Breyden") > 0.99);
        assert!(similarity("Lancey", "Lancy") > 0.90);
        assert!(similarity("Wendy", "Forka") < 0.70);
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("Levy", "Levy", 0.9).is_some());
        assert!(fuzzy_match("Levy", "Brayan", 0.9).is_none());
    }

    #[test]
    fn test_contains_and_tokenize() {
        assert!(contains("Wendy Tamba", "WENDY"));
        assert_eq!(tokenize("  Levy  Nkeng "), vec!["levy", "nkeng"]);
    }

    #[test]
    fn test_significant_words_strips_punctuation() {
        let words = significant_words("Fix the mobile app, today!", 2);
        assert!(words.contains("mobile"));
        assert!(words.contains("app"));
        assert!(words.contains("today"));
        assert!(words.contains("the"));
        assert!(!significant_words("to do", 2).contains("do"));
    }

    #[test]
    fn test_jaccard_overlap() {
        let a = significant_words("organize court documents", 2);
        let b = significant_words("court documents upload", 2);
        let score = jaccard_overlap(&a, &b);
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(jaccard_overlap(&HashSet::new(), &b), 0.0);
    }

    #[test]
    fn test_name_variations() {
        let variations = name_variations("Lancey");
        assert_eq!(variations[0], "lancey");
        assert!(variations.contains(&"lancy".to_string()));

        let compound = name_variations("Mary Ann");
        assert!(compound.contains(&"maryann".to_string()));
    }

    #[test]
    fn test_names_match_method_one() {
        assert!(names_match("Wendy", "Wendy Tamba"));
        assert!(names_match("Lancey", "Lancy Dizon"));
        assert!(names_match("Mary Ann", "Ann Smith"));
        assert!(!names_match("Levy", "Brayan Fon"));
        assert!(!names_match("Levy", ""));
    }

    #[test]
    fn test_words_match_method_two() {
        // "breyden" vs "braydon": b,r,y,d,n coincidem na posição
        assert!(words_match("Breyden", "Braydon Cole"));
        assert!(!words_match("Forka", "Wendy Tamba"));
        // palavras curtas são ignoradas
        assert!(!words_match("Al", "Al Green"));
    }

    #[test]
    fn test_sequence_ratio() {
        assert!((sequence_ratio("Mobile App", "mobile app") - 1.0).abs() < 1e-9);
        assert!(sequence_ratio("mobile app", "mobile apps") > 0.85);
        assert!(sequence_ratio("mobile app", "court documents") < 0.4);
    }
}
