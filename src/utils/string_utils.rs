/// Utilitários de texto seguros para UTF-8

/// Trunca em `max_chars` caracteres (nunca corta um caractere ao meio)
///
/// # Exemplo
/// ```
/// use meeting_trello_middleware::utils::string_utils::truncate_chars;
///
/// assert_eq!(truncate_chars("Reunião semanal", 7), "Reunião");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Trunca e adiciona um sufixo (como "...") apenas quando houve corte
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    let truncated = truncate_chars(s, max_chars);
    if truncated.len() < s.len() {
        format!("{}{}", truncated, suffix)
    } else {
        truncated.to_string()
    }
}

/// "wendy TAMBA" -> "Wendy Tamba"
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Contagem de palavras separadas por espaço
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_utf8() {
        assert_eq!(truncate_chars("Olá, mundo!", 3), "Olá");
        assert_eq!(truncate_chars("Hello 🌍 World", 7), "Hello 🌍");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_with_suffix() {
        assert_eq!(truncate_with_suffix("This is a very long text", 9, "..."), "This is a...");
        assert_eq!(truncate_with_suffix("short", 9, "..."), "short");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("wendy TAMBA"), "Wendy Tamba");
        assert_eq!(title_case("  levy  "), "Levy");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two  three\nfour"), 4);
    }
}
