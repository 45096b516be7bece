// Text normalization ahead of keyword matching

/// Punctuation kept because it is part of technology names (`c++`, `c#`, `node.js`, `ci-cd`).
const KEPT_PUNCTUATION: [char; 4] = ['.', '+', '#', '-'];

/// Whether a lowercased character survives normalization.
pub fn is_allowed_char(c: char) -> bool {
    matches!(c, 'а'..='я' | 'ё' | 'a'..='z' | '0'..='9')
        || KEPT_PUNCTUATION.contains(&c)
        || c.is_whitespace()
}

/// Lowercase `text` and replace every character outside the allowed set with a space.
///
/// The result has exactly as many characters as `text.to_lowercase()`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if is_allowed_char(c) { c } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_lowercases_both_alphabets() {
        assert_eq!(normalize("Python РАЗРАБОТЧИК"), "python разработчик");
    }

    #[test]
    fn test_normalize_keeps_tech_punctuation() {
        assert_eq!(normalize("C++, C#, Node.js, CI-CD"), "c++  c#  node.js  ci-cd");
    }

    #[test]
    fn test_normalize_replaces_markup() {
        assert_eq!(normalize("<p>Git</p>"), " p git  p ");
    }

    #[test]
    fn test_normalize_replaces_slash_and_underscore() {
        assert_eq!(normalize("PL/SQL snake_case"), "pl sql snake case");
    }

    #[test]
    fn test_normalize_keeps_yo() {
        assert_eq!(normalize("Ёлка"), "ёлка");
    }

    #[test]
    fn test_normalize_replaces_other_scripts() {
        assert_eq!(normalize("café 日本"), "caf    ");
    }

    #[test]
    fn test_normalize_preserves_char_count() {
        let inputs = [
            "Требуется Python разработчик, опыт Django, PostgreSQL",
            "<strong>C#</strong> / .NET — 1С:Предприятие",
            "emoji 🚀 and tabs\tand\nnewlines",
        ];
        for input in inputs {
            let normalized = normalize(input);
            assert_eq!(
                normalized.chars().count(),
                input.to_lowercase().chars().count(),
                "length changed for {:?}",
                input
            );
            assert!(normalized.chars().all(is_allowed_char));
        }
    }
}
