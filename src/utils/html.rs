use ammonia;

/// Clean imported question text using the ammonia library.
///
/// Question banks are often scraped or pasted from web sources. Safe inline
/// tags (like <b>, <sub>) survive; <script>, <iframe> and event-handler
/// attributes are stripped together with their content.
///
/// The result is an HTML fragment: text is entity-escaped, so plain
/// `Flora & Fauna` becomes `Flora &amp; Fauna`.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script() {
        assert_eq!(clean_html("<b>CO<sub>2</sub></b><script>x()</script>"), "<b>CO<sub>2</sub></b>");
    }

    #[test]
    fn test_text_is_entity_escaped() {
        assert_eq!(clean_html("Flora & Fauna: is 3 < 5?"), "Flora &amp; Fauna: is 3 &lt; 5?");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_html("Article 32"), "Article 32");
    }
}
