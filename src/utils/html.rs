use ammonia;

/// Clean author-supplied text using the ammonia library.
///
/// Whitelist-based: harmless inline markup (like <b>, <p>) survives while
/// <script>, <iframe> and event-handler attributes are stripped. Exams are
/// rendered to anonymous respondents, so every text field goes through here
/// before it is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
