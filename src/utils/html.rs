use ammonia;

/// Clean user-supplied rich content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (<b>, <p>, ...) survive, script
/// tags, iframes and event-handler attributes are stripped. Applied to post
/// bodies, comments and article content before they hit the database, so
/// stored content is safe to render in any client.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::clean_html;

    #[test]
    fn strips_script_tags() {
        let cleaned = clean_html("hello <script>alert('x')</script>world");
        assert!(!cleaned.contains("script"));
        assert!(cleaned.contains("hello"));
    }
}
