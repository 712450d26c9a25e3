/// Clean model-generated text before it is sent to a browser.
///
/// Whitelist-based: harmless formatting tags (like <b>, <code>) survive while
/// <script>, <iframe> and event-handler attributes are stripped. Only the
/// rendered copy is cleaned; answers are still compared against the raw text.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_script() {
        let cleaned = clean_html("Pick one<script>alert(1)</script>");
        assert_eq!(cleaned, "Pick one");
    }

    #[test]
    fn test_clean_html_keeps_plain_text() {
        assert_eq!(clean_html("What is 2+2?"), "What is 2+2?");
    }
}
