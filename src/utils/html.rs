/// Clean admin-authored HTML with ammonia's whitelist policy.
///
/// Safe inline tags (`<b>`, `<i>`, `<code>`) survive; `<script>`/`<style>` are dropped
/// along with their content, and event-handler attributes are stripped. The Mini App
/// renders question text as HTML, so this runs before anything is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
