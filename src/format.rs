//! Rendering helpers for chat bubbles and speech output.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*([^*]+)\*\*").expect("regex ok");
    static ref ITALIC: Regex = Regex::new(r"\*([^*]+)\*").expect("regex ok");
    static ref CODE: Regex = Regex::new(r"`([^`]+)`").expect("regex ok");
    static ref LINK: Regex = Regex::new(r"https?://[^\s<]+").expect("regex ok");
    static ref MARKUP: Regex = Regex::new(r"[*`_#]").expect("regex ok");
    static ref SPACES: Regex = Regex::new(r"\s+").expect("regex ok");
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the light markdown used in replies as HTML.
///
/// Input is escaped first, so user text can never inject markup.
pub fn format_message(text: &str) -> String {
    let escaped = escape_html(text);
    let linked = LINK.replace_all(&escaped, |caps: &regex::Captures| {
        let url = &caps[0];
        format!(r#"<a href="{url}" target="_blank" rel="noopener">{url}</a>"#)
    });
    let bold = BOLD.replace_all(&linked, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    let code = CODE.replace_all(&italic, "<code>$1</code>");
    code.replace('\n', "<br>")
}

fn is_pictograph(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D | 0x2122
    )
}

/// Text suitable for a speech synthesizer: no emoji, no markdown markers,
/// single spaces.
pub fn speakable_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_pictograph(*c)).collect();
    let plain = MARKUP.replace_all(&stripped, "");
    SPACES.replace_all(plain.trim(), " ").into_owned()
}
