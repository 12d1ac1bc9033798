use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Substrings that make a span worth running through [`rewrite`].
const TRIGGERS: [&str; 9] = ["[[", "**", "__", "==", "~~", "`", "*", "_", "#"];

/// Cheap pre-check so spans without any markup never hit the regex pipeline.
pub fn has_formatting(text: &str) -> bool {
    TRIGGERS.iter().any(|trigger| text.contains(trigger))
}

/// Strips inline markup and returns the visible text.
///
/// Multi-character delimiters are removed before single-character ones so
/// `**bold**` is never read as two italics. Each stage can only shorten the
/// text, so repeating the pipeline until nothing changes always terminates and
/// makes the result a fixpoint: `rewrite(rewrite(s)) == rewrite(s)`.
pub fn rewrite(text: &str) -> String {
    let mut current = rewrite_pass(text);
    loop {
        let next = rewrite_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn rewrite_pass(text: &str) -> String {
    static RE_PIPED_LINK: OnceLock<Regex> = OnceLock::new();
    static RE_LINK: OnceLock<Regex> = OnceLock::new();
    static RE_CHECKBOX: OnceLock<Regex> = OnceLock::new();
    static RE_BOLD_STAR: OnceLock<Regex> = OnceLock::new();
    static RE_BOLD_UNDERSCORE: OnceLock<Regex> = OnceLock::new();
    static RE_HIGHLIGHT: OnceLock<Regex> = OnceLock::new();
    static RE_STRIKE: OnceLock<Regex> = OnceLock::new();
    static RE_CODE: OnceLock<Regex> = OnceLock::new();
    static RE_ITALIC_STAR: OnceLock<Regex> = OnceLock::new();
    static RE_ITALIC_UNDERSCORE: OnceLock<Regex> = OnceLock::new();
    static RE_TAG: OnceLock<Regex> = OnceLock::new();
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();

    let re_piped_link =
        RE_PIPED_LINK.get_or_init(|| Regex::new(r"\[\[([^|\]]+)\|([^\]]+)\]\]").unwrap());
    let re_link = RE_LINK.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
    let re_checkbox = RE_CHECKBOX.get_or_init(|| Regex::new(r"^\s*\[[\sxX]\]\s*").unwrap());
    let re_bold_star = RE_BOLD_STAR.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
    let re_bold_underscore =
        RE_BOLD_UNDERSCORE.get_or_init(|| Regex::new(r"__(.+?)__").unwrap());
    let re_highlight = RE_HIGHLIGHT.get_or_init(|| Regex::new(r"==(.+?)==").unwrap());
    let re_strike = RE_STRIKE.get_or_init(|| Regex::new(r"~~(.+?)~~").unwrap());
    let re_code = RE_CODE.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap());
    let re_italic_star = RE_ITALIC_STAR.get_or_init(|| Regex::new(r"\*([^*]+)\*").unwrap());
    // `_` is a word character, so the boundaries only hold when the delimiters
    // sit next to whitespace, punctuation or the ends of the text.
    let re_italic_underscore =
        RE_ITALIC_UNDERSCORE.get_or_init(|| Regex::new(r"\b_([^_]+)_\b").unwrap());
    // \w is Unicode-aware here, which covers CJK tag names.
    let re_tag = RE_TAG.get_or_init(|| Regex::new(r"(^|\s)#[\w/-]+").unwrap());
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s{2,}").unwrap());

    let mut out = replace(text, re_piped_link, "$2");
    out = replace(&out, re_link, "$1");
    out = replace(&out, re_checkbox, "");
    out = replace(&out, re_bold_star, "$1");
    out = replace(&out, re_bold_underscore, "$1");
    out = replace(&out, re_highlight, "$1");
    out = replace(&out, re_strike, "$1");
    out = replace(&out, re_code, "$1");
    out = replace(&out, re_italic_star, "$1");
    out = replace(&out, re_italic_underscore, "$1");
    out = replace(&out, re_tag, "$1");
    out = replace(&out, re_spaces, " ");
    out.trim().to_string()
}

fn replace(text: &str, re: &Regex, with: &str) -> String {
    match re.replace_all(text, with) {
        Cow::Borrowed(_) => text.to_string(),
        Cow::Owned(changed) => changed,
    }
}

/// 32-bit rolling hash over UTF-16 code units, rendered as a signed decimal.
///
/// Only used to tell whether a span still holds the text we last wrote; the
/// format matches the `data-wikilink-hash` values older builds left behind.
pub fn fingerprint(text: &str) -> String {
    let hash = text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    hash.to_string()
}
