// Turns original document content into the processed text seen by annotation
// engines, recording every alteration in a RepositioningInfo.
//
// Alterations: markup tags and comments are removed (block-level tags leave a
// newline behind), script/style bodies are dropped, character references are
// decoded, and CRLF becomes LF. Everything else is copied through unchanged.

use crate::repositioning::RepositioningInfo;
use anyhow::Result;

/// Processed text plus the mapping back to the original
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub content: String,
    pub repositioning: RepositioningInfo,
}

// Tags whose removal should still separate the surrounding words
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table",
    "td", "th", "title", "tr", "ul",
];

// Elements whose body is not document text
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

// Longest character reference we try to decode, e.g. `&CounterClockwiseContourIntegral;`
const MAX_REFERENCE_LEN: usize = 34;

// A `<` with no `>` within this many chars is literal text
const MAX_TAG_LEN: usize = 4096;

/// Preprocess `original`. Markup handling only applies when `markup` is set;
/// line endings are normalized either way.
pub fn preprocess(original: &str, markup: bool) -> Result<Preprocessed> {
    let chars: Vec<char> = original.chars().collect();
    let mut builder = Builder::with_capacity(original.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if markup && ch == '<' {
            if let Some((len, replacement)) = scan_markup(&chars[i..]) {
                builder.replace(len, replacement)?;
                i += len;
                continue;
            }
        } else if markup && ch == '&' {
            if let Some((len, decoded)) = scan_reference(&chars[i..]) {
                builder.replace(len, &decoded)?;
                i += len;
                continue;
            }
        } else if ch == '\r' && chars.get(i + 1) == Some(&'\n') {
            builder.replace(2, "\n")?;
            i += 2;
            continue;
        }
        builder.keep(ch);
        i += 1;
    }

    builder.finish()
}

/// Whether content should be treated as markup when the locator gives no hint
pub fn sniff_markup(content: &str) -> bool {
    let head = content.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<?xml")
        || head.starts_with("<!")
        || head
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<html"))
}

struct Builder {
    content: String,
    info: RepositioningInfo,
    original_pos: usize,
    current_pos: usize,
    // (original_pos, current_pos) where the pending unaltered run began
    run_start: Option<(usize, usize)>,
}

impl Builder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            content: String::with_capacity(capacity),
            info: RepositioningInfo::new(),
            original_pos: 0,
            current_pos: 0,
            run_start: None,
        }
    }

    fn keep(&mut self, ch: char) {
        if self.run_start.is_none() {
            self.run_start = Some((self.original_pos, self.current_pos));
        }
        self.content.push(ch);
        self.original_pos += 1;
        self.current_pos += 1;
    }

    fn replace(&mut self, original_len: usize, replacement: &str) -> Result<()> {
        self.flush()?;
        let current_len = replacement.chars().count();
        self.info
            .add(self.original_pos, original_len, self.current_pos, current_len)?;
        self.content.push_str(replacement);
        self.original_pos += original_len;
        self.current_pos += current_len;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some((original_start, current_start)) = self.run_start.take() {
            let len = self.current_pos - current_start;
            self.info.add(original_start, len, current_start, len)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Preprocessed> {
        self.flush()?;
        Ok(Preprocessed {
            content: self.content,
            repositioning: self.info,
        })
    }
}

/// Length of the tag, comment or raw-text element at the start of `chars`
/// and what replaces it. `None` when the `<` does not open markup.
fn scan_markup(chars: &[char]) -> Option<(usize, &'static str)> {
    if starts_with(chars, "<!--") {
        let end = find(chars, 4, "-->").map(|at| at + 3).unwrap_or(chars.len());
        return Some((end, ""));
    }

    let second = *chars.get(1)?;
    if !(second.is_ascii_alphabetic() || second == '/' || second == '!' || second == '?') {
        return None;
    }
    let tag_end = chars.iter().take(MAX_TAG_LEN).position(|&c| c == '>')? + 1;

    let name_start = if second == '/' { 2 } else { 1 };
    let name: String = chars[name_start..tag_end]
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if second != '/' && RAW_TEXT_TAGS.contains(&name.as_str()) {
        let closing = format!("</{name}");
        let end = find_ignore_case(chars, tag_end, &closing)
            .and_then(|at| chars[at..].iter().position(|&c| c == '>').map(|p| at + p + 1))
            .unwrap_or(chars.len());
        return Some((end, ""));
    }

    let replacement = if BLOCK_TAGS.contains(&name.as_str()) { "\n" } else { "" };
    Some((tag_end, replacement))
}

/// Length and decoded text of the character reference at the start of `chars`.
///
/// Only a complete token counts: `&#123;`, `&#x1F;` or `&name;`. A bare `&`
/// is ordinary text.
fn scan_reference(chars: &[char]) -> Option<(usize, String)> {
    let body = chars.get(1..)?;
    let len = match body.first()? {
        '#' => match body.get(1)? {
            'x' | 'X' => token_len(&body[2..], |c| c.is_ascii_hexdigit()).map(|n| n + 3)?,
            _ => token_len(&body[1..], |c| c.is_ascii_digit()).map(|n| n + 2)?,
        },
        c if c.is_ascii_alphabetic() => token_len(body, |c| c.is_ascii_alphanumeric()).map(|n| n + 1)?,
        _ => return None,
    };
    // `len` covers `&` through `;`
    if len > MAX_REFERENCE_LEN {
        return None;
    }
    let reference: String = chars[..len].iter().collect();
    let decoded = html_escape::decode_html_entities(&reference);
    if decoded == reference {
        None
    } else {
        Some((len, decoded.into_owned()))
    }
}

/// Length of a non-empty run of `valid` chars followed by `;`, including the `;`
fn token_len(chars: &[char], valid: impl Fn(char) -> bool) -> Option<usize> {
    let run = chars
        .iter()
        .take(MAX_REFERENCE_LEN)
        .take_while(|&&c| valid(c))
        .count();
    (run > 0 && chars.get(run) == Some(&';')).then_some(run + 1)
}

fn starts_with(chars: &[char], needle: &str) -> bool {
    let mut it = chars.iter();
    needle.chars().all(|n| it.next() == Some(&n))
}

fn find(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    (from..chars.len()).find(|&at| starts_with(&chars[at..], needle))
}

fn find_ignore_case(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    (from..chars.len()).find(|&at| {
        let mut it = chars[at..].iter();
        needle
            .chars()
            .all(|n| it.next().is_some_and(|c| c.eq_ignore_ascii_case(&n)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositioning::OffsetMapper;

    fn char_slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let original = "Paris is nice.\nLondon too.";
        let result = preprocess(original, false).unwrap();
        assert_eq!(result.content, original);
        assert!(!result.repositioning.has_alterations());
        assert_eq!(result.repositioning.len(), 1);
    }

    #[test]
    fn test_plain_text_keeps_angle_brackets() {
        let original = "a < b && c > d";
        let result = preprocess(original, false).unwrap();
        assert_eq!(result.content, original);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let original = "Paris\r\nLondon\r\n";
        let result = preprocess(original, false).unwrap();
        assert_eq!(result.content, "Paris\nLondon\n");
        let info = &result.repositioning;
        assert_eq!(info.map_offset(6, false), Some(7));
        assert_eq!(info.map_offset(12, true), Some(13));
    }

    #[test]
    fn test_tags_are_removed_and_mapped() {
        let original = "<p>Ada met <b>Charles</b> in London.</p>";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "\nAda met Charles in London.\n");

        let info = &result.repositioning;
        // "Charles" is processed [9, 16)
        assert_eq!(char_slice(&result.content, 9, 16), "Charles");
        let start = info.map_offset(9, false).unwrap();
        let end = info.map_offset(16, true).unwrap();
        assert_eq!(char_slice(original, start, end), "<b>Charles</b>");

        // "London" is processed [20, 26)
        let start = info.map_offset(20, false).unwrap();
        let end = info.map_offset(26, true).unwrap();
        assert_eq!(char_slice(original, start, end), "London");
    }

    #[test]
    fn test_entities_are_decoded() {
        let original = "<p>Marks &amp; Spencer &copy; caf&eacute; &bogus; AT&T</p>";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "\nMarks & Spencer © café &bogus; AT&T\n");

        let info = &result.repositioning;
        // "café" processed [19, 23)
        assert_eq!(char_slice(&result.content, 19, 23), "café");
        let start = info.map_offset(19, false).unwrap();
        let end = info.map_offset(23, true).unwrap();
        assert_eq!(char_slice(original, start, end), "caf&eacute;");
    }

    #[test]
    fn test_bare_ampersand_before_tags_and_entities() {
        let result = preprocess("<p>Tom & <b>Paris</b>&amp; co</p>", true).unwrap();
        assert_eq!(result.content, "\nTom & Paris& co\n");

        let original = "<p>Tom & <i>and</i> Jerry &copy; co</p>";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "\nTom & and Jerry © co\n");
        assert!(!result.content.contains('<'));

        let original_chars: Vec<char> = original.chars().collect();
        for block in result.repositioning.blocks().iter().filter(|b| !b.is_altered()) {
            let processed = char_slice(&result.content, block.current_pos, block.current_end());
            let source: String = original_chars[block.original_pos..block.original_end()].iter().collect();
            assert_eq!(processed, source);
        }

        // "Jerry" is processed [11, 16)
        assert_eq!(char_slice(&result.content, 11, 16), "Jerry");
        let info = &result.repositioning;
        let start = info.map_offset(11, false).unwrap();
        let end = info.map_offset(16, true).unwrap();
        assert_eq!((start, end), (20, 25));
        assert_eq!(char_slice(original, start, end), "Jerry");
    }

    #[test]
    fn test_only_complete_references_decode() {
        let original = "<p>Marks & Spencer &copy; 2020 &#65;&#x42; & &# &#x; &;</p>";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "\nMarks & Spencer © 2020 AB & &# &#x; &;\n");

        // "Spencer" is processed [9, 16)
        let info = &result.repositioning;
        let start = info.map_offset(9, false).unwrap();
        let end = info.map_offset(16, true).unwrap();
        assert_eq!(char_slice(original, start, end), "Spencer");
    }

    #[test]
    fn test_unclosed_angle_brackets_stay_literal() {
        let original = "<a ".repeat(5_000);
        let result = preprocess(&original, true).unwrap();
        assert_eq!(result.content, original);
        assert!(!result.repositioning.has_alterations());
    }

    #[test]
    fn test_comments_scripts_and_styles_are_dropped() {
        let original = "<html><head><style>p { color: red }</style><script>var x = '<b>';</SCRIPT></head>\
                        <body><!-- hidden Paris -->Rome</body></html>";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "Rome");
        let info = &result.repositioning;
        let start = info.map_offset(0, false).unwrap();
        let end = info.map_offset(4, true).unwrap();
        assert!(char_slice(original, start, end).ends_with("Rome</body></html>"));
    }

    #[test]
    fn test_unterminated_markup_is_kept() {
        let original = "1 <2 and x<y";
        let result = preprocess(original, true).unwrap();
        assert_eq!(result.content, "1 <2 and x<y");
    }

    #[test]
    fn test_every_unaltered_char_maps_to_itself() {
        let original = "<div>Zoë &amp; <i>Zürich</i>\r\nend</div>";
        let result = preprocess(original, true).unwrap();
        let original_chars: Vec<char> = original.chars().collect();
        for block in result.repositioning.blocks() {
            if block.is_altered() {
                continue;
            }
            let processed = char_slice(&result.content, block.current_pos, block.current_end());
            let source: String = original_chars[block.original_pos..block.original_end()].iter().collect();
            assert_eq!(processed, source);
        }
        // Blocks cover both texts end to end
        let last = result.repositioning.blocks().last().unwrap();
        assert_eq!(last.original_end(), original_chars.len());
        assert_eq!(last.current_end(), result.content.chars().count());
    }

    #[test]
    fn test_sniff_markup() {
        assert!(sniff_markup("<!DOCTYPE html><html></html>"));
        assert!(sniff_markup("  <?xml version=\"1.0\"?><doc/>"));
        assert!(sniff_markup("\u{feff}<HTML>"));
        assert!(!sniff_markup("Paris is nice."));
        assert!(!sniff_markup("<3 Paris"));
    }
}
