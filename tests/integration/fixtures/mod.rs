// Input documents with known highlighted outputs for the built-in gazetteer
// WHY: Golden-file testing requires deterministic input/output pairs for validation

#![allow(dead_code)]

/// HTML page whose entities sit next to removed tags and decoded references
pub const HTML_STORY: &str = "<html><head><title>Visit</title></head>\n\
<body><p>Ada Lovelace wrote from <b>London</b> &amp; Paris.</p></body></html>";

/// Highlighted HTML_STORY. Spans wrap the inline tags around an entity
/// instead of splitting them.
pub const HTML_STORY_EXPECTED: &str = "<html><head><title>Visit</title></head>\n\
<body><p><span id=\"2\" title=\"Person\" style=\"highlight\">Ada Lovelace</span> wrote from \
<span id=\"0\" title=\"Location\" style=\"highlight\"><b>London</b></span> &amp; \
<span id=\"1\" title=\"Location\" style=\"highlight\">Paris</span>.</p></body></html>";

/// Plain text with Windows line endings and a Person overlapping a Location
pub const PLAIN_STORY: &str =
    "Charles Babbage met Ada Lovelace in London.\r\nThey spoke of Paris Hilton.";

/// Highlighted PLAIN_STORY; the longer "Paris Hilton" beats "Paris"
pub const PLAIN_STORY_EXPECTED: &str = "<span id=\"2\" title=\"Person\" style=\"highlight\">Charles Babbage</span> met \
<span id=\"3\" title=\"Person\" style=\"highlight\">Ada Lovelace</span> in \
<span id=\"0\" title=\"Location\" style=\"highlight\">London</span>.\r\n\
They spoke of <span id=\"4\" title=\"Person\" style=\"highlight\">Paris Hilton</span>.";

/// Custom gazetteer covering a type outside the default selection
pub const CUSTOM_GAZETTEER: &str = r#"
case_insensitive = true

[lists]
Location = ["Sheffield"]
Organization = ["University of Sheffield"]
Person = ["Hamish Cunningham"]
"#;

/// Text for CUSTOM_GAZETTEER
pub const CUSTOM_STORY: &str = "hamish cunningham works at the University of Sheffield.";
