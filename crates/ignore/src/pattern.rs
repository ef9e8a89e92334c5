/*!
Compiles a single gitignore-syntax line into a matchable [`Pattern`].

The compiled form is a plain anchored regex built by a two-stage
placeholder scheme: the line is first tokenized into fragments that already
know their final meaning (a literal character, a `*`, a `**` of one of its
four flavors, a character class, ...), and only then is each fragment
rendered to its regex text. Doing it in one pass — substituting text
directly — would let an escaped `\*` be re-interpreted by the wildcard
rule, or let a bare `**` be eaten by the `*` rule before its own semantics
are decided. Tokenizing first and rendering second keeps those stages from
interfering with each other.
*/

use regex::Regex;

/// Where a pattern came from, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provenance {
    /// A human-readable descriptor of the source: a file path, or a
    /// synthetic name like `"<cli>"` for caller-supplied patterns.
    pub source: String,
    /// 1-based line number within the source, or 0 if not applicable.
    pub line_number: u64,
}

impl Provenance {
    pub fn new(source: impl Into<String>, line_number: u64) -> Provenance {
        Provenance { source: source.into(), line_number }
    }
}

/// A single compiled gitignore pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    source_text: String,
    is_negation: bool,
    is_directory_only: bool,
    is_anchored: bool,
    base_directory: String,
    provenance: Provenance,
    matcher: Regex,
}

impl Pattern {
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn is_negation(&self) -> bool {
        self.is_negation
    }

    pub fn is_directory_only(&self) -> bool {
        self.is_directory_only
    }

    pub fn is_anchored(&self) -> bool {
        self.is_anchored
    }

    pub fn base_directory(&self) -> &str {
        &self.base_directory
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Tests this pattern against a forward-slash, root-relative path with
    /// no leading slash.
    pub fn matches(&self, path: &str, is_directory: bool) -> bool {
        if self.is_directory_only && !is_directory {
            return false;
        }
        let remainder = if self.base_directory.is_empty() {
            path
        } else if path == self.base_directory {
            ""
        } else if let Some(rest) = path
            .strip_prefix(self.base_directory.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            rest
        } else {
            return false;
        };
        self.matcher.is_match(remainder)
    }
}

/// Compiles one raw gitignore line. Returns `None` if the line is blank or
/// a comment once normalized; otherwise returns the compiled pattern.
///
/// `base_directory` is the path (forward-slash, relative to the repo root,
/// no trailing slash) of the `.gitignore` that contains this line, or the
/// empty string for root-level, additional, or exclude-file patterns.
pub fn compile(
    raw_line: &str,
    source: impl Into<String>,
    line_number: u64,
    base_directory: &str,
) -> Option<Pattern> {
    // Step 1: comment / blank line detection, with `\#` as an escape hatch.
    let after_leading_space = raw_line.trim_start_matches(' ');
    if after_leading_space.is_empty() {
        return None;
    }
    let mut body = if let Some(rest) = after_leading_space.strip_prefix("\\#") {
        format!("#{rest}")
    } else if after_leading_space.starts_with('#') {
        return None;
    } else {
        after_leading_space.to_string()
    };

    // Step 2: trailing whitespace, preserving escaped trailing spaces.
    body = strip_trailing_spaces(&body);
    if body.is_empty() {
        return None;
    }

    let source_text = body.clone();

    // Step 3: negation, with `\!` as an escape hatch.
    let mut is_negation = false;
    if let Some(rest) = body.strip_prefix("\\!") {
        body = format!("!{rest}");
    } else if let Some(rest) = body.strip_prefix('!') {
        is_negation = true;
        body = rest.to_string();
    }
    if body.is_empty() {
        return None;
    }

    // Step 4: directory-only trailing slash.
    let is_directory_only = if body.ends_with('/') {
        body.pop();
        true
    } else {
        false
    };
    if body.is_empty() {
        // A bare "/" pattern matches nothing.
        return None;
    }

    // Step 5: anchoring.
    let is_anchored = if let Some(rest) = body.strip_prefix('/') {
        body = rest.to_string();
        true
    } else {
        body.contains('/')
    };

    // Step 6: tokenize, then render to a regex body.
    let tokens = tokenize(&body);
    let mut regex_body = String::new();
    for token in &tokens {
        render(token, &mut regex_body);
    }

    // Step 7: anchor the final regex.
    let full_regex = if is_anchored {
        format!("^{regex_body}$")
    } else {
        format!("^(?:.*/)?{regex_body}$")
    };

    let matcher = match Regex::new(&full_regex) {
        Ok(re) => re,
        Err(_) => {
            // Our own translation should always produce a valid regex; if it
            // somehow doesn't, fall back to a pattern that matches nothing
            // rather than aborting the whole gitignore file.
            log::warn!(
                "skipping unparseable gitignore pattern {source_text:?} ({full_regex:?})"
            );
            return None;
        }
    };

    Some(Pattern {
        source_text,
        is_negation,
        is_directory_only,
        is_anchored,
        base_directory: base_directory.to_string(),
        provenance: Provenance::new(source, line_number),
        matcher,
    })
}

/// Strips unescaped trailing spaces, preserving one literal space per
/// escaped trailing `\<space>` pair counted from the end.
fn strip_trailing_spaces(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut i = chars.len();
    let mut escaped_spaces = 0usize;
    loop {
        if i >= 2 && chars[i - 2] == '\\' && chars[i - 1] == ' ' {
            escaped_spaces += 1;
            i -= 2;
            continue;
        }
        if i >= 1 && chars[i - 1] == ' ' {
            i -= 1;
            continue;
        }
        break;
    }
    let mut result: String = chars[..i].iter().collect();
    for _ in 0..escaped_spaces {
        result.push(' ');
    }
    result
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    Star,
    Question,
    Class(String),
    /// `**/` at the very start of the pattern.
    AnyDepthPrefix,
    /// `/**/` occurring strictly between the start and end.
    AnyDirsMiddle,
    /// `/**` at the very end of the pattern.
    AnyDirsSuffix,
    /// Any other occurrence of `**`.
    AnyChars,
}

fn tokenize(body: &str) -> Vec<Token> {
    let chars: Vec<char> = body.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        if i == 0 && starts_with_at(&chars, 0, "**/") {
            tokens.push(Token::AnyDepthPrefix);
            i += 3;
            continue;
        }
        if starts_with_at(&chars, i, "/**/") {
            tokens.push(Token::AnyDirsMiddle);
            i += 4;
            continue;
        }
        if i + 3 == len && starts_with_at(&chars, i, "/**") {
            tokens.push(Token::AnyDirsSuffix);
            i += 3;
            continue;
        }
        if starts_with_at(&chars, i, "**") {
            tokens.push(Token::AnyChars);
            i += 2;
            continue;
        }
        match chars[i] {
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            '[' => match scan_class(&chars, i) {
                Some((class, next)) => {
                    tokens.push(Token::Class(class));
                    i = next;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            '\\' => {
                if i + 1 < len {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                } else {
                    tokens.push(Token::Literal('\\'));
                    i += 1;
                }
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }
    tokens
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    if at + needle.len() > chars.len() {
        return false;
    }
    chars[at..at + needle.len()] == needle[..]
}

/// Scans a `[...]` character class starting at `chars[start] == '['`.
/// Returns the verbatim regex class text (including brackets) and the index
/// just past the closing `]`, or `None` if unterminated.
fn scan_class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let len = chars.len();
    let mut i = start + 1;
    let mut negated = false;
    if i < len && chars[i] == '!' {
        negated = true;
        i += 1;
    }
    // A ']' immediately after '[' (or '[!') is a literal member, not the
    // closing bracket. Escape it explicitly rather than relying on its
    // position, since the regex crate doesn't special-case that.
    let mut leading_bracket = false;
    if i < len && chars[i] == ']' {
        leading_bracket = true;
        i += 1;
    }
    let body_start = i;
    while i < len && chars[i] != ']' {
        i += 1;
    }
    if i >= len {
        return None;
    }
    let rest: String = chars[body_start..i].iter().collect();
    let mut body = String::new();
    if negated {
        body.push('^');
    }
    if leading_bracket {
        body.push_str("\\]");
    }
    body.push_str(&rest);
    Some((format!("[{body}]"), i + 1))
}

fn render(token: &Token, out: &mut String) {
    match token {
        Token::Literal(c) => render_literal(*c, out),
        Token::Star => out.push_str("[^/]*"),
        Token::Question => out.push_str("[^/]"),
        Token::Class(class) => out.push_str(class),
        Token::AnyDepthPrefix => out.push_str("(?:.*/)?"),
        Token::AnyDirsMiddle => out.push_str("/(?:[^/]+/)*"),
        Token::AnyDirsSuffix => out.push_str("/.*"),
        Token::AnyChars => out.push_str(".*"),
    }
}

fn render_literal(c: char, out: &mut String) {
    const REGEX_META: &str = ".+^$()[]{}|\\*?";
    if REGEX_META.contains(c) {
        out.push('\\');
    }
    out.push(c);
}
