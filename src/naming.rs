//! Output filename templating.
//!
//! Every converted file gets its name from a template such as `%b_%x_%y%e`.
//! The template is expanded against a small per-file context of tokens:
//!
//! | Token | Value |
//! |-------|-------|
//! | `%b` | source basename without extension (`photo` for `img/photo.png`) |
//! | `%e` | output extension including the dot (`.jpg`) |
//! | `%x` | width: the requested resize width, or the encoded width |
//! | `%y` | height: the requested resize height, or the encoded height |
//!
//! ## Substitution Rules
//!
//! Each token replaces only its *first* occurrence, tokens are applied in the
//! context's insertion order, and text produced by an earlier substitution is
//! never scanned again. There is no escaping: a literal `%b` cannot be written.
//!
//! - `"%b_%x_%y%e"` + `{%b: photo, %x: 100, %y: 50, %e: .jpg}` → `photo_100_50.jpg`
//! - `"%b%e"` + `{%b: photo, %e: .webp}` → `photo.webp`
//! - `"%b-%b%e"` + `{%b: a, %e: .png}` → `a-%b.png` (second `%b` untouched)

/// Default template when the pass resizes: `<basename>_<width>_<height><ext>`.
pub const RESIZED_NAME_FORMAT: &str = "%b_%x_%y%e";

/// Default template when the pass does not resize: `<basename><ext>`.
pub const PLAIN_NAME_FORMAT: &str = "%b%e";

/// A substitution token recognised by [`assemble_filename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Basename,
    Extension,
    Width,
    Height,
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            Token::Basename => "%b",
            Token::Extension => "%e",
            Token::Width => "%x",
            Token::Height => "%y",
        }
    }
}

/// Ordered token → value mapping for one file.
///
/// Setting a token twice overwrites its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    entries: Vec<(Token, String)>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, token: Token, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
        self
    }

    pub fn get(&self, token: Token) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.entries.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

/// Pick the template for a pass: the explicit one, or the default for
/// whether the pass resizes.
pub fn default_name_format(explicit: Option<&str>, resizing: bool) -> &str {
    match explicit {
        Some(format) => format,
        None if resizing => RESIZED_NAME_FORMAT,
        None => PLAIN_NAME_FORMAT,
    }
}

/// A piece of the template during expansion. Substituted pieces are frozen.
enum Segment<'a> {
    Template(&'a str),
    Substituted(&'a str),
}

/// Expand `format` against `context`. See the [module docs](self) for rules.
pub fn assemble_filename(format: &str, context: &TemplateContext) -> String {
    let mut segments = vec![Segment::Template(format)];

    for (token, value) in context.iter() {
        let needle = token.as_str();
        let hit = segments.iter().enumerate().find_map(|(i, seg)| match seg {
            Segment::Template(text) => text.find(needle).map(|pos| (i, *text, pos)),
            Segment::Substituted(_) => None,
        });
        if let Some((i, text, pos)) = hit {
            log::debug!("Replacing {needle} with {value}");
            let before = &text[..pos];
            let after = &text[pos + needle.len()..];
            segments.splice(
                i..=i,
                [
                    Segment::Template(before),
                    Segment::Substituted(value),
                    Segment::Template(after),
                ],
            );
        }
    }

    segments
        .iter()
        .map(|seg| match seg {
            Segment::Template(text) | Segment::Substituted(text) => *text,
        })
        .collect()
}
