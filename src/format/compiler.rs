//! Format compilation and rendering.
//!
//! A template is scanned once for `:name` or `:name[arg]` markers, where
//! `name` is two or more of `[A-Za-z0-9_-]` and `arg` is one or more
//! characters other than `]`. Everything else is kept verbatim, including a
//! `:` that does not start a valid name and a `[` that is never closed.

use std::fmt;

use crate::format::{FormatError, FormatSpec, Token};
use crate::http::{RequestContext, ResponseView};

/// Rendered in place of a token with no value.
pub const EMPTY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token(Token),
}

/// A format compiled into segments, reused for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormat {
    segments: Vec<Segment>,
}

impl CompiledFormat {
    pub fn compile(template: &str) -> Result<Self, FormatError> {
        let bytes = template.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b':' {
                i += 1;
                continue;
            }

            let name_start = i + 1;
            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            if name_end - name_start < 2 {
                i += 1;
                continue;
            }

            let mut end = name_end;
            let mut arg = None;
            if bytes.get(name_end) == Some(&b'[') {
                let arg_start = name_end + 1;
                if let Some(len) = template[arg_start..].find(']') {
                    if len > 0 {
                        arg = Some(&template[arg_start..arg_start + len]);
                        end = arg_start + len + 1;
                    }
                }
            }

            let token = Token::parse(&template[name_start..name_end], arg)?;
            if literal_start < i {
                segments.push(Segment::Literal(template[literal_start..i].to_string()));
            }
            segments.push(Segment::Token(token));

            i = end;
            literal_start = end;
        }

        if literal_start < bytes.len() {
            segments.push(Segment::Literal(template[literal_start..].to_string()));
        }

        Ok(Self { segments })
    }

    pub fn from_spec(spec: &FormatSpec) -> Result<Self, FormatError> {
        Self::compile(spec.template())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(token) => Some(token),
            Segment::Literal(_) => None,
        })
    }

    /// Render one line, without the trailing newline.
    pub fn render(&self, request: &RequestContext, response: &ResponseView) -> String {
        let mut line = String::with_capacity(128);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Token(token) => match token.extract(request, response) {
                    Some(value) if !value.is_empty() => line.push_str(&value),
                    _ => line.push_str(EMPTY),
                },
            }
        }
        line
    }
}

impl fmt::Display for CompiledFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Token(token) => write!(f, "{}", token)?,
            }
        }
        Ok(())
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}
