//! # Text Normalization
//!
//! Both sides of a relevance comparison go through [`prepare`]: normalize,
//! then truncate to a character budget. The raw input is first cut to a
//! fixed multiple of the budget so the work done per page is bounded no
//! matter how large the fetched body was.
//!
//! [`extract_text`] turns a fetched HTML body into its visible text with the
//! html5ever tokenizer before it reaches the relevance verifier.

use std::sync::OnceLock;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use regex::Regex;

/// Raw characters read per budgeted output character in [`prepare`].
pub const PREPARE_INPUT_FACTOR: usize = 8;

fn line_break() -> &'static Regex {
    static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
    LINE_BREAK.get_or_init(|| Regex::new(r"<br\s*/?>").expect("line break regex is valid"))
}

/// Lower-case, turn `<br>`, `<br/>` and `<br />` into spaces, collapse
/// whitespace runs. One linear pass: a break spliced together by removing
/// another one is left as text.
pub fn normalize_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let spaced = line_break().replace_all(&lower, " ");
    collapse_whitespace(&spaced)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cap the input, normalize, then truncate to `max_chars`.
pub fn prepare(text: &str, max_chars: usize) -> String {
    let bounded = truncate_chars(text, max_chars.saturating_mul(PREPARE_INPUT_FACTOR));
    let normalized = normalize_text(bounded);
    truncate_chars(&normalized, max_chars).trim_end().to_string()
}

/// Collects character data outside `<script>` and `<style>`. Every tag
/// contributes a space so adjacent elements do not fuse words.
#[derive(Default)]
struct TextSink {
    text: String,
    in_raw: bool,
}

impl TokenSink for TextSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chars) => {
                if !self.in_raw {
                    self.text.push_str(&chars);
                }
            }
            Token::TagToken(tag) => {
                self.text.push(' ');
                let name: &str = &tag.name;
                let raw = match name {
                    "script" => Some(RawKind::ScriptData),
                    "style" => Some(RawKind::Rawtext),
                    _ => None,
                };
                match (tag.kind, raw) {
                    (TagKind::StartTag, Some(kind)) if !tag.self_closing => {
                        self.in_raw = true;
                        return TokenSinkResult::RawData(kind);
                    }
                    (TagKind::EndTag, Some(_)) => self.in_raw = false,
                    _ => {}
                }
            }
            Token::CommentToken(_)
            | Token::DoctypeToken(_)
            | Token::NullCharacterToken
            | Token::EOFToken
            | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

/// Visible text of an HTML body: tags and comments dropped, `<script>` and
/// `<style>` bodies skipped, named and numeric character references decoded.
/// Plain text passes through unchanged apart from entity decoding.
pub fn extract_text(html: &str) -> String {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(TextSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    std::mem::take(&mut tokenizer.sink.text)
}
