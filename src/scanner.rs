use std::collections::VecDeque;

use crate::chars::{
    as_digit, as_hex, is_alpha, is_blank, is_blankz, is_bom, is_break, is_breakz, is_digit,
    is_flow_indicator, is_hex, is_space, is_tab, is_uri_char,
};
use crate::reader::Reader;
use crate::token::{Token, TokenData};
use crate::{Mark, ScalarStyle, ScannerError};

/// The longest a simple key may run, in characters.
const MAX_SIMPLE_KEY_LENGTH: u64 = 1024;

/// A potential simple key, recorded until the scanner sees whether a `:`
/// follows it on the same line.
#[derive(Copy, Clone, Default)]
struct SimpleKey {
    /// Is a simple key possible here?
    possible: bool,
    /// Must this position be a key (leftmost column of a block mapping)?
    required: bool,
    /// The queue position a KEY token would be inserted at.
    token_number: usize,
    /// Where the candidate starts.
    mark: Mark,
}

/// The tokenizer.
///
/// Tokens come out in source order except for KEY and BLOCK-MAPPING-START,
/// which are inserted retroactively into the queue once a `:` proves that a
/// previously scanned node was a mapping key. Consumers only ever see the
/// queue through [`Scanner::peek`]/[`Scanner::pop`], after insertions have
/// settled.
pub struct Scanner {
    reader: Reader,
    pub(crate) tokens: VecDeque<Token>,
    /// Number of tokens already handed out; queue indices are relative to it.
    pub(crate) tokens_taken: usize,
    pub(crate) token_available: bool,
    pub(crate) stream_start_produced: bool,
    pub(crate) stream_end_produced: bool,
    /// Nesting depth of `[...]` and `{...}`.
    flow_level: usize,
    /// The current block-context indentation column; -1 before the stream
    /// settles.
    indent: i64,
    indents: Vec<i64>,
    simple_key_allowed: bool,
    /// One entry per flow level, plus one for block context.
    simple_keys: Vec<SimpleKey>,
}

impl Scanner {
    pub fn new(reader: Reader) -> Self {
        Self {
            reader,
            tokens: VecDeque::with_capacity(16),
            tokens_taken: 0,
            token_available: false,
            stream_start_produced: false,
            stream_end_produced: false,
            flow_level: 0,
            indent: -1,
            indents: Vec::with_capacity(16),
            simple_key_allowed: false,
            simple_keys: Vec::with_capacity(16),
        }
    }

    /// The next token, without consuming it.
    pub fn peek(&mut self) -> Result<&Token, ScannerError> {
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        Ok(self.tokens.front().expect("token queue is empty"))
    }

    pub(crate) fn peek_mut(&mut self) -> Result<&mut Token, ScannerError> {
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        Ok(self.tokens.front_mut().expect("token queue is empty"))
    }

    /// Consume and return the next token.
    pub fn pop(&mut self) -> Result<Token, ScannerError> {
        if self.stream_end_produced {
            return Ok(Token::new(
                TokenData::StreamEnd,
                self.reader.mark(),
                self.reader.mark(),
            ));
        }
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        let token = self.tokens.pop_front().expect("token queue is empty");
        self.token_available = false;
        self.tokens_taken += 1;
        if let TokenData::StreamEnd = &token.data {
            self.stream_end_produced = true;
        }
        Ok(token)
    }

    /// Discard the token at the head of the queue.
    pub(crate) fn skip_token(&mut self) {
        self.token_available = false;
        self.tokens_taken += 1;
        let skipped = self.tokens.pop_front().expect("token queue is empty");
        if let TokenData::StreamEnd = &skipped.data {
            self.stream_end_produced = true;
        }
    }

    /// Whether the next token satisfies `pred`.
    pub fn check(&mut self, pred: impl FnOnce(&TokenData) -> bool) -> Result<bool, ScannerError> {
        Ok(pred(&self.peek()?.data))
    }

    fn error<T>(
        &self,
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
    ) -> Result<T, ScannerError> {
        Err(ScannerError::Problem {
            context,
            context_mark,
            problem,
            problem_mark: self.reader.mark(),
        })
    }

    /// Fetch tokens until the head of the queue is settled: the queue must be
    /// non-empty, and no recorded simple-key candidate may still point at its
    /// head (a later `:` could still insert a KEY token there).
    pub(crate) fn fetch_more_tokens(&mut self) -> Result<(), ScannerError> {
        loop {
            let mut need_more_tokens = self.tokens.is_empty();
            if !need_more_tokens {
                self.stale_simple_keys()?;
                for simple_key in &self.simple_keys {
                    if simple_key.possible && simple_key.token_number == self.tokens_taken {
                        need_more_tokens = true;
                        break;
                    }
                }
            }
            if !need_more_tokens {
                break;
            }
            self.fetch_next_token()?;
        }
        self.token_available = true;
        Ok(())
    }

    fn fetch_next_token(&mut self) -> Result<(), ScannerError> {
        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }
        self.scan_to_next_token()?;
        self.stale_simple_keys()?;
        self.unroll_indent(self.reader.mark().column as i64);

        if self.reader.is_empty() {
            return self.fetch_stream_end();
        }

        let at_column_zero = self.reader.mark().column == 0;
        if at_column_zero && self.reader.peek(0) == Some('%') {
            return self.fetch_directive();
        }
        if at_column_zero
            && self.reader.peek(0) == Some('-')
            && self.reader.peek(1) == Some('-')
            && self.reader.peek(2) == Some('-')
            && is_blankz(self.reader.peek(3))
        {
            return self.fetch_document_indicator(TokenData::DocumentStart);
        }
        if at_column_zero
            && self.reader.peek(0) == Some('.')
            && self.reader.peek(1) == Some('.')
            && self.reader.peek(2) == Some('.')
            && is_blankz(self.reader.peek(3))
        {
            return self.fetch_document_indicator(TokenData::DocumentEnd);
        }

        let ch = self.reader.peek(0).expect("input checked non-empty");
        let next = self.reader.peek(1);
        match ch {
            '[' => self.fetch_flow_collection_start(TokenData::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenData::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenData::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenData::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if is_blankz(next) => self.fetch_block_entry(),
            '?' if self.flow_level > 0 || is_blankz(next) => self.fetch_key(),
            ':' if self.flow_level > 0 || is_blankz(next) => self.fetch_value(),
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(true),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(false),
            '\'' => self.fetch_flow_scalar(true),
            '"' => self.fetch_flow_scalar(false),
            _ => {
                let plain = !matches!(
                    ch,
                    '-' | '?'
                        | ':'
                        | ','
                        | '['
                        | ']'
                        | '{'
                        | '}'
                        | '#'
                        | '&'
                        | '*'
                        | '!'
                        | '|'
                        | '>'
                        | '\''
                        | '"'
                        | '%'
                        | '@'
                        | '`'
                ) && !is_blankz(ch)
                    || ch == '-' && !is_blank(next)
                    || self.flow_level == 0 && matches!(ch, '?' | ':') && !is_blankz(next);
                if plain {
                    self.fetch_plain_scalar()
                } else {
                    self.error(
                        "while scanning for the next token",
                        self.reader.mark(),
                        "found character that cannot start any token",
                    )
                }
            }
        }
    }

    /// Invalidate simple-key candidates that can no longer be keys: the line
    /// moved on, or the candidate grew past the length limit. A required
    /// candidate going stale means the document was missing its `:`.
    fn stale_simple_keys(&mut self) -> Result<(), ScannerError> {
        let current = self.reader.mark();
        for simple_key in &mut self.simple_keys {
            let mark = simple_key.mark;
            if simple_key.possible
                && (mark.line < current.line || mark.index + MAX_SIMPLE_KEY_LENGTH < current.index)
            {
                if simple_key.required {
                    return Err(ScannerError::Problem {
                        context: "while scanning a simple key",
                        context_mark: mark,
                        problem: "could not find expected ':'",
                        problem_mark: current,
                    });
                }
                simple_key.possible = false;
            }
        }
        Ok(())
    }

    /// Record the upcoming token as a simple-key candidate for the current
    /// flow level.
    fn save_simple_key(&mut self) -> Result<(), ScannerError> {
        let required =
            self.flow_level == 0 && self.indent == self.reader.mark().column as i64;
        if self.simple_key_allowed {
            let simple_key = SimpleKey {
                possible: true,
                required,
                token_number: self.tokens_taken + self.tokens.len(),
                mark: self.reader.mark(),
            };
            self.remove_simple_key()?;
            *self.simple_keys.last_mut().unwrap() = simple_key;
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<(), ScannerError> {
        let simple_key = self.simple_keys.last_mut().unwrap();
        if simple_key.possible && simple_key.required {
            let mark = simple_key.mark;
            return Err(ScannerError::Problem {
                context: "while scanning a simple key",
                context_mark: mark,
                problem: "could not find expected ':'",
                problem_mark: self.reader.mark(),
            });
        }
        simple_key.possible = false;
        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.simple_keys.push(SimpleKey::default());
        self.flow_level += 1;
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level > 0 {
            self.flow_level -= 1;
            let _ = self.simple_keys.pop();
        }
    }

    /// Push the current indent and emit a collection-start token when the
    /// column increases. `number` places the token retroactively into the
    /// queue; `None` appends.
    fn roll_indent(&mut self, column: i64, number: Option<usize>, data: TokenData, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }
        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;
            let token = Token::new(data, mark, mark);
            match number {
                Some(number) => self.tokens.insert(number - self.tokens_taken, token),
                None => self.tokens.push_back(token),
            }
        }
    }

    /// Pop indentation levels above `column`, emitting a BLOCK-END for each.
    fn unroll_indent(&mut self, column: i64) {
        if self.flow_level > 0 {
            return;
        }
        while self.indent > column {
            let mark = self.reader.mark();
            self.tokens
                .push_back(Token::new(TokenData::BlockEnd, mark, mark));
            self.indent = self.indents.pop().unwrap();
        }
    }

    fn fetch_stream_start(&mut self) {
        let mark = self.reader.mark();
        self.indent = -1;
        self.simple_keys.push(SimpleKey::default());
        self.simple_key_allowed = true;
        self.stream_start_produced = true;
        self.tokens.push_back(Token::new(
            TokenData::StreamStart {
                encoding: self.reader.encoding(),
            },
            mark,
            mark,
        ));
    }

    fn fetch_stream_end(&mut self) -> Result<(), ScannerError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let mut mark = self.reader.mark();
        if mark.column != 0 {
            mark.column = 0;
            mark.line += 1;
        }
        self.tokens
            .push_back(Token::new(TokenData::StreamEnd, mark, mark));
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<(), ScannerError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        if let Some(token) = self.scan_directive()? {
            self.tokens.push_back(token);
        }
        Ok(())
    }

    fn fetch_document_indicator(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start_mark = self.reader.mark();
        self.reader.skip();
        self.reader.skip();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token::new(data, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token::new(data, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token::new(data, start_mark, end_mark));
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenData::FlowEntry, start_mark, end_mark));
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<(), ScannerError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return self.error(
                    "",
                    self.reader.mark(),
                    "block sequence entries are not allowed in this context",
                );
            }
            let mark = self.reader.mark();
            self.roll_indent(
                mark.column as i64,
                None,
                TokenData::BlockSequenceStart,
                mark,
            );
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenData::BlockEntry, start_mark, end_mark));
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<(), ScannerError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return self.error(
                    "",
                    self.reader.mark(),
                    "mapping keys are not allowed in this context",
                );
            }
            let mark = self.reader.mark();
            self.roll_indent(mark.column as i64, None, TokenData::BlockMappingStart, mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenData::Key, start_mark, end_mark));
        Ok(())
    }

    /// `:` after a recorded simple key retroactively inserts a KEY token
    /// (and, at a new column, a BLOCK-MAPPING-START) before the recorded
    /// position.
    fn fetch_value(&mut self) -> Result<(), ScannerError> {
        let simple_key = self.simple_keys.last_mut().unwrap();
        if simple_key.possible {
            let token_number = simple_key.token_number;
            let mark = simple_key.mark;
            simple_key.possible = false;
            self.tokens.insert(
                token_number - self.tokens_taken,
                Token::new(TokenData::Key, mark, mark),
            );
            self.roll_indent(
                mark.column as i64,
                Some(token_number),
                TokenData::BlockMappingStart,
                mark,
            );
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return self.error(
                        "",
                        self.reader.mark(),
                        "mapping values are not allowed in this context",
                    );
                }
                let mark = self.reader.mark();
                self.roll_indent(mark.column as i64, None, TokenData::BlockMappingStart, mark);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenData::Value, start_mark, end_mark));
        Ok(())
    }

    fn fetch_anchor(&mut self, alias: bool) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_anchor(alias)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_tag()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let token = self.scan_block_scalar(literal)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_flow_scalar(single)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_plain_scalar()?;
        self.tokens.push_back(token);
        Ok(())
    }

    /// Skip whitespace and comments up to the next significant character.
    /// Line breaks in block context re-allow simple keys.
    fn scan_to_next_token(&mut self) -> Result<(), ScannerError> {
        loop {
            if self.reader.mark().column == 0 && is_bom(self.reader.peek(0)) {
                self.reader.skip();
            }
            while is_space(self.reader.peek(0))
                || (self.flow_level > 0 || !self.simple_key_allowed)
                    && is_tab(self.reader.peek(0))
            {
                self.reader.skip();
            }
            if self.reader.peek(0) == Some('#') {
                while !is_breakz(self.reader.peek(0)) {
                    self.reader.skip();
                }
            }
            if !is_break(self.reader.peek(0)) {
                break;
            }
            self.reader.skip_break();
            if self.flow_level == 0 {
                self.simple_key_allowed = true;
            }
        }
        Ok(())
    }

    /// Scan a `%YAML` or `%TAG` directive. Unknown directives are skipped
    /// with a warning and produce no token.
    fn scan_directive(&mut self) -> Result<Option<Token>, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.skip();
        let name = self.scan_directive_name(start_mark)?;
        let data = if name == "YAML" {
            let (major, minor) = self.scan_version_directive_value(start_mark)?;
            Some(TokenData::VersionDirective { major, minor })
        } else if name == "TAG" {
            let (handle, prefix) = self.scan_tag_directive_value(start_mark)?;
            Some(TokenData::TagDirective { handle, prefix })
        } else {
            log::warn!("ignoring unknown directive %{name} at {start_mark}");
            while !is_breakz(self.reader.peek(0)) {
                self.reader.skip();
            }
            None
        };
        let end_mark = self.reader.mark();

        while is_blank(self.reader.peek(0)) {
            self.reader.skip();
        }
        if self.reader.peek(0) == Some('#') {
            while !is_breakz(self.reader.peek(0)) {
                self.reader.skip();
            }
        }
        if !is_breakz(self.reader.peek(0)) {
            return self.error(
                "while scanning a directive",
                start_mark,
                "did not find expected comment or line break",
            );
        }
        if is_break(self.reader.peek(0)) {
            self.reader.skip_break();
        }
        Ok(data.map(|data| Token::new(data, start_mark, end_mark)))
    }

    fn scan_directive_name(&mut self, start_mark: Mark) -> Result<String, ScannerError> {
        let mut string = String::new();
        while is_alpha(self.reader.peek(0)) {
            self.reader.read(&mut string);
        }
        if string.is_empty() {
            self.error(
                "while scanning a directive",
                start_mark,
                "could not find expected directive name",
            )
        } else if !is_blankz(self.reader.peek(0)) {
            self.error(
                "while scanning a directive",
                start_mark,
                "found unexpected non-alphabetical character",
            )
        } else {
            Ok(string)
        }
    }

    fn scan_version_directive_value(
        &mut self,
        start_mark: Mark,
    ) -> Result<(i32, i32), ScannerError> {
        while is_blank(self.reader.peek(0)) {
            self.reader.skip();
        }
        let major = self.scan_version_directive_number(start_mark)?;
        if self.reader.peek(0) != Some('.') {
            return self.error(
                "while scanning a %YAML directive",
                start_mark,
                "did not find expected digit or '.' character",
            );
        }
        self.reader.skip();
        let minor = self.scan_version_directive_number(start_mark)?;
        Ok((major, minor))
    }

    fn scan_version_directive_number(&mut self, start_mark: Mark) -> Result<i32, ScannerError> {
        const MAX_NUMBER_LENGTH: usize = 9;
        let mut value: i32 = 0;
        let mut length = 0;
        while is_digit(self.reader.peek(0)) {
            length += 1;
            if length > MAX_NUMBER_LENGTH {
                return self.error(
                    "while scanning a %YAML directive",
                    start_mark,
                    "found extremely long version number",
                );
            }
            let digit = as_digit(self.reader.peek(0).unwrap());
            value = value * 10 + digit as i32;
            self.reader.skip();
        }
        if length == 0 {
            return self.error(
                "while scanning a %YAML directive",
                start_mark,
                "did not find expected version number",
            );
        }
        Ok(value)
    }

    fn scan_tag_directive_value(
        &mut self,
        start_mark: Mark,
    ) -> Result<(String, String), ScannerError> {
        while is_blank(self.reader.peek(0)) {
            self.reader.skip();
        }
        let handle = self.scan_tag_handle(true, start_mark)?;
        if !is_blank(self.reader.peek(0)) {
            return self.error(
                "while scanning a %TAG directive",
                start_mark,
                "did not find expected whitespace",
            );
        }
        while is_blank(self.reader.peek(0)) {
            self.reader.skip();
        }
        let prefix = self.scan_tag_uri(true, true, None, start_mark)?;
        if !is_blankz(self.reader.peek(0)) {
            return self.error(
                "while scanning a %TAG directive",
                start_mark,
                "did not find expected whitespace or line break",
            );
        }
        Ok((handle, prefix))
    }

    fn scan_anchor(&mut self, alias: bool) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.skip();
        let mut string = String::new();
        while is_alpha(self.reader.peek(0)) {
            self.reader.read(&mut string);
        }
        let end_mark = self.reader.mark();
        let terminated = is_blankz(self.reader.peek(0))
            || matches!(
                self.reader.peek(0),
                Some('?' | ':' | ',' | ']' | '}' | '%' | '@' | '`')
            );
        if string.is_empty() || !terminated {
            return self.error(
                if alias {
                    "while scanning an alias"
                } else {
                    "while scanning an anchor"
                },
                start_mark,
                "did not find expected alphabetic or numeric character",
            );
        }
        let data = if alias {
            TokenData::Alias { value: string }
        } else {
            TokenData::Anchor { value: string }
        };
        Ok(Token::new(data, start_mark, end_mark))
    }

    fn scan_tag(&mut self) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        let mut handle;
        let mut suffix;

        if self.reader.peek(1) == Some('<') {
            // Verbatim form: !<tag:example.org,2002:foo>
            handle = String::new();
            self.reader.skip();
            self.reader.skip();
            suffix = self.scan_tag_uri(true, false, None, start_mark)?;
            if self.reader.peek(0) != Some('>') {
                return self.error(
                    "while scanning a tag",
                    start_mark,
                    "did not find the expected '>'",
                );
            }
            self.reader.skip();
        } else {
            handle = self.scan_tag_handle(false, start_mark)?;
            if handle.starts_with('!') && handle.len() > 1 && handle.ends_with('!') {
                suffix = self.scan_tag_uri(false, false, None, start_mark)?;
            } else {
                // A lone `!foo`: the characters scanned into the handle are
                // really the start of the suffix under the default handle.
                suffix = self.scan_tag_uri(false, false, Some(&handle), start_mark)?;
                handle = String::from("!");
                if suffix.is_empty() {
                    // The non-specific tag `!`.
                    std::mem::swap(&mut handle, &mut suffix);
                }
            }
        }

        if !is_blankz(self.reader.peek(0))
            && (self.flow_level == 0 || !is_flow_indicator(self.reader.peek(0)))
        {
            return self.error(
                "while scanning a tag",
                start_mark,
                "did not find expected whitespace or line break",
            );
        }
        let end_mark = self.reader.mark();
        Ok(Token::new(
            TokenData::Tag { handle, suffix },
            start_mark,
            end_mark,
        ))
    }

    fn scan_tag_handle(&mut self, directive: bool, start_mark: Mark) -> Result<String, ScannerError> {
        let context = if directive {
            "while scanning a tag directive"
        } else {
            "while scanning a tag"
        };
        if self.reader.peek(0) != Some('!') {
            return self.error(context, start_mark, "did not find expected '!'");
        }
        let mut string = String::new();
        self.reader.read(&mut string);
        while is_alpha(self.reader.peek(0)) {
            self.reader.read(&mut string);
        }
        if self.reader.peek(0) == Some('!') {
            self.reader.read(&mut string);
        } else if directive && string != "!" {
            return self.error(context, start_mark, "did not find expected '!'");
        }
        Ok(string)
    }

    fn scan_tag_uri(
        &mut self,
        verbatim: bool,
        directive: bool,
        head: Option<&str>,
        start_mark: Mark,
    ) -> Result<String, ScannerError> {
        let head = head.unwrap_or("");
        let mut length = head.len();
        // The head was scanned as a handle; drop its leading '!'.
        let mut string = if length > 1 {
            String::from(&head[1..])
        } else {
            String::new()
        };

        while self
            .reader
            .peek(0)
            .map_or(false, |ch| is_uri_char(ch, verbatim))
        {
            if self.reader.peek(0) == Some('%') {
                self.scan_uri_escapes(directive, start_mark, &mut string)?;
            } else {
                self.reader.read(&mut string);
            }
            length += 1;
        }
        if length == 0 {
            return self.error(
                if directive {
                    "while parsing a %TAG directive"
                } else {
                    "while parsing a tag"
                },
                start_mark,
                "did not find expected tag URI",
            );
        }
        Ok(string)
    }

    /// Decode one %HH-escaped UTF-8 sequence into `string`.
    fn scan_uri_escapes(
        &mut self,
        directive: bool,
        start_mark: Mark,
        string: &mut String,
    ) -> Result<(), ScannerError> {
        let context = if directive {
            "while parsing a %TAG directive"
        } else {
            "while parsing a tag"
        };
        let mut bytes = Vec::with_capacity(4);
        let mut width = 0usize;
        loop {
            if !(self.reader.peek(0) == Some('%')
                && is_hex(self.reader.peek(1))
                && is_hex(self.reader.peek(2)))
            {
                return self.error(context, start_mark, "did not find URI escaped octet");
            }
            let octet =
                ((as_hex(self.reader.peek(1).unwrap()) << 4) + as_hex(self.reader.peek(2).unwrap()))
                    as u8;
            if width == 0 {
                width = if octet & 0x80 == 0 {
                    1
                } else if octet & 0xE0 == 0xC0 {
                    2
                } else if octet & 0xF0 == 0xE0 {
                    3
                } else if octet & 0xF8 == 0xF0 {
                    4
                } else {
                    return self.error(
                        context,
                        start_mark,
                        "found an incorrect leading UTF-8 octet",
                    );
                };
            } else if octet & 0xC0 != 0x80 {
                return self.error(
                    context,
                    start_mark,
                    "found an incorrect trailing UTF-8 octet",
                );
            }
            bytes.push(octet);
            self.reader.skip();
            self.reader.skip();
            self.reader.skip();
            if bytes.len() == width {
                break;
            }
        }
        match std::str::from_utf8(&bytes) {
            Ok(decoded) => {
                string.push_str(decoded);
                Ok(())
            }
            Err(_) => self.error(context, start_mark, "found an invalid UTF-8 escape sequence"),
        }
    }

    /// Scan a literal (`|`) or folded (`>`) block scalar: header with
    /// chomping and indentation indicators, then indented content with
    /// style-dependent line folding.
    fn scan_block_scalar(&mut self, literal: bool) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.skip();

        // Chomping: -1 strip, 0 clip, +1 keep. The two header indicators may
        // come in either order.
        let mut chomping = 0i32;
        let mut increment = 0i64;
        if matches!(self.reader.peek(0), Some('+' | '-')) {
            chomping = if self.reader.peek(0) == Some('+') { 1 } else { -1 };
            self.reader.skip();
            if is_digit(self.reader.peek(0)) {
                if self.reader.peek(0) == Some('0') {
                    return self.error(
                        "while scanning a block scalar",
                        start_mark,
                        "found an indentation indicator equal to 0",
                    );
                }
                increment = as_digit(self.reader.peek(0).unwrap()) as i64;
                self.reader.skip();
            }
        } else if is_digit(self.reader.peek(0)) {
            if self.reader.peek(0) == Some('0') {
                return self.error(
                    "while scanning a block scalar",
                    start_mark,
                    "found an indentation indicator equal to 0",
                );
            }
            increment = as_digit(self.reader.peek(0).unwrap()) as i64;
            self.reader.skip();
            if matches!(self.reader.peek(0), Some('+' | '-')) {
                chomping = if self.reader.peek(0) == Some('+') { 1 } else { -1 };
                self.reader.skip();
            }
        }

        while is_blank(self.reader.peek(0)) {
            self.reader.skip();
        }
        if self.reader.peek(0) == Some('#') {
            while !is_breakz(self.reader.peek(0)) {
                self.reader.skip();
            }
        }
        if !is_breakz(self.reader.peek(0)) {
            return self.error(
                "while scanning a block scalar",
                start_mark,
                "did not find expected comment or line break",
            );
        }
        if is_break(self.reader.peek(0)) {
            self.reader.skip_break();
        }

        let mut end_mark = self.reader.mark();
        let mut indent: i64 = if increment != 0 {
            if self.indent >= 0 {
                self.indent + increment
            } else {
                increment
            }
        } else {
            0
        };

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut leading_blank = false;

        self.scan_block_scalar_breaks(&mut indent, &mut trailing_breaks, start_mark, &mut end_mark)?;

        while self.reader.mark().column as i64 == indent && !self.reader.is_empty() {
            // Folded style: a single break between non-blank lines becomes a
            // space; more-indented lines suppress folding.
            let trailing_blank = is_blank(self.reader.peek(0));
            if !literal && leading_break.starts_with('\n') && !leading_blank && !trailing_blank {
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
                leading_break.clear();
            } else {
                string.push_str(&leading_break);
                leading_break.clear();
            }
            string.push_str(&trailing_breaks);
            trailing_breaks.clear();
            leading_blank = is_blank(self.reader.peek(0));
            while !is_breakz(self.reader.peek(0)) {
                self.reader.read(&mut string);
            }
            if self.reader.is_empty() {
                break;
            }
            self.reader.read_break(&mut leading_break);
            self.scan_block_scalar_breaks(
                &mut indent,
                &mut trailing_breaks,
                start_mark,
                &mut end_mark,
            )?;
        }

        if chomping != -1 {
            string.push_str(&leading_break);
        }
        if chomping == 1 {
            string.push_str(&trailing_breaks);
        }

        Ok(Token::new(
            TokenData::Scalar {
                value: string,
                style: if literal {
                    ScalarStyle::Literal
                } else {
                    ScalarStyle::Folded
                },
            },
            start_mark,
            end_mark,
        ))
    }

    /// Consume blank lines inside a block scalar, determining the content
    /// indentation when it is not given explicitly.
    fn scan_block_scalar_breaks(
        &mut self,
        indent: &mut i64,
        breaks: &mut String,
        start_mark: Mark,
        end_mark: &mut Mark,
    ) -> Result<(), ScannerError> {
        let mut max_indent: i64 = 0;
        *end_mark = self.reader.mark();
        loop {
            while (*indent == 0 || (self.reader.mark().column as i64) < *indent)
                && is_space(self.reader.peek(0))
            {
                self.reader.skip();
            }
            if self.reader.mark().column as i64 > max_indent {
                max_indent = self.reader.mark().column as i64;
            }
            if (*indent == 0 || (self.reader.mark().column as i64) < *indent)
                && is_tab(self.reader.peek(0))
            {
                return self.error(
                    "while scanning a block scalar",
                    start_mark,
                    "found a tab character where an indentation space is expected",
                );
            }
            if !is_break(self.reader.peek(0)) {
                break;
            }
            self.reader.read_break(breaks);
            *end_mark = self.reader.mark();
        }
        if *indent == 0 {
            *indent = max_indent.max(self.indent + 1).max(1);
        }
        Ok(())
    }

    /// Scan a single- or double-quoted scalar.
    fn scan_flow_scalar(&mut self, single: bool) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.skip();

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks;

        loop {
            if self.reader.mark().column == 0
                && (self.reader.peek(0) == Some('-')
                    && self.reader.peek(1) == Some('-')
                    && self.reader.peek(2) == Some('-')
                    || self.reader.peek(0) == Some('.')
                        && self.reader.peek(1) == Some('.')
                        && self.reader.peek(2) == Some('.'))
                && is_blankz(self.reader.peek(3))
            {
                return self.error(
                    "while scanning a quoted scalar",
                    start_mark,
                    "found unexpected document indicator",
                );
            }
            if self.reader.is_empty() {
                return self.error(
                    "while scanning a quoted scalar",
                    start_mark,
                    "found unexpected end of stream",
                );
            }
            leading_blanks = false;
            while !is_blankz(self.reader.peek(0)) {
                if single && self.reader.peek(0) == Some('\'') && self.reader.peek(1) == Some('\'')
                {
                    // '' is the only escape in single-quoted scalars.
                    string.push('\'');
                    self.reader.skip();
                    self.reader.skip();
                    continue;
                }
                if self.reader.peek(0) == Some(if single { '\'' } else { '"' }) {
                    break;
                }
                if !single && self.reader.peek(0) == Some('\\') && is_break(self.reader.peek(1)) {
                    // An escaped line break is removed together with any
                    // following indentation.
                    self.reader.skip();
                    self.reader.skip_break();
                    leading_blanks = true;
                    break;
                }
                if !single && self.reader.peek(0) == Some('\\') {
                    self.scan_double_quoted_escape(start_mark, &mut string)?;
                    continue;
                }
                self.reader.read(&mut string);
            }
            if self.reader.peek(0) == Some(if single { '\'' } else { '"' }) {
                break;
            }
            while is_blank(self.reader.peek(0)) || is_break(self.reader.peek(0)) {
                if is_blank(self.reader.peek(0)) {
                    if !leading_blanks {
                        self.reader.read(&mut whitespaces);
                    } else {
                        self.reader.skip();
                    }
                } else if !leading_blanks {
                    whitespaces.clear();
                    self.reader.read_break(&mut leading_break);
                    leading_blanks = true;
                } else {
                    self.reader.read_break(&mut trailing_breaks);
                }
            }
            if leading_blanks {
                // Fold: single break between non-blank content becomes a
                // space; additional breaks are preserved.
                if leading_break.starts_with('\n') {
                    if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                        trailing_breaks.clear();
                    }
                } else {
                    string.push_str(&leading_break);
                    string.push_str(&trailing_breaks);
                    trailing_breaks.clear();
                }
                leading_break.clear();
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.reader.skip();
        let end_mark = self.reader.mark();
        Ok(Token::new(
            TokenData::Scalar {
                value: string,
                style: if single {
                    ScalarStyle::SingleQuoted
                } else {
                    ScalarStyle::DoubleQuoted
                },
            },
            start_mark,
            end_mark,
        ))
    }

    /// Decode one `\`-escape inside a double-quoted scalar.
    fn scan_double_quoted_escape(
        &mut self,
        start_mark: Mark,
        string: &mut String,
    ) -> Result<(), ScannerError> {
        let mut code_length = 0usize;
        match self.reader.peek(1) {
            Some('0') => string.push('\0'),
            Some('a') => string.push('\x07'),
            Some('b') => string.push('\x08'),
            Some('t' | '\t') => string.push('\t'),
            Some('n') => string.push('\n'),
            Some('v') => string.push('\x0B'),
            Some('f') => string.push('\x0C'),
            Some('r') => string.push('\r'),
            Some('e') => string.push('\x1B'),
            Some(' ') => string.push(' '),
            Some('"') => string.push('"'),
            Some('/') => string.push('/'),
            Some('\\') => string.push('\\'),
            // NEL (#x85)
            Some('N') => string.push('\u{0085}'),
            // #xA0
            Some('_') => string.push('\u{00a0}'),
            // LS (#x2028)
            Some('L') => string.push('\u{2028}'),
            // PS (#x2029)
            Some('P') => string.push('\u{2029}'),
            Some('x') => code_length = 2,
            Some('u') => code_length = 4,
            Some('U') => code_length = 8,
            _ => {
                return self.error(
                    "while parsing a quoted scalar",
                    start_mark,
                    "found unknown escape character",
                )
            }
        }
        self.reader.skip();
        self.reader.skip();
        if code_length != 0 {
            let mut value: u32 = 0;
            for k in 0..code_length {
                let Some(ch) = self.reader.peek(k).filter(|ch| ch.is_ascii_hexdigit()) else {
                    return self.error(
                        "while parsing a quoted scalar",
                        start_mark,
                        "did not find expected hexadecimal number",
                    );
                };
                value = (value << 4) + as_hex(ch);
            }
            match char::from_u32(value) {
                Some(ch) => string.push(ch),
                None => {
                    return self.error(
                        "while parsing a quoted scalar",
                        start_mark,
                        "found invalid Unicode character escape code",
                    )
                }
            }
            for _ in 0..code_length {
                self.reader.skip();
            }
        }
        Ok(())
    }

    fn scan_plain_scalar(&mut self) -> Result<Token, ScannerError> {
        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks = false;
        let indent = self.indent + 1;
        let start_mark = self.reader.mark();
        let mut end_mark = start_mark;

        loop {
            if self.reader.mark().column == 0
                && (self.reader.peek(0) == Some('-')
                    && self.reader.peek(1) == Some('-')
                    && self.reader.peek(2) == Some('-')
                    || self.reader.peek(0) == Some('.')
                        && self.reader.peek(1) == Some('.')
                        && self.reader.peek(2) == Some('.'))
                && is_blankz(self.reader.peek(3))
            {
                break;
            }
            if self.reader.peek(0) == Some('#') {
                break;
            }
            while !is_blankz(self.reader.peek(0)) {
                if self.flow_level > 0
                    && self.reader.peek(0) == Some(':')
                    && is_flow_indicator(self.reader.peek(1))
                {
                    return self.error(
                        "while scanning a plain scalar",
                        start_mark,
                        "found unexpected ':'",
                    );
                }
                if self.reader.peek(0) == Some(':') && is_blankz(self.reader.peek(1))
                    || self.flow_level > 0
                        && matches!(self.reader.peek(0), Some(',' | '[' | ']' | '{' | '}'))
                {
                    break;
                }
                if leading_blanks || !whitespaces.is_empty() {
                    if leading_blanks {
                        if leading_break.starts_with('\n') {
                            if trailing_breaks.is_empty() {
                                string.push(' ');
                            } else {
                                string.push_str(&trailing_breaks);
                                trailing_breaks.clear();
                            }
                        } else {
                            string.push_str(&leading_break);
                            string.push_str(&trailing_breaks);
                            trailing_breaks.clear();
                        }
                        leading_break.clear();
                        leading_blanks = false;
                    } else {
                        string.push_str(&whitespaces);
                        whitespaces.clear();
                    }
                }
                self.reader.read(&mut string);
                end_mark = self.reader.mark();
            }
            if !(is_blank(self.reader.peek(0)) || is_break(self.reader.peek(0))) {
                break;
            }
            while is_blank(self.reader.peek(0)) || is_break(self.reader.peek(0)) {
                if is_blank(self.reader.peek(0)) {
                    if leading_blanks
                        && (self.reader.mark().column as i64) < indent
                        && is_tab(self.reader.peek(0))
                    {
                        return self.error(
                            "while scanning a plain scalar",
                            start_mark,
                            "found a tab character that violates indentation",
                        );
                    }
                    if !leading_blanks {
                        self.reader.read(&mut whitespaces);
                    } else {
                        self.reader.skip();
                    }
                } else if !leading_blanks {
                    whitespaces.clear();
                    self.reader.read_break(&mut leading_break);
                    leading_blanks = true;
                } else {
                    self.reader.read_break(&mut trailing_breaks);
                }
            }
            if self.flow_level == 0 && (self.reader.mark().column as i64) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        Ok(Token::new(
            TokenData::Scalar {
                value: string,
                style: ScalarStyle::Plain,
            },
            start_mark,
            end_mark,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoding;

    fn scan_all(input: &str) -> Result<Vec<Token>, ScannerError> {
        let reader = Reader::new(input.as_bytes(), None).unwrap();
        let mut scanner = Scanner::new(reader);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.pop()?;
            let done = matches!(token.data, TokenData::StreamEnd);
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn data(tokens: &[Token]) -> Vec<&TokenData> {
        tokens.iter().map(|t| &t.data).collect()
    }

    #[test]
    fn scans_simple_mapping_with_retroactive_key() {
        let tokens = scan_all("key: value\n").unwrap();
        assert_eq!(
            data(&tokens),
            vec![
                &TokenData::StreamStart {
                    encoding: Encoding::Utf8
                },
                &TokenData::BlockMappingStart,
                &TokenData::Key,
                &TokenData::Scalar {
                    value: "key".into(),
                    style: ScalarStyle::Plain
                },
                &TokenData::Value,
                &TokenData::Scalar {
                    value: "value".into(),
                    style: ScalarStyle::Plain
                },
                &TokenData::BlockEnd,
                &TokenData::StreamEnd,
            ]
        );
    }

    #[test]
    fn scans_block_sequence() {
        let tokens = scan_all("- 1\n- 2\n- 3\n").unwrap();
        assert_eq!(
            data(&tokens),
            vec![
                &TokenData::StreamStart {
                    encoding: Encoding::Utf8
                },
                &TokenData::BlockSequenceStart,
                &TokenData::BlockEntry,
                &TokenData::Scalar {
                    value: "1".into(),
                    style: ScalarStyle::Plain
                },
                &TokenData::BlockEntry,
                &TokenData::Scalar {
                    value: "2".into(),
                    style: ScalarStyle::Plain
                },
                &TokenData::BlockEntry,
                &TokenData::Scalar {
                    value: "3".into(),
                    style: ScalarStyle::Plain
                },
                &TokenData::BlockEnd,
                &TokenData::StreamEnd,
            ]
        );
    }

    #[test]
    fn token_marks_are_ordered() {
        let tokens = scan_all("a: [1, {b: c}]\n").unwrap();
        let mut previous = Mark::default();
        for token in &tokens {
            assert!(token.start_mark.index <= token.end_mark.index);
            assert!(previous.index <= token.start_mark.index);
            previous = token.start_mark;
        }
    }

    #[test]
    fn literal_strip_chomping() {
        let tokens = scan_all("|-\n  foo\n  bar\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::Literal } if value == "foo\nbar"
        )));
    }

    #[test]
    fn literal_clip_keeps_one_newline() {
        let tokens = scan_all("|\n  foo\n\n\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::Literal } if value == "foo\n"
        )));
    }

    #[test]
    fn literal_keep_chomping_preserves_trailing_newlines() {
        let tokens = scan_all("|+\n  foo\n\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::Literal } if value == "foo\n\n"
        )));
    }

    #[test]
    fn folded_scalar_folds_single_breaks() {
        let tokens = scan_all(">\n  foo\n  bar\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::Folded } if value == "foo bar\n"
        )));
    }

    #[test]
    fn double_quoted_escapes() {
        let tokens = scan_all(r#""a\tbA\x40\n""#).unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::DoubleQuoted } if value == "a\tbA@\n"
        )));
    }

    #[test]
    fn single_quoted_doubles_quotes() {
        let tokens = scan_all("'it''s'").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::SingleQuoted } if value == "it's"
        )));
    }

    #[test]
    fn plain_scalar_folds_line_breaks() {
        let tokens = scan_all("a\n b\n\n c\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, style: ScalarStyle::Plain } if value == "a b\nc"
        )));
    }

    #[test]
    fn tag_shorthand_and_verbatim() {
        let tokens = scan_all("!!str x").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Tag { handle, suffix } if handle == "!!" && suffix == "str"
        )));
        let tokens = scan_all("!<tag:example.org,2002:foo> x").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Tag { handle, suffix }
                if handle.is_empty() && suffix == "tag:example.org,2002:foo"
        )));
    }

    #[test]
    fn tag_uri_percent_escapes_decode() {
        let tokens = scan_all("!e!caf%C3%A9 x\n").unwrap_or_else(|err| {
            panic!("scan failed: {err}");
        });
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Tag { suffix, .. } if suffix == "café"
        )));
    }

    #[test]
    fn required_simple_key_without_colon_errors() {
        // Inside a block mapping, `b` sits at the mapping's indent and so is
        // a required key; the line break stales it before any ':' shows up.
        let err = scan_all("a: 1\nb\nc: 2\n").unwrap_err();
        assert!(err.to_string().contains("could not find expected ':'"));
    }

    #[test]
    fn simple_key_of_1024_characters_is_accepted() {
        let long_key = "k".repeat(1024);
        let input = format!("{long_key}: v\n");
        let tokens = scan_all(&input).unwrap();
        assert!(tokens.iter().any(|t| matches!(&t.data, TokenData::Key)));
    }

    #[test]
    fn flow_collection_tokens_balance() {
        let tokens = scan_all("{a: [1, 2], b: {c: d}}\n").unwrap();
        let mut depth = 0i32;
        for token in &tokens {
            match token.data {
                TokenData::FlowSequenceStart | TokenData::FlowMappingStart => depth += 1,
                TokenData::FlowSequenceEnd | TokenData::FlowMappingEnd => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn plain_scalar_with_colon_in_flow_is_rejected_before_indicator() {
        let err = scan_all("[foo:[bar]]").unwrap_err();
        assert!(err.to_string().contains("found unexpected ':'"));
    }

    #[test]
    fn plain_scalar_with_embedded_colon_is_accepted() {
        let tokens = scan_all("http://example.org\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Scalar { value, .. } if value == "http://example.org"
        )));
    }

    #[test]
    fn document_markers_at_column_zero() {
        let tokens = scan_all("---\na\n...\n").unwrap();
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.data, TokenData::DocumentStart)));
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.data, TokenData::DocumentEnd)));
    }

    #[test]
    fn directive_tokens() {
        let tokens = scan_all("%YAML 1.1\n%TAG !e! tag:example.org,2002:\n---\nx\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::VersionDirective { major: 1, minor: 1 }
        )));
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::TagDirective { handle, prefix }
                if handle == "!e!" && prefix == "tag:example.org,2002:"
        )));
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let tokens = scan_all("%FOO bar baz\n---\nx\n").unwrap();
        assert!(!tokens
            .iter()
            .any(|t| matches!(&t.data, TokenData::VersionDirective { .. })));
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.data, TokenData::DocumentStart)));
    }

    #[test]
    fn anchor_and_alias_tokens() {
        let tokens = scan_all("a: &x 1\nb: *x\n").unwrap();
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Anchor { value } if value == "x"
        )));
        assert!(tokens.iter().any(|t| matches!(
            &t.data,
            TokenData::Alias { value } if value == "x"
        )));
    }

    #[test]
    fn peek_and_check_do_not_consume() {
        let reader = Reader::new(b"plain", None).unwrap();
        let mut scanner = Scanner::new(reader);
        assert!(scanner
            .check(|data| matches!(data, TokenData::StreamStart { .. }))
            .unwrap());
        assert!(matches!(
            scanner.peek().unwrap().data,
            TokenData::StreamStart { .. }
        ));
        assert!(matches!(
            scanner.pop().unwrap().data,
            TokenData::StreamStart { .. }
        ));
        assert!(scanner
            .check(|data| matches!(data, TokenData::Scalar { .. }))
            .unwrap());
    }

    #[test]
    fn comment_only_document_scans_to_stream_end() {
        let tokens = scan_all("# just a comment\n").unwrap();
        assert_eq!(
            data(&tokens),
            vec![
                &TokenData::StreamStart {
                    encoding: Encoding::Utf8
                },
                &TokenData::StreamEnd,
            ]
        );
    }
}
