use crate::syntax_kind::SyntaxKind;
use crate::TextRange;

/// A single lexed token. Trivia (whitespace, comments, preprocessor
/// directive lines) appears in the token stream like everything else; the
/// parser attaches it to the tree verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.start as usize..self.range.end as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub range: TextRange,
}

/// Lex `input`, discarding error details.
pub fn lex(input: &str) -> Vec<Token> {
    lex_with_errors(input).0
}

/// Lex `input` into a token list terminated by a zero-width `Eof` token.
pub fn lex_with_errors(input: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(input);
    lexer.run();
    let end = input.len() as u32;
    lexer.tokens.push(Token {
        kind: SyntaxKind::Eof,
        range: TextRange { start: end, end },
    });
    (lexer.tokens, lexer.errors)
}

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Only whitespace has been seen since the last newline. A `#` is a
    /// preprocessor directive exactly in that position.
    at_line_start: bool,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            at_line_start: true,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let b = self.bytes[self.pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.whitespace(),
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment(),
                b'#' if self.at_line_start => self.directive(),
                b'"' => self.string_literal(false),
                b'\'' => self.char_literal(),
                b'@' => self.at_prefixed(),
                b'$' => self.dollar_prefixed(),
                b'0'..=b'9' => self.number(),
                b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                _ => {
                    if is_ident_start(self.current_char()) {
                        self.identifier_or_keyword();
                    } else {
                        self.operator();
                    }
                }
            }
            debug_assert!(self.pos > start, "lexer failed to make progress");
        }
    }

    fn whitespace(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => {
                    self.at_line_start = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
        self.push(SyntaxKind::Whitespace, start);
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let kind = if self.input[self.pos..].starts_with("///")
            && !self.input[self.pos..].starts_with("////")
        {
            SyntaxKind::DocComment
        } else {
            SyntaxKind::LineComment
        };
        self.consume_to_line_end();
        self.push_non_trivial(kind, start);
    }

    fn block_comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let mut terminated = false;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                terminated = true;
                break;
            }
            self.advance_char();
        }
        if !terminated {
            self.error(start, "unterminated block comment");
        }
        self.push_non_trivial(SyntaxKind::BlockComment, start);
    }

    fn directive(&mut self) {
        let start = self.pos;
        self.consume_to_line_end();
        let text = &self.input[start..self.pos];
        let word = text[1..]
            .trim_start()
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or("");
        let kind = match word {
            "if" => SyntaxKind::IfDirective,
            "elif" => SyntaxKind::ElifDirective,
            "else" => SyntaxKind::ElseDirective,
            "endif" => SyntaxKind::EndIfDirective,
            "region" => SyntaxKind::RegionDirective,
            "endregion" => SyntaxKind::EndRegionDirective,
            _ => SyntaxKind::OtherDirective,
        };
        self.push_non_trivial(kind, start);
    }

    fn at_prefixed(&mut self) {
        let start = self.pos;
        match self.peek(1) {
            // Verbatim string: `@"..."` with `""` as the quote escape.
            Some(b'"') => {
                self.pos += 1;
                self.string_literal(true);
                self.retag_last(start);
            }
            // Interpolated verbatim string: `@$"..."`.
            Some(b'$') if self.peek(2) == Some(b'"') => {
                self.pos += 2;
                self.string_literal(true);
                self.retag_last(start);
            }
            // Verbatim identifier: `@foo` is an identifier, never a keyword.
            Some(c) if is_ident_start(char::from(c)) => {
                self.pos += 1;
                while self.pos < self.bytes.len() && is_ident_continue(self.current_char()) {
                    self.advance_char();
                }
                self.push_non_trivial(SyntaxKind::Identifier, start);
            }
            _ => {
                self.pos += 1;
                self.error(start, "stray `@`");
                self.push_non_trivial(SyntaxKind::Error, start);
            }
        }
    }

    fn dollar_prefixed(&mut self) {
        let start = self.pos;
        match self.peek(1) {
            // Interpolated string: `$"..."`.
            Some(b'"') => {
                self.pos += 1;
                self.interpolated_string(false);
                self.retag_last(start);
            }
            // Interpolated verbatim string: `$@"..."`.
            Some(b'@') if self.peek(2) == Some(b'"') => {
                self.pos += 2;
                self.interpolated_string(true);
                self.retag_last(start);
            }
            _ => {
                self.pos += 1;
                self.error(start, "stray `$`");
                self.push_non_trivial(SyntaxKind::Error, start);
            }
        }
    }

    /// Plain or verbatim string body starting at the opening quote.
    fn string_literal(&mut self, verbatim: bool) {
        let start = self.pos;
        debug_assert_eq!(self.bytes[self.pos], b'"');
        self.pos += 1;
        let mut terminated = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'"' if verbatim && self.peek(1) == Some(b'"') => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                b'\\' if !verbatim => {
                    self.pos += 1;
                    if self.pos < self.bytes.len() {
                        self.advance_char();
                    }
                }
                b'\n' if !verbatim => break,
                _ => self.advance_char(),
            }
        }
        if !terminated {
            self.error(start, "unterminated string literal");
        }
        self.push_non_trivial(SyntaxKind::StringLiteral, start);
    }

    /// Interpolated string body starting at the opening quote. Interpolation
    /// holes are skipped with brace matching; the whole template is one
    /// `StringLiteral` token — the engine treats interpolations opaquely.
    fn interpolated_string(&mut self, verbatim: bool) {
        let start = self.pos;
        debug_assert_eq!(self.bytes[self.pos], b'"');
        self.pos += 1;
        let mut terminated = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'{' if self.peek(1) == Some(b'{') => self.pos += 2,
                b'{' => {
                    // Skip the hole; nested strings inside holes are consumed
                    // naively by brace depth.
                    let mut depth = 1usize;
                    self.pos += 1;
                    while self.pos < self.bytes.len() && depth > 0 {
                        match self.bytes[self.pos] {
                            b'{' => depth += 1,
                            b'}' => depth -= 1,
                            _ => {}
                        }
                        self.advance_char();
                    }
                }
                b'"' if verbatim && self.peek(1) == Some(b'"') => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                b'\\' if !verbatim => {
                    self.pos += 1;
                    if self.pos < self.bytes.len() {
                        self.advance_char();
                    }
                }
                b'\n' if !verbatim => break,
                _ => self.advance_char(),
            }
        }
        if !terminated {
            self.error(start, "unterminated interpolated string");
        }
        self.push_non_trivial(SyntaxKind::StringLiteral, start);
    }

    fn char_literal(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut terminated = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\'' => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.bytes.len() {
                        self.advance_char();
                    }
                }
                b'\n' => break,
                _ => self.advance_char(),
            }
        }
        if !terminated {
            self.error(start, "unterminated character literal");
        }
        self.push_non_trivial(SyntaxKind::CharLiteral, start);
    }

    fn number(&mut self) {
        let start = self.pos;
        let mut real = false;

        if self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_hexdigit() || self.bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
        } else if self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'b') | Some(b'B')) {
            self.pos += 2;
            while self.pos < self.bytes.len()
                && matches!(self.bytes[self.pos], b'0' | b'1' | b'_')
            {
                self.pos += 1;
            }
        } else {
            self.digits();
            if self.pos < self.bytes.len()
                && self.bytes[self.pos] == b'.'
                && self.peek(1).is_some_and(|c| c.is_ascii_digit())
            {
                real = true;
                self.pos += 1;
                self.digits();
            }
            if matches!(self.current_byte(), Some(b'e') | Some(b'E'))
                && self
                    .peek(1)
                    .is_some_and(|c| c.is_ascii_digit() || c == b'+' || c == b'-')
            {
                real = true;
                self.pos += 1;
                if matches!(self.current_byte(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                self.digits();
            }
        }

        let kind = match self.current_byte() {
            Some(b'f') | Some(b'F') | Some(b'd') | Some(b'D') | Some(b'm') | Some(b'M') => {
                self.pos += 1;
                SyntaxKind::RealLiteral
            }
            Some(b'l') | Some(b'L') => {
                self.pos += 1;
                // `ul` / `lu` combined suffixes.
                if matches!(self.current_byte(), Some(b'u') | Some(b'U')) {
                    self.pos += 1;
                }
                SyntaxKind::LongLiteral
            }
            Some(b'u') | Some(b'U') => {
                self.pos += 1;
                if matches!(self.current_byte(), Some(b'l') | Some(b'L')) {
                    self.pos += 1;
                    SyntaxKind::LongLiteral
                } else {
                    SyntaxKind::IntLiteral
                }
            }
            _ if real => SyntaxKind::RealLiteral,
            _ => SyntaxKind::IntLiteral,
        };
        self.push_non_trivial(kind, start);
    }

    fn digits(&mut self) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
    }

    fn identifier_or_keyword(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.current_char()) {
            self.advance_char();
        }
        let text = &self.input[start..self.pos];
        let kind = SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Identifier);
        self.push_non_trivial(kind, start);
    }

    fn operator(&mut self) {
        let start = self.pos;
        let rest = &self.input[self.pos..];
        let (kind, len) = match () {
            _ if rest.starts_with("<<=") => (SyntaxKind::LeftShiftEq, 3),
            _ if rest.starts_with(">>=") => (SyntaxKind::RightShiftEq, 3),
            _ if rest.starts_with("<<") => (SyntaxKind::LeftShift, 2),
            _ if rest.starts_with(">>") => (SyntaxKind::RightShift, 2),
            _ if rest.starts_with("<=") => (SyntaxKind::LessEq, 2),
            _ if rest.starts_with(">=") => (SyntaxKind::GreaterEq, 2),
            _ if rest.starts_with("==") => (SyntaxKind::EqEq, 2),
            _ if rest.starts_with("!=") => (SyntaxKind::BangEq, 2),
            _ if rest.starts_with("=>") => (SyntaxKind::Arrow, 2),
            _ if rest.starts_with("&&") => (SyntaxKind::AmpAmp, 2),
            _ if rest.starts_with("||") => (SyntaxKind::PipePipe, 2),
            _ if rest.starts_with("??") => (SyntaxKind::QuestionQuestion, 2),
            _ if rest.starts_with("++") => (SyntaxKind::PlusPlus, 2),
            _ if rest.starts_with("--") => (SyntaxKind::MinusMinus, 2),
            _ if rest.starts_with("+=") => (SyntaxKind::PlusEq, 2),
            _ if rest.starts_with("-=") => (SyntaxKind::MinusEq, 2),
            _ if rest.starts_with("*=") => (SyntaxKind::StarEq, 2),
            _ if rest.starts_with("/=") => (SyntaxKind::SlashEq, 2),
            _ if rest.starts_with("%=") => (SyntaxKind::PercentEq, 2),
            _ if rest.starts_with("&=") => (SyntaxKind::AmpEq, 2),
            _ if rest.starts_with("|=") => (SyntaxKind::PipeEq, 2),
            _ if rest.starts_with("^=") => (SyntaxKind::CaretEq, 2),
            _ if rest.starts_with('(') => (SyntaxKind::LParen, 1),
            _ if rest.starts_with(')') => (SyntaxKind::RParen, 1),
            _ if rest.starts_with('{') => (SyntaxKind::LBrace, 1),
            _ if rest.starts_with('}') => (SyntaxKind::RBrace, 1),
            _ if rest.starts_with('[') => (SyntaxKind::LBracket, 1),
            _ if rest.starts_with(']') => (SyntaxKind::RBracket, 1),
            _ if rest.starts_with(';') => (SyntaxKind::Semicolon, 1),
            _ if rest.starts_with(',') => (SyntaxKind::Comma, 1),
            _ if rest.starts_with('.') => (SyntaxKind::Dot, 1),
            _ if rest.starts_with('?') => (SyntaxKind::Question, 1),
            _ if rest.starts_with(':') => (SyntaxKind::Colon, 1),
            _ if rest.starts_with('+') => (SyntaxKind::Plus, 1),
            _ if rest.starts_with('-') => (SyntaxKind::Minus, 1),
            _ if rest.starts_with('*') => (SyntaxKind::Star, 1),
            _ if rest.starts_with('/') => (SyntaxKind::Slash, 1),
            _ if rest.starts_with('%') => (SyntaxKind::Percent, 1),
            _ if rest.starts_with('~') => (SyntaxKind::Tilde, 1),
            _ if rest.starts_with('!') => (SyntaxKind::Bang, 1),
            _ if rest.starts_with('=') => (SyntaxKind::Eq, 1),
            _ if rest.starts_with('<') => (SyntaxKind::Less, 1),
            _ if rest.starts_with('>') => (SyntaxKind::Greater, 1),
            _ if rest.starts_with('&') => (SyntaxKind::Amp, 1),
            _ if rest.starts_with('|') => (SyntaxKind::Pipe, 1),
            _ if rest.starts_with('^') => (SyntaxKind::Caret, 1),
            _ => {
                let ch = self.current_char();
                self.error(start, "unexpected character");
                (SyntaxKind::Error, ch.len_utf8())
            }
        };
        self.pos += len;
        self.push_non_trivial(kind, start);
    }

    fn consume_to_line_end(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.advance_char();
        }
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        self.tokens.push(Token {
            kind,
            range: TextRange {
                start: start as u32,
                end: self.pos as u32,
            },
        });
    }

    /// Push a token and note that the line now contains something other than
    /// leading whitespace.
    fn push_non_trivial(&mut self, kind: SyntaxKind, start: usize) {
        self.at_line_start = false;
        self.push(kind, start);
    }

    /// Rewrite the range of the most recently pushed token to start at
    /// `start` (used for `@`/`$` string prefixes consumed before the body).
    fn retag_last(&mut self, start: usize) {
        if let Some(last) = self.tokens.last_mut() {
            last.range.start = start as u32;
        }
    }

    fn error(&mut self, start: usize, message: &str) {
        self.errors.push(LexError {
            message: message.to_string(),
            range: TextRange {
                start: start as u32,
                end: self.pos as u32,
            },
        });
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn current_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance_char(&mut self) {
        let ch = self.current_char();
        self.pos += ch.len_utf8().max(1);
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, SyntaxKind::Whitespace | SyntaxKind::Eof))
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("int foo = bar;"),
            vec![
                SyntaxKind::IntKw,
                SyntaxKind::Identifier,
                SyntaxKind::Eq,
                SyntaxKind::Identifier,
                SyntaxKind::Semicolon,
            ]
        );
    }

    #[test]
    fn verbatim_identifier_is_never_a_keyword() {
        assert_eq!(kinds("@int"), vec![SyntaxKind::Identifier]);
    }

    #[test]
    fn directives_only_at_line_start() {
        let toks = kinds("#if DEBUG\nx = 1;\n#endif");
        assert_eq!(toks[0], SyntaxKind::IfDirective);
        assert_eq!(*toks.last().unwrap(), SyntaxKind::EndIfDirective);
    }

    #[test]
    fn region_directives_are_tagged() {
        assert_eq!(
            kinds("#region setup\n#endregion"),
            vec![SyntaxKind::RegionDirective, SyntaxKind::EndRegionDirective]
        );
    }

    #[test]
    fn interpolated_string_is_one_token() {
        assert_eq!(kinds(r#"$"x = {x + 1}!";"#), vec![
            SyntaxKind::StringLiteral,
            SyntaxKind::Semicolon,
        ]);
    }

    #[test]
    fn numeric_suffixes() {
        assert_eq!(kinds("1 2L 3u 4ul 5.0 6f 0x1F"), vec![
            SyntaxKind::IntLiteral,
            SyntaxKind::LongLiteral,
            SyntaxKind::IntLiteral,
            SyntaxKind::LongLiteral,
            SyntaxKind::RealLiteral,
            SyntaxKind::RealLiteral,
            SyntaxKind::IntLiteral,
        ]);
    }

    #[test]
    fn doc_comment_kind() {
        assert_eq!(kinds("/// docs\n// plain"), vec![
            SyntaxKind::DocComment,
            SyntaxKind::LineComment,
        ]);
    }

    #[test]
    fn shift_and_compound_operators() {
        assert_eq!(kinds("a <<= b >> c ?? d"), vec![
            SyntaxKind::Identifier,
            SyntaxKind::LeftShiftEq,
            SyntaxKind::Identifier,
            SyntaxKind::RightShift,
            SyntaxKind::Identifier,
            SyntaxKind::QuestionQuestion,
            SyntaxKind::Identifier,
        ]);
    }

    #[test]
    fn every_token_covers_the_input() {
        let input = "class C { void M() { var s = @\"a\"\"b\"; } }";
        let tokens = lex(input);
        let mut pos = 0u32;
        for tok in &tokens {
            assert_eq!(tok.range.start, pos, "gap before {:?}", tok.kind);
            pos = tok.range.end;
        }
        assert_eq!(pos, input.len() as u32);
    }
}
