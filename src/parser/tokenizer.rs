use crate::utils::{BoolToErrorHelper, Located};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    IncompleteHexLiteral,
    IncompleteExponent,
    EmptyName,
    InvalidCharacter,
}
impl TokenizerError {
    #[inline(always)]
    pub const fn at(self, line: usize, col: usize) -> Located<Self> {
        Located { t: self, line, col }
    }
}

#[inline(always)]
const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '-')
}

#[inline(always)]
const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$')
}

pub struct Tokenizer<'s> {
    pub source: &'s str,
    pub line: usize,
    pub col: usize,
}
impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            line: 0,
            col: 0,
        }
    }

    /// トークン頭のスペースと改行、行コメントを読み飛ばす
    fn skip_spaces(&mut self) {
        loop {
            let (chars, bytes) = self
                .source
                .chars()
                .take_while(|&c| c.is_whitespace() && c != '\n')
                .fold((0, 0), |(a, b), c| (a + 1, b + c.len_utf8()));
            self.col += chars;
            self.source = &self.source[bytes..];

            if self.source.starts_with(';') {
                // line comment: drop up to the newline, which the check below consumes
                self.source = self.source.trim_start_matches(|c| c != '\n');
            }

            if !self.source.starts_with('\n') {
                break;
            }
            self.line += 1;
            self.col = 0;
            self.source = &self.source[1..];
        }
    }

    #[inline]
    fn take(&mut self, kind: TokenKind, bytes: usize) -> Token<'s> {
        let tk = Token {
            slice: &self.source[..bytes],
            kind,
            line: self.line,
            col: self.col,
        };
        // every multi-byte token is ascii, so bytes and columns agree
        self.source = &self.source[bytes..];
        self.col += bytes;

        tk
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'s>>, Located<TokenizerError>> {
        self.skip_spaces();

        if self.source.is_empty() {
            // 読み切った
            return Ok(None);
        }

        // 1バイトのトークンを読む
        'try1: {
            let kind = match self.source.as_bytes()[0] {
                b'(' => TokenKind::OpenParenthese,
                b')' => TokenKind::CloseParenthese,
                b'{' => TokenKind::OpenBrace,
                b'}' => TokenKind::CloseBrace,
                b'<' => TokenKind::OpenAngleBracket,
                b'>' => TokenKind::CloseAngleBracket,
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b'=' => TokenKind::Eq,
                _ => break 'try1,
            };

            return Ok(Some(self.take(kind, 1)));
        }

        if let Some(sigil_kind) = match self.source.as_bytes()[0] {
            b'%' => Some(TokenKind::LocalName),
            b'@' => Some(TokenKind::GlobalName),
            _ => None,
        } {
            let name_len = self.source[1..]
                .chars()
                .take_while(|&c| is_name_char(c))
                .count();
            (name_len > 0).or_err(|| TokenizerError::EmptyName.at(self.line, self.col))?;

            return Ok(Some(self.take(sigil_kind, 1 + name_len)));
        }

        if self.source.starts_with("0x") || self.source.starts_with("0X") {
            // hexlit
            let hexpart_count = self.source[2..]
                .chars()
                .take_while(char::is_ascii_hexdigit)
                .count();
            (hexpart_count > 0)
                .or_err(|| TokenizerError::IncompleteHexLiteral.at(self.line, self.col))?;

            return Ok(Some(self.take(TokenKind::Number, 2 + hexpart_count)));
        }

        let sign_len = usize::from(self.source.starts_with('-'));
        if self.source[sign_len..].starts_with(|c: char| c.is_ascii_digit()) {
            let digits = |s: &str| s.chars().take_while(char::is_ascii_digit).count();

            let mut len = sign_len + digits(&self.source[sign_len..]);
            if self.source[len..].starts_with('.') {
                len += 1 + digits(&self.source[len + 1..]);
            }
            if self.source[len..].starts_with(['e', 'E']) {
                let exp_sign_len = usize::from(self.source[len + 1..].starts_with(['+', '-']));
                let exp_digits = digits(&self.source[len + 1 + exp_sign_len..]);
                (exp_digits > 0)
                    .or_err(|| TokenizerError::IncompleteExponent.at(self.line, self.col))?;
                len += 1 + exp_sign_len + exp_digits;
            }

            return Ok(Some(self.take(TokenKind::Number, len)));
        }

        let ident_len = self
            .source
            .chars()
            .take_while(|&c| is_identifier_char(c))
            .count();
        (ident_len > 0).or_err(|| TokenizerError::InvalidCharacter.at(self.line, self.col))?;
        let kind = match &self.source[..ident_len] {
            "define" | "call" | "ret" | "br" | "label" | "select" | "bitcast" | "to" | "undef"
            | "zeroinitializer" | "true" | "false" => TokenKind::Keyword,
            _ => TokenKind::Identifier,
        };

        Ok(Some(self.take(kind, ident_len)))
    }
}

/// Splits the whole source into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, Located<TokenizerError>> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();
    while let Some(t) = tokenizer.next_token()? {
        tokens.push(t);
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    /// `%name`
    LocalName,
    /// `@name`
    GlobalName,
    Number,
    OpenParenthese,
    CloseParenthese,
    OpenAngleBracket,
    CloseAngleBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Colon,
    Eq,
}

#[derive(Debug, Clone)]
pub struct Token<'s> {
    pub slice: &'s str,
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}
