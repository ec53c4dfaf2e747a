//! FEEL lexer using logos.

use logos::Logos;

/// A span in the source input (byte offsets).
pub type Span = std::ops::Range<usize>;

/// A token with its source span.
pub type SpannedToken = (Token, Span);

/// Lexer error with span information.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// FEEL tokens.
///
/// Multi-word names such as `date and time` are not recognized here: the
/// lexer emits one `Name` (or keyword) per word and the parser merges them.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // === Literals ===
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| format!("0{}", lex.slice()))]
    Number(String),

    #[token("\"", lex_string)]
    String(String),

    // === Comments (kept, attached to the next node by the parser) ===
    #[regex(r"//[^\n]*", |lex| lex.slice()[2..].trim().to_string())]
    #[token("/*", lex_block_comment)]
    Comment(String),

    // === Keywords ===
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("return")]
    Return,
    #[token("some")]
    Some,
    #[token("every")]
    Every,
    #[token("satisfies")]
    Satisfies,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("between")]
    Between,
    #[token("instance")]
    Instance,
    #[token("of")]
    Of,
    #[token("function")]
    Function,

    // === Identifier ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Name(String),

    // === Operators (multi-char first) ===
    #[token("**")]
    Pow,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("..")]
    DotDot,
    #[token("->")]
    Arrow,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("?")]
    Question,
    #[token("@")]
    At,
    #[token(":")]
    Colon,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
}

impl Token {
    /// Text of a token that may form part of a multi-word name.
    pub fn word(&self) -> Option<&str> {
        let word = match self {
            Token::Name(name) => name.as_str(),
            Token::And => "and",
            Token::Or => "or",
            Token::Of => "of",
            Token::In => "in",
            Token::Instance => "instance",
            Token::Between => "between",
            _ => return None,
        };
        Some(word)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Comment(c) => write!(f, "/* {} */", c),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::Return => write!(f, "return"),
            Token::Some => write!(f, "some"),
            Token::Every => write!(f, "every"),
            Token::Satisfies => write!(f, "satisfies"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Between => write!(f, "between"),
            Token::Instance => write!(f, "instance"),
            Token::Of => write!(f, "of"),
            Token::Function => write!(f, "function"),
            Token::Name(s) => write!(f, "{}", s),
            Token::Pow => write!(f, "**"),
            Token::Ne => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::DotDot => write!(f, ".."),
            Token::Arrow => write!(f, "->"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Eq => write!(f, "="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Question => write!(f, "?"),
            Token::At => write!(f, "@"),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
        }
    }
}

// === Lexer Callbacks ===

fn lex_string(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let remainder = lex.remainder();
    let mut chars = remainder.chars();
    let mut result = String::new();
    let mut consumed = 0;

    while let Some(c) = chars.next() {
        consumed += c.len_utf8();
        match c {
            '"' => {
                lex.bump(consumed);
                return Some(result);
            }
            '\\' => {
                let escape_char = chars.next()?;
                consumed += escape_char.len_utf8();
                match escape_char {
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    '\'' => result.push('\''),
                    'n' => result.push('\n'),
                    'r' => result.push('\r'),
                    't' => result.push('\t'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).collect();
                        if hex.len() != 4 {
                            return None;
                        }
                        consumed += 4;
                        let code = u32::from_str_radix(&hex, 16).ok()?;
                        result.push(char::from_u32(code)?);
                    }
                    other => {
                        result.push('\\');
                        result.push(other);
                    }
                }
            }
            _ => result.push(c),
        }
    }

    // Unterminated string
    None
}

fn lex_block_comment(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let remainder = lex.remainder();
    let end = remainder.find("*/")?;
    let text = remainder[..end].trim().to_string();
    lex.bump(end + 2);
    Some(text)
}

/// Tokenize the input string.
pub fn lex(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                let text = input.get(span.clone()).unwrap_or_default();
                let message = if text.starts_with('"') {
                    "unterminated string literal".to_string()
                } else if text.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else {
                    format!("unexpected character '{}'", text)
                };
                return Err(LexError { message, span });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_tokens(input: &str) -> Vec<Token> {
        lex(input)
            .unwrap()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_tokens("1 2.5 1e3 .5"),
            vec![
                Token::Number("1".into()),
                Token::Number("2.5".into()),
                Token::Number("1e3".into()),
                Token::Number("0.5".into()),
            ]
        );
    }

    #[test]
    fn test_range_dots_do_not_become_decimals() {
        assert_eq!(
            lex_tokens("[1..3]"),
            vec![
                Token::LBracket,
                Token::Number("1".into()),
                Token::DotDot,
                Token::Number("3".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            lex_tokens(r#""hello \"world\"\n""#),
            vec![Token::String("hello \"world\"\n".into())]
        );
        assert_eq!(lex_tokens(r#""A""#), vec![Token::String("A".into())]);
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            lex_tokens("date and time"),
            vec![Token::Name("date".into()), Token::And, Token::Name("time".into())]
        );
        assert_eq!(
            lex_tokens("x instance of number"),
            vec![
                Token::Name("x".into()),
                Token::Instance,
                Token::Of,
                Token::Name("number".into()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex_tokens("a**2 != b -> <= >= ?"),
            vec![
                Token::Name("a".into()),
                Token::Pow,
                Token::Number("2".into()),
                Token::Ne,
                Token::Name("b".into()),
                Token::Arrow,
                Token::Le,
                Token::Ge,
                Token::Question,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex_tokens("// note\n1 /* block */"),
            vec![
                Token::Comment("note".into()),
                Token::Number("1".into()),
                Token::Comment("block".into()),
            ]
        );
    }

    #[test]
    fn test_errors() {
        let err = lex("1 # 2").unwrap_err();
        assert_eq!(err.message, "unexpected character '#'");
        assert_eq!(err.span, 2..3);

        let err = lex("\"open").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
    }
}
