use logos::{FilterResult, Lexer, Logos};
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // `/** ... */` blocks carry documentation and are kept; other block
    // comments are skipped
    #[token("/*", block_comment)]
    DocComment(String),

    // Literals
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"`([^`\\]|\\.)*`", |lex| unquote(lex.slice()))]
    Template(String),

    #[regex(r"[0-9][0-9_]*(\.[0-9_]+)?([eE][+-]?[0-9]+)?n?", |lex| lex.slice().to_string())]
    #[regex(r"0[xXbBoO][0-9a-fA-F_]+n?", |lex| lex.slice().to_string())]
    Number(String),

    // Identifiers and keywords; TypeScript keywords are contextual in
    // declaration files so the parser matches them by text.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    #[regex(r"#[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Symbols
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("=")]
    Eq,
    #[token("=>")]
    Arrow,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("*")]
    Star,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("@")]
    At,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("~")]
    Tilde,
    #[token("^")]
    Caret,
}

/// Consume a block comment up to its `*/`. An unterminated comment is a
/// lexing error.
fn block_comment(lex: &mut Lexer<'_, Token>) -> FilterResult<String, ()> {
    let rest = lex.remainder();
    let Some(end) = rest.find("*/") else {
        let len = rest.len();
        lex.bump(len);
        return FilterResult::Error(());
    };
    // `/**/` is empty, not documentation
    let is_doc = end > 0 && rest.starts_with('*');
    lex.bump(end + 2);
    if is_doc {
        FilterResult::Emit(lex.slice().to_string())
    } else {
        FilterResult::Skip
    }
}

fn unquote(slice: &str) -> String {
    if slice.len() < 2 {
        return String::new();
    }
    slice[1..slice.len() - 1].to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Range<usize>,
}

pub type SpannedToken = Spanned<Token>;

/// Tokenize a declaration file. Doc comments are returned as tokens so the
/// parser can attach them to the following declaration.
pub fn tokenize(source: &str, filename: &str) -> Result<Vec<SpannedToken>, String> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(Spanned {
                value: token,
                span: lexer.span(),
            }),
            Err(()) => {
                let span = lexer.span();
                let slice = lexer.slice();
                let message = if slice.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else {
                    format!("unexpected character '{slice}'")
                };
                return Err(format!("{filename}:{}: {message}", line_of(source, span.start)));
            }
        }
    }

    Ok(tokens)
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<Token> {
        tokenize(source, "test.d.ts")
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_function_declaration_tokens() {
        let tokens = values("export declare function getDeviceId(): string;");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("export".into()),
                Token::Ident("declare".into()),
                Token::Ident("function".into()),
                Token::Ident("getDeviceId".into()),
                Token::LParen,
                Token::RParen,
                Token::Colon,
                Token::Ident("string".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_doc_comments_are_kept_and_others_skipped() {
        let tokens = values("// line\n/* block */\n/** doc */\n/**/ x");
        assert_eq!(
            tokens,
            vec![
                Token::DocComment("/** doc */".into()),
                Token::Ident("x".into())
            ]
        );
    }

    #[test]
    fn test_block_comments_with_stars() {
        let tokens = values("/* eslint-disable */\n/* a * b **/ /***/ /** a * b */ x");
        assert_eq!(
            tokens,
            vec![
                Token::DocComment("/***/".into()),
                Token::DocComment("/** a * b */".into()),
                Token::Ident("x".into())
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("export declare const a: number;\n/* open", "a.d.ts").unwrap_err();
        assert_eq!(err, "a.d.ts:2: unterminated block comment");
    }

    #[test]
    fn test_literals_and_arrow() {
        let tokens = values(r#"'a' | "b" => `c` 42 ..."#);
        assert_eq!(
            tokens,
            vec![
                Token::Str("a".into()),
                Token::Pipe,
                Token::Str("b".into()),
                Token::Arrow,
                Token::Template("c".into()),
                Token::Number("42".into()),
                Token::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_unicode_in_comments() {
        let tokens = values("/** 기기 고유 ID를 반환합니다. */ declare const a: number;");
        assert!(matches!(tokens[0], Token::DocComment(ref s) if s.contains("기기")));
    }

    #[test]
    fn test_line_of() {
        let source = "a\nb\nc";
        assert_eq!(line_of(source, 0), 1);
        assert_eq!(line_of(source, 2), 2);
        assert_eq!(line_of(source, 4), 3);
    }
}
