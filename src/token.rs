use logos::{Lexer, Logos};

pub fn lex(input: &str) -> Vec<Token> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        tokens.push(match token {
            Token::Identifier(word) => Token::keyword(word),
            Token::Error => Token::Unexpected(lexer.slice().chars().next().unwrap_or_default()),
            token => token,
        });
    }
    tokens
}

fn to_string(lex: &mut Lexer<Token>) -> Option<String> {
    let mut string = lex.slice().to_string();
    if string.starts_with('"') && string.ends_with('"') && string.len() >= 2 {
        string.remove(0);
        string.remove(string.len() - 1);
    }
    Some(string)
}

#[derive(Debug, Clone, Logos, PartialEq)]
pub enum Token {
    #[regex(r"[\p{XID_Start}_$][\p{XID_Continue}$]*", to_string)]
    Identifier(String),
    #[regex(r#""[^"]*""#, to_string)]
    String(String),
    #[regex(r#""[^"]*"#)]
    UnterminatedString,

    /// `true` / `false`, produced from identifiers by [`lex`].
    Bool(bool),

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,

    #[token("!")]
    Bang,

    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,

    /// A character that starts no token.
    Unexpected(char),

    EoF,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Error,
}

impl Token {
    fn keyword(word: String) -> Self {
        if word.eq_ignore_ascii_case("true") {
            Token::Bool(true)
        } else if word.eq_ignore_ascii_case("false") {
            Token::Bool(false)
        } else {
            Token::Identifier(word)
        }
    }
}
