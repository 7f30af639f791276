//! Tokenizer for action expressions.

use super::ParseError;

/// Tokens produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    /// Unsigned magnitude; the parser applies a leading minus and range-checks
    Int(u64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Nil,
    SelfKw,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl Tok {
    /// Source spelling used in error messages
    pub fn describe(&self) -> String {
        match self {
            Tok::Int(i) => i.to_string(),
            Tok::Float(x) => x.to_string(),
            Tok::Str(s) => format!("{:?}", s),
            Tok::Ident(name) => name.clone(),
            Tok::True => "true".into(),
            Tok::False => "false".into(),
            Tok::Nil => "nil".into(),
            Tok::SelfKw => "self".into(),
            Tok::LParen => "(".into(),
            Tok::RParen => ")".into(),
            Tok::LBracket => "[".into(),
            Tok::RBracket => "]".into(),
            Tok::Comma => ",".into(),
            Tok::Dot => ".".into(),
            Tok::Assign => "=".into(),
            Tok::Plus => "+".into(),
            Tok::Minus => "-".into(),
            Tok::Star => "*".into(),
            Tok::Slash => "/".into(),
            Tok::Percent => "%".into(),
            Tok::Bang => "!".into(),
            Tok::EqEq => "==".into(),
            Tok::NotEq => "!=".into(),
            Tok::Lt => "<".into(),
            Tok::Le => "<=".into(),
            Tok::Gt => ">".into(),
            Tok::Ge => ">=".into(),
            Tok::AndAnd => "&&".into(),
            Tok::OrOr => "||".into(),
        }
    }
}

/// A token with the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub tok: Tok,
    pub pos: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // A leading '.' only starts a number when followed by a digit and not
        // preceded by something that could be a receiver (`x.5` is not valid anyway)
        let starts_number = c.is_ascii_digit()
            || (c == b'.'
                && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit())
                && !matches!(
                    tokens.last(),
                    Some(Spanned {
                        tok: Tok::Ident(_) | Tok::RParen | Tok::RBracket | Tok::SelfKw,
                        ..
                    })
                ));

        if starts_number {
            let (tok, end) = lex_number(source, i)?;
            tokens.push(Spanned { tok, pos: start });
            i = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            // Allow a trailing '?' the way predicate methods are usually spelled
            if i < bytes.len() && bytes[i] == b'?' {
                i += 1;
            }
            let word = &source[start..i];
            let tok = match word {
                "true" => Tok::True,
                "false" => Tok::False,
                "nil" | "null" => Tok::Nil,
                "self" => Tok::SelfKw,
                _ => Tok::Ident(word.to_string()),
            };
            tokens.push(Spanned { tok, pos: start });
            continue;
        }

        if c == b'"' || c == b'\'' {
            let (text, end) = lex_string(source, i)?;
            tokens.push(Spanned {
                tok: Tok::Str(text),
                pos: start,
            });
            i = end;
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (tok, width) = match (c, next) {
            (b'=', Some(b'=')) => (Tok::EqEq, 2),
            (b'!', Some(b'=')) => (Tok::NotEq, 2),
            (b'<', Some(b'=')) => (Tok::Le, 2),
            (b'>', Some(b'=')) => (Tok::Ge, 2),
            (b'&', Some(b'&')) => (Tok::AndAnd, 2),
            (b'|', Some(b'|')) => (Tok::OrOr, 2),
            (b'=', _) => (Tok::Assign, 1),
            (b'!', _) => (Tok::Bang, 1),
            (b'<', _) => (Tok::Lt, 1),
            (b'>', _) => (Tok::Gt, 1),
            (b'(', _) => (Tok::LParen, 1),
            (b')', _) => (Tok::RParen, 1),
            (b'[', _) => (Tok::LBracket, 1),
            (b']', _) => (Tok::RBracket, 1),
            (b',', _) => (Tok::Comma, 1),
            (b'.', _) => (Tok::Dot, 1),
            (b'+', _) => (Tok::Plus, 1),
            (b'-', _) => (Tok::Minus, 1),
            (b'*', _) => (Tok::Star, 1),
            (b'/', _) => (Tok::Slash, 1),
            (b'%', _) => (Tok::Percent, 1),
            _ => {
                let ch = source[i..].chars().next().unwrap_or('?');
                return Err(ParseError::UnexpectedChar { ch, pos: i });
            }
        };
        tokens.push(Spanned { tok, pos: start });
        i += width;
    }

    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(Tok, usize), ParseError> {
    let bytes = source.as_bytes();
    let mut i = start;
    let mut is_float = false;

    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }

    // Fraction only when a digit follows the dot, so `1.abs` stays a method call
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit())
    {
        is_float = true;
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text = source[start..i].replace('_', "");
    let invalid = || ParseError::InvalidNumber {
        text: source[start..i].to_string(),
        pos: start,
    };
    let tok = if is_float {
        Tok::Float(text.parse().map_err(|_| invalid())?)
    } else {
        Tok::Int(text.parse().map_err(|_| invalid())?)
    };
    Ok((tok, i))
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize), ParseError> {
    let quote = source.as_bytes()[start] as char;
    let mut out = String::new();
    let mut chars = source[start + 1..].char_indices();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((out, start + 1 + offset + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            c => out.push(c),
        }
    }

    Err(ParseError::UnterminatedString { pos: start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(source: &str) -> Vec<Tok> {
        tokenize(source).unwrap().into_iter().map(|s| s.tok).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            toks("1 2.5 .5 5e-1 1_000"),
            vec![
                Tok::Int(1),
                Tok::Float(2.5),
                Tok::Float(0.5),
                Tok::Float(0.5),
                Tok::Int(1000),
            ]
        );
    }

    #[test]
    fn test_method_call_on_literal() {
        assert_eq!(
            toks("[0.2, 0.1].min"),
            vec![
                Tok::LBracket,
                Tok::Float(0.2),
                Tok::Comma,
                Tok::Float(0.1),
                Tok::RBracket,
                Tok::Dot,
                Tok::Ident("min".into()),
            ]
        );
        assert_eq!(toks("3.abs"), vec![Tok::Int(3), Tok::Dot, Tok::Ident("abs".into())]);
    }

    #[test]
    fn test_operators_and_strings() {
        assert_eq!(
            toks("a == 'x\\'y' && !b"),
            vec![
                Tok::Ident("a".into()),
                Tok::EqEq,
                Tok::Str("x'y".into()),
                Tok::AndAnd,
                Tok::Bang,
                Tok::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            tokenize("a # b"),
            Err(ParseError::UnexpectedChar { ch: '#', pos: 2 })
        ));
        assert!(matches!(
            tokenize("\"open"),
            Err(ParseError::UnterminatedString { pos: 0 })
        ));
    }
}
