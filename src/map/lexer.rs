//! Tokenizer for scene sources.
//!
//! * Spaces, tabs and carriage returns separate tokens and are dropped.
//! * `[`, `]`, `#`, `,` and `\n` are single-character tokens of their own.
//! * Everything else accumulates into word tokens (numbers, guard names,
//!   booleans).

use super::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    OpenBracket,
    CloseBracket,
    Hash,
    Comma,
    Newline,
}

#[derive(Clone, Copy, Debug)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub pos: Position,
}

fn special(c: char) -> Option<TokenKind> {
    match c {
        '[' => Some(TokenKind::OpenBracket),
        ']' => Some(TokenKind::CloseBracket),
        '#' => Some(TokenKind::Hash),
        ',' => Some(TokenKind::Comma),
        '\n' => Some(TokenKind::Newline),
        _ => None,
    }
}

#[inline]
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Split `src` into tokens. Never fails; grammar errors are the parser's job.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut line = 1u32;
    let mut column = 1u32;
    // start byte + position of the word being accumulated
    let mut word: Option<(usize, Position)> = None;

    for (at, c) in src.char_indices() {
        if is_separator(c) {
            flush_word(src, &mut out, &mut word, at);
        } else if let Some(kind) = special(c) {
            flush_word(src, &mut out, &mut word, at);
            out.push(Token {
                kind,
                text: &src[at..at + c.len_utf8()],
                pos: Position {
                    token: out.len(),
                    line,
                    column,
                },
            });
        } else if word.is_none() {
            word = Some((
                at,
                Position {
                    token: 0,
                    line,
                    column,
                },
            ));
        }

        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    flush_word(src, &mut out, &mut word, src.len());

    out
}

fn flush_word<'src>(
    src: &'src str,
    out: &mut Vec<Token<'src>>,
    word: &mut Option<(usize, Position)>,
    end: usize,
) {
    if let Some((start, pos)) = word.take() {
        let token = out.len();
        out.push(Token {
            kind: TokenKind::Word,
            text: &src[start..end],
            pos: Position { token, ..pos },
        });
    }
}

/// Position just past the last token, used for "expected more" errors at EOF.
pub fn end_of_input(src: &str, tokens: &[Token<'_>]) -> Position {
    let line = 1 + src.matches('\n').count() as u32;
    let column = 1 + src.rsplit('\n').next().map_or(0, |l| l.chars().count()) as u32;
    Position {
        token: tokens.len(),
        line,
        column,
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
