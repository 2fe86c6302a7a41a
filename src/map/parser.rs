//! Block and line grammar of scene sources.
//!
//! ```text
//! [BEGIN_VERTS]      x y
//! [BEGIN_WALLS]      v1 v2 true|false
//! [BEGIN_SECTORS]    floor ceil w w w , w w w , ...
//! ```
//!
//! Blocks never nest and every `BEGIN_X` is closed by the matching `END_X`.
//! `#` starts a comment that runs to the end of the line.

use std::num::IntErrorKind;

use glam::Vec2;

use super::{
    LoadError, ParseErrorKind, Position,
    lexer::{Token, TokenKind},
};
use crate::world::{Scene, Sector, Wall};

/// Where every cross reference was written, so validation can point at it.
#[derive(Debug, Default)]
pub struct SourceRefs {
    pub wall_vertices: Vec<[Position; 2]>,
    pub sector_walls: Vec<Vec<Position>>,
}

#[derive(Debug)]
pub struct Parsed {
    pub scene: Scene,
    pub refs: SourceRefs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    Verts,
    Walls,
    Sectors,
}

/// Guard name → (block, opens?).
fn guard(name: &str) -> Option<(Block, bool)> {
    Some(match name {
        "BEGIN_VERTS" => (Block::Verts, true),
        "END_VERTS" => (Block::Verts, false),
        "BEGIN_WALLS" => (Block::Walls, true),
        "END_WALLS" => (Block::Walls, false),
        "BEGIN_SECTORS" => (Block::Sectors, true),
        "END_SECTORS" => (Block::Sectors, false),
        _ => return None,
    })
}

/*──────────────────────────── Lines ────────────────────────────────*/

/// One source line with its comment stripped.
struct Line<'t, 's> {
    tokens: &'t [Token<'s>],
    /// Position of the terminating newline (or end of input).
    end: Position,
    next: usize,
}

impl<'t, 's> Line<'t, 's> {
    fn new(tokens: &'t [Token<'s>], end: Position) -> Self {
        let code = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Hash)
            .map_or(tokens, |i| &tokens[..i]);
        Self {
            tokens: code,
            end,
            next: 0,
        }
    }

    /// Next required field.
    fn take(&mut self) -> Result<&'t Token<'s>, LoadError> {
        let tok = self
            .tokens
            .get(self.next)
            .ok_or(LoadError::at(ParseErrorKind::ExpectedToken, self.end))?;
        self.next += 1;
        Ok(tok)
    }

    /// Every field not yet taken.
    fn rest(&mut self) -> &'t [Token<'s>] {
        let rest = &self.tokens[self.next..];
        self.next = self.tokens.len();
        rest
    }

    /// Fails on the first surplus token.
    fn finish(&self) -> Result<(), LoadError> {
        match self.tokens.get(self.next) {
            Some(tok) => Err(unexpected(tok)),
            None => Ok(()),
        }
    }
}

fn lines<'t, 's>(tokens: &'t [Token<'s>], eof: Position) -> impl Iterator<Item = Line<'t, 's>> {
    let mut rest = tokens;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let line = match rest.iter().position(|t| t.kind == TokenKind::Newline) {
            Some(i) => {
                let line = Line::new(&rest[..i], rest[i].pos);
                rest = &rest[i + 1..];
                line
            }
            None => {
                let line = Line::new(rest, eof);
                rest = &[];
                line
            }
        };
        Some(line)
    })
}

/*──────────────────────────── Scalars ──────────────────────────────*/

#[inline]
fn unexpected(tok: &Token<'_>) -> LoadError {
    LoadError::at(ParseErrorKind::UnexpectedToken, tok.pos)
}

/// Non-negative integer index; the whole token must be consumed.
fn index(tok: &Token<'_>) -> Result<u32, LoadError> {
    if tok.kind != TokenKind::Word {
        return Err(unexpected(tok));
    }
    let out_of_range = LoadError::at(ParseErrorKind::IdOutOfRange, tok.pos);
    match tok.text.parse::<i64>() {
        Ok(v) => u32::try_from(v).map_err(|_| out_of_range),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Err(out_of_range),
            _ => Err(unexpected(tok)),
        },
    }
}

/// `f32` literal; the whole token must be consumed.
///
/// Literals that overflow to infinity or underflow to zero are out of range.
fn float(tok: &Token<'_>) -> Result<f32, LoadError> {
    if tok.kind != TokenKind::Word {
        return Err(unexpected(tok));
    }
    let v: f32 = tok.text.parse().map_err(|_| unexpected(tok))?;

    let digits = tok.text.trim_start_matches(['+', '-']);
    let spelled_inf =
        digits.eq_ignore_ascii_case("inf") || digits.eq_ignore_ascii_case("infinity");
    let mantissa = digits.split(['e', 'E']).next().unwrap_or("");
    let nonzero_mantissa = mantissa.bytes().any(|b| (b'1'..=b'9').contains(&b));

    if (v.is_infinite() && !spelled_inf) || (v == 0.0 && nonzero_mantissa) {
        return Err(LoadError::at(ParseErrorKind::FloatOutOfRange, tok.pos));
    }
    Ok(v)
}

fn boolean(tok: &Token<'_>) -> Result<bool, LoadError> {
    match (tok.kind, tok.text) {
        (TokenKind::Word, "true") => Ok(true),
        (TokenKind::Word, "false") => Ok(false),
        _ => Err(unexpected(tok)),
    }
}

/*──────────────────────────── Parser ───────────────────────────────*/

#[derive(Default)]
struct Parser {
    scene: Scene,
    refs: SourceRefs,
    block: Option<Block>,
}

impl Parser {
    fn line(&mut self, mut line: Line<'_, '_>) -> Result<(), LoadError> {
        let tokens = line.tokens;
        let Some(first) = tokens.first() else {
            return Ok(());
        };

        match (first.kind, self.block) {
            (TokenKind::OpenBracket, _) => self.guard(line),
            (TokenKind::Word, Some(Block::Verts)) => {
                let x = float(line.take()?)?;
                let y = float(line.take()?)?;
                line.finish()?;
                self.scene.vertices.push(Vec2::new(x, y));
                Ok(())
            }
            (TokenKind::Word, Some(Block::Walls)) => {
                let a = line.take()?;
                let b = line.take()?;
                let v1 = index(a)?;
                let v2 = index(b)?;
                let is_portal = boolean(line.take()?)?;
                line.finish()?;
                self.scene.walls.push(Wall::new(v1, v2, is_portal));
                self.refs.wall_vertices.push([a.pos, b.pos]);
                Ok(())
            }
            (TokenKind::Word, Some(Block::Sectors)) => self.sector(line),
            _ => Err(unexpected(first)),
        }
    }

    /// `[ NAME ]` on a line of its own.
    fn guard(&mut self, mut line: Line<'_, '_>) -> Result<(), LoadError> {
        line.take()?; // '['
        let name = line.take()?;
        let (block, opens) = match name.kind {
            TokenKind::Word => guard(name.text).ok_or_else(|| unexpected(name))?,
            _ => return Err(unexpected(name)),
        };
        let close = line.take()?;
        if close.kind != TokenKind::CloseBracket {
            return Err(unexpected(close));
        }
        line.finish()?;

        self.block = match (self.block, opens) {
            (None, true) => Some(block),
            (Some(open), false) if open == block => None,
            _ => return Err(unexpected(name)),
        };
        Ok(())
    }

    /// `floor ceil` followed by comma separated wall cycles.
    fn sector(&mut self, mut line: Line<'_, '_>) -> Result<(), LoadError> {
        let floor_height = float(line.take()?)?;
        let ceil_height = float(line.take()?)?;
        let end = line.end;

        let mut walls = Vec::new();
        let mut cycle_ends = Vec::new();
        let mut positions = Vec::new();
        let mut want_index = true;

        for tok in line.rest() {
            if tok.kind == TokenKind::Comma {
                if want_index {
                    return Err(unexpected(tok));
                }
                cycle_ends.push(walls.len() as u32 - 1);
                want_index = true;
            } else {
                walls.push(index(tok)?);
                positions.push(tok.pos);
                want_index = false;
            }
        }

        if walls.is_empty() {
            return Err(LoadError::at(ParseErrorKind::ExpectedToken, end));
        }
        if !want_index {
            cycle_ends.push(walls.len() as u32 - 1);
        }

        self.scene.sectors.push(Sector {
            floor_height,
            ceil_height,
            walls,
            cycle_ends,
        });
        self.refs.sector_walls.push(positions);
        Ok(())
    }
}

/// Run the grammar over a token stream. References are not checked here.
pub fn parse(tokens: &[Token<'_>], eof: Position) -> Result<Parsed, LoadError> {
    let mut parser = Parser::default();
    for line in lines(tokens, eof) {
        parser.line(line)?;
    }
    if parser.block.is_some() {
        return Err(LoadError::at(ParseErrorKind::ExpectedToken, eof));
    }
    Ok(Parsed {
        scene: parser.scene,
        refs: parser.refs,
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
