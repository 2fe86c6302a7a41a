// ──────────────────────────────────────────────────────────────────────────
// map/mod.rs
//
//  scene text ──lexer──▶ tokens ──parser──▶ Scene + source refs
//                                              │
//                                   validate ◀─╯  (references, wall links)
// ──────────────────────────────────────────────────────────────────────────

mod lexer;
mod parser;
mod validate;

use std::{fmt, fs, io, path::Path, str::FromStr};

use thiserror::Error;

use crate::world::Scene;

/*──────────────────────────── Error types ──────────────────────────*/

/// What went wrong while reading a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A line or guard ended before a required token.
    ExpectedToken,
    /// A token that does not fit the grammar, malformed numbers included.
    UnexpectedToken,
    /// Negative or overflowing integer index.
    IdOutOfRange,
    /// Float literal outside the `f32` range.
    FloatOutOfRange,
    /// Index naming a vertex or wall that does not exist.
    UndefinedReference,
    /// Wall claimed by more than two sectors.
    InvalidWall,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExpectedToken => "expected token",
            Self::UnexpectedToken => "unexpected token",
            Self::IdOutOfRange => "index out of range",
            Self::FloatOutOfRange => "float out of range",
            Self::UndefinedReference => "undefined reference",
            Self::InvalidWall => "wall shared by more than two sectors",
        };
        f.write_str(s)
    }
}

/// Location of a token in the scene source.
///
/// `token` is 0-based over the whole token stream (newlines included),
/// `line` / `column` are 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub token: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (token #{})", self.line, self.column, self.token)
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{kind} at {pos}")]
    Parse { kind: ParseErrorKind, pos: Position },
}

impl LoadError {
    pub(crate) fn at(kind: ParseErrorKind, pos: Position) -> Self {
        Self::Parse { kind, pos }
    }

    /// Grammar / validation kind, `None` for I/O failures.
    pub fn kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse { kind, .. } => Some(*kind),
            Self::Io(_) => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Parse { pos, .. } => Some(*pos),
            Self::Io(_) => None,
        }
    }
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

/// Parse and validate scene source text.
///
/// Fails fast on the first grammar or validation error; a failed load never
/// yields a partially built `Scene`.
pub fn parse_scene(src: &str) -> Result<Scene, LoadError> {
    let tokens = lexer::tokenize(src);
    let eof = lexer::end_of_input(src, &tokens);

    let parser::Parsed { mut scene, refs } = parser::parse(&tokens, eof)?;
    validate::link(&mut scene, &refs)?;

    log::info!(
        "scene loaded: {} vertices, {} walls, {} sectors",
        scene.vertices.len(),
        scene.walls.len(),
        scene.sectors.len()
    );
    Ok(scene)
}

/// Read the scene file at `path` and parse it.
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene, LoadError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path)?;
    log::debug!("loading scene {}", path.display());
    parse_scene(&src)
}

impl FromStr for Scene {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scene(s)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROOM: &str = "\
# unit square room
[BEGIN_VERTS]
0 0
1 0
1 1
0 1
[END_VERTS]
[BEGIN_WALLS]
0 1 false
1 2 false
2 3 false
3 0 false
[END_WALLS]
[BEGIN_SECTORS]
0 10 0 1 2 3
[END_SECTORS]
";

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(ROOM.as_bytes()).expect("write scene");

        let scene = load_scene(file.path()).expect("scene loads");
        assert_eq!(scene.vertices.len(), 4);
        assert_eq!(scene.walls.len(), 4);
        assert_eq!(scene.sectors.len(), 1);
        assert!(scene.walls.iter().all(|w| w.sectors() == [0]));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_scene(dir.path().join("nope.scene")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn from_str_matches_parse_scene() {
        let scene: Scene = ROOM.parse().expect("scene parses");
        assert_eq!(scene.sectors[0].walls, vec![0, 1, 2, 3]);
        assert_eq!(scene.sectors[0].cycle_ends, vec![3]);
    }

    #[test]
    fn error_message_carries_position() {
        let err = parse_scene("[BEGIN_WALLS]\n0 1 2 true\n[END_WALLS]\n").unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::UnexpectedToken));
        let msg = err.to_string();
        assert!(msg.starts_with("unexpected token at 2:5"), "{msg}");
    }

    #[test]
    fn bundled_scenes_load() {
        let two = parse_scene(include_str!("../../scenes/two_rooms.scene")).expect("two_rooms");
        assert_eq!(two.walls[2].sectors(), [0, 1]);

        let corridor = parse_scene(include_str!("../../scenes/corridor.scene")).expect("corridor");
        assert_eq!(corridor.sectors[1].cycles().count(), 2);
        assert_eq!(corridor.walls[8].other_side(1), Some(2));

        parse_scene(include_str!("../../scenes/square.scene")).expect("square");
    }
}
