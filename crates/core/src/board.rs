//! Parsed per-tick arena snapshot and cell queries.
//! This module exists so the engine works against typed entities instead of
//! the raw glyph string. It does not own any cross-tick tracked state.

use std::collections::BTreeSet;
use std::fmt;

use crate::types::{Direction, Element, Perk, Point};

/// Blast reach of a bomb with no radius perk applied.
pub const BASE_BLAST_RANGE: u32 = 3;

/// One tick's fully parsed arena. Immutable; replaced wholesale each tick.
#[derive(Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Element>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardParseError {
    Empty,
    NotSquare { len: usize },
    UnknownGlyph { glyph: char, index: usize },
}

impl fmt::Display for BoardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardParseError::Empty => write!(f, "empty board snapshot"),
            BoardParseError::NotSquare { len } => {
                write!(f, "snapshot of {len} cells is not a square board")
            }
            BoardParseError::UnknownGlyph { glyph, index } => {
                write!(f, "unknown glyph {glyph:?} at cell {index}")
            }
        }
    }
}

impl std::error::Error for BoardParseError {}

impl Board {
    /// Parse the raw textual snapshot. Newlines are ignored so both the
    /// single-line wire form and a row-per-line form are accepted.
    pub fn parse(raw: &str) -> Result<Board, BoardParseError> {
        let mut cells = Vec::new();
        for (index, glyph) in raw.chars().filter(|c| *c != '\n' && *c != '\r').enumerate() {
            let element = Element::from_glyph(glyph)
                .ok_or(BoardParseError::UnknownGlyph { glyph, index })?;
            cells.push(element);
        }
        if cells.is_empty() {
            return Err(BoardParseError::Empty);
        }
        let size = (cells.len() as f64).sqrt() as usize;
        if size * size != cells.len() {
            return Err(BoardParseError::NotSquare { len: cells.len() });
        }
        Ok(Board { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Off-board reads resolve to solid wall so callers need no bounds checks.
    pub fn at(&self, point: Point) -> Element {
        if point.is_bad(self.size) {
            return Element::Wall;
        }
        self.cells[point.y as usize * self.size + point.x as usize]
    }

    fn collect(&self, wanted: impl Fn(Element) -> bool) -> Vec<Point> {
        let mut found = Vec::new();
        for (index, element) in self.cells.iter().enumerate() {
            if wanted(*element) {
                found.push(Point::new((index % self.size) as i32, (index / self.size) as i32));
            }
        }
        found
    }

    /// The agent's own cell, whatever state it is in.
    pub fn hero(&self) -> Option<Point> {
        self.collect(|e| {
            matches!(e, Element::Hero | Element::HeroOnBomb | Element::HeroDead)
        })
        .into_iter()
        .next()
    }

    pub fn opponents(&self) -> BTreeSet<Point> {
        self.collect(|e| matches!(e, Element::Opponent | Element::OpponentOnBomb))
            .into_iter()
            .collect()
    }

    pub fn hostiles(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::Hostile).into_iter().collect()
    }

    pub fn dead_hostiles(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::HostileDead).into_iter().collect()
    }

    pub fn bricks(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::Brick).into_iter().collect()
    }

    pub fn walls(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::Wall).into_iter().collect()
    }

    pub fn rubble(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::Rubble).into_iter().collect()
    }

    pub fn blasts(&self) -> BTreeSet<Point> {
        self.collect(|e| e == Element::Blast).into_iter().collect()
    }

    pub fn perks(&self) -> Vec<(Point, Perk)> {
        let mut found = Vec::new();
        for (index, element) in self.cells.iter().enumerate() {
            if let Some(perk) = element.perk() {
                found.push((
                    Point::new((index % self.size) as i32, (index / self.size) as i32),
                    perk,
                ));
            }
        }
        found
    }

    /// Visible fused bombs with their remaining fuse ticks.
    pub fn bombs(&self) -> Vec<(Point, u8)> {
        let mut found = Vec::new();
        for (index, element) in self.cells.iter().enumerate() {
            if let Some(fuse) = element.bomb_fuse() {
                found.push((
                    Point::new((index % self.size) as i32, (index / self.size) as i32),
                    fuse,
                ));
            }
        }
        found
    }

    /// Cells destroyed when a bomb at `origin` with reach `range` detonates:
    /// walk each axis direction, stop at the first solid wall (excluded),
    /// include the first brick wall but nothing beyond it.
    pub fn blast_cells(&self, origin: Point, range: u32) -> BTreeSet<Point> {
        let mut cells = BTreeSet::new();
        cells.insert(origin);
        for direction in Direction::ALL {
            let mut cursor = origin;
            for _ in 0..range {
                cursor = cursor.step(direction);
                match self.at(cursor) {
                    Element::Wall => break,
                    Element::Brick => {
                        cells.insert(cursor);
                        break;
                    }
                    _ => {
                        cells.insert(cursor);
                    }
                }
            }
        }
        cells
    }

    /// Union of blast cells over every visible fused bomb. With
    /// `imminent_only` the walk is restricted to bombs detonating this tick.
    pub fn future_blasts(&self, imminent_only: bool) -> BTreeSet<Point> {
        let mut cells = BTreeSet::new();
        for (origin, fuse) in self.bombs() {
            if imminent_only && fuse > 1 {
                continue;
            }
            cells.append(&mut self.blast_cells(origin, BASE_BLAST_RANGE));
        }
        cells
    }
}
