use serde::{Deserialize, Serialize};

/// Board-relative integer coordinate. `y` grows downward, matching the
/// row order of the raw snapshot text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Off-board points are flagged rather than being an error.
    pub fn is_bad(self, board_size: usize) -> bool {
        self.x < 0
            || self.y < 0
            || self.x as usize >= board_size
            || self.y as usize >= board_size
    }

    pub fn step(self, direction: Direction) -> Point {
        let (dx, dy) = direction.offset();
        Point { x: self.x + dx, y: self.y + dy }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Point {
        Point { x: self.x + dx, y: self.y + dy }
    }

    pub fn neighbors(self) -> [Point; 4] {
        [
            Point { x: self.x, y: self.y - 1 },
            Point { x: self.x + 1, y: self.y },
            Point { x: self.x, y: self.y + 1 },
            Point { x: self.x - 1, y: self.y },
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }

    /// Direction of a single-cell step from `from` to `to`, if any.
    pub fn between(from: Point, to: Point) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Temporary power-up kinds. A closed enum so perk bookkeeping can use a
/// fixed-size array instead of a runtime-keyed map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Perk {
    Immunity,
    RemoteControl,
    ExtraBomb,
    BlastRadius,
}

impl Perk {
    pub const COUNT: usize = 4;
    pub const ALL: [Perk; Perk::COUNT] =
        [Perk::Immunity, Perk::RemoteControl, Perk::ExtraBomb, Perk::BlastRadius];

    pub fn index(self) -> usize {
        match self {
            Perk::Immunity => 0,
            Perk::RemoteControl => 1,
            Perk::ExtraBomb => 2,
            Perk::BlastRadius => 3,
        }
    }
}

/// Everything a single board cell can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Empty,
    Wall,
    Brick,
    Rubble,
    Hero,
    HeroOnBomb,
    HeroDead,
    Opponent,
    OpponentOnBomb,
    OpponentDead,
    Hostile,
    HostileDead,
    Bomb1,
    Bomb2,
    Bomb3,
    Bomb4,
    Bomb5,
    Blast,
    PerkImmunity,
    PerkRemoteControl,
    PerkExtraBomb,
    PerkBlastRadius,
}

impl Element {
    pub fn from_glyph(glyph: char) -> Option<Element> {
        Some(match glyph {
            ' ' => Element::Empty,
            '☼' => Element::Wall,
            '#' => Element::Brick,
            'H' => Element::Rubble,
            '☺' => Element::Hero,
            '☻' => Element::HeroOnBomb,
            'Ѡ' => Element::HeroDead,
            '♥' => Element::Opponent,
            '♠' => Element::OpponentOnBomb,
            '♣' => Element::OpponentDead,
            '&' => Element::Hostile,
            'x' => Element::HostileDead,
            '1' => Element::Bomb1,
            '2' => Element::Bomb2,
            '3' => Element::Bomb3,
            '4' => Element::Bomb4,
            '5' => Element::Bomb5,
            '҉' => Element::Blast,
            'i' => Element::PerkImmunity,
            'r' => Element::PerkRemoteControl,
            'c' => Element::PerkExtraBomb,
            '+' => Element::PerkBlastRadius,
            _ => return None,
        })
    }

    pub fn glyph(self) -> char {
        match self {
            Element::Empty => ' ',
            Element::Wall => '☼',
            Element::Brick => '#',
            Element::Rubble => 'H',
            Element::Hero => '☺',
            Element::HeroOnBomb => '☻',
            Element::HeroDead => 'Ѡ',
            Element::Opponent => '♥',
            Element::OpponentOnBomb => '♠',
            Element::OpponentDead => '♣',
            Element::Hostile => '&',
            Element::HostileDead => 'x',
            Element::Bomb1 => '1',
            Element::Bomb2 => '2',
            Element::Bomb3 => '3',
            Element::Bomb4 => '4',
            Element::Bomb5 => '5',
            Element::Blast => '҉',
            Element::PerkImmunity => 'i',
            Element::PerkRemoteControl => 'r',
            Element::PerkExtraBomb => 'c',
            Element::PerkBlastRadius => '+',
        }
    }

    /// Ticks left on a visible fused bomb, if this cell is one.
    /// Cells where an agent stands on its own bomb count as a fresh fuse.
    pub fn bomb_fuse(self) -> Option<u8> {
        match self {
            Element::Bomb1 => Some(1),
            Element::Bomb2 => Some(2),
            Element::Bomb3 => Some(3),
            Element::Bomb4 => Some(4),
            Element::Bomb5 | Element::HeroOnBomb | Element::OpponentOnBomb => Some(5),
            _ => None,
        }
    }

    pub fn perk(self) -> Option<Perk> {
        match self {
            Element::PerkImmunity => Some(Perk::Immunity),
            Element::PerkRemoteControl => Some(Perk::RemoteControl),
            Element::PerkExtraBomb => Some(Perk::ExtraBomb),
            Element::PerkBlastRadius => Some(Perk::BlastRadius),
            _ => None,
        }
    }

    /// Cells the hero cannot traverse this tick.
    pub fn is_impassable(self) -> bool {
        matches!(
            self,
            Element::Wall
                | Element::Brick
                | Element::Hostile
                | Element::HostileDead
                | Element::Opponent
                | Element::Bomb1
                | Element::Bomb2
                | Element::Bomb3
                | Element::Bomb4
                | Element::Bomb5
        )
    }
}

/// When a bomb action applies relative to the move in the same command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActOrder {
    BeforeMove,
    AfterMove,
}

/// One tick's emitted command: an optional directional move and an
/// optional bomb action ordered before or after the move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Command {
    pub direction: Option<Direction>,
    pub act: Option<ActOrder>,
}

impl Command {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn step(direction: Direction) -> Self {
        Self { direction: Some(direction), act: None }
    }

    pub fn act_only() -> Self {
        Self { direction: None, act: Some(ActOrder::BeforeMove) }
    }

    pub fn act_then_step(direction: Option<Direction>) -> Self {
        Self { direction, act: Some(ActOrder::BeforeMove) }
    }

    pub fn step_then_act(direction: Direction) -> Self {
        Self { direction: Some(direction), act: Some(ActOrder::AfterMove) }
    }

    pub fn fires_bomb(self) -> bool {
        self.act.is_some()
    }

    pub fn clear_act(&mut self) {
        self.act = None;
    }

    /// Attach a bomb action unless one is already present.
    pub fn add_act(&mut self, order: ActOrder) {
        if self.act.is_none() {
            self.act = Some(order);
        }
    }

    pub fn token(self) -> String {
        match (self.direction, self.act) {
            (None, None) => "NONE".to_string(),
            (None, Some(_)) => "ACT".to_string(),
            (Some(dir), None) => dir.token().to_string(),
            (Some(dir), Some(ActOrder::BeforeMove)) => format!("ACT,{}", dir.token()),
            (Some(dir), Some(ActOrder::AfterMove)) => format!("{},ACT", dir.token()),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token())
    }
}
