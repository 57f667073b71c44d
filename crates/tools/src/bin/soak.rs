//! Soak harness: drive the engine against a seeded, self-contained arena
//! stepper for many ticks and assert every tick still decides. The stepper
//! is deliberately minimal; it only models what the engine can observe:
//! walls, bricks, fused bombs, blasts and random-walking hostiles.

use anyhow::Result;
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use sapper_core::{ActOrder, Command, Direction, Engine, Point};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    ticks: u32,
    /// Arena side length (odd, at least 7)
    #[arg(long, default_value_t = 13)]
    size: usize,
}

const BOMB_FUSE: u8 = 5;
const BLAST_RANGE: i32 = 3;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Terrain {
    Open,
    Wall,
    Brick,
}

struct Arena {
    size: usize,
    terrain: Vec<Terrain>,
    hero: Point,
    hero_dead: bool,
    hostiles: Vec<Point>,
    corpses: Vec<Point>,
    bombs: Vec<(Point, u8)>,
    blasts: Vec<Point>,
    bricks_destroyed: u32,
    hero_deaths: u32,
}

impl Arena {
    fn generate(size: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut terrain = vec![Terrain::Open; size * size];
        for y in 0..size {
            for x in 0..size {
                let border = x == 0 || y == 0 || x == size - 1 || y == size - 1;
                let lattice = x % 2 == 0 && y % 2 == 0;
                if border || lattice {
                    terrain[y * size + x] = Terrain::Wall;
                }
            }
        }
        // Scatter bricks over roughly a third of the open cells, keeping
        // the spawn corner clear so the hero is never walled in.
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                let spawn_corner = x + y <= 3;
                if terrain[y * size + x] == Terrain::Open
                    && !spawn_corner
                    && rng.next_u64() % 3 == 0
                {
                    terrain[y * size + x] = Terrain::Brick;
                }
            }
        }

        let mut arena = Self {
            size,
            terrain,
            hero: Point::new(1, 1),
            hero_dead: false,
            hostiles: Vec::new(),
            corpses: Vec::new(),
            bombs: Vec::new(),
            blasts: Vec::new(),
            bricks_destroyed: 0,
            hero_deaths: 0,
        };
        for _ in 0..3 {
            let spot = arena.random_open_cell(rng);
            if spot.manhattan(arena.hero) > 4 {
                arena.hostiles.push(spot);
            }
        }
        arena
    }

    fn random_open_cell(&self, rng: &mut ChaCha8Rng) -> Point {
        loop {
            let x = 1 + (rng.next_u64() as usize % (self.size - 2));
            let y = 1 + (rng.next_u64() as usize % (self.size - 2));
            let point = Point::new(x as i32, y as i32);
            if self.terrain_at(point) == Terrain::Open {
                return point;
            }
        }
    }

    fn terrain_at(&self, point: Point) -> Terrain {
        if point.is_bad(self.size) {
            return Terrain::Wall;
        }
        self.terrain[point.y as usize * self.size + point.x as usize]
    }

    fn walkable(&self, point: Point) -> bool {
        self.terrain_at(point) == Terrain::Open
            && !self.bombs.iter().any(|(bomb, _)| *bomb == point)
    }

    fn render(&self) -> String {
        let mut glyphs = vec![' '; self.size * self.size];
        for (index, terrain) in self.terrain.iter().enumerate() {
            glyphs[index] = match terrain {
                Terrain::Open => ' ',
                Terrain::Wall => '☼',
                Terrain::Brick => '#',
            };
        }
        let mut put = |point: Point, glyph: char| {
            glyphs[point.y as usize * self.size + point.x as usize] = glyph;
        };
        for blast in &self.blasts {
            put(*blast, '҉');
        }
        for (bomb, fuse) in &self.bombs {
            put(*bomb, char::from(b'0' + fuse));
        }
        for corpse in &self.corpses {
            put(*corpse, 'x');
        }
        for hostile in &self.hostiles {
            put(*hostile, '&');
        }
        if self.hero_dead {
            put(self.hero, 'Ѡ');
        } else if self.bombs.iter().any(|(bomb, _)| *bomb == self.hero) {
            put(self.hero, '☻');
        } else {
            put(self.hero, '☺');
        }
        glyphs.into_iter().collect()
    }

    fn step(&mut self, command: Command, rng: &mut ChaCha8Rng) {
        self.blasts.clear();
        self.corpses.clear();

        if self.hero_dead {
            // One tick as a corpse, then respawn at the spawn corner.
            self.hero_dead = false;
            self.hero = Point::new(1, 1);
        } else {
            if command.act == Some(ActOrder::BeforeMove) {
                self.place_bomb(self.hero);
            }
            if let Some(direction) = command.direction {
                let next = self.hero.step(direction);
                if self.walkable(next) {
                    self.hero = next;
                }
            }
            if command.act == Some(ActOrder::AfterMove) {
                self.place_bomb(self.hero);
            }
        }

        // Fuse countdown and detonation.
        let mut exploded = Vec::new();
        for (bomb, fuse) in &mut self.bombs {
            *fuse -= 1;
            if *fuse == 0 {
                exploded.push(*bomb);
            }
        }
        self.bombs.retain(|(_, fuse)| *fuse > 0);
        for origin in exploded {
            self.detonate(origin);
        }

        // Hostiles wander one random step; stepping onto the hero kills.
        let mut moved = Vec::new();
        for hostile in self.hostiles.clone() {
            let direction = Direction::ALL[(rng.next_u64() % 4) as usize];
            let next = hostile.step(direction);
            let open = self.walkable(next) && !moved.contains(&next);
            let next = if open { next } else { hostile };
            if next == self.hero && !self.hero_dead {
                self.hero_dead = true;
                self.hero_deaths += 1;
            }
            moved.push(next);
        }
        self.hostiles = moved;
    }

    fn place_bomb(&mut self, at: Point) {
        if !self.bombs.iter().any(|(bomb, _)| *bomb == at) {
            self.bombs.push((at, BOMB_FUSE));
        }
    }

    fn detonate(&mut self, origin: Point) {
        let mut hit = vec![origin];
        for direction in Direction::ALL {
            let mut cursor = origin;
            for _ in 0..BLAST_RANGE {
                cursor = cursor.step(direction);
                match self.terrain_at(cursor) {
                    Terrain::Wall => break,
                    Terrain::Brick => {
                        self.terrain[cursor.y as usize * self.size + cursor.x as usize] =
                            Terrain::Open;
                        self.bricks_destroyed += 1;
                        hit.push(cursor);
                        break;
                    }
                    Terrain::Open => hit.push(cursor),
                }
            }
        }

        for cell in &hit {
            if let Some(index) = self.hostiles.iter().position(|h| h == cell) {
                self.hostiles.swap_remove(index);
                self.corpses.push(*cell);
            }
            if *cell == self.hero && !self.hero_dead {
                self.hero_dead = true;
                self.hero_deaths += 1;
            }
        }
        self.blasts.extend(hit);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.size >= 7 && args.size % 2 == 1, "size must be odd and at least 7");

    println!(
        "Soaking seed {} for {} ticks on a {size}x{size} arena...",
        args.seed,
        args.ticks,
        size = args.size
    );
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut arena = Arena::generate(args.size, &mut rng);
    let mut engine = Engine::new();

    for tick in 1..=args.ticks {
        let snapshot = arena.render();
        let command = engine
            .process_tick(&snapshot)
            .map_err(|e| anyhow::anyhow!("tick {tick} failed to decide: {e}"))?;
        arena.step(command, &mut rng);
    }

    println!(
        "Soak complete: {} ticks, {} bricks destroyed, {} hero deaths.",
        args.ticks, arena.bricks_destroyed, arena.hero_deaths
    );
    Ok(())
}
