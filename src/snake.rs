use std::ops::Add;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use Direction::*;

const INITIAL_SNAKE_LENGTH: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn delta(self) -> Point {
        match self {
            Up => Point::new(0, -1),
            Down => Point::new(0, 1),
            Left => Point::new(-1, 0),
            Right => Point::new(1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Left | Right)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfHit,
}

/// What a single call to [`GameState::step`] did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The game was already over, nothing changed.
    Idle,
    Moved,
    Ate,
    Crashed(Collision),
}

/// The whole game: the snake (head first), where it's heading, the food,
/// the score and whether the game has ended.
pub struct GameState {
    width: i32,
    height: i32,
    snake: Vec<Point>,
    direction: Direction,
    food: Point,
    score: u32,
    game_over: bool,
    rng: StdRng,
}

impl GameState {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    pub fn seeded(width: i32, height: i32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: i32, height: i32, rng: StdRng) -> Self {
        let mut state = GameState {
            width,
            height,
            snake: vec![],
            direction: Right,
            food: Point::new(0, 0),
            score: 0,
            game_over: false,
            rng,
        };
        state.reset(width, height);
        state
    }

    pub fn reset(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;

        let center = Point::new(width / 2, height / 2);
        self.snake = (0..INITIAL_SNAKE_LENGTH)
            .map(|i| Point::new(center.x - i, center.y))
            .collect();

        self.direction = Right;
        self.score = 0;
        self.game_over = false;
        self.place_food();
    }

    pub fn step(&mut self) -> StepOutcome {
        if self.game_over {
            return StepOutcome::Idle;
        }

        let new_head = self.head() + self.direction.delta();

        if self.hits_wall(new_head) {
            self.game_over = true;
            return StepOutcome::Crashed(Collision::Wall);
        }

        // The current tail counts too, even though it would move away this tick
        if self.snake.contains(&new_head) {
            self.game_over = true;
            return StepOutcome::Crashed(Collision::SelfHit);
        }

        self.snake.insert(0, new_head);

        if new_head == self.food {
            self.score += 1;
            self.place_food();
            StepOutcome::Ate
        } else {
            self.snake.pop();
            StepOutcome::Moved
        }
    }

    /// Picks random interior cells until one is free of the snake.
    pub fn place_food(&mut self) {
        loop {
            let candidate = Point::new(
                self.rng.gen_range(1..self.width - 1),
                self.rng.gen_range(1..self.height - 1),
            );

            if !self.snake.contains(&candidate) {
                self.food = candidate;
                break;
            }
        }

        debug!("Food placed at ({}, {})", self.food.x, self.food.y);
    }

    /// Turns are only taken across axes, so the snake can never reverse into its neck.
    pub fn set_direction(&mut self, new_direction: Direction) {
        if new_direction.is_horizontal() != self.direction.is_horizontal() {
            self.direction = new_direction;
        }
    }

    pub fn head(&self) -> Point {
        self.snake[0]
    }

    pub fn snake(&self) -> &[Point] {
        &self.snake
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn food(&self) -> Point {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn hits_wall(&self, p: Point) -> bool {
        p.x <= 0 || p.x >= self.width - 1 || p.y <= 0 || p.y >= self.height - 1
    }
}
