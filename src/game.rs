use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::{thread, thread::sleep, time::Duration};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::style::Color;
use log::{info, warn};

use crate::input::{Command, InputMapper};
use crate::snake::{Direction, GameState, StepOutcome};
use crate::term::Surface;

pub const WIDTH: i32 = 40;
pub const HEIGHT: i32 = 20;
pub const TICK_INTERVAL: Duration = Duration::from_millis(120);

const WALL_COLOR: Color = Color::Blue;
const SNAKE_COLOR: Color = Color::Green;
const FOOD_COLOR: Color = Color::Red;
const TEXT_COLOR: Color = Color::White;
const BG: Color = Color::Reset;

const SNAKE_HEAD_CHAR: char = '☻';
const SNAKE_BODY_CHAR: char = '■';
const FOOD_CHAR: char = '●';

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Quit,
}

pub struct SnakeGame<S: Surface> {
    state: GameState,
    input: InputMapper,
    surface: S,
    pending: Option<Direction>,
    tick_interval: Duration,
}

impl<S: Surface> SnakeGame<S> {
    pub fn new(state: GameState, surface: S) -> Self {
        SnakeGame { state, input: InputMapper::new(), surface, pending: None, tick_interval: TICK_INTERVAL }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Drains one event per cycle; only simulates when there was nothing to drain.
    pub fn run(&mut self, events: Receiver<Event>) -> Result<()> {
        info!("Game started on a {}x{} board", self.state.width(), self.state.height());

        loop {
            let event = match events.try_recv() {
                Ok(ev) => Some(ev),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    warn!("Input source went away, stopping");
                    break;
                }
            };
            let idle = event.is_none();

            if self.cycle(event)? == LoopState::Quit {
                info!("Quit with score {}", self.state.score());
                break;
            }

            if idle {
                sleep(self.tick_interval);
            }
        }

        Ok(())
    }

    /// One pass of the loop: handle `event` if there is one, otherwise tick and draw.
    pub fn cycle(&mut self, event: Option<Event>) -> Result<LoopState> {
        match event {
            Some(Event::Key(key)) => match self.input.map_key(&key) {
                Command::Quit => return Ok(LoopState::Quit),
                Command::Turn(dir) => self.pending = Some(dir),
                Command::Restart if self.state.is_game_over() => {
                    self.state.reset(WIDTH, HEIGHT);
                    self.pending = None;
                    info!("Restarted");
                }
                Command::Restart | Command::None => {}
            },
            Some(_) => {}
            None => {
                self.tick();
                self.draw().context("Error drawing frame")?;
            }
        }

        Ok(LoopState::Running)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn tick(&mut self) {
        if self.state.is_game_over() {
            return;
        }

        if let Some(dir) = self.pending.take() {
            self.state.set_direction(dir);
        }

        if let StepOutcome::Crashed(collision) = self.state.step() {
            info!("Game over ({:?} heading {:?}), score {}", collision, self.state.direction(), self.state.score());
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw(&mut self) -> std::io::Result<()> {
        self.surface.clear();
        self.draw_walls();
        self.draw_snake();

        let food = self.state.food();
        self.surface.set_cell(food.x, food.y, FOOD_CHAR, FOOD_COLOR, BG);

        self.draw_info();
        if self.state.is_game_over() {
            self.draw_game_over();
        }

        self.surface.flush()
    }

    fn draw_walls(&mut self) {
        let (w, h) = (self.state.width(), self.state.height());

        for x in 0..w {
            self.surface.set_cell(x, 0, '═', WALL_COLOR, BG);
            self.surface.set_cell(x, h - 1, '═', WALL_COLOR, BG);
        }

        for y in 1..h - 1 {
            self.surface.set_cell(0, y, '║', WALL_COLOR, BG);
            self.surface.set_cell(w - 1, y, '║', WALL_COLOR, BG);
        }

        self.surface.set_cell(0, 0, '╔', WALL_COLOR, BG);
        self.surface.set_cell(w - 1, 0, '╗', WALL_COLOR, BG);
        self.surface.set_cell(0, h - 1, '╚', WALL_COLOR, BG);
        self.surface.set_cell(w - 1, h - 1, '╝', WALL_COLOR, BG);
    }

    fn draw_snake(&mut self) {
        for (i, pos) in self.state.snake().iter().enumerate() {
            let ch = if i == 0 {SNAKE_HEAD_CHAR} else {SNAKE_BODY_CHAR};
            self.surface.set_cell(pos.x, pos.y, ch, SNAKE_COLOR, BG);
        }
    }

    fn draw_info(&mut self) {
        let x = self.state.width() + 2;
        let score = format!("Score: {}", self.state.score());

        self.draw_text(x, 2, &score, TEXT_COLOR);
        self.draw_text(x, 4, "Controls:", TEXT_COLOR);
        self.draw_text(x, 5, "Arrow keys", TEXT_COLOR);
        self.draw_text(x, 6, "'q' to quit", TEXT_COLOR);
    }

    fn draw_game_over(&mut self) {
        let mid = self.state.height() / 2;
        let final_score = format!("Final Score: {}", self.state.score());

        self.draw_centered(mid - 1, "GAME OVER", FOOD_COLOR);
        self.draw_centered(mid, &final_score, TEXT_COLOR);
        self.draw_centered(mid + 2, "Press ENTER to restart", TEXT_COLOR);
    }

    fn draw_centered(&mut self, y: i32, text: &str, fg: Color) {
        let x = (self.state.width() - text.chars().count() as i32) / 2;
        self.draw_text(x, y, text, fg);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.surface.set_cell(x + i as i32, y, ch, fg, BG);
        }
    }
}

/// Starts the background reader that forwards every terminal event to the loop.
pub fn spawn_input_thread() -> Result<Receiver<Event>> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("input".into())
        .spawn(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break; // Loop is gone
                    }
                }
                Err(e) => {
                    warn!("Error reading terminal event: {}", e);
                    break;
                }
            }
        })
        .context("Error spawning input thread")?;

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::{Direction::*, Point};
    use crate::term::ScreenBuffer;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn game() -> SnakeGame<ScreenBuffer> {
        SnakeGame::new(GameState::seeded(WIDTH, HEIGHT, 42), ScreenBuffer::new(80, 24))
            .with_tick_interval(Duration::ZERO)
    }

    fn key(code: KeyCode) -> Option<Event> {
        Some(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn crash(game: &mut SnakeGame<ScreenBuffer>) {
        game.cycle(key(KeyCode::Up)).unwrap();
        while !game.state().is_game_over() {
            game.cycle(None).unwrap();
        }
    }

    #[test]
    fn idle_cycle_steps_once() {
        let mut game = game();
        let head = game.state().head();

        assert_eq!(game.cycle(None).unwrap(), LoopState::Running);
        assert_eq!(game.state().head(), head + Point::new(1, 0));
    }

    #[test]
    fn event_cycle_does_not_step() {
        let mut game = game();
        let head = game.state().head();

        game.cycle(key(KeyCode::Down)).unwrap();
        assert_eq!(game.state().head(), head);
        assert_eq!(game.state().direction(), Right);

        game.cycle(None).unwrap();
        assert_eq!(game.state().direction(), Down);
        assert_eq!(game.state().head(), head + Point::new(0, 1));
    }

    #[test]
    fn latest_turn_wins() {
        let mut game = game();

        game.cycle(key(KeyCode::Up)).unwrap();
        game.cycle(key(KeyCode::Down)).unwrap();
        game.cycle(None).unwrap();

        assert_eq!(game.state().direction(), Down);
    }

    #[test]
    fn quick_reversal_is_rejected() {
        let mut game = game();

        game.cycle(key(KeyCode::Left)).unwrap();
        game.cycle(None).unwrap();

        assert_eq!(game.state().direction(), Right);
        assert!(!game.state().is_game_over());
    }

    #[test]
    fn quit_keys_stop_loop() {
        let mut game = game();
        assert_eq!(game.cycle(key(KeyCode::Char('q'))).unwrap(), LoopState::Quit);

        let ctrl_q = Some(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert_eq!(game.cycle(ctrl_q).unwrap(), LoopState::Quit);
    }

    #[test]
    fn restart_only_when_over() {
        let mut game = game();
        game.cycle(None).unwrap();
        let head = game.state().head();

        game.cycle(key(KeyCode::Enter)).unwrap();
        assert_eq!(game.state().head(), head);

        crash(&mut game);
        let snake = game.state().snake().to_vec();
        game.cycle(None).unwrap();
        assert_eq!(game.state().snake(), &snake[..]);

        game.cycle(key(KeyCode::Enter)).unwrap();
        assert!(!game.state().is_game_over());
        assert_eq!(game.state().score(), 0);
        assert_eq!(game.state().snake(), &[Point::new(20, 10), Point::new(19, 10), Point::new(18, 10)]);
    }

    #[test]
    fn non_key_events_are_ignored() {
        let mut game = game();
        let head = game.state().head();

        assert_eq!(game.cycle(Some(Event::Resize(100, 50))).unwrap(), LoopState::Running);
        assert_eq!(game.state().head(), head);
    }

    #[test]
    fn frame_shows_board() {
        let mut game = game();
        game.cycle(None).unwrap();

        let screen = game.surface();
        let head = game.state().head();
        let food = game.state().food();

        assert_eq!(screen.cell(0, 0).unwrap().ch, '╔');
        assert_eq!(screen.cell(WIDTH - 1, HEIGHT - 1).unwrap().ch, '╝');
        assert_eq!(screen.cell(WIDTH - 1, 5).unwrap().ch, '║');
        assert_eq!(screen.cell(5, 0).unwrap().fg, WALL_COLOR);
        assert_eq!(screen.cell(head.x, head.y).unwrap().ch, SNAKE_HEAD_CHAR);
        assert_eq!(screen.cell(head.x - 1, head.y).unwrap().ch, SNAKE_BODY_CHAR);
        assert_eq!(screen.cell(food.x, food.y).unwrap().ch, FOOD_CHAR);
        assert!(screen.row_text(2).contains(&format!("Score: {}", game.state().score())));
        assert!(screen.row_text(6).contains("'q' to quit"));
        assert!(!screen.row_text(HEIGHT / 2 - 1).contains("GAME OVER"));
    }

    #[test]
    fn frame_shows_game_over() {
        let mut game = game();
        crash(&mut game);
        game.cycle(None).unwrap();

        let screen = game.surface();
        let y = HEIGHT / 2 - 1;
        let title: String = ((WIDTH - 9) / 2..(WIDTH - 9) / 2 + 9)
            .map(|x| screen.cell(x, y).unwrap().ch)
            .collect();
        assert_eq!(title, "GAME OVER");
        assert_eq!(screen.cell((WIDTH - 9) / 2, y).unwrap().fg, FOOD_COLOR);

        let final_score = format!("Final Score: {}", game.state().score());
        assert!(screen.row_text(HEIGHT / 2).contains(&final_score));
        assert!(screen.row_text(HEIGHT / 2 + 2).contains("Press ENTER to restart"));
    }

    #[test]
    fn run_drains_then_quits() {
        let (tx, rx) = mpsc::channel();
        let mut game = game();
        let head = game.state().head();

        tx.send(Event::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE))).unwrap();
        tx.send(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE))).unwrap();
        game.run(rx).unwrap();

        assert_eq!(game.state().head(), head);
    }

    #[test]
    fn run_stops_when_input_disconnects() {
        let (tx, rx) = mpsc::channel::<Event>();
        drop(tx);

        let mut game = game();
        game.run(rx).unwrap();
        assert!(!game.state().is_game_over());
    }
}
