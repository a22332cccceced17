use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::snake::Direction::{self, *};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Quit,
    /// Only honoured by the loop while the game is over.
    Restart,
    None,
}

pub struct InputMapper;

impl InputMapper {
    pub fn new() -> Self {
        InputMapper
    }

    pub fn map_key(&self, key: &KeyEvent) -> Command {
        if key.kind != KeyEventKind::Press {
            return Command::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => Command::Quit,
                _ => Command::None,
            };
        }

        match key.code {
            KeyCode::Up => Command::Turn(Up),
            KeyCode::Down => Command::Turn(Down),
            KeyCode::Left => Command::Turn(Left),
            KeyCode::Right => Command::Turn(Right),
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Enter => Command::Restart,
            _ => Command::None,
        }
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}
