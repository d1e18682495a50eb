use std::error::Error;
use std::fmt::{self, Display};

/// A source position, 1-indexed on both axes.
pub type Position = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusError {
    Lexer { message: String, position: Position },
    Parser(Vec<ParseError>),
    Type { message: String, position: Position },
    Runtime { message: String, position: Position },
    Name { message: String, position: Position },
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.position.0, self.position.1
        )
    }
}

impl Error for ParseError {}

impl MusError {
    pub fn lexer(message: impl Into<String>, position: Position) -> Self {
        Self::Lexer {
            message: message.into(),
            position,
        }
    }

    pub fn ty(message: impl Into<String>, position: Position) -> Self {
        Self::Type {
            message: message.into(),
            position,
        }
    }

    pub fn runtime(message: impl Into<String>, position: Position) -> Self {
        Self::Runtime {
            message: message.into(),
            position,
        }
    }

    pub fn name(message: impl Into<String>, position: Position) -> Self {
        Self::Name {
            message: message.into(),
            position,
        }
    }

    /// Exit code the CLI driver should map this error to (see external interface spec).
    pub fn exit_code(&self) -> i32 {
        match self {
            MusError::Lexer { .. } | MusError::Parser(_) => 65,
            MusError::Type { .. } | MusError::Runtime { .. } | MusError::Name { .. } => 70,
            MusError::Interrupt => 130,
        }
    }
}

impl Display for MusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusError::Lexer { message, position } => {
                write!(f, "{} at line {}, column {}", message, position.0, position.1)
            }
            MusError::Parser(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            MusError::Type { message, position } => {
                write!(f, "{} at line {}, column {}", message, position.0, position.1)
            }
            MusError::Runtime { message, position } => {
                write!(f, "{} at line {}, column {}", message, position.0, position.1)
            }
            MusError::Name { message, position } => {
                write!(f, "{} at line {}, column {}", message, position.0, position.1)
            }
            MusError::Interrupt => write!(f, "interrupted"),
        }
    }
}

impl Error for MusError {}
