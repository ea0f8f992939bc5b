use serde::ser;
use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Convert(#[from] nix_expr::Error),

    #[error("map key must be a string, integer, boolean or char, got {kind}")]
    KeyMustBeAString { kind: &'static str },
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
