use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, NetErr>;

/// The crate's error type.
///
/// Numerical divergence is not represented here: it is a state of the network,
/// queried with `Network::contains_nan`.
#[derive(Debug)]
pub enum NetErr {
    InvalidConfig(String),
    EmptyCorpus,
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for NetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            NetErr::EmptyCorpus => write!(f, "the corpus does not contain any sample"),
            NetErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch for {what}: got {got}, expected {expected}"
            ),
            NetErr::Io(e) => write!(f, "io error: {e}"),
            NetErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for NetErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NetErr::Io(e) => Some(e),
            NetErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NetErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for NetErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
