use std::fmt::{Display, Formatter};
use ureq::Error;

#[derive(Debug)]
pub enum ObservationError {
    Http(String),
    Document(String),
}

impl Display for ObservationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationError::Http(e) => write!(f, "ObservationError::Http: {}", e),
            ObservationError::Document(e) => write!(f, "ObservationError::Document: {}", e),
        }
    }
}
impl From<Error> for ObservationError {
    fn from(e: Error) -> Self { ObservationError::Http(e.to_string()) }
}
impl From<serde_json::Error> for ObservationError {
    fn from(e: serde_json::Error) -> Self { ObservationError::Document(e.to_string()) }
}
