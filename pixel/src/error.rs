use std::{error::Error, fmt::Display};

pub type PixelResult<T = ()> = Result<T, PixelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An image or text could not be decoded into pixels.
    Decode,
    /// The backend rejected the decoded pixels.
    Upload,
    /// An atlas rectangle does not fit inside its texture.
    OutOfBounds,
    /// An atlas lookup missed.
    UnknownFrame,
    /// Window, event loop or graphics device failure.
    Platform,
}

#[derive(Debug)]
pub struct PixelError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn Error>>,
}

impl PixelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upload, message)
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfBounds, message)
    }

    pub fn unknown_frame(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFrame, message)
    }

    pub fn platform(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Platform, message)
    }

    pub fn with_source(self, err: impl Error + 'static) -> Self {
        Self {
            source: Some(Box::new(err)),
            ..self
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PixelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", &self.message, source),
            None => write!(f, "{}", &self.message),
        }
    }
}

impl Error for PixelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref()
    }
}

impl From<std::io::Error> for PixelError {
    fn from(err: std::io::Error) -> Self {
        PixelError::decode("failed to read file").with_source(err)
    }
}
