use std::{error, fmt, io, path::PathBuf};

#[derive(Debug, derive_more::From)]
pub enum SqError {
    #[from(ignore)]
    MissingElement {
        id: String,
    },
    #[from(ignore)]
    MalformedSquareId {
        id: String,
    },
    Dom(zdom::Error),
    RonDeserializeError {
        error: ron::de::Error,
        path: PathBuf,
    },
    IOError(io::Error),
}

impl SqError {
    pub fn from_ron_de_error(error: ron::de::Error, path: PathBuf) -> Self {
        SqError::RonDeserializeError { error, path }
    }
}

impl fmt::Display for SqError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SqError::MissingElement { id } => write!(f, "No element with id '{}'", id),
            SqError::MalformedSquareId { id } => {
                write!(f, "Square id '{}' is not in the 'row,col' form", id)
            }
            SqError::Dom(ref e) => write!(f, "ZDom Error: {}", e),
            SqError::RonDeserializeError { error, path } => {
                let s = path.to_str().unwrap_or("<no path>");
                write!(f, "Can't deserialize '{}': {}", s, error)
            }
            SqError::IOError(ref e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl error::Error for SqError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SqError::MissingElement { .. } | SqError::MalformedSquareId { .. } => None,
            SqError::Dom(ref e) => Some(e),
            SqError::RonDeserializeError { error, .. } => Some(error),
            SqError::IOError(ref e) => Some(e),
        }
    }
}
