#[derive(Debug)]
pub enum HashError {
    Validation(String),
    Allocation { size: u32, reason: String },
    Engine(String),
    Unavailable(String),
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashError::Validation(msg) => write!(f, "Invalid parameters: {msg}"),
            HashError::Allocation { size, reason } => {
                write!(f, "Engine allocation of {size} bytes failed: {reason}")
            }
            HashError::Engine(msg) => write!(f, "Engine failure: {msg}"),
            HashError::Unavailable(msg) => write!(f, "Hasher unavailable: {msg}"),
        }
    }
}

impl std::error::Error for HashError {}

impl HashError {
    pub fn is_validation(&self) -> bool {
        matches!(self, HashError::Validation(_))
    }

    pub fn is_engine(&self) -> bool {
        matches!(self, HashError::Engine(_))
    }
}
