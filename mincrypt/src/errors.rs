#[derive(thiserror::Error, Debug)]
pub enum MincryptError {
    /// Nearest-prime search ran off the end of the `u64` range without hitting a prime.
    #[error("NotFound: no prime reachable from {0} in the requested direction")]
    NotFound(u64),
    /// Error when trying to find a modular inverse that doesn't exist (gcd(e, phi) != 1).
    #[error("NoInverse: {0}")]
    NoInverse(String),
    /// Key search hit the configured retry ceiling.
    #[error("KeyGenExhausted: no usable key material after {attempts} attempts")]
    KeyGenExhausted { attempts: usize },
    #[error("NotSemiprime: {0} is not a product of exactly two primes")]
    NotSemiprime(u64),
    #[error("NoPrimeFound: {0}")]
    NoPrimeFound(String),

    /// A zero modulus was passed where arithmetic needs one.
    #[error("InvalidModulus: {0}")]
    InvalidModulus(String),
    #[error("InvalidParameters: {0}")]
    InvalidParameters(String),

    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    /// Malformed or truncated key material.
    #[error("FormatError: {0}")]
    FormatError(String),

    #[error("Data serialization: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MincryptError {
    /// Maps an I/O error raised while decoding a stream: running out of bytes is a format
    /// problem of the stream, anything else stays an I/O failure.
    pub(crate) fn from_read(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            return MincryptError::FormatError(format!("truncated stream while reading {}", what));
        }

        MincryptError::IoError(err)
    }
}
