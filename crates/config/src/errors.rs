use thiserror::Error;

/// Errors that can occur while loading or resolving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying IO failure.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        /// Path of the configuration file that could not be read.
        path: std::path::PathBuf,
        /// Underlying IO error produced while reading the file.
        source: std::io::Error,
    },
    /// Failure to parse TOML.
    #[error("unable to parse config file as TOML: {source}")]
    TomlParse {
        #[from]
        /// Error returned by the TOML parser.
        source: toml::de::Error,
    },
    /// Invalid node URL.
    #[error("invalid node url '{value}': {source}")]
    NodeUrl {
        /// The node URL provided by the user.
        value: String,
        /// Error returned while parsing the URI.
        source: http::uri::InvalidUri,
    },
    /// Invalid upstream fork URL.
    #[error("invalid fork url '{value}': {source}")]
    ForkUrl {
        /// The fork URL after the API key was applied.
        value: String,
        /// Error returned while parsing the URI.
        source: http::uri::InvalidUri,
    },
    /// The private key is not 32 bytes of hex. The value itself is never echoed.
    #[error("invalid private key: {source}")]
    PrivateKey {
        /// Error returned by the hex decoder.
        source: alloy_primitives::hex::FromHexError,
    },
    /// No private key was supplied by the file or the overrides.
    #[error("a private key is required; set `private_key` or pass --private-key")]
    MissingPrivateKey,
    /// A fork block or API key was given without a fork URL.
    #[error("fork settings were provided without a fork url")]
    ForkWithoutUrl,
}
