use model::core::tagged::TagShapeError;
use thiserror::Error;

/// A raw field that cannot be turned into a canonical value. Fatal for
/// the record it came from, never for the batch or the table.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("'{0}' is not a valid decimal number")]
    Number(String),

    #[error(transparent)]
    Shape(#[from] TagShapeError),
}

/// Problems with the job configuration, raised before any I/O starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("endpoint url must not be empty")]
    MissingEndpointUrl,

    #[error("endpoint token not set; set endpoint.token or the {0} environment variable")]
    MissingToken(&'static str),

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    #[error("worker count must be greater than zero")]
    ZeroWorkers,

    #[error("source page size must be greater than zero")]
    ZeroPageSize,

    #[error("unknown table group '{0}'")]
    UnknownGroup(String),

    #[error("no tables selected; pass --table or --group")]
    NoTables,
}
