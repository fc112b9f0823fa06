use thiserror::Error;

/// Hard failures of the document rewriter.
///
/// Missing scripts, absent host proxies and unrecognized shim imports are not
/// errors; they degrade to "unchanged" or to a logged pass-through.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to parse HTML: {0}")]
    Parse(#[source] std::io::Error),
    #[error("failed to serialize HTML: {0}")]
    Serialize(#[source] std::io::Error),
    #[error("serialized HTML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[cfg(feature = "napi")]
impl From<TransformError> for napi::Error {
    fn from(err: TransformError) -> Self {
        napi::Error::from_reason(err.to_string())
    }
}
