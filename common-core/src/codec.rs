//! JSON decode/encode over byte streams.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one JSON value from `reader`.
pub fn decode<T, R>(reader: R) -> Result<T, CodecError>
where
    T: DeserializeOwned,
    R: Read,
{
    serde_json::from_reader(reader).map_err(CodecError::Decode)
}

/// Write `value` to `writer` followed by a newline.
pub fn encode<T, W>(mut writer: W, value: &T) -> Result<(), CodecError>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer(&mut writer, value).map_err(CodecError::Encode)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
