use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::ReqError;

/// One length-delimited, JSON-encoded frame per message. Every request/reply
/// and topic connection in this crate is a `Framed<TcpStream, ..>` of this
/// shape; there is no multiplexing within a connection.
pub type FramedJson = Framed<TcpStream, LengthDelimitedCodec>;

pub fn wrap(stream: TcpStream) -> FramedJson {
    Framed::new(stream, LengthDelimitedCodec::new())
}

pub async fn send_json<T: Serialize>(framed: &mut FramedJson, value: &T) -> Result<(), ReqError> {
    let bytes = serde_json::to_vec(value).map_err(ReqError::Encode)?;
    framed.send(Bytes::from(bytes)).await.map_err(ReqError::Io)
}

pub async fn recv_json<T: DeserializeOwned>(framed: &mut FramedJson) -> Result<T, ReqError> {
    let frame = framed
        .next()
        .await
        .ok_or(ReqError::ConnectionClosed)?
        .map_err(ReqError::Io)?;
    serde_json::from_slice(&frame).map_err(ReqError::Decode)
}
