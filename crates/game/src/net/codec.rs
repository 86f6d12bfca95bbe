use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::{MAX_PACKET_SIZE, Packet, PacketError};

const LENGTH_PREFIX: usize = 4;

/// Encodes a packet as a length-prefixed frame ready for the wire.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, PacketError> {
    let body = packet.serialize()?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), PacketError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<usize, PacketError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(packet)?;
    write_frame(writer, &frame).await?;
    Ok(frame.len())
}

/// Reads one frame. `Ok(None)` means the peer closed the stream cleanly
/// between frames.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<(Packet, usize)>, PacketError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32_le().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > MAX_PACKET_SIZE {
        return Err(PacketError::TooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    let packet = Packet::deserialize(&body)?;
    Ok(Some((packet, LENGTH_PREFIX + len)))
}
