use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::StompError;
use crate::frame::{StompEvent, StompFrame};

/// Frame codec for STOMP 1.2 over a byte stream.
///
/// Frames are `COMMAND\nheader:value\n...\n\nBODY\0`; a lone `\n` between
/// frames is a heartbeat (heartbeats negotiated at connect time).
/// This codec does not implement the `content-length` header — every
/// payload on these feeds is NUL-free JSON text, so the NUL terminator alone
/// is sufficient to delimit frames.
#[derive(Debug, Default)]
pub struct StompCodec;

impl Decoder for StompCodec {
    type Item = StompEvent;
    type Error = StompError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.first() == Some(&b'\n') {
            src.advance(1);
            return Ok(Some(StompEvent::Heartbeat));
        }

        let Some(terminator) = src.iter().position(|byte| *byte == 0) else {
            return Ok(None);
        };

        let frame_bytes = src.split_to(terminator);
        src.advance(1); // consume the NUL terminator
        while src.first() == Some(&b'\n') {
            src.advance(1);
        }

        parse_frame(&frame_bytes).map(|frame| Some(StompEvent::Frame(frame)))
    }
}

fn parse_frame(bytes: &[u8]) -> Result<StompFrame, StompError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| StompError::Malformed(format!("non-UTF8 frame: {err}")))?;

    let (head, body) = text
        .split_once("\n\n")
        .ok_or_else(|| StompError::Malformed("missing header/body separator".into()))?;

    let mut lines = head.lines();
    let command = lines
        .next()
        .ok_or_else(|| StompError::Malformed("missing command line".into()))?
        .to_owned();

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| StompError::Malformed(format!("malformed header line: {line:?}")))?;
        headers.push((name.to_owned(), value.to_owned()));
    }

    Ok(StompFrame {
        command,
        headers,
        body: body.as_bytes().to_vec(),
    })
}

impl Encoder<StompFrame> for StompCodec {
    type Error = StompError;

    fn encode(&mut self, frame: StompFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(frame.command.as_bytes());
        dst.put_u8(b'\n');
        for (name, value) in &frame.headers {
            dst.put_slice(name.as_bytes());
            dst.put_u8(b':');
            dst.put_slice(value.as_bytes());
            dst.put_u8(b'\n');
        }
        dst.put_u8(b'\n');
        dst.put_slice(&frame.body);
        dst.put_u8(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_simple_frame() {
        let mut buf = BytesMut::from(&b"CONNECTED\nversion:1.2\n\n\0"[..]);
        let mut codec = StompCodec;
        let event = codec.decode(&mut buf).unwrap().unwrap();
        match event {
            StompEvent::Frame(frame) => {
                assert_eq!(frame.command, "CONNECTED");
                assert_eq!(frame.get("version"), Some("1.2"));
                assert!(frame.body.is_empty());
            }
            StompEvent::Heartbeat => panic!("expected a frame"),
        }
    }

    #[test]
    fn decodes_a_heartbeat() {
        let mut buf = BytesMut::from(&b"\n"[..]);
        let mut codec = StompCodec;
        assert_eq!(
            codec.decode(&mut buf).unwrap().unwrap(),
            StompEvent::Heartbeat
        );
    }

    #[test]
    fn incomplete_frame_returns_none() {
        let mut buf = BytesMut::from(&b"MESSAGE\nsubscription:1\n\n{\"a\":1}"[..]);
        let mut codec = StompCodec;
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn round_trips_through_encode_and_decode() {
        let frame = StompFrame::new("SEND")
            .header("destination", "/topic/RTPPM_ALL")
            .with_body(b"payload".to_vec());

        let mut codec = StompCodec;
        let mut buf = BytesMut::new();
        codec.encode(frame.clone(), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, StompEvent::Frame(frame));
    }
}
