//! Framing for the two-byte request protocol.
//!
//! [`RequestCodec`] is the server half: it decodes request headers and encodes
//! whole response batches. [`ResponseCodec`] is the client half: it encodes
//! headers and decodes the batches they ask for, in order.

use std::collections::VecDeque;

use bytes::{Buf, BufMut, BytesMut};
use noeq::NoeqId;
use tokio_util::codec::{Decoder, Encoder};

use crate::{Error, HEADER_SIZE, ID_SIZE, IdBatch, Request, Result};

/// Decodes `{count, space}` headers and encodes ID batches.
///
/// A header with `count == 0` fails decoding with [`Error::InvalidRequest`].
/// A stream that ends part-way through a header fails with an I/O error
/// (the default [`Decoder::decode_eof`] behavior).
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestCodec;

impl Decoder for RequestCodec {
    type Item = Request;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>> {
        if src.len() < HEADER_SIZE {
            src.reserve(HEADER_SIZE - src.len());
            return Ok(None);
        }
        let count = src.get_u8();
        let space = src.get_u8();
        Request::new(count, space).map(Some)
    }
}

impl Encoder<IdBatch> for RequestCodec {
    type Error = Error;

    /// Writes the whole batch into the frame buffer so it leaves in one flush.
    fn encode(&mut self, ids: IdBatch, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(ids.len() * ID_SIZE);
        for id in ids {
            dst.put_u64(id.to_raw());
        }
        Ok(())
    }
}

/// Client-side codec that remembers the size of every outstanding response.
#[derive(Debug, Default)]
pub struct ResponseCodec {
    pending: VecDeque<usize>,
}

impl ResponseCodec {
    /// Number of requests written whose responses have not been decoded yet.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl Encoder<Request> for ResponseCodec {
    type Error = Error;

    fn encode(&mut self, request: Request, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&request.to_bytes());
        self.pending.push_back(request.count());
        Ok(())
    }
}

impl Decoder for ResponseCodec {
    type Item = IdBatch;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<IdBatch>> {
        let Some(&count) = self.pending.front() else {
            return Ok(None);
        };
        let len = count * ID_SIZE;
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        self.pending.pop_front();
        let ids = (0..count)
            .map(|_| NoeqId::from_raw(src.get_u64()))
            .collect();
        Ok(Some(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_full_header() {
        let mut codec = RequestCodec;
        let mut buf = BytesMut::from(&[3_u8][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_u8(9);
        let request = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.count(), 3);
        assert_eq!(request.space(), 9);
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_pipelined_headers() {
        let mut codec = RequestCodec;
        let mut buf = BytesMut::from(&[1_u8, 0, 255, 7, 2][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Request::new(1, 0).unwrap()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Request::new(255, 7).unwrap()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], &[2]);
    }

    #[test]
    fn zero_count_is_invalid_for_any_space() {
        for space in [0_u8, 1, 128, 255] {
            let mut buf = BytesMut::from(&[0_u8, space][..]);
            assert!(matches!(
                RequestCodec.decode(&mut buf),
                Err(Error::InvalidRequest { .. })
            ));
        }
    }

    #[test]
    fn truncated_header_at_eof_is_an_io_error() {
        let mut buf = BytesMut::from(&[5_u8][..]);
        assert!(matches!(
            RequestCodec.decode_eof(&mut buf),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn clean_eof_at_header_boundary() {
        let mut buf = BytesMut::new();
        assert!(RequestCodec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn batch_is_big_endian() {
        let ids = vec![
            NoeqId::from_raw(0x0102_0304_0506_0708),
            NoeqId::from_raw(1),
        ];
        let mut buf = BytesMut::new();
        RequestCodec.encode(ids, &mut buf).unwrap();
        assert_eq!(
            &buf[..],
            &[1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn client_codec_splits_responses_by_request() {
        let mut codec = ResponseCodec::default();
        let mut out = BytesMut::new();
        codec.encode(Request::new(2, 0).unwrap(), &mut out).unwrap();
        codec.encode(Request::new(1, 4).unwrap(), &mut out).unwrap();
        assert_eq!(&out[..], &[2, 0, 1, 4]);
        assert_eq!(codec.in_flight(), 2);

        let mut input = BytesMut::new();
        for raw in [10_u64, 11] {
            input.put_u64(raw);
        }
        // Half of the second response
        input.put_slice(&[0, 0, 0, 0]);

        let first = codec.decode(&mut input).unwrap().unwrap();
        assert_eq!(first, vec![NoeqId::from_raw(10), NoeqId::from_raw(11)]);
        assert!(codec.decode(&mut input).unwrap().is_none());

        input.put_slice(&[0, 0, 0, 12]);
        let second = codec.decode(&mut input).unwrap().unwrap();
        assert_eq!(second, vec![NoeqId::from_raw(12)]);
        assert_eq!(codec.in_flight(), 0);
    }
}
