//! Binary wire format for snapshots.
//!
//! A serialized snapshot is a 4-byte magic followed by an ordered list of
//! typed records: one record per counter, then the host record, then the
//! capture record (timestamp + range). Each record is framed as
//! `[kind: u8][len: u32 LE][crc32: u32 LE][JSON payload]`.
//!
//! The format evolves append-only: new record kinds may be added at the tail
//! and decoders skip kinds they do not recognize instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Counter, Error, HostInfo, Range, Result, Snapshot};

const MAGIC: [u8; 4] = *b"RSNP";

const REC_COUNTER: u8 = 0x01;
const REC_HOST: u8 = 0x02;
const REC_CAPTURE: u8 = 0x03;

const RECORD_HEADER_LEN: usize = 9;

#[derive(Debug, Serialize, Deserialize)]
struct CaptureRecord {
    captured_at: DateTime<Utc>,
    range: Range,
}

pub fn serialize(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(&MAGIC);

    for counter in &snapshot.counters {
        write_record(&mut out, REC_COUNTER, counter)?;
    }
    write_record(&mut out, REC_HOST, &snapshot.host)?;
    write_record(
        &mut out,
        REC_CAPTURE,
        &CaptureRecord {
            captured_at: snapshot.captured_at,
            range: snapshot.range,
        },
    )?;

    Ok(out)
}

pub fn deserialize(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::CorruptedSnapshot("bad magic".to_string()));
    }

    let mut counters = Vec::new();
    let mut host: Option<HostInfo> = None;
    let mut capture: Option<CaptureRecord> = None;

    let mut offset = MAGIC.len();
    while offset < bytes.len() {
        let (kind, payload, next) = read_record(bytes, offset)?;
        match kind {
            REC_COUNTER => counters.push(parse_payload::<Counter>(payload)?),
            REC_HOST => host = Some(parse_payload::<HostInfo>(payload)?),
            REC_CAPTURE => capture = Some(parse_payload::<CaptureRecord>(payload)?),
            unknown => debug!(kind = unknown, "skipping unknown snapshot record"),
        }
        offset = next;
    }

    let host = host.ok_or_else(|| Error::CorruptedSnapshot("missing host record".to_string()))?;
    let capture =
        capture.ok_or_else(|| Error::CorruptedSnapshot("missing capture record".to_string()))?;

    Ok(Snapshot {
        host,
        counters,
        captured_at: capture.captured_at,
        range: capture.range,
    })
}

fn write_record<T: Serialize>(out: &mut Vec<u8>, kind: u8, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value)
        .map_err(|e| Error::SnapshotBuildFailed(format!("encode record: {e}")))?;

    out.push(kind);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

fn read_record(bytes: &[u8], offset: usize) -> Result<(u8, &[u8], usize)> {
    if bytes.len() - offset < RECORD_HEADER_LEN {
        return Err(Error::CorruptedSnapshot(
            "truncated record header".to_string(),
        ));
    }

    let kind = bytes[offset];
    let len = u32::from_le_bytes(bytes[offset + 1..offset + 5].try_into().unwrap()) as usize;
    let crc = u32::from_le_bytes(bytes[offset + 5..offset + 9].try_into().unwrap());

    let start = offset + RECORD_HEADER_LEN;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| Error::CorruptedSnapshot("truncated record payload".to_string()))?;

    let payload = &bytes[start..end];
    if crc32fast::hash(payload) != crc {
        return Err(Error::CorruptedSnapshot("record checksum mismatch".to_string()));
    }

    Ok((kind, payload, end))
}

fn parse_payload<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload)
        .map_err(|e| Error::CorruptedSnapshot(format!("record payload: {e}")))
}
