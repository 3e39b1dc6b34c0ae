//! Deterministic little-endian binary codec for NBAC artifacts: a meta blob
//! (`NBM1`) and two card-entry formats (`NBC1` without background
//! log-probabilities, `NBC2` with them). All floats are IEEE-754 binary32
//! on the wire; training math stays in `f64` and truncates at encode.

use serde::{Deserialize, Serialize};

use crate::asi::BigramTable;
use crate::error::{ArchClassError, ArchResult};
use crate::nbac::{ModelKind, NbacCardEntry, NbacMeta, NbacModel, NbacModelParams};

const META_MAGIC: &[u8; 4] = b"NBM1";
const CARD_MAGIC_V1: &[u8; 4] = b"NBC1";
const CARD_MAGIC_V2: &[u8; 4] = b"NBC2";

fn check_finite(xs: impl IntoIterator<Item = f64>) -> ArchResult<()> {
    for x in xs {
        if !x.is_finite() {
            return Err(ArchClassError::NumericDomain(
                "non-finite float in artifact payload".to_string(),
            ));
        }
    }
    Ok(())
}

/// Encodes `meta` as an `NBM1` blob. Errors if either model's arrays don't
/// match the archetype count, or contain a non-finite value.
pub fn encode_meta(meta: &NbacMeta) -> ArchResult<Vec<u8>> {
    if meta.version != 1 {
        return Err(ArchClassError::VersionSkew(format!(
            "unsupported meta version {}",
            meta.version
        )));
    }
    let a_count = meta.archetypes.len();
    for model in [&meta.counts, &meta.presence] {
        if model.log_prior.len() != a_count || model.log_unseen.len() != a_count {
            return Err(ArchClassError::InputShape(
                "meta arrays must match archetype count".to_string(),
            ));
        }
        check_finite(model.log_prior.iter().copied())?;
        check_finite(model.log_unseen.iter().copied())?;
    }

    let mut out = Vec::new();
    out.extend_from_slice(META_MAGIC);
    out.push(meta.version);
    out.extend_from_slice(&meta.build_unix.to_le_bytes());
    out.extend_from_slice(&(a_count as u32).to_le_bytes());

    for name in &meta.archetypes {
        let bytes = name.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(ArchClassError::InputShape(
                "archetype name too long".to_string(),
            ));
        }
        out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(bytes);
    }

    encode_model(&meta.counts, &mut out);
    encode_model(&meta.presence, &mut out);

    Ok(out)
}

fn encode_model(model: &NbacModel, out: &mut Vec<u8>) {
    let kind_byte: u8 = match model.kind {
        ModelKind::Counts => 0,
        ModelKind::Presence => 1,
    };
    out.push(kind_byte);
    out.extend_from_slice(&(model.params.alpha as f32).to_le_bytes());
    out.extend_from_slice(&(model.params.background_lambda as f32).to_le_bytes());
    out.extend_from_slice(&(model.params.temperature as f32).to_le_bytes());
    for x in model.log_prior.iter().chain(model.log_unseen.iter()) {
        out.extend_from_slice(&(*x as f32).to_le_bytes());
    }
}

/// Decodes an `NBM1` blob, accepting the `"b64:"`-prefixed or raw-base64
/// textual fallback via [`decode_blob_bytes`].
pub fn decode_meta(blob: &[u8]) -> ArchResult<NbacMeta> {
    let b = decode_blob_bytes(blob)?;
    if b.len() < 4 + 1 + 8 + 4 {
        return Err(ArchClassError::VersionSkew("meta blob too short".to_string()));
    }
    if &b[0..4] != META_MAGIC {
        return Err(ArchClassError::VersionSkew("invalid meta magic".to_string()));
    }

    let version = b[4];
    if version != 1 {
        return Err(ArchClassError::VersionSkew(format!(
            "unsupported meta version {version}"
        )));
    }
    let build_unix = u64::from_le_bytes(b[5..13].try_into().unwrap());
    let a_count = u32::from_le_bytes(b[13..17].try_into().unwrap()) as usize;

    let mut offset = 17;
    let mut archetypes = Vec::with_capacity(a_count);
    for _ in 0..a_count {
        if b.len() < offset + 2 {
            return Err(ArchClassError::VersionSkew("meta blob truncated".to_string()));
        }
        let n = u16::from_le_bytes(b[offset..offset + 2].try_into().unwrap()) as usize;
        offset += 2;
        if b.len() < offset + n {
            return Err(ArchClassError::VersionSkew("meta blob truncated".to_string()));
        }
        let name = std::str::from_utf8(&b[offset..offset + n])
            .map_err(|_| ArchClassError::VersionSkew("archetype name not utf-8".to_string()))?
            .to_string();
        offset += n;
        archetypes.push(name);
    }

    let (counts_model, offset) = decode_model(&b, offset, a_count)?;
    let (presence_model, _offset) = decode_model(&b, offset, a_count)?;

    if counts_model.kind != ModelKind::Counts || presence_model.kind != ModelKind::Presence {
        return Err(ArchClassError::VersionSkew(
            "meta models out of order".to_string(),
        ));
    }

    Ok(NbacMeta {
        version,
        build_unix,
        archetypes,
        counts: counts_model,
        presence: presence_model,
    })
}

fn decode_model(b: &[u8], offset: usize, a_count: usize) -> ArchResult<(NbacModel, usize)> {
    const HEADER_LEN: usize = 1 + 4 + 4 + 4;
    if b.len() < offset + HEADER_LEN {
        return Err(ArchClassError::VersionSkew("model header truncated".to_string()));
    }
    let kind_byte = b[offset];
    let alpha = f32::from_le_bytes(b[offset + 1..offset + 5].try_into().unwrap());
    let background_lambda = f32::from_le_bytes(b[offset + 5..offset + 9].try_into().unwrap());
    let temperature = f32::from_le_bytes(b[offset + 9..offset + 13].try_into().unwrap());
    let mut offset = offset + HEADER_LEN;

    let total = a_count * 2;
    if b.len() < offset + total * 4 {
        return Err(ArchClassError::VersionSkew("model arrays truncated".to_string()));
    }
    let mut floats = Vec::with_capacity(total);
    for _ in 0..total {
        floats.push(f32::from_le_bytes(b[offset..offset + 4].try_into().unwrap()) as f64);
        offset += 4;
    }
    let log_prior = floats[..a_count].to_vec();
    let log_unseen = floats[a_count..].to_vec();

    let kind = if kind_byte == 0 {
        ModelKind::Counts
    } else {
        ModelKind::Presence
    };
    let model = NbacModel {
        kind,
        params: NbacModelParams {
            alpha: alpha as f64,
            background_lambda: background_lambda as f64,
            temperature: temperature as f64,
        },
        log_prior,
        log_unseen,
    };
    Ok((model, offset))
}

/// Encodes one card entry. Emits `NBC2` when both background
/// log-probabilities are present, `NBC1` otherwise.
pub fn encode_card_entry(entry: &NbacCardEntry) -> ArchResult<Vec<u8>> {
    if entry.log_theta_counts.len() != entry.log_theta_presence.len() {
        return Err(ArchClassError::InputShape(
            "model arrays must be same length".to_string(),
        ));
    }
    check_finite(entry.log_theta_counts.iter().copied())?;
    check_finite(entry.log_theta_presence.iter().copied())?;

    let a_count = entry.log_theta_counts.len() as u32;
    let mut out = Vec::new();

    match (entry.log_q_counts, entry.log_q_presence) {
        (Some(log_q_counts), Some(log_q_presence)) => {
            if !log_q_counts.is_finite() || !log_q_presence.is_finite() {
                return Err(ArchClassError::NumericDomain(
                    "background log-q must be finite".to_string(),
                ));
            }
            out.extend_from_slice(CARD_MAGIC_V2);
            out.extend_from_slice(&a_count.to_le_bytes());
            out.extend_from_slice(&(log_q_counts as f32).to_le_bytes());
            out.extend_from_slice(&(log_q_presence as f32).to_le_bytes());
        }
        _ => {
            out.extend_from_slice(CARD_MAGIC_V1);
            out.extend_from_slice(&a_count.to_le_bytes());
        }
    }

    for x in entry
        .log_theta_counts
        .iter()
        .chain(entry.log_theta_presence.iter())
    {
        out.extend_from_slice(&(*x as f32).to_le_bytes());
    }

    Ok(out)
}

/// Decodes a card entry, dispatching on the `NBC1`/`NBC2` magic. Accepts
/// the textual base64 fallback via [`decode_blob_bytes`].
pub fn decode_card_entry(blob: &[u8]) -> ArchResult<NbacCardEntry> {
    let b = decode_blob_bytes(blob)?;
    if b.len() < 8 {
        return Err(ArchClassError::VersionSkew("card blob too short".to_string()));
    }
    let magic: [u8; 4] = b[0..4].try_into().unwrap();

    if &magic == CARD_MAGIC_V1 {
        let a_count = u32::from_le_bytes(b[4..8].try_into().unwrap()) as usize;
        let expected = 8 + 4 * 2 * a_count;
        if b.len() != expected {
            return Err(ArchClassError::VersionSkew(
                "card blob has unexpected length".to_string(),
            ));
        }
        let floats = read_f32_array(&b, 8, 2 * a_count);
        return Ok(NbacCardEntry {
            log_theta_counts: floats[..a_count].to_vec(),
            log_theta_presence: floats[a_count..].to_vec(),
            log_q_counts: None,
            log_q_presence: None,
        });
    }

    if &magic == CARD_MAGIC_V2 {
        if b.len() < 16 {
            return Err(ArchClassError::VersionSkew("card blob too short".to_string()));
        }
        let a_count = u32::from_le_bytes(b[4..8].try_into().unwrap()) as usize;
        let log_q_counts = f32::from_le_bytes(b[8..12].try_into().unwrap()) as f64;
        let log_q_presence = f32::from_le_bytes(b[12..16].try_into().unwrap()) as f64;
        let expected = 16 + 4 * 2 * a_count;
        if b.len() != expected {
            return Err(ArchClassError::VersionSkew(
                "card blob has unexpected length".to_string(),
            ));
        }
        let floats = read_f32_array(&b, 16, 2 * a_count);
        return Ok(NbacCardEntry {
            log_theta_counts: floats[..a_count].to_vec(),
            log_theta_presence: floats[a_count..].to_vec(),
            log_q_counts: Some(log_q_counts),
            log_q_presence: Some(log_q_presence),
        });
    }

    Err(ArchClassError::VersionSkew("invalid card magic".to_string()))
}

fn read_f32_array(b: &[u8], offset: usize, count: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(count);
    let mut pos = offset;
    for _ in 0..count {
        out.push(f32::from_le_bytes(b[pos..pos + 4].try_into().unwrap()) as f64);
        pos += 4;
    }
    out
}

#[derive(Serialize, Deserialize)]
struct BigramRow {
    a: String,
    b: String,
    weights: Vec<(String, f64)>,
}

/// Serializes a bigram table to JSON. The ASI artifact has no per-card
/// shape to fit the `NBM1`/`NBC*` binary codec, so it rides the store's
/// meta table as a plain JSON blob (see `archclass-hive::store`) rather
/// than a magic-prefixed binary format.
pub fn encode_bigram_table(table: &BigramTable) -> ArchResult<Vec<u8>> {
    let rows: Vec<BigramRow> = table
        .iter()
        .map(|((a, b), weights)| BigramRow {
            a: a.clone(),
            b: b.clone(),
            weights: weights.clone(),
        })
        .collect();
    serde_json::to_vec(&rows).map_err(ArchClassError::from)
}

pub fn decode_bigram_table(blob: &[u8]) -> ArchResult<BigramTable> {
    let rows: Vec<BigramRow> = serde_json::from_slice(blob)?;
    Ok(rows.into_iter().map(|r| ((r.a, r.b), r.weights)).collect())
}

/// Accepts a raw binary blob as-is, or (if it looks like UTF-8 text) a
/// `"b64:"`-prefixed or bare base64-encoded blob. Exists because some store
/// bindings can't bind raw binary parameters.
pub fn decode_blob_bytes(blob: &[u8]) -> ArchResult<Vec<u8>> {
    if blob.len() >= 4 && (&blob[0..4] == META_MAGIC || &blob[0..4] == CARD_MAGIC_V1 || &blob[0..4] == CARD_MAGIC_V2)
    {
        return Ok(blob.to_vec());
    }
    match std::str::from_utf8(blob) {
        Ok(text) => {
            let stripped = text.strip_prefix("b64:").unwrap_or(text);
            base64_decode(stripped)
        }
        Err(_) => Ok(blob.to_vec()),
    }
}

/// Wraps an encoded blob as `"b64:"` + base64 text, for store bindings that
/// can only accept TEXT columns.
pub fn blob_to_text(blob: &[u8]) -> String {
    format!("b64:{}", base64_encode(blob))
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);

        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | b2 as u32;
        out.push(BASE64_ALPHABET[((n >> 18) & 0x3f) as usize] as char);
        out.push(BASE64_ALPHABET[((n >> 12) & 0x3f) as usize] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[((n >> 6) & 0x3f) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[(n & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}

fn base64_decode(text: &str) -> ArchResult<Vec<u8>> {
    fn value(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some((c - b'A') as u32),
            b'a'..=b'z' => Some((c - b'a' + 26) as u32),
            b'0'..=b'9' => Some((c - b'0' + 52) as u32),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let cleaned: Vec<u8> = text.bytes().filter(|c| *c != b'=' && !c.is_ascii_whitespace()).collect();
    let mut out = Vec::with_capacity(cleaned.len() / 4 * 3);
    for chunk in cleaned.chunks(4) {
        let values: Vec<u32> = chunk
            .iter()
            .map(|c| value(*c).ok_or_else(|| ArchClassError::InputShape("invalid base64 blob".to_string())))
            .collect::<ArchResult<Vec<u32>>>()?;
        let n = values
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, v)| acc | (v << (18 - 6 * i)));
        out.push((n >> 16) as u8);
        if values.len() > 2 {
            out.push((n >> 8) as u8);
        }
        if values.len() > 3 {
            out.push(n as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> NbacMeta {
        let model = |kind| NbacModel {
            kind,
            params: NbacModelParams {
                alpha: 1.0,
                background_lambda: 0.15,
                temperature: 1.0,
            },
            log_prior: vec![-0.5, -0.9],
            log_unseen: vec![-3.0, -3.2],
        };
        NbacMeta {
            version: 1,
            build_unix: 1_700_000_000,
            archetypes: vec!["Burn".to_string(), "Tron".to_string()],
            counts: model(ModelKind::Counts),
            presence: model(ModelKind::Presence),
        }
    }

    #[test]
    fn meta_round_trips() {
        let meta = sample_meta();
        let encoded = encode_meta(&meta).unwrap();
        let decoded = decode_meta(&encoded).unwrap();
        assert_eq!(decoded.archetypes, meta.archetypes);
        assert_eq!(decoded.build_unix, meta.build_unix);
        for (a, b) in decoded.counts.log_prior.iter().zip(meta.counts.log_prior.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn meta_round_trip_is_bit_identical_on_reencode() {
        let meta = sample_meta();
        let first = encode_meta(&meta).unwrap();
        let decoded = decode_meta(&first).unwrap();
        let second = encode_meta(&decoded).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn swapped_model_order_is_version_skew() {
        let meta = sample_meta();
        let mut encoded = encode_meta(&meta).unwrap();

        let a_count = meta.archetypes.len();
        let header_len = 4 + 1 + 8 + 4;
        let names_len: usize = meta.archetypes.iter().map(|a| 2 + a.len()).sum();
        let model_block_len = 13 + a_count * 2 * 4;
        let first_kind_byte = header_len + names_len;
        let second_kind_byte = first_kind_byte + model_block_len;

        // Flip the kind byte of each model header to simulate corruption
        // that puts presence before counts.
        encoded[first_kind_byte] = 1;
        encoded[second_kind_byte] = 0;
        let result = decode_meta(&encoded);
        assert!(matches!(result, Err(ArchClassError::VersionSkew(_))));
    }

    #[test]
    fn card_entry_v2_round_trips() {
        let entry = NbacCardEntry {
            log_theta_counts: vec![-0.5, -4.0],
            log_theta_presence: vec![-0.6, -3.9],
            log_q_counts: Some(-2.1),
            log_q_presence: Some(-2.2),
        };
        let encoded = encode_card_entry(&entry).unwrap();
        assert_eq!(&encoded[0..4], CARD_MAGIC_V2);
        let decoded = decode_card_entry(&encoded).unwrap();
        assert_eq!(decoded.log_theta_counts, entry.log_theta_counts);
        assert_eq!(decoded.log_q_counts, entry.log_q_counts);
    }

    #[test]
    fn card_entry_v1_round_trips_without_background() {
        let entry = NbacCardEntry {
            log_theta_counts: vec![-0.5, -4.0],
            log_theta_presence: vec![-0.6, -3.9],
            log_q_counts: None,
            log_q_presence: None,
        };
        let encoded = encode_card_entry(&entry).unwrap();
        assert_eq!(&encoded[0..4], CARD_MAGIC_V1);
        let decoded = decode_card_entry(&encoded).unwrap();
        assert!(decoded.log_q_counts.is_none());
    }

    #[test]
    fn rejects_non_finite_payload() {
        let entry = NbacCardEntry {
            log_theta_counts: vec![f64::NAN],
            log_theta_presence: vec![0.0],
            log_q_counts: None,
            log_q_presence: None,
        };
        assert!(encode_card_entry(&entry).is_err());
    }

    #[test]
    fn bigram_table_round_trips() {
        use std::collections::BTreeMap;
        let mut table: BigramTable = BTreeMap::new();
        table.insert(
            ("lightning bolt".to_string(), "mountain".to_string()),
            vec![("Burn".to_string(), 0.9)],
        );
        let encoded = encode_bigram_table(&table).unwrap();
        let decoded = decode_bigram_table(&encoded).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn base64_textual_fallback_round_trips() {
        let entry = NbacCardEntry {
            log_theta_counts: vec![-0.5, -4.0],
            log_theta_presence: vec![-0.6, -3.9],
            log_q_counts: None,
            log_q_presence: None,
        };
        let encoded = encode_card_entry(&entry).unwrap();
        let wrapped = blob_to_text(&encoded);
        let decoded = decode_card_entry(wrapped.as_bytes()).unwrap();
        assert_eq!(decoded.log_theta_counts, entry.log_theta_counts);
    }
}
