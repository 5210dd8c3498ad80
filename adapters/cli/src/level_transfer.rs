use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use block_jam_core::{LevelDefinition, LevelError};
use thiserror::Error;

const SHARE_DOMAIN: &str = "jam";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const SHARE_HEADER: &str = "jam:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for pasting into chat or a bug report.
pub(crate) fn encode(level: &LevelDefinition) -> Result<String, LevelTransferError> {
    let json = serde_json::to_vec(level).map_err(LevelTransferError::Serialize)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{SHARE_HEADER}:{}x{}:{encoded}",
        level.grid_width(),
        level.grid_height()
    ))
}

/// Decodes and validates a level from its share string.
pub(crate) fn decode(value: &str) -> Result<LevelDefinition, LevelTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LevelTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LevelTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelTransferError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(LevelTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(LevelTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (columns, rows) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LevelTransferError::InvalidEncoding)?;
    let level: LevelDefinition =
        serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)?;

    if (level.grid_width(), level.grid_height()) != (columns, rows) {
        return Err(LevelTransferError::DimensionMismatch {
            header_columns: columns,
            header_rows: rows,
            columns: level.grid_width(),
            rows: level.grid_height(),
        });
    }
    level.validate().map_err(LevelTransferError::InvalidLevel)?;
    Ok(level)
}

/// Errors that can occur while encoding or decoding level share strings.
#[derive(Debug, Error)]
pub(crate) enum LevelTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the share string.
    #[error("share string is missing the prefix")]
    MissingPrefix,
    /// The share string did not contain a version segment.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The share string did not include grid dimensions.
    #[error("share string is missing the grid dimensions")]
    MissingDimensions,
    /// The share string did not include the payload segment.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the share string.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the decoded level.
    #[error("header announces a {header_columns}x{header_rows} grid but the level is {columns}x{rows}")]
    DimensionMismatch {
        /// Columns announced in the header.
        header_columns: u32,
        /// Rows announced in the header.
        header_rows: u32,
        /// Columns stored in the payload.
        columns: u32,
        /// Rows stored in the payload.
        rows: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse level payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The level could not be serialised.
    #[error("could not serialise level")]
    Serialize(#[source] serde_json::Error),
    /// The decoded level breaks a level invariant.
    #[error("shared level is invalid")]
    InvalidLevel(#[source] LevelError),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelTransferError> {
    let invalid = || LevelTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_jam_core::{BlockColor, BlockSpawn, CellCoord, Footprint, GoalSpawn, Orientation};

    fn sample_level() -> LevelDefinition {
        LevelDefinition::new(
            10,
            8,
            1.0,
            7,
            vec![GoalSpawn {
                color: BlockColor::Yellow,
                footprint: Footprint::new(CellCoord::new(0, 3), 4, Orientation::AlongZ),
            }],
            vec![BlockSpawn {
                color: BlockColor::Yellow,
                footprint: Footprint::new(CellCoord::new(5, 5), 3, Orientation::AlongX),
            }],
        )
        .expect("valid level")
    }

    #[test]
    fn share_string_restores_the_level() {
        let level = sample_level();
        let encoded = encode(&level).expect("level encodes");
        assert!(encoded.starts_with(&format!("{SHARE_HEADER}:10x8:")));
        assert!(!encoded.contains('\n'));

        let decoded = decode(&format!("  {encoded}\n")).expect("level decodes");
        assert_eq!(decoded, level);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(decode("   "), Err(LevelTransferError::EmptyPayload)));
        assert!(matches!(
            decode("puzzle:v1:10x8:abc"),
            Err(LevelTransferError::InvalidPrefix(prefix)) if prefix == "puzzle"
        ));
        assert!(matches!(
            decode("jam:v2:10x8:abc"),
            Err(LevelTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode("jam:v1:0x8:abc"),
            Err(LevelTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("jam:v1:10x8"),
            Err(LevelTransferError::MissingPayload)
        ));
        assert!(matches!(
            decode("jam:v1:10x8:!!!"),
            Err(LevelTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn decoding_errors_keep_their_cause() {
        use std::error::Error as _;

        let error = decode("jam:v1:10x8:!!!").expect_err("bad payload");
        assert_eq!(error.to_string(), "could not decode level payload");
        assert!(error.source().is_some());
        assert_eq!(
            LevelTransferError::DimensionMismatch {
                header_columns: 9,
                header_rows: 8,
                columns: 10,
                rows: 8,
            }
            .to_string(),
            "header announces a 9x8 grid but the level is 10x8"
        );
    }

    #[test]
    fn header_must_agree_with_payload() {
        let encoded = encode(&sample_level()).expect("level encodes");
        let tampered = encoded.replacen(":10x8:", ":9x8:", 1);
        assert!(matches!(
            decode(&tampered),
            Err(LevelTransferError::DimensionMismatch {
                header_columns: 9,
                header_rows: 8,
                columns: 10,
                rows: 8,
            })
        ));
    }

    #[test]
    fn invalid_levels_are_rejected_after_decoding() {
        let json = r#"{"grid_width":4,"grid_height":4,"cell_size":1.0,"max_moves":0,
            "goals":[],"blocks":[]}"#;
        let shared = format!("{SHARE_HEADER}:4x4:{}", STANDARD_NO_PAD.encode(json));
        assert!(matches!(
            decode(&shared),
            Err(LevelTransferError::InvalidLevel(_))
        ));
    }
}
