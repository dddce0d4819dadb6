//! Compatibility gates applied to a decoded header.
//!
//! Versions must match exactly; subversions are additive, so a file may
//! carry a subversion up to, but not beyond, the reader's.

use tracing::debug;

use super::{FORMAT_SUBVERSION, FORMAT_VERSION, FileHeader};
use crate::error::{Result, VarpackError};
use crate::types::Producer;

fn compatible(expected: u8, expected_sub: u8, found: u8, found_sub: u8) -> bool {
    found == expected && found_sub <= expected_sub
}

/// Check the container format version.
pub(crate) fn check_format(header: &FileHeader) -> Result<()> {
    if !compatible(
        FORMAT_VERSION,
        FORMAT_SUBVERSION,
        header.format_version,
        header.format_subversion,
    ) {
        return Err(VarpackError::FormatVersion {
            expected: FORMAT_VERSION,
            expected_sub: FORMAT_SUBVERSION,
            found: header.format_version,
            found_sub: header.format_subversion,
        });
    }
    Ok(())
}

/// Check producer identity, then producer version.
pub(crate) fn check_producer(header: &FileHeader, expected: &Producer) -> Result<()> {
    let found = header.producer.as_ref();
    if found != Some(&expected.id) {
        return Err(VarpackError::ProducerIdentity {
            expected: expected.id.to_string(),
            found: found.map_or_else(|| "nothing".to_string(), ToString::to_string),
        });
    }
    if !compatible(
        expected.version,
        expected.subversion,
        header.producer_version,
        header.producer_subversion,
    ) {
        return Err(VarpackError::ProducerVersion {
            expected: expected.version,
            expected_sub: expected.subversion,
            found: header.producer_version,
            found_sub: header.producer_subversion,
        });
    }
    debug!(producer = %expected.id, "header accepted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::header::Metadata;
    use crate::types::{IdMode, ProducerId};
    use crate::wire::Endian;

    fn header(version: u8, subversion: u8) -> FileHeader {
        FileHeader {
            magic: super::super::MAGIC,
            endian: Endian::NATIVE,
            metadata: Metadata {
                id_mode: IdMode::Names,
                descriptions: false,
                word_width: 8,
            },
            format_version: FORMAT_VERSION,
            format_subversion: FORMAT_SUBVERSION,
            producer_version: version,
            producer_subversion: subversion,
            producer: Some(ProducerId::Name("demo".to_string())),
            producer_description: None,
        }
    }

    #[test]
    fn test_subversion_gate() {
        let expected = Producer::named("demo").with_version(1, 2);
        assert!(check_producer(&header(1, 0), &expected).is_ok());
        assert!(check_producer(&header(1, 2), &expected).is_ok());
        let err = check_producer(&header(1, 3), &expected).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProducerVersion);
        let err = check_producer(&header(2, 0), &expected).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProducerVersion);
    }

    #[test]
    fn test_identity_gate() {
        let err = check_producer(&header(1, 0), &Producer::named("other")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProducerIdentity);
        let err = check_producer(&header(1, 0), &Producer::numeric(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProducerIdentity);
    }

    #[test]
    fn test_format_gate() {
        let mut file = header(1, 0);
        assert!(check_format(&file).is_ok());
        file.format_subversion = FORMAT_SUBVERSION + 1;
        assert_eq!(check_format(&file).unwrap_err().kind(), ErrorKind::FormatVersion);
        file.format_subversion = 0;
        file.format_version = 1;
        assert_eq!(check_format(&file).unwrap_err().kind(), ErrorKind::FormatVersion);
    }
}
