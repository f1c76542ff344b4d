//! Binary header checks done before handing bytes to the runtime.

use trigon::bootstrap::LoadError;

pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
pub const WASM_VERSION: u32 = 1;

/// Reject anything that is not a version-1 core module.
pub fn check_header(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.len() < 8 {
        return Err(LoadError::Incompatible(format!(
            "truncated header ({} bytes)",
            bytes.len()
        )));
    }
    if bytes[..4] != WASM_MAGIC {
        return Err(LoadError::Incompatible(format!(
            "not a wasm binary (magic {:02x?})",
            &bytes[..4]
        )));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != WASM_VERSION {
        return Err(LoadError::Incompatible(format!(
            "unsupported binary version {version:#x}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(bytes: &[u8]) -> String {
        match check_header(bytes) {
            Err(LoadError::Incompatible(r)) => r,
            other => panic!("expected incompatible, got {other:?}"),
        }
    }

    #[test]
    fn accepts_empty_module() {
        assert!(check_header(b"\0asm\x01\0\0\0").is_ok());
    }

    #[test]
    fn rejects_short_input() {
        assert!(reason(b"\0as").contains("truncated"));
    }

    #[test]
    fn rejects_other_formats() {
        assert!(reason(b"<!doctype html>").contains("not a wasm binary"));
    }

    #[test]
    fn rejects_component_binaries() {
        // Component model layer uses version 0x0d with layer 1.
        assert!(reason(b"\0asm\x0d\0\x01\0").contains("unsupported binary version"));
    }
}
