//! AppID hashing for jump-list file names.
//!
//! The shell names each application's jump-list file after a CRC-64 of the
//! application's AppID (Jones polynomial, initial value all-ones, reflected),
//! computed over the AppID encoded as UTF-16 little-endian. Applications
//! without an explicit AppID manifest default to their lowercased full
//! executable path.

/// Jones polynomial `0xAD93D23594C935A9` in reflected (LSB-first) form.
const CRC64_POLY_REFLECTED: u64 = 0x95AC_9329_AC4B_C9B5;

const CRC64_TABLE: [u64; 256] = build_table();

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC64_POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn crc64(bytes: &[u8]) -> u64 {
    let mut crc = u64::MAX;
    for &b in bytes {
        let index = ((crc ^ b as u64) & 0xFF) as usize;
        crc = CRC64_TABLE[index] ^ (crc >> 8);
    }
    crc
}

/// Hash an AppID string: UTF-16LE code units, each fed low byte first.
pub fn hash_app_id(app_id: &str) -> u64 {
    let mut bytes = Vec::with_capacity(app_id.len() * 2);
    for unit in app_id.encode_utf16() {
        bytes.push((unit & 0xFF) as u8);
        bytes.push((unit >> 8) as u8);
    }
    crc64(&bytes)
}

/// The AppID the shell assumes for an application without a manifest.
pub fn default_app_id(executable_path: &str) -> String {
    executable_path.to_lowercase()
}

/// File-name stem of an application's jump-list file.
pub fn jump_list_stem(executable_path: &str) -> String {
    format!("{:016x}", hash_app_id(&default_app_id(executable_path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc64_jones_check_vector() {
        // Published CRC-64/Jones check value for ASCII "123456789".
        assert_eq!(crc64(b"123456789"), 0xCAA7_1716_8609_F281);
    }

    #[test]
    fn test_utf16_app_id_hash() {
        // Same string fed as UTF-16LE code units, low byte first.
        assert_eq!(
            hash_app_id("Microsoft.Windows.Explorer"),
            0x92AB_1FDF_E726_5043
        );
    }

    #[test]
    fn test_hash_is_stable_across_runs() {
        let path = "c:\\program files\\notepad++\\notepad++.exe";
        let first = hash_app_id(path);
        let second = hash_app_id(path);
        assert_eq!(first, second);
        assert_ne!(first, 0);
    }

    #[test]
    fn test_hash_distinguishes_inputs() {
        assert_ne!(
            hash_app_id("c:\\a\\app.exe"),
            hash_app_id("c:\\b\\app.exe")
        );
    }

    #[test]
    fn test_default_app_id_lowercases() {
        assert_eq!(
            default_app_id("C:\\Program Files\\Notepad++\\Notepad++.EXE"),
            "c:\\program files\\notepad++\\notepad++.exe"
        );
    }

    #[test]
    fn test_stem_format_is_sixteen_lowercase_hex_digits() {
        let stem = jump_list_stem("C:\\Windows\\System32\\notepad.exe");
        assert_eq!(stem.len(), 16);
        assert!(stem
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_stem_ignores_path_case() {
        assert_eq!(
            jump_list_stem("C:\\APPS\\TOOL.EXE"),
            jump_list_stem("c:\\apps\\tool.exe")
        );
    }
}
