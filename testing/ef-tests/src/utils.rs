use std::path::Path;

use snap::raw::Decoder;

/// Decode the snappy-compressed SSZ object at ``path``. Returns ``None`` when the file is absent,
/// which is how the test vectors mark an operation that must be rejected.
pub fn read_ssz_snappy<T: ssz::Decode>(path: &Path) -> Option<T> {
    let ssz_snappy = std::fs::read(path).ok()?;
    let mut decoder = Decoder::new();
    let ssz = decoder.decompress_vec(&ssz_snappy).ok()?;
    T::from_ssz_bytes(&ssz).ok()
}
