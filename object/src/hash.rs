const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a. Stable across runs and platforms.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(FNV_PRIME))
}

/// Key under which an attribute named `name` is stored on an object.
///
/// Attribute names are hashed so that compartments with different string
/// literal tables agree on the same attribute.
pub fn attr_key(name: &str) -> u64 {
    fnv1a(name.as_bytes())
}
