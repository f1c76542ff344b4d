//! Arithmetic exported next to the scene.

/// Two's-complement sum; overflow wraps instead of trapping so the native and
/// wasm builds agree on every input.
pub fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_small_values() {
        assert_eq!(add(2, 3), 5);
        assert_eq!(add(-7, 7), 0);
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(add(i32::MAX, 1), i32::MIN);
    }
}
