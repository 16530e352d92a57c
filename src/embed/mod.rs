//! Embedded runtime resources.

/// CommonJS-style module loader prepended to the main bundle's script.
pub const REQUIRE_JS: &str = include_str!("require.js");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_shim_defines_registry() {
        assert!(REQUIRE_JS.contains("function require("));
        assert!(REQUIRE_JS.contains("require.register = function"));
        assert!(REQUIRE_JS.contains("require.alias = function"));
    }
}
