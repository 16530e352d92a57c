//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sheaf.toml`:
//!
//! | Module    | TOML Section  | Purpose                              |
//! |-----------|---------------|--------------------------------------|
//! | `bundler` | `[bundler]`   | Boot/build paths, post-processors    |
//! | `serve`   | `[serve]`     | HTTP server                          |

mod bundler;
mod serve;

pub use bundler::{BundlerConfig, CssMinifyOptions, JsMinifyOptions, Toggle};
#[cfg(test)]
pub use bundler::{AutoprefixOptions, DEFAULT_EXTENSIONS};
pub use serve::ServeConfig;
