//! Workspace tooling package. It exists to install the `rusty-hook` git hooks
//! configured in the root `Cargo.toml`; the code lives under `crates/`.
