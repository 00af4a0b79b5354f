fn main() {
    // Fail fast: the context primitive is glibc's ucontext family.
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if os != "linux" || env != "gnu" {
        panic!(
            "{} needs a glibc Linux target (e.g. `x86_64-unknown-linux-gnu`), got os={os:?} env={env:?}.",
            env!("CARGO_PKG_NAME")
        );
    }
}
