/// Recommended error type for your scenario `main` function and any shared code that builds
/// scenario configuration, so you can use `?` to propagate errors.
pub type PerfTunnelResult<T> = anyhow::Result<T>;
