use anyhow::{anyhow, Result};

/// Runs `f` with validation and out-of-memory error scopes pushed on `device`.
///
/// This is the explicit "query the error state after the operation" step: any
/// error raised by `f` is returned instead of reaching the uncaptured-error
/// handler. When an error is reported the value produced by `f` is dropped,
/// which frees whatever GPU objects it holds.
///
/// Error scopes are per-thread in wgpu, so `f` must run on the calling thread.
pub(crate) fn scoped<T>(device: &wgpu::Device, what: &str, f: impl FnOnce() -> T) -> Result<T> {
    let oom = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = f();

    // Scopes pop in reverse push order.
    let validation_err = pollster::block_on(validation.pop());
    let oom_err = pollster::block_on(oom.pop());

    match validation_err.or(oom_err) {
        None => Ok(value),
        Some(err) => {
            drop(value);
            Err(anyhow!("GPU error during {what}: {err}"))
        }
    }
}
