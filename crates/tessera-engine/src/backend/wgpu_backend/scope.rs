//! Validation and out-of-memory capture around groups of wgpu calls.

/// Pair of error scopes; everything the device reports between `open` and
/// `close` on this thread ends up in `close`'s result.
pub(super) struct ErrorScope {
    validation: wgpu::ErrorScopeGuard,
    oom: wgpu::ErrorScopeGuard,
}

impl ErrorScope {
    pub(super) fn open(device: &wgpu::Device) -> Self {
        let oom = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
        Self { validation, oom }
    }

    /// Pops both scopes, innermost first.
    pub(super) fn close(self) -> Vec<String> {
        [self.validation, self.oom]
            .into_iter()
            .filter_map(|scope| pollster::block_on(scope.pop()))
            .map(|err| err.to_string())
            .collect()
    }
}

/// Runs `f` inside a fresh scope.
pub(super) fn capture<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let scope = ErrorScope::open(device);
    let value = f();
    (value, scope.close())
}
