use scanwork_engine::logging::{LoggingConfig, init_logging};
use scanwork_engine::{ComputeContext, ComputeInit};

/// Acquires a device, or `None` when this machine has no usable adapter.
pub fn context() -> Option<ComputeContext> {
    context_with(ComputeInit::from_env())
}

/// Acquires a device with `init`, or `None` when no adapter satisfies it.
pub fn context_with(init: ComputeInit) -> Option<ComputeContext> {
    init_logging(LoggingConfig::for_tests());
    match ComputeContext::new_blocking(init) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            println!("Skipping GPU test: {err}");
            None
        }
    }
}
