/// Reloads the application after a restore so no stale state survives.
pub trait RestartHook: Send + Sync {
    fn restart(&self);
}

impl<F> RestartHook for F
where
    F: Fn() + Send + Sync,
{
    fn restart(&self) {
        self()
    }
}
