//! Engine-level defaults that apply when a command's scope omits them.

/// Defaults the command parser falls back to when a `run`/`check` doesn't
/// spell out its own scope, step bound, or integer width.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub default_scope: u32,
    pub default_steps: u32,
    pub int_bit_width: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_scope: 3,
            default_steps: 10,
            int_bit_width: 4,
        }
    }
}
