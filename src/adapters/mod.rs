// Adapters layer: concrete implementations for external systems (installers, prompts).

pub mod install;
pub mod prompt;
