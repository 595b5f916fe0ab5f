pub mod cart;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod hook;
pub mod log;
pub mod modal;
pub mod page;
pub mod pricing;
pub mod prompt;
pub mod ux;
pub mod view;
pub mod wire;

pub use hook::{wire_customization_hook, ClickOutcome, CustomizationHook, HookConfig};
pub use modal::{ModalController, ModalSession, Surface};
pub use wire::{CartLine, ChosenOption, Prompt};
