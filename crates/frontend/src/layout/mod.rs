//! Application shell state.
//!
//! `tabs` is framework-free; `global_context` binds it to Leptos signals and
//! context for the components rendered inside the shell.

pub mod global_context;
pub mod tabs;

pub use global_context::{
    provide_tab_session, use_tab_navigation, use_tab_session, use_tab_state, AppGlobalContext,
    TabSessionProvider,
};
