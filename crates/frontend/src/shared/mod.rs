pub mod clock;
pub mod state;
