//! Tool-change post-processing scripts
//!
//! Each script turns every tool change after the first into a manual
//! filament swap, so a multi-material slice can be printed on a single
//! extruder machine.

mod amount;
pub mod filament_change;
pub mod pause_swap;

pub use filament_change::{FilamentChangeParams, FilamentChangeTransformer, FILAMENT_CHANGE_COMMENT};
pub use pause_swap::{
    FilamentChunks, PauseSwapParams, PauseSwapTransformer, MAX_FILAMENT_AMOUNT, MAX_LOAD_CHUNK,
    MAX_UNLOAD_CHUNK, MIN_PARK_HEIGHT,
};
