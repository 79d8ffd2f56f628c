//! Slot arithmetic over the fixed reference timezone, the weekly grid
//! reconciler, and aggregation of logged entries. Everything here is pure and
//! independent of the host machine timezone.

pub mod analysis;
pub mod grid;
pub mod reference;
pub mod slots;
