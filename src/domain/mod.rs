pub mod ai;
pub mod cell;
pub mod edge;
pub mod entity;
pub mod grid;
pub mod region;
pub mod walk;
