//! Rail Shunt Engine
//!
//! A headless engine for spline-track train positioning, drag
//! interaction, and automatic coupling.

pub mod engine;
