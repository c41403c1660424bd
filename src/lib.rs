pub mod assignment;
pub mod config;
pub mod consts;
pub mod control;
pub mod dataset;
pub mod error;
pub mod fitness;
pub mod graph;
pub mod optimizer;
// cmd and reports are binary modules, see main.rs.
