pub mod borrowck;
pub mod cfg;
pub mod cli;
pub mod demo;
pub mod diagnostics;
pub mod facts;
pub mod ir;
pub mod list;
pub mod profiler;
pub mod sum;
