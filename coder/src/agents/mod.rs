//! Oracle-consulting agents: decision engine, edit planner, response formatter.

pub mod decision;
pub mod formatter;
pub mod planner;
