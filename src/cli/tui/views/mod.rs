//! Board views

pub mod kanban;
