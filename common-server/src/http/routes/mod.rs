//! Route handlers shared by every service

pub mod health;
