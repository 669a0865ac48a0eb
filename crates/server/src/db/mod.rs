pub mod accounts;
pub mod journal;
pub mod matches;
pub mod pool;
pub mod sessions;
