pub mod auth;
pub mod challenges;
pub mod events;
pub mod health;
pub mod journal;
pub mod matches;
pub mod presence;
