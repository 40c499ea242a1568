pub mod data;
pub mod edge;
pub mod filters;
pub mod leaderboard;
pub mod odds;
pub mod parlay;
pub mod zscore;
