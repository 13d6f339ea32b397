//! Repository implementations

mod account;
mod job;
mod league;
mod notification;
mod season;

pub use account::{AccountRepo, DbLotChange};
pub use job::JobRepo;
pub use league::{LeagueRepo, MemberInsert};
pub use notification::NotificationRepo;
pub use season::SeasonRepo;
