pub mod protocol;

pub use protocol::{
    AccountView, CastOutcome, InsertHintView, Protocol, RankingEntry, RedemptionOutcome,
};
