// pairchat-common: shared types for the PairChat relay and its clients

pub mod protocol;
pub mod types;
