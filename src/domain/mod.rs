// Domain layer: chain records, storage layout and ports. No transport code here.

pub mod export;
pub mod keys;
pub mod model;
pub mod ports;
pub mod ss58;
