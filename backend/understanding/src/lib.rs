pub mod minerals;

pub use minerals::{
    extract, LabelError, LabelRule, LabelSet, Mineral, MineralReadings, MineralValue, NOT_FOUND,
};
