pub mod model;

pub use model::{MAX_NAME_LEN, NAME_FIELD_SIZE, Transaction};
