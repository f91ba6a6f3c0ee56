mod state;

pub use state::{INITIAL_SERIAL, StateVersionPayload, md5_hex};
