mod clock;
mod error;
mod protocol;
pub mod serial;

pub use clock::{Clock, SystemClock};
pub use error::{LinkError, TransferError};
pub use protocol::{
    Phase, StorageOutcome, Transfer, TransferReport, TransferSettings, READY, STORAGE_FAILED,
    STORED,
};
