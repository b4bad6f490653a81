mod failure;
mod shutdown;

pub mod prelude {
    pub use crate::failure::{FailureKind, ShutdownSignalError};
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle};
}
