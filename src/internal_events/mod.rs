mod azure_table;
mod prelude;

pub use self::azure_table::*;
pub use self::prelude::{error_stage, error_type};

/// A notable occurrence inside the sink, reported as structured logs and metrics.
pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}
