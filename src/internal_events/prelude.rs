pub mod error_stage {
    pub const PROCESSING: &str = "processing";
    pub const SENDING: &str = "sending";
}

pub mod error_type {
    pub const CONFIGURATION_FAILED: &str = "configuration_failed";
    pub const REQUEST_FAILED: &str = "request_failed";
}
