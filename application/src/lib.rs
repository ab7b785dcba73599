pub mod analysis_service;
pub mod retry;
pub mod session_service;
