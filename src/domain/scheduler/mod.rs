pub mod allocator;
pub mod request;
pub mod reservation_manager;
pub mod scheduler_config;
