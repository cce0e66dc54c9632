pub mod broadcast_service;

pub use broadcast_service::BroadcastService;
