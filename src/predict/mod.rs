mod dto;
pub mod handlers;

pub use dto::PredictResponse;
pub use handlers::predict_routes;
