pub mod app;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod nutrition;
pub mod pages;
pub mod predict;
pub mod state;

pub use app::build_app;
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

/// Rounds to two decimal places, the precision used for confidences and nutrient amounts.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(0.8912), 0.89);
        assert_eq!(round2(52.005_1), 52.01);
        assert_eq!(round2(3.0), 3.0);
    }
}
