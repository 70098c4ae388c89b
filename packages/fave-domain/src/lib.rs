pub mod list_name;
pub mod score;
pub mod topk;

pub use score::ScoreModel;
pub use topk::BoundedTopK;
