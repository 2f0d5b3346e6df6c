//! Transform Module - fit once, apply many
//!
//! Scales numeric features, one-hot encodes categoricals and vectorizes text
//! into a single dense matrix whose width is frozen at fit time.

pub mod scaler;
pub mod onehot;
pub mod tfidf;
pub mod state;


pub use onehot::OneHotEncoder;
pub use scaler::StandardScaler;
pub use state::{FeatureMatrix, FittedTransform};
pub use tfidf::TfidfVectorizer;
