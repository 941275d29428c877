mod embedding;
mod health;
mod transcript;

pub use embedding::*;
pub use health::*;
pub use transcript::*;
