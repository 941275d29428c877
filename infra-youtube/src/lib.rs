mod client;
pub mod parse;

pub use client::{YoutubeCaptionSource, YoutubeClientConfig};
