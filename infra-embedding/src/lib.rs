mod bert;
mod device;
mod loader;

pub use bert::{
    l2_normalize, mean_pool, BertEncoder, BertEncoderConfig, CandleTextEncoder, CONFIG_FILE,
    TOKENIZER_FILE, WEIGHTS_FILE,
};
pub use device::{select_device, DeviceChoice};
pub use loader::CandleEncoderLoader;
