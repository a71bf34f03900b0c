pub mod decode;
pub mod store;

pub use decode::{decode_image, decode_svg};
pub use store::{AssetStore, normalize_rel_path};
