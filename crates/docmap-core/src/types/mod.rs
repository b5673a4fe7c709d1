mod blob;
mod partial;
mod reference;

pub use blob::Blob;
pub use partial::PartialUpdate;
pub use reference::Ref;
