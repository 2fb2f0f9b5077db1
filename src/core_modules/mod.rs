pub mod blob_detector;
pub mod blob_manager;
pub mod correlator;
pub mod detected_blob;
pub mod equivalence;
pub mod events;
pub mod filter;
pub mod mask;
pub mod utils;
