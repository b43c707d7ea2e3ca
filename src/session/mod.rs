//! Session input modes. Live streams and uploaded clips both drive the same
//! per-frame engine through [`run_session`].

pub mod live;
pub mod pipeline;
pub mod source;
pub mod upload;

pub use live::{LiveSession, LiveUpdate};
pub use pipeline::{run_session, SessionOptions};
pub use source::{FrameSource, GifClip, PlaceholderFrames};
pub use upload::{process_upload, UploadedClip};
