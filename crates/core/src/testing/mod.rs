//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use ffconv_core::testing::MockMediaInfoProvider;
//!
//! let provider = MockMediaInfoProvider::new();
//! provider.set_media_info(MockMediaInfoProvider::video_file("/a.mp4", 640, 360)).await;
//! let conversion = ffconv_core::snippets::to_webm(&provider, "/a.mp4", "/a.webm").await?;
//! ```

mod mock_media_info;

pub use mock_media_info::MockMediaInfoProvider;
