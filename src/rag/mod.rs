//! Course question answering: the tool loop, sessions and cited answers.

mod response;
mod session;
mod system;

pub use response::{CourseAnalytics, RagResponse};
pub use session::SessionManager;
pub use system::RagSystem;
