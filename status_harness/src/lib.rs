//! Test harness for commit status publishers.
//!
//! - [`MockPublisher`]: a publisher that records what it receives instead of
//!   calling GitLab, used to check the order and content of lifecycle calls.
//! - [`PublishRecorder`]: the ordered log the mock writes to.
//! - [`EventGate`]: holds a lifecycle call until the test releases it.
//! - [`FakeGitlab`]: an in-memory GitLab commit status API behind the
//!   `HttpTransport` seam, for driving the real publisher end to end.

pub mod event_gate;
pub mod fake_gitlab;
pub mod logging;
pub mod mock_publisher;
pub mod recorder;

pub use event_gate::EventGate;
pub use fake_gitlab::FakeGitlab;
pub use mock_publisher::{MockPublisher, PUBLISHER_ERROR};
pub use recorder::{PublishRecorder, RecorderSnapshot, ReportedProblem};
