pub mod candidate;
pub mod classifier;
pub mod error;
pub mod extractor;
pub mod prober;
pub mod response;
pub mod result;

pub use candidate::{ApiType, Candidate, HttpMethod};
pub use classifier::{Classifier, HeaderProfile};
pub use error::ScanError;
pub use extractor::Extractor;
pub use prober::{ProbeCallback, ProbeEvent, ProbeOptions, Prober};
pub use result::ProbeResult;
