pub mod settings;

pub use settings::{CredentialSource, RunMode, Settings};
