//! A two-layer feed-forward classifier over sparse token frequencies.
//!
//! Training is plain per-sample gradient descent with normalized gradients. A
//! [`Trainer`] picks its own epoch count by cross-validation, and
//! [`search::train`] tries a geometric range of step sizes and keeps the best
//! network.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use lexnet::{search, Freqs};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn main() -> lexnet::Result<()> {
//! let mut corpus = BTreeMap::new();
//! corpus.insert("rust".to_owned(), vec![Freqs::from_text("fn main() { let x = 1; }")]);
//! corpus.insert("python".to_owned(), vec![Freqs::from_text("def main(): x = 1")]);
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! if let Some(net) = search::train(corpus, &mut rng)? {
//!     println!("{:?}", net.classify(&Freqs::from_text("fn f() {}")));
//! }
//! # Ok(())
//! # }
//! ```

mod activation;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod freqs;
pub mod gradient;
pub mod network;
pub mod search;
pub mod trainer;

pub use config::TrainingConfig;
pub use dataset::Dataset;
pub use error::{NetErr, Result};
pub use freqs::Freqs;
pub use gradient::GradientCalc;
pub use network::Network;
pub use search::Trial;
pub use trainer::{StopReason, TrainReport, Trainer};
